//! Syntax Repair Engine
//!
//! Purely textual fixers for the failure modes LLM-generated Swift actually
//! exhibits. Each fixer takes file content and returns
//! `(new_content, fixes_applied)`; a zero count means "no change", which the
//! orchestrator uses to detect strategies that made no progress. Fixers never
//! fail and never reduce the file's set of top-level declarations.
//!
//! This is heuristic text scanning, not a parser. Multi-line string literals,
//! raw strings, and deeply nested generic brackets are out of reliable scope.

pub mod attributes;
pub mod cleanup;
pub mod conformance;
pub mod delimiters;
pub mod imports;
pub mod ios_compat;
pub mod literals;
pub mod ternary;

/// Run the structural fixers in their canonical order: balance delimiters
/// first so later line-based passes see sane nesting, then complete
/// ternaries, then collapse duplicate attributes.
pub fn repair_structure(content: &str) -> (String, usize) {
    let mut total = 0;

    let (content, fixes) = delimiters::balance_delimiters(content);
    total += fixes;
    let (content, fixes) = ternary::complete_ternaries(&content);
    total += fixes;
    let (content, fixes) = attributes::collapse_main_actor(&content);
    total += fixes;

    (content, total)
}

#[cfg(test)]
mod tests {
    use super::repair_structure;

    #[test]
    fn test_repair_structure_composes() {
        let input = "struct ContentView: View {\n    var body: some View {\n        Text(\"hi\")\n";
        let (fixed, fixes) = repair_structure(input);
        assert!(fixes >= 2);
        assert_eq!(fixed.matches('{').count(), fixed.matches('}').count());
    }

    #[test]
    fn test_repair_structure_no_op_on_clean_code() {
        let input = "struct Model {\n    let id: UUID\n}\n";
        let (fixed, fixes) = repair_structure(input);
        assert_eq!(fixes, 0);
        assert_eq!(fixed, input);
    }
}
