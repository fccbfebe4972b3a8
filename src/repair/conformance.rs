//! Protocol conformance injection
//!
//! Reads `does not conform to protocol 'Hashable'`-style diagnostics,
//! appends the missing protocol to the named type's conformance list, and
//! synthesizes `hash(into:)`/`==` keyed on `id` when the type has neither.

use super::delimiters::find_matching_brace;
use regex::Regex;

/// Type and protocol named by a conformance diagnostic, if any.
pub fn extract_missing_conformance(error: &str) -> Option<(String, String)> {
    let patterns = [
        r"type '(\w+)' does not conform to protocol '(\w+)'",
        r"'(\w+)' does not conform to protocol '(\w+)'",
        r"'(\w+)' must conform to '(\w+)'",
        r"requires that '(\w+)' conform to '(\w+)'",
    ];

    for pattern in patterns {
        let re = Regex::new(pattern).expect("static pattern");
        if let Some(captures) = re.captures(error) {
            return Some((captures[1].to_string(), captures[2].to_string()));
        }
    }
    None
}

/// Add `protocol_name` to `type_name`'s declaration, creating a conformance
/// list if none exists. For Hashable/Equatable, synthesize `hash(into:)` and
/// `==` on `id` unless the type already defines either.
pub fn add_conformance(content: &str, type_name: &str, protocol_name: &str) -> (String, usize) {
    let decl = Regex::new(&format!(
        r"(struct|class|enum)\s+{}(\s*:\s*([^{{\n]+?))?\s*\{{",
        regex::escape(type_name)
    ))
    .expect("static declaration pattern");

    let Some(captures) = decl.captures(content) else {
        return (content.to_string(), 0);
    };

    let keyword = &captures[1];
    let existing = captures.get(3).map(|m| m.as_str().trim()).unwrap_or("");

    if existing
        .split(',')
        .any(|p| p.trim() == protocol_name)
    {
        return (content.to_string(), 0);
    }

    let new_decl = if existing.is_empty() {
        format!("{} {}: {} {{", keyword, type_name, protocol_name)
    } else {
        format!("{} {}: {}, {} {{", keyword, type_name, existing, protocol_name)
    };

    let full_match = captures.get(0).expect("capture 0 always present");
    let mut fixed = String::with_capacity(content.len() + 128);
    fixed.push_str(&content[..full_match.start()]);
    fixed.push_str(&new_decl);
    fixed.push_str(&content[full_match.end()..]);
    let mut fixes = 1;

    let wants_hash = matches!(protocol_name, "Hashable" | "Equatable");
    let already_implements = fixed.contains("func hash(into hasher: inout Hasher)")
        || fixed.contains(&format!("static func == (lhs: {}", type_name));

    if wants_hash && !already_implements {
        let open_idx = full_match.start() + new_decl.len() - 1;
        if let Some(close_idx) = find_matching_brace(&fixed, open_idx) {
            let methods = format!(
                "\n    func hash(into hasher: inout Hasher) {{\n        hasher.combine(id)\n    }}\n\n    static func == (lhs: {name}, rhs: {name}) -> Bool {{\n        lhs.id == rhs.id\n    }}\n",
                name = type_name
            );
            fixed.insert_str(close_idx, &methods);
            fixes += 1;
        }
    }

    (fixed, fixes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_type_and_protocol() {
        let (ty, proto) =
            extract_missing_conformance("type 'Foo' does not conform to protocol 'Hashable'")
                .unwrap();
        assert_eq!(ty, "Foo");
        assert_eq!(proto, "Hashable");

        let (ty, proto) =
            extract_missing_conformance("generic parameter requires that 'Item' conform to 'Hashable'")
                .unwrap();
        assert_eq!(ty, "Item");
        assert_eq!(proto, "Hashable");
    }

    #[test]
    fn test_injects_hashable_with_synthesized_methods() {
        let input = "struct Foo {\n    let id: UUID\n}\n";
        let (fixed, fixes) = add_conformance(input, "Foo", "Hashable");
        assert_eq!(fixes, 2);
        assert!(fixed.contains("struct Foo: Hashable {"));
        assert!(fixed.contains("func hash(into hasher: inout Hasher)"));
        assert!(fixed.contains("hasher.combine(id)"));
        assert!(fixed.contains("static func == (lhs: Foo, rhs: Foo) -> Bool"));
        // The methods land inside the type body.
        let close = fixed.rfind('}').unwrap();
        assert!(fixed.find("hasher.combine").unwrap() < close);
    }

    #[test]
    fn test_appends_to_existing_conformance_list() {
        let input = "struct Item: Identifiable, Codable {\n    let id: UUID\n}\n";
        let (fixed, fixes) = add_conformance(input, "Item", "Hashable");
        assert!(fixes >= 1);
        assert!(fixed.contains("struct Item: Identifiable, Codable, Hashable {"));
    }

    #[test]
    fn test_existing_conformance_is_a_no_op() {
        let input = "struct Item: Hashable {\n    let id: UUID\n}\n";
        let (fixed, fixes) = add_conformance(input, "Item", "Hashable");
        assert_eq!(fixes, 0);
        assert_eq!(fixed, input);
    }

    #[test]
    fn test_codable_does_not_synthesize_hash_methods() {
        let input = "struct Payload {\n    let id: UUID\n}\n";
        let (fixed, fixes) = add_conformance(input, "Payload", "Codable");
        assert_eq!(fixes, 1);
        assert!(fixed.contains("struct Payload: Codable {"));
        assert!(!fixed.contains("hash(into"));
    }

    #[test]
    fn test_missing_type_is_a_no_op() {
        let input = "struct Other {}\n";
        let (fixed, fixes) = add_conformance(input, "Foo", "Hashable");
        assert_eq!(fixes, 0);
        assert_eq!(fixed, input);
    }

    #[test]
    fn test_does_not_duplicate_user_equality() {
        let input = "struct Foo {\n    let id: UUID\n    static func == (lhs: Foo, rhs: Foo) -> Bool { lhs.id == rhs.id }\n}\n";
        let (fixed, _) = add_conformance(input, "Foo", "Hashable");
        assert_eq!(fixed.matches("static func ==").count(), 1);
    }
}
