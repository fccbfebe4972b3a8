//! String literal repair
//!
//! LLM output arrives with word-processor quotes, Python-style single
//! quotes, unterminated literals, and `String(format:)` calls nested inside
//! string literals. All are fixed line by line.

use regex::Regex;

/// Fix the string-literal failure modes in one pass.
pub fn fix_string_literals(content: &str) -> (String, usize) {
    let mut fixes = 0;

    // Smart quotes first so the per-line scans below see plain ASCII.
    let mut current: String = content.to_string();
    if current.contains(['\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}']) {
        current = current
            .replace(['\u{201C}', '\u{201D}'], "\"")
            .replace(['\u{2018}', '\u{2019}'], "'");
        fixes += 1;
    }

    let single_quoted = Regex::new(r"'([^'\n]*)'").expect("static pattern");
    let text_call_open = Regex::new(r#"Text\("[^"]*$"#).expect("static pattern");

    let lines: Vec<String> = current
        .lines()
        .map(|line| {
            let mut fixed = line.to_string();
            let trimmed = line.trim();
            if trimmed.starts_with("//") {
                return fixed;
            }

            // Swift has no single-quoted strings. Only rewrite when the line
            // carries no double quotes, so apostrophes inside real strings
            // survive.
            if fixed.contains('\'') && !fixed.contains('"') && single_quoted.is_match(&fixed) {
                fixed = single_quoted.replace_all(&fixed, "\"$1\"").into_owned();
                fixes += 1;
            }

            // Odd number of unescaped quotes means an unterminated literal.
            let unescaped = fixed.replace("\\\"", "");
            if unescaped.matches('"').count() % 2 != 0 {
                if text_call_open.is_match(&fixed) {
                    fixed = format!("{}\")", fixed.trim_end());
                } else {
                    fixed = format!("{}\"", fixed.trim_end());
                }
                fixes += 1;
            }

            fixed
        })
        .collect();

    current = lines.join("\n");
    if content.ends_with('\n') {
        current.push('\n');
    }

    // String(format:) swallowed by an enclosing literal:
    //   Text("Total: String(format: "%.2f", total)")
    let embedded = Regex::new(r#"Text\("([^"]*?)String\(format:\s*"([^"]+)",\s*([^)]+)\)"\)"#)
        .expect("static pattern");
    if embedded.is_match(&current) {
        current = embedded
            .replace_all(&current, r#"Text("$1\(String(format: "$2", $3))")"#)
            .into_owned();
        fixes += 1;
    }

    let quoted_format = Regex::new(r#""String\(format:\s*"([^"]+)",\s*([^)]+)\)""#)
        .expect("static pattern");
    if quoted_format.is_match(&current) {
        current = quoted_format
            .replace_all(&current, r#"String(format: "$1", $2)"#)
            .into_owned();
        fixes += 1;
    }

    (current, fixes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smart_quotes_become_ascii() {
        let input = "Text(\u{201C}Hello\u{201D})\n";
        let (fixed, fixes) = fix_string_literals(input);
        assert_eq!(fixes, 1);
        assert_eq!(fixed, "Text(\"Hello\")\n");
    }

    #[test]
    fn test_single_quoted_literal_rewritten() {
        let input = "let title = 'Settings'\n";
        let (fixed, fixes) = fix_string_literals(input);
        assert_eq!(fixes, 1);
        assert_eq!(fixed, "let title = \"Settings\"\n");
    }

    #[test]
    fn test_apostrophe_inside_string_survives() {
        let input = "Text(\"it's fine\")\n";
        let (fixed, fixes) = fix_string_literals(input);
        assert_eq!(fixes, 0);
        assert_eq!(fixed, input);
    }

    #[test]
    fn test_unterminated_text_call_closed() {
        let input = "Text(\"Hello\n";
        let (fixed, fixes) = fix_string_literals(input);
        assert_eq!(fixes, 1);
        assert_eq!(fixed, "Text(\"Hello\")\n");
    }

    #[test]
    fn test_unterminated_assignment_closed() {
        let input = "let s = \"oops\n";
        let (fixed, fixes) = fix_string_literals(input);
        assert_eq!(fixes, 1);
        assert_eq!(fixed, "let s = \"oops\"\n");
    }

    #[test]
    fn test_embedded_format_call_interpolated() {
        let input = "Text(\"Total: String(format: \"%.2f\", total)\")\n";
        let (fixed, fixes) = fix_string_literals(input);
        assert!(fixes >= 1);
        assert!(fixed.contains(r#"\(String(format: "%.2f", total))"#));
    }

    #[test]
    fn test_clean_lines_untouched() {
        let input = "let label = \"Done\"\nText(label)\n";
        let (fixed, fixes) = fix_string_literals(input);
        assert_eq!(fixes, 0);
        assert_eq!(fixed, input);
    }
}
