//! Attribute de-duplication
//!
//! Grok in particular likes stacking `@MainActor` twice, or emitting
//! `final @MainActor` under an existing `@MainActor` line. Exactly one
//! occurrence survives; the declaration itself is never touched.

use regex::Regex;

/// Collapse duplicate `@MainActor` annotations.
pub fn collapse_main_actor(content: &str) -> (String, usize) {
    let mut fixes = 0;
    let mut current = content.to_string();

    // Same-line stacking: `@MainActor @MainActor class ...`
    let stacked = Regex::new(r"@MainActor\s+@MainActor").expect("static pattern");
    while stacked.is_match(&current) {
        current = stacked.replace_all(&current, "@MainActor").into_owned();
        fixes += 1;
    }

    // `@MainActor` line followed by `final @MainActor` keeps the first
    // attribute and demotes the second line to plain `final`.
    let split_final =
        Regex::new(r"(@MainActor\s*\n\s*)final\s+@MainActor").expect("static pattern");
    if split_final.is_match(&current) {
        current = split_final.replace_all(&current, "${1}final").into_owned();
        fixes += 1;
    }

    // A lone `final @MainActor` is legal but triggers the duplicate path in
    // combination with the patterns above; normalize the order.
    let reversed = Regex::new(r"final\s+@MainActor").expect("static pattern");
    if reversed.is_match(&current) {
        current = reversed.replace_all(&current, "@MainActor final").into_owned();
        fixes += 1;
    }

    // Consecutive attribute-only lines.
    let mut deduped: Vec<&str> = Vec::new();
    let mut removed_lines = false;
    for line in current.lines() {
        if line.trim() == "@MainActor" && deduped.last().map(|l: &&str| l.trim()) == Some("@MainActor")
        {
            removed_lines = true;
            continue;
        }
        deduped.push(line);
    }
    if removed_lines {
        fixes += 1;
        current = deduped.join("\n");
        if content.ends_with('\n') {
            current.push('\n');
        }
    }

    (current, fixes)
}
