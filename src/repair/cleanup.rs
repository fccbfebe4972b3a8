//! Generated-boilerplate cleanup
//!
//! Three fix families for code the generator should not have produced:
//! Core Data scaffolding referencing a PersistenceController that does not
//! exist, `catch` blocks assigning to an immutable `error` binding, and the
//! ambiguous `.toolbar(content:)` spelling.

use regex::Regex;

/// Strip Core Data references from a file that has no Core Data stack.
pub fn strip_core_data(content: &str) -> (String, usize) {
    if !content.contains("PersistenceController")
        && !content.contains("managedObjectContext")
        && !content.contains("CoreData")
    {
        return (content.to_string(), 0);
    }

    let mut fixes = 0;
    let mut current = content.to_string();

    let patterns = [
        r"import CoreData\s*\n",
        r"(?m)^\s*(private\s+)?let\s+persistenceController\s*=\s*PersistenceController[^\n]*\n",
        r"\.environment\(\\\.managedObjectContext[^)]*\)\s*",
        r"(?m)^\s*@Environment\(\\\.managedObjectContext\)\s*(private\s+)?var\s+\w+[^\n]*\n",
        r"(?m)^\s*@FetchRequest\([^)]*\)\s*(private\s+)?var\s+\w+[^\n]*\n",
    ];

    for pattern in patterns {
        let re = Regex::new(pattern).expect("static pattern");
        if re.is_match(&current) {
            current = re.replace_all(&current, "").into_owned();
            fixes += 1;
        }
    }

    (current, fixes)
}

/// Rewrite `catch { error = ... }` blocks that shadow a published `error`
/// property into `catch let caughtError { self.error = ... }`.
pub fn fix_immutable_catch(content: &str) -> (String, usize) {
    let mut fixes = 0;
    let mut current = content.to_string();

    let assigns_caught = Regex::new(r"catch\s*\{(\s*\n\s*)error\s*=\s*error")
        .expect("static pattern");
    if assigns_caught.is_match(&current) {
        current = assigns_caught
            .replace_all(&current, "catch let caughtError {${1}self.error = caughtError")
            .into_owned();
        fixes += 1;
    }

    let assigns_other = Regex::new(r"catch\s*\{(\s*\n\s*)error\s*=").expect("static pattern");
    if assigns_other.is_match(&current) {
        current = assigns_other
            .replace_all(&current, "catch let caughtError {${1}self.error =")
            .into_owned();
        fixes += 1;
    }

    (current, fixes)
}

/// Disambiguate `.toolbar`: rewrite the `(content:)` spelling and comment
/// out duplicate toolbar modifiers beyond the first.
///
/// The rewrite leaves the closure's trailing `)` orphaned; the delimiter
/// balancer drops it on the structural pass that follows.
pub fn fix_toolbar_ambiguity(content: &str) -> (String, usize) {
    let mut fixes = 0;
    let mut current = content.to_string();

    let spelled = Regex::new(r"\.toolbar\s*\(\s*content\s*:\s*\{").expect("static pattern");
    if spelled.is_match(&current) {
        current = spelled.replace_all(&current, ".toolbar {").into_owned();
        fixes += 1;
    }

    let toolbar_lines: Vec<usize> = current
        .lines()
        .enumerate()
        .filter(|(_, line)| line.contains(".toolbar") && !line.trim().starts_with("//"))
        .map(|(i, _)| i)
        .collect();

    if toolbar_lines.len() > 1 {
        let duplicates: Vec<usize> = toolbar_lines[1..].to_vec();
        let lines: Vec<String> = current
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if duplicates.contains(&i) {
                    format!("// {}", line)
                } else {
                    line.to_string()
                }
            })
            .collect();
        current = lines.join("\n");
        if content.ends_with('\n') {
            current.push('\n');
        }
        fixes += 1;
    }

    (current, fixes)
}
