//! SwiftUI scope analysis
//!
//! Builds a lexical scope tree from indentation and pattern heuristics -
//! `ForEach` bindings, closure parameters, function parameters, type bodies -
//! then flags identifiers referenced outside their defining scope. The
//! canonical target is `.swipeActions` attached to an outer `ForEach` while
//! its closure references the inner row binding.
//!
//! The tree is rebuilt from scratch on every analysis; nothing is mutated
//! incrementally. A variable is visible at a line iff it is bound in that
//! line's enclosing scope or any ancestor - no flow or sibling visibility.

use regex::Regex;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    File,
    ForEach,
    Closure,
    Function,
    Type,
}

/// One node in the scope tree. Nodes live in an arena and point at their
/// parent by index, which stands in for the weak back-reference a pointer
/// tree would carry.
#[derive(Debug)]
pub struct ScopeNode {
    pub kind: ScopeKind,
    pub bound: BTreeSet<String>,
    pub line_start: usize,
    pub line_end: usize,
    pub indent: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

#[derive(Debug)]
pub struct ScopeTree {
    nodes: Vec<ScopeNode>,
}

impl ScopeTree {
    pub fn root(&self) -> &ScopeNode {
        &self.nodes[0]
    }

    pub fn node(&self, idx: usize) -> &ScopeNode {
        &self.nodes[idx]
    }

    /// Whether `variable` is bound in `scope` or any ancestor.
    pub fn is_visible(&self, scope: usize, variable: &str) -> bool {
        let mut current = Some(scope);
        while let Some(idx) = current {
            if self.nodes[idx].bound.contains(variable) {
                return true;
            }
            current = self.nodes[idx].parent;
        }
        false
    }

    /// Deepest scope whose line range contains `line`.
    pub fn scope_for_line(&self, line: usize) -> usize {
        let mut current = 0;
        loop {
            let next = self.nodes[current]
                .children
                .iter()
                .copied()
                .find(|&c| self.nodes[c].line_start <= line && line <= self.nodes[c].line_end);
            match next {
                Some(child) => current = child,
                None => return current,
            }
        }
    }
}

/// An identifier referenced where it is not visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeIssue {
    pub variable: String,
    pub line: usize,
    pub message: String,
    pub in_swipe_actions: bool,
}

pub struct Analysis {
    pub tree: ScopeTree,
    pub issues: Vec<ScopeIssue>,
}

/// Identifiers that are system types or keywords, never scope issues.
const BUILTINS: &[&str] = &[
    "self", "super", "String", "Int", "Double", "Float", "Bool", "Array", "Dictionary", "Set",
    "Date", "UUID", "Calendar", "Locale", "Timer", "Task", "Color", "Text", "Image", "Button",
    "VStack", "HStack", "ZStack", "List", "Spacer", "Label", "Font", "Section", "ForEach",
    "NavigationStack", "NavigationView", "Toggle", "TextField", "Slider", "Picker", "Form",
    "Group", "GeometryReader", "ScrollView", "EdgeInsets", "Binding", "State",
];

struct Patterns {
    foreach: Regex,
    closure: Regex,
    function: Regex,
    type_decl: Regex,
    binding: Regex,
    param_name: Regex,
    member_access: Regex,
    call_argument: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            foreach: Regex::new(r"ForEach\([^)]*\)\s*\{\s*(\w+)\s+in").expect("static pattern"),
            closure: Regex::new(r"\{\s*(\w+(?:\s*,\s*\w+)*)\s+in\b").expect("static pattern"),
            function: Regex::new(r"func\s+\w+\s*\(([^)]*)\)").expect("static pattern"),
            type_decl: Regex::new(r"\b(struct|class|enum)\s+(\w+)").expect("static pattern"),
            binding: Regex::new(r"(?:let|var)\s+(\w+)").expect("static pattern"),
            param_name: Regex::new(r"(\w+)\s*:").expect("static pattern"),
            member_access: Regex::new(r"\b([A-Za-z_]\w*)\.[A-Za-z_]").expect("static pattern"),
            call_argument: Regex::new(r"\w+\(\s*([a-z]\w*)\s*\)").expect("static pattern"),
        }
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Build the scope tree and flag out-of-scope identifier references.
pub fn analyze(content: &str) -> Analysis {
    let patterns = Patterns::new();
    let lines: Vec<&str> = content.lines().collect();
    let tree = build_tree(&lines, &patterns);
    let issues = find_issues(&lines, &tree, &patterns);
    Analysis { tree, issues }
}

fn build_tree(lines: &[&str], patterns: &Patterns) -> ScopeTree {
    let mut nodes = vec![ScopeNode {
        kind: ScopeKind::File,
        bound: BTreeSet::new(),
        line_start: 0,
        line_end: lines.len().saturating_sub(1),
        indent: 0,
        parent: None,
        children: Vec::new(),
    }];
    let mut stack: Vec<usize> = vec![0];

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let indent = indent_of(line);

        // Dedent closes every scope opened at this indentation or deeper.
        while stack.len() > 1 && indent <= nodes[*stack.last().expect("stack nonempty")].indent {
            let closed = stack.pop().expect("stack nonempty");
            nodes[closed].line_end = i;
        }
        let current = *stack.last().expect("file scope remains");

        let push_scope = |nodes: &mut Vec<ScopeNode>,
                              stack: &mut Vec<usize>,
                              kind: ScopeKind,
                              bound: BTreeSet<String>| {
            let idx = nodes.len();
            nodes.push(ScopeNode {
                kind,
                bound,
                line_start: i,
                line_end: lines.len().saturating_sub(1),
                indent,
                parent: Some(current),
                children: Vec::new(),
            });
            nodes[current].children.push(idx);
            stack.push(idx);
        };

        if let Some(captures) = patterns.foreach.captures(trimmed) {
            let mut bound = BTreeSet::new();
            bound.insert(captures[1].to_string());
            push_scope(&mut nodes, &mut stack, ScopeKind::ForEach, bound);
            continue;
        }

        if !trimmed.contains("ForEach") {
            if let Some(captures) = patterns.closure.captures(trimmed) {
                let bound = captures[1]
                    .split(',')
                    .map(|p| p.trim().to_string())
                    .collect();
                push_scope(&mut nodes, &mut stack, ScopeKind::Closure, bound);
                continue;
            }
        }

        if let Some(captures) = patterns.function.captures(trimmed) {
            let bound = patterns
                .param_name
                .captures_iter(&captures[1])
                .map(|c| c[1].to_string())
                .collect();
            push_scope(&mut nodes, &mut stack, ScopeKind::Function, bound);
            continue;
        }

        if patterns.type_decl.is_match(trimmed) {
            push_scope(&mut nodes, &mut stack, ScopeKind::Type, BTreeSet::new());
            continue;
        }

        if let Some(captures) = patterns.binding.captures(trimmed) {
            let name = captures[1].to_string();
            nodes[current].bound.insert(name);
        }
    }

    ScopeTree { nodes }
}

fn find_issues(lines: &[&str], tree: &ScopeTree, patterns: &Patterns) -> Vec<ScopeIssue> {
    let mut issues = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        let in_swipe = line.contains(".swipeActions");

        let mut candidates: BTreeSet<String> = patterns
            .member_access
            .captures_iter(line)
            .map(|c| c[1].to_string())
            .collect();
        if in_swipe {
            // Inside a swipeActions closure the row binding usually shows up
            // as a bare call argument, not a member access.
            candidates.extend(
                patterns
                    .call_argument
                    .captures_iter(line)
                    .map(|c| c[1].to_string()),
            );
        }

        let scope = tree.scope_for_line(i);
        for variable in candidates {
            if BUILTINS.contains(&variable.as_str()) {
                continue;
            }
            if tree.is_visible(scope, &variable) {
                continue;
            }
            let message = if in_swipe {
                format!(
                    "'{}' is not in scope where .swipeActions is attached; the modifier sits on an outer ForEach instead of the one binding '{}'",
                    variable, variable
                )
            } else {
                format!("'{}' is not in scope on line {}", variable, i + 1)
            };
            issues.push(ScopeIssue {
                variable,
                line: i,
                message,
                in_swipe_actions: in_swipe,
            });
        }
    }

    issues
}

/// Fix swipeActions scope issues by moving the modifier onto the view inside
/// the `ForEach` that binds the referenced variable. When the block or the
/// target view cannot be located with confidence, a TODO marker is inserted
/// instead of guessing.
pub fn fix_scope_issues(content: &str) -> (String, Vec<String>) {
    let mut lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
    let mut notes = Vec::new();

    // Relocation shifts line numbers, so re-analyze after every applied fix.
    for _ in 0..8 {
        let joined = lines.join("\n");
        let analysis = analyze(&joined);
        let Some(issue) = analysis
            .issues
            .iter()
            .find(|issue| issue.in_swipe_actions)
        else {
            break;
        };

        match relocate_swipe_actions(&lines, issue) {
            Some((new_lines, note)) => {
                lines = new_lines;
                notes.push(note);
            }
            None => {
                // Re-running the fixer must not stack a second marker.
                if issue.line > 0 && lines[issue.line - 1].contains("/* TODO:") {
                    break;
                }
                let indent = " ".repeat(indent_of(&lines[issue.line]));
                lines.insert(
                    issue.line,
                    format!(
                        "{}/* TODO: '{}' is out of scope for the swipeActions below; move the modifier inside the ForEach that binds it */",
                        indent, issue.variable
                    ),
                );
                notes.push(format!(
                    "Marked unresolvable swipeActions scope issue for '{}'",
                    issue.variable
                ));
                break;
            }
        }
    }

    let mut out = lines.join("\n");
    if content.ends_with('\n') {
        out.push('\n');
    }
    (out, notes)
}

fn relocate_swipe_actions(lines: &[String], issue: &ScopeIssue) -> Option<(Vec<String>, String)> {
    // Locate the block: the modifier line, then brace-match to its end.
    let start = (issue.line.saturating_sub(5)..(issue.line + 5).min(lines.len()))
        .find(|&i| lines[i].contains(".swipeActions"))?;

    let mut depth = 0i32;
    let mut entered = false;
    let mut end = None;
    for (i, line) in lines.iter().enumerate().skip(start) {
        depth += line.matches('{').count() as i32;
        depth -= line.matches('}').count() as i32;
        if line.contains('{') {
            entered = true;
        }
        if entered && depth <= 0 {
            end = Some(i);
            break;
        }
    }
    let end = end?;

    // The ForEach that binds the variable, scanning upward from the block.
    // Matched in two parts because the collection expression may itself
    // contain a closure brace.
    let binder = Regex::new(&format!(r"\{{\s*{}\s+in\b", regex::escape(&issue.variable)))
        .expect("static pattern");
    let foreach_line = (0..start)
        .rev()
        .find(|&i| lines[i].contains("ForEach") && binder.is_match(&lines[i]))?;

    // The view expression inside that ForEach the modifier should attach to.
    let view = Regex::new(r"^\s*(Text|Label|HStack|VStack|ZStack|Image|\w+Row)\b")
        .expect("static pattern");
    let view_line = ((foreach_line + 1)..start).find(|&i| view.is_match(&lines[i]))?;

    let block: Vec<String> = lines[start..=end].iter().cloned().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if i >= start && i <= end {
            continue;
        }
        out.push(line.clone());
        if i == view_line {
            let base = indent_of(line) + 4;
            for moved in &block {
                out.push(format!("{}{}", " ".repeat(base), moved.trim()));
            }
        }
    }

    Some((
        out,
        format!(
            "Moved .swipeActions inside the ForEach that binds '{}'",
            issue.variable
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED_FOREACH: &str = r#"ForEach(categories) { category in
    ForEach(items.filter { $0.category == category }) { item in
        Text(item.name)
    }
}
.swipeActions { Button("Delete") { delete(item) } }"#;

    #[test]
    fn test_flags_item_at_swipe_actions_line() {
        let analysis = analyze(NESTED_FOREACH);
        let issue = analysis
            .issues
            .iter()
            .find(|i| i.variable == "item")
            .expect("item must be flagged");
        assert_eq!(issue.line, 5);
        assert!(issue.in_swipe_actions);
        assert!(issue.message.contains("swipeActions"));
    }

    #[test]
    fn test_item_visible_inside_inner_foreach() {
        let analysis = analyze(NESTED_FOREACH);
        let scope = analysis.tree.scope_for_line(2);
        assert!(analysis.tree.is_visible(scope, "item"));
        assert!(analysis.tree.is_visible(scope, "category"));
    }

    #[test]
    fn test_no_issue_when_swipe_actions_is_inside() {
        let content = r#"ForEach(items) { item in
    Text(item.name)
        .swipeActions { Button("Delete") { delete(item) } }
}"#;
        let analysis = analyze(content);
        assert!(analysis.issues.iter().all(|i| i.variable != "item"));
    }

    #[test]
    fn test_function_parameters_are_bound() {
        let content = "func delete(at offsets: IndexSet) {\n    items.remove(atOffsets: offsets)\n}";
        let analysis = analyze(content);
        assert!(analysis.issues.iter().all(|i| i.variable != "offsets"));
    }

    #[test]
    fn test_closure_parameters_are_bound() {
        let content = "withAnimation { value, extra in\n    value.toggle()\n}";
        let analysis = analyze(content);
        assert!(analysis.issues.iter().all(|i| i.variable != "value"));
    }

    #[test]
    fn test_fix_relocates_swipe_actions() {
        let (fixed, notes) = fix_scope_issues(NESTED_FOREACH);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("Moved .swipeActions"));

        let lines: Vec<&str> = fixed.lines().collect();
        let text_idx = lines
            .iter()
            .position(|l| l.contains("Text(item.name)"))
            .unwrap();
        assert!(lines[text_idx + 1].contains(".swipeActions"));
        // Nothing left attached to the outer ForEach.
        assert!(!lines.last().unwrap().contains(".swipeActions"));

        // The relocated code no longer raises the issue.
        let reanalyzed = analyze(&fixed);
        assert!(reanalyzed.issues.iter().all(|i| !i.in_swipe_actions));
    }

    #[test]
    fn test_fix_degrades_to_todo_marker() {
        // No ForEach binds `item`, so relocation is impossible.
        let content = "List {\n    Text(\"row\")\n}\n.swipeActions { Button(\"Delete\") { delete(item) } }";
        let (fixed, notes) = fix_scope_issues(content);
        assert_eq!(notes.len(), 1);
        assert!(fixed.contains("TODO"));
        assert!(fixed.contains(".swipeActions"));
    }

    #[test]
    fn test_bindings_in_type_scope() {
        let content = "struct ContentView: View {\n    @State private var items: [String] = []\n    var body: some View {\n        Text(items.first ?? \"\")\n    }\n}";
        let analysis = analyze(content);
        assert!(analysis.issues.iter().all(|i| i.variable != "items"));
    }
}
