//! Delimiter balancing
//!
//! Scans character-by-character with a stack of open delimiters, ignoring
//! anything inside string literals and line comments. Missing closers are
//! appended at end of input in LIFO order; orphaned closers are dropped.
//! Running the balancer on its own output is a no-op.

fn closer_for(opener: char) -> char {
    match opener {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        _ => unreachable!("only delimiter openers are stacked"),
    }
}

fn opener_for(closer: char) -> char {
    match closer {
        ')' => '(',
        ']' => '[',
        '}' => '{',
        _ => unreachable!("only delimiter closers are matched"),
    }
}

/// Balance `(`, `[` and `{` across the whole file.
///
/// A `"` not preceded by an unescaped `\` toggles in-string mode; characters
/// inside strings and `//` comments are never treated as delimiters. Swift
/// single-line literals cannot contain a raw newline, so a newline while in
/// string mode ends the (unterminated) literal rather than swallowing the
/// rest of the file.
pub fn balance_delimiters(content: &str) -> (String, usize) {
    let mut out = String::with_capacity(content.len() + 8);
    let mut stack: Vec<char> = Vec::new();
    let mut fixes = 0;

    let mut in_string = false;
    let mut escaped = false;
    let mut in_comment = false;
    let mut prev: Option<char> = None;

    for c in content.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' || c == '\n' {
                in_string = false;
            }
            prev = Some(c);
            continue;
        }

        if in_comment {
            out.push(c);
            if c == '\n' {
                in_comment = false;
            }
            prev = Some(c);
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if prev == Some('/') => {
                in_comment = true;
                out.push(c);
            }
            '(' | '[' | '{' => {
                stack.push(c);
                out.push(c);
            }
            ')' | ']' | '}' => {
                if stack.last() == Some(&opener_for(c)) {
                    stack.pop();
                    out.push(c);
                } else {
                    // Orphaned closer: dropping it beats leaving it dangling.
                    fixes += 1;
                }
            }
            _ => out.push(c),
        }
        prev = Some(c);
    }

    if !stack.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        while let Some(opener) = stack.pop() {
            out.push(closer_for(opener));
            fixes += 1;
        }
        out.push('\n');
    }

    (out, fixes)
}

/// Report unbalanced delimiters with line numbers, without modifying anything.
pub fn validate_balance(content: &str) -> Vec<String> {
    let mut issues = Vec::new();
    let mut stack: Vec<(char, usize)> = Vec::new();

    let mut in_string = false;
    let mut escaped = false;
    let mut in_comment = false;
    let mut prev: Option<char> = None;
    let mut line = 1;

    for c in content.chars() {
        if c == '\n' {
            line += 1;
            in_comment = false;
            in_string = false;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            prev = Some(c);
            continue;
        }
        if in_comment {
            prev = Some(c);
            continue;
        }
        match c {
            '"' => in_string = true,
            '/' if prev == Some('/') => in_comment = true,
            '(' | '[' | '{' => stack.push((c, line)),
            ')' | ']' | '}' => {
                if stack.last().map(|(o, _)| *o) == Some(opener_for(c)) {
                    stack.pop();
                } else {
                    issues.push(format!("line {}: unmatched '{}'", line, c));
                }
            }
            _ => {}
        }
        prev = Some(c);
    }

    for (opener, line) in stack {
        issues.push(format!("line {}: unclosed '{}'", line, opener));
    }

    issues
}

/// Index of the `}` matching the `{` at `open_idx`, honoring strings.
pub(crate) fn find_matching_brace(content: &str, open_idx: usize) -> Option<usize> {
    let bytes = content.as_bytes();
    if bytes.get(open_idx) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in content.char_indices().skip_while(|(i, _)| *i < open_idx) {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' || c == '\n' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}
