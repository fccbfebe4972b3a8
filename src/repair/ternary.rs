//! Ternary completion
//!
//! LLMs regularly emit `cond ? value` and forget the else branch. Any line
//! with a ternary-looking `?` and no `:` before end of line gets ` : nil`
//! appended. Best-effort by design: optional chaining (`?.`), nil
//! coalescing (`??`), `try?`/`as?` and a trailing bare `?` are left alone.

/// Complete unterminated ternary expressions, one line at a time.
pub fn complete_ternaries(content: &str) -> (String, usize) {
    let mut fixes = 0;
    let lines: Vec<String> = content
        .lines()
        .map(|line| {
            if needs_completion(line) {
                fixes += 1;
                format!("{} : nil", line.trim_end())
            } else {
                line.to_string()
            }
        })
        .collect();

    let mut out = lines.join("\n");
    if content.ends_with('\n') {
        out.push('\n');
    }
    (out, fixes)
}

fn needs_completion(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.starts_with("//") || trimmed.contains(':') || trimmed.ends_with('?') {
        return false;
    }

    let chars: Vec<char> = line.chars().collect();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
            continue;
        }
        if c != '?' {
            continue;
        }

        // Not a ternary when part of `??`, `?.`, `init?(` or similar.
        if chars.get(i + 1).is_some_and(|n| matches!(n, '?' | '.' | '(')) {
            continue;
        }
        if i > 0 && chars[i - 1] == '?' {
            continue;
        }
        // `try? f()` and `x as? T` read like ternaries to a naive scan.
        if word_before(&chars, i) == "try" || word_before(&chars, i) == "as" {
            continue;
        }

        return true;
    }

    false
}

fn word_before(chars: &[char], idx: usize) -> String {
    chars[..idx]
        .iter()
        .rev()
        .take_while(|c| c.is_alphanumeric())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completes_dangling_ternary() {
        let (fixed, fixes) = complete_ternaries("let color = isRunning ? .red\n");
        assert_eq!(fixes, 1);
        assert_eq!(fixed, "let color = isRunning ? .red : nil\n");
    }

    #[test]
    fn test_leaves_complete_ternary_alone() {
        let input = "let color = isRunning ? .red : .green\n";
        let (fixed, fixes) = complete_ternaries(input);
        assert_eq!(fixes, 0);
        assert_eq!(fixed, input);
    }

    #[test]
    fn test_ignores_optional_chaining_and_coalescing() {
        for input in [
            "let name = user?.name\n",
            "let count = items ?? defaults\n",
            "let value = try? decode(data)\n",
            "let view = thing as? AnyView\n",
            "var delegate: Delegate?\n",
        ] {
            let (fixed, fixes) = complete_ternaries(input);
            assert_eq!(fixes, 0, "modified {:?} into {:?}", input, fixed);
        }
    }

    #[test]
    fn test_ignores_question_marks_in_strings() {
        let input = "Text(\"ready?\")\n";
        let (_, fixes) = complete_ternaries(input);
        assert_eq!(fixes, 0);
    }
}
