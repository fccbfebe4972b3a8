//! Import repair
//!
//! Two fix families: adding the system imports that well-known identifiers
//! require, and removing imports of local folders (`import Components`) that
//! LLMs invent - SwiftUI projects reference local types directly.

use regex::Regex;
use std::collections::BTreeSet;

/// Well-known identifiers and the module each one lives in.
const IMPORT_TABLE: &[(&str, &str)] = &[
    ("UIImpactFeedbackGenerator", "UIKit"),
    ("UIDevice", "UIKit"),
    ("UIApplication", "UIKit"),
    ("UIColor", "UIKit"),
    ("Timer", "Foundation"),
    ("Date", "Foundation"),
    ("DateFormatter", "Foundation"),
    ("URL", "Foundation"),
    ("URLSession", "Foundation"),
    ("UUID", "Foundation"),
    ("UserDefaults", "Foundation"),
    ("NotificationCenter", "Foundation"),
    ("JSONEncoder", "Foundation"),
    ("JSONDecoder", "Foundation"),
    ("View", "SwiftUI"),
    ("Text", "SwiftUI"),
    ("Button", "SwiftUI"),
    ("VStack", "SwiftUI"),
    ("HStack", "SwiftUI"),
    ("List", "SwiftUI"),
    ("NavigationStack", "SwiftUI"),
    ("NavigationView", "SwiftUI"),
    ("WindowGroup", "SwiftUI"),
    ("Color", "SwiftUI"),
    ("Image", "SwiftUI"),
    ("@State", "SwiftUI"),
    ("@Binding", "SwiftUI"),
    ("@StateObject", "SwiftUI"),
    ("@ObservedObject", "SwiftUI"),
];

/// Local folder names that must never appear as module imports.
const LOCAL_MODULES: &[&str] = &[
    "Views",
    "Models",
    "ViewModels",
    "Components",
    "Services",
    "Utilities",
    "Helpers",
    "Extensions",
];

fn has_import(content: &str, module: &str) -> bool {
    content
        .lines()
        .any(|line| line.trim() == format!("import {}", module))
}

fn uses_identifier(content: &str, identifier: &str) -> bool {
    if let Some(attr) = identifier.strip_prefix('@') {
        return content.contains(&format!("@{}", attr));
    }
    Regex::new(&format!(r"\b{}\b", regex::escape(identifier)))
        .expect("static identifier pattern")
        .is_match(content)
}

/// Prepend any imports the file's identifiers require but that are missing,
/// alphabetically ordered, after the existing import block.
pub fn resolve_missing_imports(content: &str) -> (String, usize) {
    let needed: BTreeSet<&str> = IMPORT_TABLE
        .iter()
        .filter(|(identifier, module)| {
            !has_import(content, module) && uses_identifier(content, identifier)
        })
        .map(|(_, module)| *module)
        .collect();

    if needed.is_empty() {
        return (content.to_string(), 0);
    }

    let lines: Vec<&str> = content.lines().collect();
    let mut insert_at = 0;
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("import ") {
            insert_at = i + 1;
        } else if !trimmed.is_empty() && !trimmed.starts_with("//") {
            break;
        }
    }

    let mut out_lines: Vec<String> = lines[..insert_at].iter().map(|l| l.to_string()).collect();
    for module in &needed {
        out_lines.push(format!("import {}", module));
    }
    out_lines.extend(lines[insert_at..].iter().map(|l| l.to_string()));

    let mut out = out_lines.join("\n");
    if content.ends_with('\n') {
        out.push('\n');
    }
    (out, needed.len())
}

/// Remove imports of modules that do not exist and strip their prefixes from
/// type references (`Components.CardView` -> `CardView`).
///
/// Modules named in `no such module` errors are removed along with the
/// conventional local folder names.
pub fn remove_local_module_imports(content: &str, errors: &[String]) -> (String, usize) {
    let module_error = Regex::new(r"no such module '(\w+)'").expect("static pattern");

    let mut bad_modules: BTreeSet<String> = errors
        .iter()
        .filter_map(|e| module_error.captures(e))
        .map(|c| c[1].to_string())
        .collect();
    for module in LOCAL_MODULES {
        if has_import(content, module) {
            bad_modules.insert(module.to_string());
        }
    }

    let mut fixes = 0;
    let mut current = content.to_string();

    for module in &bad_modules {
        if !has_import(&current, module) {
            continue;
        }
        current = current
            .lines()
            .filter(|line| line.trim() != format!("import {}", module))
            .collect::<Vec<_>>()
            .join("\n");
        if content.ends_with('\n') {
            current.push('\n');
        }
        fixes += 1;

        let prefix = Regex::new(&format!(r"\b{}\.(\w+)", regex::escape(module)))
            .expect("static module pattern");
        if prefix.is_match(&current) {
            current = prefix.replace_all(&current, "$1").into_owned();
            fixes += 1;
        }
    }

    (current, fixes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_missing_imports_after_import_block() {
        let input = "import SwiftUI\n\nstruct ClockView: View {\n    let fired = Timer.publish(every: 1, on: .main, in: .common)\n}\n";
        let (fixed, fixes) = resolve_missing_imports(input);
        assert_eq!(fixes, 1);
        let lines: Vec<&str> = fixed.lines().collect();
        assert_eq!(lines[0], "import SwiftUI");
        assert_eq!(lines[1], "import Foundation");
    }

    #[test]
    fn test_imports_are_alphabetical() {
        let input = "struct HapticView: View {\n    let gen = UIImpactFeedbackGenerator(style: .light)\n    let when = Date()\n}\n";
        let (fixed, fixes) = resolve_missing_imports(input);
        assert_eq!(fixes, 3);
        let lines: Vec<&str> = fixed.lines().collect();
        assert_eq!(lines[0], "import Foundation");
        assert_eq!(lines[1], "import SwiftUI");
        assert_eq!(lines[2], "import UIKit");
    }

    #[test]
    fn test_existing_import_not_duplicated() {
        let input = "import SwiftUI\nstruct A: View {}\n";
        let (fixed, fixes) = resolve_missing_imports(input);
        assert_eq!(fixes, 0);
        assert_eq!(fixed, input);
    }

    #[test]
    fn test_property_wrapper_triggers_swiftui() {
        let input = "struct S {\n    @State private var on = false\n}\n";
        let (fixed, fixes) = resolve_missing_imports(input);
        assert_eq!(fixes, 1);
        assert!(fixed.starts_with("import SwiftUI"));
    }

    #[test]
    fn test_removes_invented_module_and_prefix() {
        let input = "import SwiftUI\nimport Components\n\nstruct A: View {\n    var body: some View { Components.CardView() }\n}\n";
        let errors = vec!["no such module 'Components'".to_string()];
        let (fixed, fixes) = remove_local_module_imports(input, &errors);
        assert_eq!(fixes, 2);
        assert!(!fixed.contains("import Components"));
        assert!(fixed.contains("CardView()"));
        assert!(!fixed.contains("Components.CardView"));
    }

    #[test]
    fn test_known_local_folders_removed_without_error_hint() {
        let input = "import Views\nstruct A {}\n";
        let (fixed, fixes) = remove_local_module_imports(input, &[]);
        assert_eq!(fixes, 1);
        assert!(!fixed.contains("import Views"));
    }
}
