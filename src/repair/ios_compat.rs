//! iOS 17 API down-leveling
//!
//! Generated apps target iOS 16, but models trained on newer SwiftUI keep
//! reaching for iOS 17+ API. Each rewrite swaps the call for an equivalent
//! the target OS ships.

use regex::Regex;

const UNAVAILABLE_WITH_DESCRIPTION: &str = r#"ContentUnavailableView\s*\(\s*"([^"]+)"\s*,\s*systemImage:\s*"([^"]+)"\s*,\s*description:\s*Text\s*\(\s*"([^"]+)"\s*\)\s*\)"#;
const UNAVAILABLE_SIMPLE: &str =
    r#"ContentUnavailableView\s*\(\s*"([^"]+)"\s*,\s*systemImage:\s*"([^"]+)"\s*\)"#;
const UNAVAILABLE_ANY: &str = r"ContentUnavailableView[^)]*\)";

/// iOS 17-only view modifiers that are removed outright.
const REMOVED_MODIFIERS: &[&str] = &[
    r"\.scrollBounceBehavior\([^)]*\)",
    r"\.contentTransition\([^)]*\)",
    r"\.presentationBackground\([^)]*\)",
    r"\.presentationCornerRadius\([^)]*\)",
];

/// Rewrite iOS 17+ API down to the iOS 16 surface.
pub fn downlevel_ios17(content: &str) -> (String, usize) {
    let mut fixes = 0;
    let mut current = content.to_string();

    // ContentUnavailableView, richest signature first so the simple pattern
    // never eats a prefix of the described one.
    let with_description = Regex::new(UNAVAILABLE_WITH_DESCRIPTION).expect("static pattern");
    if with_description.is_match(&current) {
        current = with_description
            .replace_all(
                &current,
                "VStack(spacing: 20) {\n    Image(systemName: \"$2\")\n        .font(.system(size: 50))\n        .foregroundColor(.gray)\n    Text(\"$1\")\n        .font(.title2)\n        .foregroundColor(.gray)\n    Text(\"$3\")\n        .font(.caption)\n        .foregroundColor(.secondary)\n}\n.padding()",
            )
            .into_owned();
        fixes += 1;
    }

    let simple = Regex::new(UNAVAILABLE_SIMPLE).expect("static pattern");
    if simple.is_match(&current) {
        current = simple
            .replace_all(
                &current,
                "VStack(spacing: 20) {\n    Image(systemName: \"$2\")\n        .font(.system(size: 50))\n        .foregroundColor(.gray)\n    Text(\"$1\")\n        .font(.title2)\n        .foregroundColor(.gray)\n}\n.padding()",
            )
            .into_owned();
        fixes += 1;
    }

    let any = Regex::new(UNAVAILABLE_ANY).expect("static pattern");
    if any.is_match(&current) {
        current = any
            .replace_all(
                &current,
                "VStack(spacing: 20) {\n    Image(systemName: \"exclamationmark.triangle\")\n        .font(.system(size: 50))\n        .foregroundColor(.gray)\n    Text(\"Content Unavailable\")\n        .font(.title2)\n        .foregroundColor(.gray)\n}\n.padding()",
            )
            .into_owned();
        fixes += 1;
    }

    // Symbol effects only exist on iOS 17; a spring animation reads the same.
    let symbol_effect = Regex::new(r"\.symbolEffect\([^)]*\)").expect("static pattern");
    if symbol_effect.is_match(&current) {
        current = symbol_effect
            .replace_all(&current, ".scaleEffect(1.1).animation(.spring(), value: true)")
            .into_owned();
        fixes += 1;
    }

    let bounce = Regex::new(r"\.bounce\b").expect("static pattern");
    if bounce.is_match(&current) {
        current = bounce.replace_all(&current, ".spring()").into_owned();
        fixes += 1;
    }

    // @Observable is the iOS 17 observation model; fall back to
    // ObservableObject on the classes that used it.
    let observable = Regex::new(r"@Observable\s+(?:final\s+)?class\s+(\w+)").expect("static pattern");
    let observable_classes: Vec<String> = observable
        .captures_iter(&current)
        .map(|c| c[1].to_string())
        .collect();
    if !observable_classes.is_empty() {
        current = Regex::new(r"@Observable\s+")
            .expect("static pattern")
            .replace_all(&current, "")
            .into_owned();
        for class_name in &observable_classes {
            let (with_conformance, _) =
                super::conformance::add_conformance(&current, class_name, "ObservableObject");
            current = with_conformance;
        }
        fixes += 1;
    }

    // NavigationView is deprecated; the generated code mixes both freely.
    let nav = Regex::new(r"NavigationView\s*\{").expect("static pattern");
    if nav.is_match(&current) {
        current = nav.replace_all(&current, "NavigationStack {").into_owned();
        fixes += 1;
    }

    for modifier in REMOVED_MODIFIERS {
        let re = Regex::new(modifier).expect("static pattern");
        if re.is_match(&current) {
            current = re.replace_all(&current, "").into_owned();
            fixes += 1;
        }
    }

    (current, fixes)
}
