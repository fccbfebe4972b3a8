//! Compiler error classification
//!
//! Maps raw Swift diagnostics onto a closed set of categories via ordered,
//! case-insensitive regex tables. Classification is what the rest of the
//! pipeline keys on: strategies consult the buckets, and the orchestrator's
//! retry bookkeeping uses a category-based fingerprint so "the same bug" is
//! recognized across retries regardless of line numbers or identifiers.

use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, BTreeSet};

/// Every category the pipeline knows how to react to.
///
/// Table order is the tie-break: the first category whose pattern matches
/// wins, so specific categories sit above the catch-all `cannot find` ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    IosVersion,
    PersistenceController,
    HashableConformance,
    CodableConformance,
    DuplicateDeclaration,
    ToolbarAmbiguous,
    ImmutableVariable,
    ExhaustiveSwitch,
    MissingImport,
    TypeNotFound,
    Other,
}

impl ErrorCategory {
    /// All categories in matching order.
    pub fn all() -> &'static [ErrorCategory] {
        &[
            ErrorCategory::IosVersion,
            ErrorCategory::PersistenceController,
            ErrorCategory::HashableConformance,
            ErrorCategory::CodableConformance,
            ErrorCategory::DuplicateDeclaration,
            ErrorCategory::ToolbarAmbiguous,
            ErrorCategory::ImmutableVariable,
            ErrorCategory::ExhaustiveSwitch,
            ErrorCategory::MissingImport,
            ErrorCategory::TypeNotFound,
            ErrorCategory::Other,
        ]
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ErrorCategory::IosVersion => "ios_version",
            ErrorCategory::PersistenceController => "persistence_controller",
            ErrorCategory::HashableConformance => "hashable_conformance",
            ErrorCategory::CodableConformance => "codable_conformance",
            ErrorCategory::DuplicateDeclaration => "duplicate_declaration",
            ErrorCategory::ToolbarAmbiguous => "toolbar_ambiguous",
            ErrorCategory::ImmutableVariable => "immutable_variable",
            ErrorCategory::ExhaustiveSwitch => "exhaustive_switch",
            ErrorCategory::MissingImport => "missing_import",
            ErrorCategory::TypeNotFound => "type_not_found",
            ErrorCategory::Other => "other",
        }
    }

    /// Ordered detection patterns. Case-insensitive.
    fn patterns(&self) -> &'static [&'static str] {
        match self {
            ErrorCategory::IosVersion => &[
                r"is only available in iOS",
                r"is only available in macOS",
                r"symbolEffect.*is only available",
                r"'ContentUnavailableView' is only available",
                r"@Observable.*is only available",
                r"scrollBounceBehavior.*is only available",
            ],
            ErrorCategory::PersistenceController => &[
                r"cannot find (type )?'PersistenceController'",
                r"use of unresolved identifier 'PersistenceController'",
                r"cannot find 'managedObjectContext' in scope",
            ],
            ErrorCategory::HashableConformance => &[
                r"does not conform to protocol 'Hashable'",
                r"must conform to 'Hashable'",
                r"requires that '\w+' conform to 'Hashable'",
                r"does not conform to protocol 'Equatable'",
            ],
            ErrorCategory::CodableConformance => &[
                r"does not conform to protocol '(Codable|Decodable|Encodable)'",
                r"requires that '\w+' conform to '(Codable|Decodable|Encodable)'",
            ],
            ErrorCategory::DuplicateDeclaration => &[
                r"invalid redeclaration",
                r"duplicate '@MainActor'",
                r"redundant '@MainActor'",
                r"multiple global actor attributes",
                r"declaration can not have multiple global actor",
                r"final @MainActor",
            ],
            ErrorCategory::ToolbarAmbiguous => &[r"ambiguous use of 'toolbar'"],
            ErrorCategory::ImmutableVariable => &[
                r"cannot assign to value.*is immutable",
                r"immutable value '\w+'",
            ],
            ErrorCategory::ExhaustiveSwitch => &[r"switch must be exhaustive"],
            ErrorCategory::MissingImport => &[
                r"no such module '\w+'",
                r"cannot find type '(App|Scene|View|WindowGroup|NavigationView|NavigationStack|UIImpactFeedbackGenerator|UIDevice|UIApplication)' in scope",
                r"cannot find '(Timer|Date|URL|URLSession|Data|JSONEncoder|JSONDecoder|UserDefaults)' in scope",
            ],
            ErrorCategory::TypeNotFound => &[
                r"cannot find type '[^']+' in scope",
                r"cannot find '[^']+' in scope",
                r"use of unresolved identifier",
                r"use of undeclared type",
            ],
            ErrorCategory::Other => &[],
        }
    }

    /// Human-readable fix descriptions for logging/telemetry. Fixes are
    /// applied by code, never by this text.
    pub fn fix_notes(&self) -> &'static [&'static str] {
        match self {
            ErrorCategory::IosVersion => &[
                "Replace iOS 17+ views and modifiers with iOS 16 equivalents",
                "Replace @Observable with ObservableObject + @Published",
            ],
            ErrorCategory::PersistenceController => &[
                "Remove Core Data boilerplate the generator invented",
            ],
            ErrorCategory::HashableConformance => &[
                "Add Hashable conformance and synthesize hash(into:)/== on id",
            ],
            ErrorCategory::CodableConformance => &["Add Codable to the type declaration"],
            ErrorCategory::DuplicateDeclaration => &["Collapse duplicate @MainActor attributes"],
            ErrorCategory::ToolbarAmbiguous => &["Rewrite .toolbar(content:) as .toolbar { }"],
            ErrorCategory::ImmutableVariable => &[
                "Rename the caught error binding and assign through self",
            ],
            ErrorCategory::ExhaustiveSwitch => &["Add missing cases or a default arm"],
            ErrorCategory::MissingImport => &["Add the import the identifier belongs to"],
            ErrorCategory::TypeNotFound => &["Define or remove the unresolved type"],
            ErrorCategory::Other => &[],
        }
    }
}

/// A full partition of the input errors: every category has a bucket,
/// possibly empty, and every error lands in exactly one bucket.
#[derive(Debug, Default)]
pub struct Classification {
    buckets: BTreeMap<ErrorCategory, Vec<String>>,
}

impl Classification {
    pub fn bucket(&self, category: ErrorCategory) -> &[String] {
        self.buckets
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has(&self, category: ErrorCategory) -> bool {
        !self.bucket(category).is_empty()
    }
}

/// Compiled pattern tables. Build once per session, reuse across attempts.
pub struct Classifier {
    tables: Vec<(ErrorCategory, Vec<Regex>)>,
}

impl Classifier {
    pub fn new() -> Self {
        let tables = ErrorCategory::all()
            .iter()
            .map(|category| {
                let patterns = category
                    .patterns()
                    .iter()
                    .map(|p| {
                        RegexBuilder::new(p)
                            .case_insensitive(true)
                            .build()
                            .expect("classifier pattern tables are static and valid")
                    })
                    .collect();
                (*category, patterns)
            })
            .collect();
        Self { tables }
    }

    /// Category of a single error string. First matching table entry wins.
    pub fn category_of(&self, error: &str) -> ErrorCategory {
        for (category, patterns) in &self.tables {
            if patterns.iter().any(|p| p.is_match(error)) {
                return *category;
            }
        }
        ErrorCategory::Other
    }

    /// Partition every error into exactly one bucket.
    pub fn classify(&self, errors: &[String]) -> Classification {
        let mut buckets: BTreeMap<ErrorCategory, Vec<String>> = ErrorCategory::all()
            .iter()
            .map(|c| (*c, Vec::new()))
            .collect();

        for error in errors {
            let category = self.category_of(error);
            buckets.get_mut(&category).expect("all buckets exist").push(error.clone());
        }

        Classification { buckets }
    }

    /// Category-based signature of an error list.
    ///
    /// Built from the first five errors' category tags, deduplicated and
    /// sorted, so line numbers, file paths, and identifier names never
    /// change the fingerprint. Uncategorized errors contribute a sanitized
    /// message prefix instead, keeping distinct unknown bugs distinct.
    pub fn fingerprint(&self, errors: &[String]) -> String {
        let mut tags = BTreeSet::new();

        for error in errors.iter().take(5) {
            let category = self.category_of(error);
            let tag = match category {
                ErrorCategory::Other => {
                    let prefix: String = error
                        .chars()
                        .take(20)
                        .map(|c| if c.is_alphanumeric() { c } else { '_' })
                        .collect();
                    prefix
                }
                _ => format!("{}_error", category.slug()),
            };
            tags.insert(tag);
        }

        tags.into_iter().collect::<Vec<_>>().join("|")
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull individual diagnostics out of raw compiler stderr.
///
/// Only the Swift diagnostic shape `path:line:col: error: message` is
/// understood. Falls back to any line mentioning `error:` so a truncated log
/// still yields something to classify.
pub fn extract_errors(output: &str) -> Vec<String> {
    let pattern = Regex::new(r"(?m)^([^\s:]+\.swift):(\d+):(\d+): error: (.+)$")
        .expect("static pattern");

    let mut errors: Vec<String> = pattern
        .captures_iter(output)
        .map(|c| format!("{}:{}: {}", &c[1], &c[2], c[4].trim()))
        .collect();

    if errors.is_empty() {
        errors = output
            .lines()
            .filter(|line| line.contains("error:"))
            .map(|line| line.trim().to_string())
            .collect();
    }

    errors
}
