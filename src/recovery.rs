//! Recovery orchestration
//!
//! Runs a fixed cascade of strategies over the failing file set:
//! pattern-based fixes, Swift syntax repair, dependency/import resolution,
//! learned-fix replay, then LLM regeneration. Strategies compose - each one
//! receives the previous one's output - and the early strategies never
//! short-circuit, because a partial regex fix often leaves residue only the
//! LLM can clear. The LLM strategy is terminal on success.
//!
//! A per-fingerprint attempt counter bounds retries: once the same error
//! shape has been attempted five times, recovery reports exhaustion instead
//! of looping. Attempt state lives on the orchestrator instance; build one
//! per generation session.

use crate::breaker::CircuitBreaker;
use crate::classify::{Classification, Classifier, ErrorCategory};
use crate::config::Config;
use crate::knowledge::KnowledgeBase;
use crate::llm::{LlmService, ModifyRequest};
use crate::repair;
use crate::scope;
use crate::source::{merge_files, SourceFile};
use crate::template;
use anyhow::bail;
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of one recovery attempt. Callers pattern-match instead of probing
/// a loosely-shaped map.
#[derive(Debug, Clone)]
pub enum RecoveryResult {
    /// At least one strategy made progress; `files` is the full updated set.
    Fixed {
        files: Vec<SourceFile>,
        notes: Vec<String>,
    },
    /// This error shape has hit its attempt ceiling; nothing was run.
    Exhausted { fingerprint: String },
    /// No strategy could do anything (and no entry point exists to rebuild).
    NoChange,
}

impl RecoveryResult {
    pub fn succeeded(&self) -> bool {
        matches!(self, RecoveryResult::Fixed { .. })
    }

    /// Flatten into the `(success, files, notes)` triple the surrounding
    /// pipeline speaks, with `original` returned on the failure arms.
    pub fn into_parts(self, original: &[SourceFile]) -> (bool, Vec<SourceFile>, Vec<String>) {
        match self {
            RecoveryResult::Fixed { files, notes } => (true, files, notes),
            RecoveryResult::Exhausted { .. } => (
                false,
                original.to_vec(),
                vec!["Automated recovery exhausted for this error pattern".to_string()],
            ),
            RecoveryResult::NoChange => (false, original.to_vec(), Vec::new()),
        }
    }
}

struct StrategyOutcome {
    files: Vec<SourceFile>,
    fixes: usize,
    note: String,
}

/// Placeholder service for sessions that run without an LLM.
pub struct NoLlm;

impl LlmService for NoLlm {
    async fn modify(&self, _request: ModifyRequest) -> anyhow::Result<crate::llm::ModifyResponse> {
        bail!("no LLM service configured")
    }
}

pub struct RecoveryOrchestrator<S> {
    classifier: Classifier,
    attempts: HashMap<String, u32>,
    max_attempts: u32,
    knowledge: KnowledgeBase,
    breaker: CircuitBreaker,
    llm: Option<S>,
}

impl RecoveryOrchestrator<NoLlm> {
    /// An orchestrator limited to the deterministic strategies.
    pub fn without_llm(config: &Config, knowledge: KnowledgeBase) -> Self {
        Self::new(config, knowledge, None)
    }
}

impl<S: LlmService> RecoveryOrchestrator<S> {
    pub fn new(config: &Config, knowledge: KnowledgeBase, llm: Option<S>) -> Self {
        Self {
            classifier: Classifier::new(),
            attempts: HashMap::new(),
            max_attempts: config.max_attempts_per_fingerprint,
            knowledge,
            breaker: CircuitBreaker::new(
                "llm-recovery",
                config.breaker.failure_threshold,
                Duration::from_secs(config.breaker.call_timeout_secs),
                Duration::from_secs(config.breaker.reset_timeout_secs),
            ),
            llm,
        }
    }

    /// Attempt to repair `files` given the compiler `errors`.
    pub async fn recover(
        &mut self,
        errors: &[String],
        files: &[SourceFile],
        bundle_id: Option<&str>,
    ) -> RecoveryResult {
        if errors.is_empty() {
            return RecoveryResult::NoChange;
        }

        let fingerprint = self.classifier.fingerprint(errors);
        let attempted = *self.attempts.get(&fingerprint).unwrap_or(&0);
        if attempted >= self.max_attempts {
            warn!(
                %fingerprint,
                attempted, "attempt ceiling reached, refusing further automated recovery"
            );
            return RecoveryResult::Exhausted { fingerprint };
        }
        *self.attempts.entry(fingerprint.clone()).or_insert(0) += 1;
        info!(%fingerprint, attempt = attempted + 1, errors = errors.len(), "recovery attempt");

        let classification = self.classifier.classify(errors);
        let mut current: Vec<SourceFile> = files.to_vec();
        let mut notes: Vec<String> = Vec::new();

        // Deterministic strategies. A strategy error is logged and treated
        // as "made no changes" - one broken strategy must never abort the
        // whole attempt.
        let strategies: [(&str, fn(&[String], &Classification, &[SourceFile]) -> anyhow::Result<StrategyOutcome>); 3] = [
            ("pattern", pattern_strategy),
            ("syntax", syntax_strategy),
            ("dependency", dependency_strategy),
        ];
        for (name, strategy) in strategies {
            match strategy(errors, &classification, &current) {
                Ok(outcome) if outcome.fixes > 0 => {
                    info!(strategy = name, fixes = outcome.fixes, "strategy made changes");
                    current = outcome.files;
                    notes.push(outcome.note);
                }
                Ok(_) => {}
                Err(err) => warn!(strategy = name, %err, "strategy failed, continuing"),
            }
        }

        match knowledge_strategy(&self.knowledge, errors, &current) {
            Ok(outcome) if outcome.fixes > 0 => {
                info!(strategy = "knowledge", fixes = outcome.fixes, "strategy made changes");
                current = outcome.files;
                notes.push(outcome.note);
            }
            Ok(_) => {}
            Err(err) => warn!(strategy = "knowledge", %err, "strategy failed, continuing"),
        }

        // Terminal strategy: once the LLM reports success, return with the
        // full cumulative fix list.
        if let Some(llm) = &self.llm {
            let request = build_fix_request(errors, &classification, &current);
            match self.breaker.call(|| llm.modify(request)).await {
                Ok(response) => {
                    let cleaned: Vec<SourceFile> = response
                        .files
                        .into_iter()
                        .map(|mut f| {
                            let (content, _) = repair::literals::fix_string_literals(&f.content);
                            f.content = content;
                            f
                        })
                        .collect();
                    current = merge_files(&current, cleaned);
                    notes.push("Applied AI-powered fixes".to_string());
                    return RecoveryResult::Fixed {
                        files: current,
                        notes,
                    };
                }
                Err(err) => warn!(strategy = "llm", %err, "strategy failed, continuing"),
            }
        }

        if !notes.is_empty() {
            return RecoveryResult::Fixed {
                files: current,
                notes,
            };
        }

        self.last_resort(&current, bundle_id)
    }

    /// Swap the broken app for a template that is guaranteed to compile.
    /// Terminates the pipeline with forward progress at the cost of the
    /// custom UI.
    fn last_resort(&self, files: &[SourceFile], bundle_id: Option<&str>) -> RecoveryResult {
        info!("all strategies failed, applying fallback template");

        let Some(app_file) = files.iter().find(|f| f.is_entry_point()) else {
            return RecoveryResult::NoChange;
        };

        let app_struct = Regex::new(r"struct\s+(\w+)\s*:\s*App")
            .expect("static pattern")
            .captures(&app_file.content)
            .map(|c| c[1].to_string());
        let app_name = app_struct
            .or_else(|| {
                bundle_id
                    .and_then(|id| id.rsplit('.').next())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "MyApp".to_string());

        let hint = format!("{} {}", app_name, bundle_id.unwrap_or(""));
        let replacement = match template::detect_app_kind(&hint) {
            Some(kind) => template::template_files(kind, &app_name),
            None => template::minimal_app_files(&app_name),
        };
        let [app_template, view_template] = replacement.as_slice() else {
            return RecoveryResult::NoChange;
        };

        let view_path = files
            .iter()
            .find(|f| f.path.contains("ContentView"))
            .map(|f| f.path.clone())
            .unwrap_or_else(|| "Sources/ContentView.swift".to_string());

        RecoveryResult::Fixed {
            files: vec![
                SourceFile::new(app_file.path.clone(), app_template.content.clone()),
                SourceFile::new(view_path, view_template.content.clone()),
            ],
            notes: vec!["Applied guaranteed-compiling fallback template".to_string()],
        }
    }

    /// How many attempts have been spent on an error shape.
    pub fn attempts_for(&self, errors: &[String]) -> u32 {
        let fingerprint = self.classifier.fingerprint(errors);
        *self.attempts.get(&fingerprint).unwrap_or(&0)
    }

    /// Clear attempt counters, e.g. when a fresh generation begins.
    pub fn reset_attempts(&mut self) {
        self.attempts.clear();
    }

    pub fn breaker_status(&self) -> crate::breaker::BreakerStatus {
        self.breaker.status()
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn knowledge_mut(&mut self) -> &mut KnowledgeBase {
        &mut self.knowledge
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Classification-driven textual fixes: iOS 17 down-leveling, invented
/// module imports, Core Data stripping, string literals, conformances,
/// toolbar and attribute duplication.
fn pattern_strategy(
    errors: &[String],
    classification: &Classification,
    files: &[SourceFile],
) -> anyhow::Result<StrategyOutcome> {
    let mut out = Vec::with_capacity(files.len());
    let mut fixes = 0;

    let conformance_targets: Vec<(String, String)> = classification
        .bucket(ErrorCategory::HashableConformance)
        .iter()
        .chain(classification.bucket(ErrorCategory::CodableConformance).iter())
        .filter_map(|e| repair::conformance::extract_missing_conformance(e))
        .collect();

    for file in files {
        let mut content = file.content.clone();

        if classification.has(ErrorCategory::IosVersion) {
            let (fixed, n) = repair::ios_compat::downlevel_ios17(&content);
            content = fixed;
            fixes += n;
        }
        if classification.has(ErrorCategory::MissingImport)
            || classification.has(ErrorCategory::TypeNotFound)
        {
            let (fixed, n) = repair::imports::remove_local_module_imports(&content, errors);
            content = fixed;
            fixes += n;
        }
        if classification.has(ErrorCategory::PersistenceController) {
            let (fixed, n) = repair::cleanup::strip_core_data(&content);
            content = fixed;
            fixes += n;
        }
        if classification.has(ErrorCategory::ImmutableVariable) {
            let (fixed, n) = repair::cleanup::fix_immutable_catch(&content);
            content = fixed;
            fixes += n;
        }
        if classification.has(ErrorCategory::ToolbarAmbiguous) {
            let (fixed, n) = repair::cleanup::fix_toolbar_ambiguity(&content);
            content = fixed;
            fixes += n;
        }
        if classification.has(ErrorCategory::DuplicateDeclaration) {
            let (fixed, n) = repair::attributes::collapse_main_actor(&content);
            content = fixed;
            fixes += n;
        }
        for (type_name, protocol_name) in &conformance_targets {
            let (fixed, n) = repair::conformance::add_conformance(&content, type_name, protocol_name);
            content = fixed;
            fixes += n;
        }

        // Quote and literal damage shows up under every category, so this
        // one always runs; it is a no-op on healthy files.
        let (fixed, n) = repair::literals::fix_string_literals(&content);
        content = fixed;
        fixes += n;

        out.push(SourceFile::new(file.path.clone(), content));
    }

    Ok(StrategyOutcome {
        files: out,
        fixes,
        note: format!("Applied pattern-based fixes ({})", fixes),
    })
}

/// Structural Swift repair: delimiter balancing, ternary completion,
/// attribute collapsing, swipeActions scope relocation, and duplicate
/// entry-point resolution.
fn syntax_strategy(
    _errors: &[String],
    _classification: &Classification,
    files: &[SourceFile],
) -> anyhow::Result<StrategyOutcome> {
    let mut repaired = Vec::with_capacity(files.len());
    let mut fixes = 0;

    for file in files {
        let (content, n) = repair::repair_structure(&file.content);
        fixes += n;

        let (content, scope_notes) = scope::fix_scope_issues(&content);
        fixes += scope_notes.len();

        repaired.push(SourceFile::new(file.path.clone(), content));
    }

    // Exactly one @main may exist. A byte-identical second entry-point file
    // is dropped outright; a differing one keeps its code but loses the
    // attribute.
    let mut out: Vec<SourceFile> = Vec::with_capacity(repaired.len());
    let mut entry_seen: Option<usize> = None;
    for file in repaired {
        if !file.is_entry_point() {
            out.push(file);
            continue;
        }
        match entry_seen {
            None => {
                entry_seen = Some(out.len());
                out.push(file);
            }
            Some(first) => {
                fixes += 1;
                if out[first].content == file.content {
                    continue;
                }
                let content = file.content.replace("@main\n", "").replace("@main ", "");
                out.push(SourceFile::new(file.path, content));
            }
        }
    }

    Ok(StrategyOutcome {
        files: out,
        fixes,
        note: format!("Applied Swift syntax fixes ({})", fixes),
    })
}

/// Import resolution for identifiers with a known home module.
fn dependency_strategy(
    _errors: &[String],
    classification: &Classification,
    files: &[SourceFile],
) -> anyhow::Result<StrategyOutcome> {
    if !classification.has(ErrorCategory::MissingImport)
        && !classification.has(ErrorCategory::TypeNotFound)
    {
        return Ok(StrategyOutcome {
            files: files.to_vec(),
            fixes: 0,
            note: String::new(),
        });
    }

    let mut out = Vec::with_capacity(files.len());
    let mut fixes = 0;
    for file in files {
        let (content, n) = repair::imports::resolve_missing_imports(&file.content);
        fixes += n;
        out.push(SourceFile::new(file.path.clone(), content));
    }

    Ok(StrategyOutcome {
        files: out,
        fixes,
        note: format!("Resolved missing imports ({})", fixes),
    })
}

/// Replay fixes the knowledge base has seen succeed before.
fn knowledge_strategy(
    knowledge: &KnowledgeBase,
    errors: &[String],
    files: &[SourceFile],
) -> anyhow::Result<StrategyOutcome> {
    let mut out: Vec<SourceFile> = files.to_vec();
    let mut fixes = 0;

    for error in errors {
        if !knowledge.has_learned_fix(error) {
            continue;
        }
        for file in &mut out {
            if let Some(fixed) = knowledge.apply_learned_fix(error, &file.content) {
                if fixed != file.content {
                    file.content = fixed;
                    fixes += 1;
                }
            }
        }
    }

    Ok(StrategyOutcome {
        files: out,
        fixes,
        note: format!("Replayed {} learned fixes", fixes),
    })
}

fn build_fix_request(
    errors: &[String],
    classification: &Classification,
    files: &[SourceFile],
) -> ModifyRequest {
    let app_name = files
        .iter()
        .find_map(|f| {
            Regex::new(r"struct\s+(\w+)\s*:\s*App")
                .expect("static pattern")
                .captures(&f.content)
                .map(|c| c[1].to_string())
        })
        .unwrap_or_else(|| "App".to_string());

    let mut modification = String::from("Fix these Swift build errors:\n");
    for error in errors.iter().take(10) {
        modification.push_str(&format!("- {}\n", error));
    }
    for category in ErrorCategory::all() {
        if classification.has(*category) {
            for note in category.fix_notes() {
                modification.push_str(&format!("Hint: {}\n", note));
            }
        }
    }

    ModifyRequest {
        app_name,
        description: "Fix build errors".to_string(),
        modification,
        files: files.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ModifyResponse, ModifyRequest};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn knowledge_in(dir: &tempfile::TempDir) -> KnowledgeBase {
        KnowledgeBase::open(dir.path().join("knowledge.json"))
    }

    fn owned(errors: &[&str]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    struct FailingLlm {
        calls: Arc<AtomicUsize>,
    }

    impl LlmService for FailingLlm {
        async fn modify(&self, _request: ModifyRequest) -> anyhow::Result<ModifyResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            bail!("llm unavailable")
        }
    }

    struct RewritingLlm;

    impl LlmService for RewritingLlm {
        async fn modify(&self, request: ModifyRequest) -> anyhow::Result<ModifyResponse> {
            let files = request
                .files
                .iter()
                .map(|f| SourceFile::new(f.path.clone(), "import SwiftUI\n// rewritten\n"))
                .collect();
            Ok(ModifyResponse {
                files,
                summary: "rewrote everything".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_attempt_ceiling_exhausts_on_sixth_call() {
        let dir = tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let llm = FailingLlm {
            calls: Arc::clone(&calls),
        };
        let mut orchestrator =
            RecoveryOrchestrator::new(&Config::default(), knowledge_in(&dir), Some(llm));

        // Classifies identically every time; no file gives the strategies
        // anything to chew on, and there is no @main for the fallback.
        let errors = owned(&["'ContentUnavailableView' is only available in iOS 17.0"]);
        let files = vec![SourceFile::new("Sources/Helper.swift", "let x = 1\n")];

        for call in 1..=5 {
            let result = orchestrator.recover(&errors, &files, None).await;
            assert!(
                !matches!(result, RecoveryResult::Exhausted { .. }),
                "call {} must not be exhausted",
                call
            );
        }
        assert_eq!(orchestrator.attempts_for(&errors), 5);

        let llm_calls_before = calls.load(Ordering::SeqCst);
        let sixth = orchestrator.recover(&errors, &files, None).await;
        assert!(matches!(sixth, RecoveryResult::Exhausted { .. }));
        assert_eq!(
            calls.load(Ordering::SeqCst),
            llm_calls_before,
            "no strategy may run on the exhausted call"
        );

        let (success, returned, notes) = sixth.into_parts(&files);
        assert!(!success);
        assert_eq!(returned, files);
        assert!(notes[0].contains("exhausted"));
    }

    #[tokio::test]
    async fn test_breaker_stops_llm_hammering() {
        let dir = tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let llm = FailingLlm {
            calls: Arc::clone(&calls),
        };
        let mut orchestrator =
            RecoveryOrchestrator::new(&Config::default(), knowledge_in(&dir), Some(llm));

        let errors = owned(&["'ContentUnavailableView' is only available in iOS 17.0"]);
        let files = vec![SourceFile::new("Sources/Helper.swift", "let x = 1\n")];

        for _ in 0..5 {
            let _ = orchestrator.recover(&errors, &files, None).await;
        }
        // Threshold is 3: later attempts are rejected by the open circuit
        // without reaching the service.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_end_to_end_balances_entry_point() {
        let dir = tempdir().unwrap();
        let mut orchestrator =
            RecoveryOrchestrator::without_llm(&Config::default(), knowledge_in(&dir));

        let broken = "import SwiftUI\n\n@main\nstruct MyApp: App {\n    var body: some Scene {\n        WindowGroup {\n            ContentView()\n        }\n";
        let errors = owned(&["expected '}' in struct"]);
        let files = vec![SourceFile::new("Sources/App.swift", broken)];

        let result = orchestrator.recover(&errors, &files, None).await;
        let RecoveryResult::Fixed { files, notes } = result else {
            panic!("recovery must succeed");
        };
        assert!(!notes.is_empty());
        let app = &files[0];
        assert_eq!(app.content.matches('{').count(), app.content.matches('}').count());
        assert!(app.content.contains("@main"));
    }

    #[tokio::test]
    async fn test_llm_strategy_is_terminal_and_merges() {
        let dir = tempdir().unwrap();
        let mut orchestrator = RecoveryOrchestrator::new(
            &Config::default(),
            knowledge_in(&dir),
            Some(RewritingLlm),
        );

        let errors = owned(&["cannot find 'Mystery' in scope"]);
        let files = vec![
            SourceFile::new("Sources/A.swift", "let a = Mystery()\n"),
            SourceFile::new("Sources/B.swift", "let b = 2\n"),
        ];

        let result = orchestrator.recover(&errors, &files, None).await;
        let RecoveryResult::Fixed { files, notes } = result else {
            panic!("recovery must succeed");
        };
        assert!(notes.iter().any(|n| n.contains("AI-powered")));
        assert!(files.iter().all(|f| f.content.contains("rewritten")));
    }

    #[tokio::test]
    async fn test_pattern_fixes_compose_with_later_strategies() {
        let dir = tempdir().unwrap();
        let mut orchestrator =
            RecoveryOrchestrator::without_llm(&Config::default(), knowledge_in(&dir));

        // Both an iOS 17 usage and a missing Foundation import: the pattern
        // strategy rewrites the view, the dependency strategy adds imports.
        let content = "struct ClockView: View {\n    let start = Date()\n    var body: some View {\n        ContentUnavailableView(\"Empty\", systemImage: \"clock\")\n    }\n}\n";
        let errors = owned(&[
            "'ContentUnavailableView' is only available in iOS 17.0 or newer",
            "cannot find 'Date' in scope",
        ]);
        let files = vec![SourceFile::new("Sources/ClockView.swift", content)];

        let result = orchestrator.recover(&errors, &files, None).await;
        let RecoveryResult::Fixed { files, notes } = result else {
            panic!("recovery must succeed");
        };
        assert!(notes.len() >= 2, "expected multiple strategies to report: {:?}", notes);
        let fixed = &files[0].content;
        assert!(!fixed.contains("ContentUnavailableView"));
        assert!(fixed.contains("import Foundation"));
        assert!(fixed.contains("import SwiftUI"));
    }

    #[tokio::test]
    async fn test_last_resort_swaps_in_template() {
        let dir = tempdir().unwrap();
        let mut orchestrator =
            RecoveryOrchestrator::without_llm(&Config::default(), knowledge_in(&dir));

        // An error no deterministic strategy touches, with an entry point
        // present so the fallback can rebuild the pair.
        let errors = owned(&["linker command failed with exit code 1"]);
        let files = vec![
            SourceFile::new(
                "Sources/App.swift",
                "import SwiftUI\n@main\nstruct CounterApp: App {\n    var body: some Scene {\n        WindowGroup { ContentView() }\n    }\n}\n",
            ),
            SourceFile::new("Sources/ContentView.swift", "totally broken\n"),
            SourceFile::new("Sources/Extra.swift", "also broken\n"),
        ];

        let result = orchestrator.recover(&errors, &files, Some("com.example.counter")).await;
        let RecoveryResult::Fixed { files, notes } = result else {
            panic!("fallback must report success");
        };
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("fallback template"));
        // Broken custom UI is discarded: only the App/ContentView pair remains.
        assert_eq!(files.len(), 2);
        assert!(files[0].is_entry_point());
        assert!(files[1].content.contains("struct ContentView: View"));
        // Bundle id hints at a counter, so the counter template is used.
        assert!(files[1].content.contains("count"));
    }

    #[tokio::test]
    async fn test_learned_fix_replay_counts_as_progress() {
        use crate::knowledge::{FixKind, LearnedFix};

        let dir = tempdir().unwrap();
        let mut knowledge = knowledge_in(&dir);
        // An error no deterministic strategy understands, with a remembered
        // regex fix on a modifier line (so the no-degradation check passes).
        let error = "extraneous argument in call to 'buzz'";
        knowledge.learn_from_success(
            error,
            LearnedFix::new(FixKind::RegexReplace, r"\.buzz\(strength: \d+\)", ".buzz()"),
        );

        let mut orchestrator =
            RecoveryOrchestrator::without_llm(&Config::default(), knowledge);

        let errors = owned(&[error]);
        let files = vec![SourceFile::new(
            "Sources/V.swift",
            "Button(\"Tap\") { }\n    .buzz(strength: 5)\n",
        )];
        let result = orchestrator.recover(&errors, &files, None).await;
        let RecoveryResult::Fixed { files, notes } = result else {
            panic!("recovery must succeed");
        };
        assert!(notes.iter().any(|n| n.contains("learned")), "notes: {:?}", notes);
        assert!(files[0].content.contains(".buzz()"));
    }

    #[tokio::test]
    async fn test_duplicate_entry_point_is_resolved() {
        let dir = tempdir().unwrap();
        let mut orchestrator =
            RecoveryOrchestrator::without_llm(&Config::default(), knowledge_in(&dir));

        let app = "import SwiftUI\n\n@main\nstruct MyApp: App {\n    var body: some Scene {\n        WindowGroup { ContentView() }\n    }\n}\n";
        let files = vec![
            SourceFile::new("Sources/App.swift", app),
            SourceFile::new("Sources/MyApp.swift", app),
        ];
        let errors = owned(&["invalid redeclaration of 'MyApp'"]);

        let result = orchestrator.recover(&errors, &files, None).await;
        let RecoveryResult::Fixed { files, .. } = result else {
            panic!("recovery must succeed");
        };
        let entry_points = files.iter().filter(|f| f.is_entry_point()).count();
        assert_eq!(entry_points, 1);
        assert_eq!(files.len(), 1, "identical duplicate must be dropped");
    }

    #[tokio::test]
    async fn test_empty_error_list_is_no_change() {
        let dir = tempdir().unwrap();
        let mut orchestrator =
            RecoveryOrchestrator::without_llm(&Config::default(), knowledge_in(&dir));
        let result = orchestrator.recover(&[], &[], None).await;
        assert!(matches!(result, RecoveryResult::NoChange));
    }
}
