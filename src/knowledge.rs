//! Learned-fix knowledge base
//!
//! Remembers which fixes worked for which error signatures across runs.
//! The knowledge file is one JSON document read fully at open and rewritten
//! fully on every mutation - no partial writes, no cross-process merging.
//! Callers must serialize access; a single advisory lock guards the write
//! itself.
//!
//! A fix is only replayed when its historical success rate clears 80%, and
//! entries that keep failing prune themselves.

use crate::util::{hash_str, truncate};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

/// Minimum historical success rate before a fix is replayed automatically.
const REPLAY_THRESHOLD: f64 = 0.8;

/// How a learned fix is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixKind {
    RegexReplace,
    AddImport,
    /// A build-system fix; file content passes through unchanged.
    SubdirectoryInclusion,
}

/// One remembered fix, keyed by normalized error signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedFix {
    pub fix_id: String,
    pub kind: FixKind,
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
    /// Sample of the original error, for debugging only.
    pub error_sample: String,
    pub first_seen: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl LearnedFix {
    pub fn new(kind: FixKind, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let replacement = replacement.into();
        let fix_id = hash_str(&format!("{:?}|{}|{}", kind, pattern, replacement));
        let now = Utc::now();
        Self {
            fix_id,
            kind,
            pattern,
            replacement,
            error_sample: String::new(),
            first_seen: now,
            last_used: now,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Knowledge {
    patterns: HashMap<String, LearnedFix>,
    success_count: HashMap<String, u32>,
    failure_count: HashMap<String, u32>,
    last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeStats {
    pub patterns_learned: usize,
    pub successful_fixes: u32,
    pub failed_attempts: u32,
    pub success_rate: f64,
}

/// The persistent knowledge base.
pub struct KnowledgeBase {
    path: PathBuf,
    knowledge: Knowledge,
}

impl KnowledgeBase {
    /// Load the knowledge file, tolerating a missing or corrupt document.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let knowledge = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(knowledge) => knowledge,
                Err(err) => {
                    warn!(path = %path.display(), %err, "knowledge file corrupt, starting fresh");
                    Knowledge::default()
                }
            },
            Err(_) => Knowledge::default(),
        };
        Self { path, knowledge }
    }

    /// Normalized signature for an error: paths, line numbers and literal
    /// digits are stripped so the same bug hashes identically across builds.
    pub fn signature(error: &str) -> String {
        let path_re = Regex::new(r"[\w/.-]+\.swift:\d+(:\d+)?:?").expect("static pattern");
        let pos_re = Regex::new(r"line \d+ column \d+").expect("static pattern");
        let num_re = Regex::new(r"\d+").expect("static pattern");

        let cleaned = path_re.replace_all(error, "");
        let cleaned = pos_re.replace_all(&cleaned, "");
        let cleaned = num_re.replace_all(&cleaned, "NUM");
        hash_str(cleaned.trim())
    }

    fn rate_of(&self, fix_id: &str) -> f64 {
        let successes = *self.knowledge.success_count.get(fix_id).unwrap_or(&0);
        let failures = *self.knowledge.failure_count.get(fix_id).unwrap_or(&0);
        if successes == 0 {
            return 0.0;
        }
        successes as f64 / (successes + failures) as f64
    }

    /// Whether a proven fix exists for this error.
    pub fn has_learned_fix(&self, error: &str) -> bool {
        let signature = Self::signature(error);
        match self.knowledge.patterns.get(&signature) {
            Some(fix) => self.rate_of(&fix.fix_id) > REPLAY_THRESHOLD,
            None => false,
        }
    }

    pub fn get_learned_fix(&self, error: &str) -> Option<&LearnedFix> {
        self.knowledge.patterns.get(&Self::signature(error))
    }

    /// Replay a learned fix against `content`.
    ///
    /// Returns the fixed content, or `None` when no eligible fix exists, the
    /// fix made no difference, or the no-degradation check rejected it.
    pub fn apply_learned_fix(&self, error: &str, content: &str) -> Option<String> {
        if !self.has_learned_fix(error) {
            return None;
        }
        let fix = self.get_learned_fix(error)?;

        match fix.kind {
            FixKind::RegexReplace => {
                let re = match Regex::new(&fix.pattern) {
                    Ok(re) => re,
                    Err(err) => {
                        warn!(fix_id = %fix.fix_id, %err, "learned pattern no longer compiles");
                        return None;
                    }
                };
                let fixed = re.replace_all(content, fix.replacement.as_str()).into_owned();
                if fixed == content {
                    return None;
                }
                verify_no_degradation(content, &fixed).then_some(fixed)
            }
            FixKind::AddImport => {
                if content.contains(&fix.pattern) {
                    return None;
                }
                let fixed = format!("{}\n{}", fix.pattern, content);
                verify_no_degradation(content, &fixed).then_some(fixed)
            }
            // Handled by the build layer; content is already correct.
            FixKind::SubdirectoryInclusion => Some(content.to_string()),
        }
    }

    /// Record that a fix resolved this error.
    pub fn learn_from_success(&mut self, error: &str, mut fix: LearnedFix) {
        let signature = Self::signature(error);
        fix.error_sample = truncate(error, 200);
        fix.last_used = Utc::now();
        if let Some(existing) = self.knowledge.patterns.get(&signature) {
            fix.first_seen = existing.first_seen;
        }

        *self
            .knowledge
            .success_count
            .entry(fix.fix_id.clone())
            .or_insert(0) += 1;
        self.knowledge.patterns.insert(signature.clone(), fix);
        info!(%signature, "learned successful fix");
        self.save();
    }

    /// Record that a fix failed, pruning entries that keep failing.
    pub fn learn_from_failure(&mut self, error: &str, fix: &LearnedFix) {
        let signature = Self::signature(error);
        let failures = self
            .knowledge
            .failure_count
            .entry(fix.fix_id.clone())
            .or_insert(0);
        *failures += 1;
        let failures = *failures;
        let successes = *self.knowledge.success_count.get(&fix.fix_id).unwrap_or(&0);

        if failures > 3 && failures > successes * 2 {
            if self
                .knowledge
                .patterns
                .get(&signature)
                .is_some_and(|f| f.fix_id == fix.fix_id)
            {
                self.knowledge.patterns.remove(&signature);
                info!(%signature, "pruned fix that keeps failing");
            }
        }
        self.save();
    }

    pub fn statistics(&self) -> KnowledgeStats {
        let successes: u32 = self.knowledge.success_count.values().sum();
        let failures: u32 = self.knowledge.failure_count.values().sum();
        let success_rate = if successes + failures > 0 {
            successes as f64 / (successes + failures) as f64
        } else {
            0.0
        };
        KnowledgeStats {
            patterns_learned: self.knowledge.patterns.len(),
            successful_fixes: successes,
            failed_attempts: failures,
            success_rate,
        }
    }

    /// Rewrite the whole knowledge file. Best-effort: a failed save costs a
    /// re-learn later, never the current recovery.
    fn save(&mut self) {
        self.knowledge.last_updated = Some(Utc::now());
        if let Err(err) = self.write_locked() {
            warn!(path = %self.path.display(), %err, "failed to persist knowledge base");
        }
    }

    fn write_locked(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.knowledge)?;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        file.lock_exclusive()?;
        let result = file.write_all(json.as_bytes());
        let _ = fs2::FileExt::unlock(&file);
        result?;
        Ok(())
    }

    #[cfg(test)]
    fn force_counts(&mut self, fix_id: &str, successes: u32, failures: u32) {
        self.knowledge
            .success_count
            .insert(fix_id.to_string(), successes);
        self.knowledge
            .failure_count
            .insert(fix_id.to_string(), failures);
    }
}

/// Structural keywords whose removal a cached fix is never allowed to cause.
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "func ", "var ", "let ", "class ", "struct ", "enum ", "@State", "@Published",
    "@ObservedObject", "View {",
];

/// Lines that are safe to lose: boilerplate the pipeline removes on purpose.
const SAFE_REMOVALS: &[&str] = &[
    "PersistenceController",
    "managedObjectContext",
    "import Components",
    "import Views",
];

/// A cached fix must never delete working code: any removed non-blank line
/// carrying a structural keyword rejects the fix unless it is a known-safe
/// removal.
pub fn verify_no_degradation(original: &str, fixed: &str) -> bool {
    let original_lines: std::collections::BTreeSet<&str> = original
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let fixed_lines: std::collections::BTreeSet<&str> = fixed
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    for removed in original_lines.difference(&fixed_lines) {
        if SAFE_REMOVALS.iter().any(|safe| removed.contains(safe)) {
            continue;
        }
        if STRUCTURAL_KEYWORDS
            .iter()
            .any(|keyword| removed.contains(keyword))
        {
            warn!(line = %removed, "rejected cached fix: it would remove code");
            return false;
        }
    }
    true
}
