use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use swiftmend::classify::extract_errors;
use swiftmend::config::Config;
use swiftmend::knowledge::KnowledgeBase;
use swiftmend::llm::{HybridService, OpenRouterClient, Provider};
use swiftmend::repair::delimiters::validate_balance;
use swiftmend::recovery::{RecoveryOrchestrator, RecoveryResult};
use swiftmend::source::SourceFile;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "swiftmend",
    about = "Self-healing build repair for LLM-generated SwiftUI apps",
    version
)]
struct Args {
    /// Directory containing the Swift sources
    #[arg(default_value = "Sources")]
    sources: PathBuf,

    /// Build log to read compiler diagnostics from (stdin if omitted)
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Bundle identifier, used to pick a fallback template
    #[arg(short, long)]
    bundle_id: Option<String>,

    /// Write fixed files back to disk instead of printing a summary
    #[arg(short, long)]
    apply: bool,

    /// Knowledge base location (defaults to the config directory)
    #[arg(short, long)]
    knowledge: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::load();
    if args.knowledge.is_some() {
        config.knowledge_path = args.knowledge.clone();
    }

    let log_text = match &args.log {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read build log {}", path.display()))?,
        None => std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?,
    };
    let errors = extract_errors(&log_text);
    if errors.is_empty() {
        println!("No compiler errors found in the build log.");
        return Ok(());
    }
    eprintln!("Found {} compiler errors", errors.len());

    let files = load_sources(&args.sources)?;
    if files.is_empty() {
        anyhow::bail!("no .swift files under {}", args.sources.display());
    }

    let knowledge = KnowledgeBase::open(config.knowledge_path());
    // Hybrid mode: all providers race, first success wins.
    let llm = std::env::var("OPENROUTER_API_KEY").ok().map(|key| {
        HybridService::new(vec![
            OpenRouterClient::new(key.clone(), Provider::Claude),
            OpenRouterClient::new(key.clone(), Provider::Gpt4),
            OpenRouterClient::new(key, Provider::Grok),
        ])
    });
    if llm.is_none() {
        eprintln!("OPENROUTER_API_KEY not set; running deterministic strategies only");
    }
    let mut orchestrator = RecoveryOrchestrator::new(&config, knowledge, llm);

    let result = orchestrator
        .recover(&errors, &files, args.bundle_id.as_deref())
        .await;

    match result {
        RecoveryResult::Fixed { files: fixed, notes } => {
            for note in &notes {
                println!("  + {}", note);
            }
            for file in &fixed {
                for issue in validate_balance(&file.content) {
                    eprintln!("  ! {}: {}", file.path, issue);
                }
            }
            if args.apply {
                write_sources(&args.sources, &files, &fixed)?;
                println!("Wrote {} files to {}", fixed.len(), args.sources.display());
            } else {
                for file in &fixed {
                    println!("--- {}", file.path);
                }
                println!("(run with --apply to write changes)");
            }
        }
        RecoveryResult::Exhausted { fingerprint } => {
            println!(
                "Recovery exhausted for this error pattern ({}); manual intervention needed",
                fingerprint
            );
            std::process::exit(1);
        }
        RecoveryResult::NoChange => {
            println!("No strategy could make progress on these errors.");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn load_sources(root: &PathBuf) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("swift") {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root.parent().unwrap_or(root))
            .unwrap_or(entry.path());
        let content = fs::read_to_string(entry.path())
            .with_context(|| format!("failed to read {}", entry.path().display()))?;
        files.push(SourceFile::new(relative.to_string_lossy(), content));
    }
    Ok(files)
}

fn write_sources(root: &PathBuf, original: &[SourceFile], fixed: &[SourceFile]) -> Result<()> {
    let base = root.parent().unwrap_or(root);
    for file in fixed {
        let unchanged = original
            .iter()
            .any(|o| o.path == file.path && o.content == file.content);
        if unchanged {
            continue;
        }
        let target = base.join(&file.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &file.content)
            .with_context(|| format!("failed to write {}", target.display()))?;
    }
    Ok(())
}
