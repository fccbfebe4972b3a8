//! LLM collaborator seam
//!
//! The orchestrator only knows the `LlmService` trait: hand over the app's
//! files plus a modification request, get rewritten files back. The bundled
//! implementation talks to OpenRouter so one client covers every provider
//! the generator uses; `race_providers` fans a request out to several and
//! takes the first success.

use crate::source::SourceFile;
use anyhow::{anyhow, bail, Context};
use futures::future::select_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// Models used for code repair, addressed through OpenRouter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Claude,
    Gpt4,
    Grok,
}

impl Provider {
    pub fn id(&self) -> &'static str {
        match self {
            Provider::Claude => "anthropic/claude-sonnet-4",
            Provider::Gpt4 => "openai/gpt-4-turbo",
            Provider::Grok => "x-ai/grok-beta",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Claude => "Claude",
            Provider::Gpt4 => "GPT-4",
            Provider::Grok => "Grok",
        }
    }
}

/// A modification request: the whole file set plus what to change.
#[derive(Debug, Clone)]
pub struct ModifyRequest {
    pub app_name: String,
    pub description: String,
    pub modification: String,
    pub files: Vec<SourceFile>,
}

#[derive(Debug, Clone)]
pub struct ModifyResponse {
    pub files: Vec<SourceFile>,
    pub summary: String,
}

/// Anything that can rewrite an app's source files on request. The engine
/// does not know or care which provider backs it.
pub trait LlmService {
    fn modify(
        &self,
        request: ModifyRequest,
    ) -> impl Future<Output = anyhow::Result<ModifyResponse>> + Send;
}

/// Fan a request out to several services and return the first success.
///
/// Losing calls are dropped, which cancels them cooperatively; a late result
/// has nowhere to land. Ordering between providers is not guaranteed beyond
/// "first success wins".
pub async fn race_providers<S: LlmService>(
    services: &[S],
    request: &ModifyRequest,
) -> anyhow::Result<ModifyResponse> {
    if services.is_empty() {
        bail!("no LLM services configured");
    }

    let mut in_flight: Vec<_> = services
        .iter()
        .map(|service| Box::pin(service.modify(request.clone())))
        .collect();

    let mut last_error = anyhow!("all providers failed");
    while !in_flight.is_empty() {
        let (result, _, rest) = select_all(in_flight).await;
        match result {
            Ok(response) => return Ok(response),
            Err(err) => {
                warn!(%err, "provider failed, waiting on the rest");
                last_error = err;
                in_flight = rest;
            }
        }
    }
    Err(last_error)
}

/// Hybrid mode: one logical service that queries several providers
/// concurrently and keeps whichever succeeds first.
pub struct HybridService<S> {
    services: Vec<S>,
}

impl<S: LlmService + Sync> HybridService<S> {
    pub fn new(services: Vec<S>) -> Self {
        Self { services }
    }
}

impl<S: LlmService + Sync> LlmService for HybridService<S> {
    async fn modify(&self, request: ModifyRequest) -> anyhow::Result<ModifyResponse> {
        race_providers(&self.services, &request).await
    }
}

// ---------------------------------------------------------------------------
// OpenRouter-backed implementation
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    provider: Provider,
    timeout: Duration,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>, provider: Provider) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            provider,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build a client from `OPENROUTER_API_KEY`, if set.
    pub fn from_env(provider: Provider) -> Option<Self> {
        std::env::var("OPENROUTER_API_KEY")
            .ok()
            .map(|key| Self::new(key, provider))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn chat(&self, system: &str, user: &str) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: self.provider.id().to_string(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_tokens: 8192,
            stream: false,
        };

        let response = self
            .client
            .post(OPENROUTER_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", "https://github.com/swiftmend")
            .header("X-Title", "swiftmend")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .context("request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("API error {}: {}", status, crate::util::truncate(&text, 300));
        }

        let chat: ChatResponse = response.json().await.context("failed to parse response")?;
        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("no response from {}", self.provider.name()))
    }
}

const FIX_SYSTEM_PROMPT: &str = r#"You are a Swift/SwiftUI expert fixing compilation errors in a generated iOS app.

Rules:
1. Target iOS 16.0 - never use iOS 17+ API
2. Use double quotes for strings, never single or smart quotes
3. Never import local folders (Views, Models, Components)
4. Fix the root cause, return COMPLETE code for every changed file

Return JSON:
{
    "files": [{"path": "Sources/FileName.swift", "content": "// complete Swift code"}],
    "fixes_applied": ["list of fixes"]
}"#;

impl LlmService for OpenRouterClient {
    async fn modify(&self, request: ModifyRequest) -> anyhow::Result<ModifyResponse> {
        let files_text: String = request
            .files
            .iter()
            .map(|f| format!("File: {}\n```swift\n{}\n```\n", f.path, f.content))
            .collect();

        let user = format!(
            "App: {}\nDescription: {}\n\nRequested change:\n{}\n\nCurrent files:\n{}",
            request.app_name, request.description, request.modification, files_text
        );

        let raw = self.chat(FIX_SYSTEM_PROMPT, &user).await?;
        debug!(provider = self.provider.name(), bytes = raw.len(), "LLM response received");
        parse_modify_response(&raw, &request.files)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct FilesPayload {
    files: Vec<PayloadFile>,
    #[serde(default)]
    fixes_applied: Vec<String>,
    #[serde(default)]
    explanation: Option<String>,
}

#[derive(Deserialize)]
struct PayloadFile {
    path: String,
    content: String,
}

/// Parse an LLM reply into files: structured JSON first (optionally fenced),
/// then a swift code-block fallback matched against the original files.
pub fn parse_modify_response(
    response: &str,
    original_files: &[SourceFile],
) -> anyhow::Result<ModifyResponse> {
    if let Some(json) = extract_json(response) {
        if let Ok(payload) = serde_json::from_str::<FilesPayload>(&json) {
            let files: Vec<SourceFile> = payload
                .files
                .into_iter()
                .filter(|f| !f.content.trim().is_empty())
                .map(|f| SourceFile::new(f.path, f.content))
                .collect();
            if !files.is_empty() {
                let summary = if payload.fixes_applied.is_empty() {
                    payload.explanation.unwrap_or_default()
                } else {
                    payload.fixes_applied.join("; ")
                };
                return Ok(ModifyResponse { files, summary });
            }
        }
    }

    // Fall back to bare ```swift blocks, matched by entry point or file stem.
    let block_re = Regex::new(r"(?s)```swift\s*(.*?)```").expect("static pattern");
    let blocks: Vec<String> = block_re
        .captures_iter(response)
        .map(|c| c[1].trim().to_string())
        .collect();

    if blocks.is_empty() {
        bail!("response contained neither JSON nor swift code blocks");
    }

    let mut files = Vec::new();
    for original in original_files {
        let stem = original.file_name().trim_end_matches(".swift");
        let matched = blocks.iter().find(|block| {
            (original.is_entry_point() && block.contains("@main")) || block.contains(stem)
        });
        if let Some(block) = matched {
            files.push(SourceFile::new(original.path.clone(), block.clone()));
        }
    }

    if files.is_empty() {
        bail!("could not match any code block to a source file");
    }

    Ok(ModifyResponse {
        files,
        summary: "Rewrote files from code blocks".to_string(),
    })
}

fn extract_json(response: &str) -> Option<String> {
    if let Some(start) = response.find("```json") {
        let body = &response[start + 7..];
        if let Some(end) = body.find("```") {
            return Some(body[..end].trim().to_string());
        }
    }
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end > start {
        Some(response[start..=end].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn originals() -> Vec<SourceFile> {
        vec![
            SourceFile::new("Sources/App.swift", "@main\nstruct MyApp: App {}"),
            SourceFile::new("Sources/ContentView.swift", "struct ContentView: View {}"),
        ]
    }

    #[test]
    fn test_parses_fenced_json_payload() {
        let response = "Here you go:\n```json\n{\"files\": [{\"path\": \"Sources/App.swift\", \"content\": \"import SwiftUI\"}], \"fixes_applied\": [\"added import\"]}\n```";
        let parsed = parse_modify_response(response, &originals()).unwrap();
        assert_eq!(parsed.files.len(), 1);
        assert_eq!(parsed.files[0].path, "Sources/App.swift");
        assert_eq!(parsed.summary, "added import");
    }

    #[test]
    fn test_parses_bare_json_payload() {
        let response = "{\"files\": [{\"path\": \"a.swift\", \"content\": \"let x = 1\"}]}";
        let parsed = parse_modify_response(response, &originals()).unwrap();
        assert_eq!(parsed.files[0].content, "let x = 1");
    }

    #[test]
    fn test_blank_files_are_dropped() {
        let response = "{\"files\": [{\"path\": \"a.swift\", \"content\": \"  \"}, {\"path\": \"b.swift\", \"content\": \"ok\"}]}";
        let parsed = parse_modify_response(response, &originals()).unwrap();
        assert_eq!(parsed.files.len(), 1);
        assert_eq!(parsed.files[0].path, "b.swift");
    }

    #[test]
    fn test_swift_block_fallback_matches_entry_point() {
        let response = "```swift\nimport SwiftUI\n\n@main\nstruct MyApp: App {\n    var body: some Scene { WindowGroup { ContentView() } }\n}\n```";
        let parsed = parse_modify_response(response, &originals()).unwrap();
        assert_eq!(parsed.files[0].path, "Sources/App.swift");
        assert!(parsed.files[0].content.contains("@main"));
    }

    #[test]
    fn test_unparseable_response_is_an_error() {
        assert!(parse_modify_response("sorry, I cannot help", &originals()).is_err());
    }

    #[tokio::test]
    async fn test_race_returns_first_success() {
        struct Stub {
            delay_ms: u64,
            fail: bool,
            tag: &'static str,
        }
        impl LlmService for Stub {
            async fn modify(&self, _request: ModifyRequest) -> anyhow::Result<ModifyResponse> {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
                if self.fail {
                    bail!("provider down");
                }
                Ok(ModifyResponse {
                    files: vec![SourceFile::new("a.swift", self.tag)],
                    summary: self.tag.to_string(),
                })
            }
        }

        let services = vec![
            Stub { delay_ms: 5, fail: true, tag: "fast-fail" },
            Stub { delay_ms: 20, fail: false, tag: "winner" },
            Stub { delay_ms: 200, fail: false, tag: "slow" },
        ];
        let request = ModifyRequest {
            app_name: "App".into(),
            description: String::new(),
            modification: "fix".into(),
            files: vec![],
        };

        let response = race_providers(&services, &request).await.unwrap();
        assert_eq!(response.summary, "winner");
    }

    #[tokio::test]
    async fn test_race_surfaces_failure_when_all_fail() {
        struct AlwaysFails;
        impl LlmService for AlwaysFails {
            async fn modify(&self, _request: ModifyRequest) -> anyhow::Result<ModifyResponse> {
                bail!("no luck")
            }
        }
        let request = ModifyRequest {
            app_name: "App".into(),
            description: String::new(),
            modification: "fix".into(),
            files: vec![],
        };
        let result = race_providers(&[AlwaysFails, AlwaysFails], &request).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_ids() {
        assert!(Provider::Claude.id().contains("claude"));
        assert!(Provider::Gpt4.id().contains("gpt-4"));
        assert!(Provider::Grok.id().contains("grok"));
    }
}
