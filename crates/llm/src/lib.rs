//! Language-model collaborator: an OpenAI-compatible chat-completions
//! client implementing the engine's `Summarizer` and `Classifier`
//! traits. Every call is single-attempt; retry policy (there is none)
//! belongs to the engine, not here.

use async_trait::async_trait;
use engine::{Classifier, EmailBrief, EngineError, Summarizer};
use serde::{Deserialize, Serialize};
use tracing::debug;

const SUMMARY_SYSTEM_PROMPT: &str =
    "You summarize batches of emails for a busy reader. Follow the user's \
     instruction and answer in plain prose.";

const CLASSIFIER_SYSTEM_PROMPT: &str =
    "You tag emails. Reply with a JSON array of the candidate label names \
     that apply to the email, and nothing else. Use only names from the \
     candidate list; reply with [] if none apply.";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// One chat-completions round trip. Any transport error, non-2xx
    /// status, undecodable body, or empty completion is an upstream
    /// failure.
    async fn chat(&self, system: &str, user: String) -> Result<String, EngineError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.2,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        debug!(model = %self.config.model, %url, "requesting chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Upstream(format!(
                "model endpoint returned {status}"
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Upstream(format!("undecodable model response: {e}")))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            return Err(EngineError::Upstream(
                "model returned an empty completion".to_string(),
            ));
        }
        Ok(content.to_string())
    }
}

#[async_trait]
impl Summarizer for LlmClient {
    async fn summarize(
        &self,
        emails: &[EmailBrief],
        prompt: &str,
    ) -> Result<String, EngineError> {
        self.chat(SUMMARY_SYSTEM_PROMPT, summary_request_body(emails, prompt))
            .await
    }
}

#[async_trait]
impl Classifier for LlmClient {
    async fn classify(
        &self,
        subject: &str,
        body: &str,
        candidates: &[String],
    ) -> Result<Vec<String>, EngineError> {
        // Zero candidates means there is nothing to choose from; skip
        // the external call entirely.
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let content = self
            .chat(
                CLASSIFIER_SYSTEM_PROMPT,
                classification_request_body(subject, body, candidates),
            )
            .await?;
        parse_label_names(&content)
    }
}

fn summary_request_body(emails: &[EmailBrief], prompt: &str) -> String {
    let mut text = String::with_capacity(256);
    text.push_str(prompt);
    text.push_str("\n\nEmails:\n");
    for (index, email) in emails.iter().enumerate() {
        text.push_str(&format!(
            "{}. From: {} | Subject: {} | {}\n",
            index + 1,
            email.sender,
            email.subject,
            email.preview
        ));
    }
    text
}

fn classification_request_body(subject: &str, body: &str, candidates: &[String]) -> String {
    format!(
        "Candidate labels: {}\n\nSubject: {}\n\n{}",
        candidates.join(", "),
        subject,
        body
    )
}

/// Parses the classifier's completion as a JSON array of names,
/// tolerating a Markdown code fence around it. Anything else is an
/// upstream failure (which the engine treats as zero suggestions).
fn parse_label_names(content: &str) -> Result<Vec<String>, EngineError> {
    let payload = strip_code_fence(content);
    serde_json::from_str::<Vec<String>>(payload)
        .map_err(|e| EngineError::Upstream(format!("unparseable classifier response: {e}")))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
