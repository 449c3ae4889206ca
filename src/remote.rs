//! Remote Normalization Adapter
//!
//! Optional language-model classifier that maps an utterance onto one of the supported
//! intent tags, seeded with the current taxonomy. Every failure is reported as
//! [`AdapterUnavailable`]; the resolver falls back to the heuristic result.
//!
//! Layering:
//! - [`LlmClient`]: raw system + user prompt → reply text (network seam)
//! - [`OpenAiClient`]: OpenAI-compatible chat completions over `reqwest`
//! - [`RemoteNormalizer`]: builds instructions, calls a client, parses the reply
//! - [`IntentNormalizer`]: what the resolver depends on

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::intent::Intent;
use crate::taxonomy::Taxonomy;

/// Default OpenAI model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default OpenAI-compatible API base
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

// ============================================================================
// Error Types
// ============================================================================

/// Why the remote classifier could not produce an intent
#[derive(Error, Debug)]
pub enum AdapterUnavailable {
    #[error("classifier request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),

    #[error("classifier returned an empty reply")]
    EmptyReply,

    #[error("classifier reply is not an intent object: {0}")]
    Malformed(String),

    #[error("classifier returned unsupported intent '{0}'")]
    Unsupported(&'static str),
}

// ============================================================================
// Traits
// ============================================================================

/// A chat-style language model
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Call the model with system + user prompts, return the raw reply text
    async fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AdapterUnavailable>;

    /// Model name for logging
    fn model_name(&self) -> &str;
}

/// Turns an utterance into an intent using some external capability
#[async_trait]
pub trait IntentNormalizer: Send + Sync {
    async fn normalize(
        &self,
        text: &str,
        taxonomy: &Taxonomy,
    ) -> Result<Intent, AdapterUnavailable>;
}

// ============================================================================
// OpenAI Client
// ============================================================================

/// OpenAI-compatible chat completions client
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    api_base: String,
    client: reqwest::Client,
    model: String,
}

impl OpenAiClient {
    /// Create a client; `timeout` bounds each HTTP round-trip
    pub fn new(
        api_key: String,
        model: &str,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, AdapterUnavailable> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AdapterUnavailable> {
        let body = serde_json::json!({
            "model": &self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": 0,
            "response_format": {"type": "json_object"}
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterUnavailable::Status { status, body });
        }

        #[derive(Deserialize)]
        struct Message {
            content: Option<String>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            choices: Vec<Choice>,
        }

        let api_response: ApiResponse = response.json().await?;
        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(AdapterUnavailable::EmptyReply)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Instructions
// ============================================================================

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}

/// System instructions: the supported tags, the current vocabularies, and the reply shape
pub fn build_instructions(taxonomy: &Taxonomy) -> String {
    format!(
        r#"You normalize user voice requests about analytics events.
Supported types: filterByCategory, filterByAction, filterByHookName, askAboutCategories, askAboutActions, askAboutHookNames, showDuplicates.
Known categories: {categories}
Known actions: {actions}
Known hookNames: {hook_names}
Return strict JSON only: a single object with a "type" field and, for filters, one of "category", "action" or "hookName". Examples:
{{"type":"filterByCategory","category":"signin"}}
{{"type":"filterByAction","action":"login_with_password"}}
{{"type":"filterByHookName","hookName":"listing_carousel"}}
{{"type":"askAboutCategories"}}
{{"type":"showDuplicates"}}"#,
        categories = join_or_none(&taxonomy.categories),
        actions = join_or_none(&taxonomy.actions),
        hook_names = join_or_none(&taxonomy.hook_names),
    )
}

// ============================================================================
// Reply Parsing
// ============================================================================

/// First balanced `{...}` span in `text`, ignoring braces inside JSON strings
pub fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a classifier reply into a supported intent.
///
/// The whole reply is tried first; if it is not an intent object, the first balanced
/// `{...}` inside it is tried. `unknown` and empty filter values are rejected.
pub fn parse_reply(reply: &str) -> Result<Intent, AdapterUnavailable> {
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(AdapterUnavailable::EmptyReply);
    }

    let intent = match serde_json::from_str::<Intent>(reply) {
        Ok(intent) => intent,
        Err(strict_err) => {
            let object = first_balanced_object(reply)
                .ok_or_else(|| AdapterUnavailable::Malformed(strict_err.to_string()))?;
            serde_json::from_str::<Intent>(object)
                .map_err(|e| AdapterUnavailable::Malformed(e.to_string()))?
        }
    };

    check_supported(intent)
}

/// Accept an intent only if it may replace the heuristic result: not `unknown`, and a
/// filter carries a non-blank value.
pub fn check_supported(intent: Intent) -> Result<Intent, AdapterUnavailable> {
    if intent == Intent::Unknown {
        return Err(AdapterUnavailable::Unsupported(intent.tag()));
    }
    if let Some((_, value)) = intent.filter_value() {
        if value.trim().is_empty() {
            return Err(AdapterUnavailable::Malformed(format!(
                "empty value for {}",
                intent.tag()
            )));
        }
    }
    Ok(intent)
}

// ============================================================================
// Normalizer
// ============================================================================

/// [`IntentNormalizer`] backed by a language model
pub struct RemoteNormalizer<C> {
    client: C,
}

impl<C: LlmClient> RemoteNormalizer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: LlmClient> IntentNormalizer for RemoteNormalizer<C> {
    async fn normalize(
        &self,
        text: &str,
        taxonomy: &Taxonomy,
    ) -> Result<Intent, AdapterUnavailable> {
        let instructions = build_instructions(taxonomy);
        let reply = self.client.chat(&instructions, text).await?;
        debug!("{} replied: {}", self.client.model_name(), reply);
        parse_reply(&reply)
    }
}

// ============================================================================
// Tests
// ============================================================================
