//! Minimal OpenAI client implementing `CompletionService`.
//!
//! We only call chat.completions and request either plain text or a strict JSON object
//! (for the structured exam-question contract). Calls are instrumented and log model
//! names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::completion::CompletionService;
use crate::domain::{CompletionResult, OutputContract, TokenUsage};
use crate::error::AppError;
use crate::prompts::PromptPair;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone)]
pub struct OpenAI {
  client: reqwest::Client,
  api_key: String,
  pub base_url: String,
  pub model: String,
}

impl OpenAI {
  pub fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> Result<Self, AppError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client, api_key, base_url: base_url.trim_end_matches('/').to_string(), model })
  }

  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    let timeout = std::env::var("OPENAI_TIMEOUT_SECS")
      .ok()
      .and_then(|s| s.parse::<u64>().ok())
      .unwrap_or(DEFAULT_TIMEOUT_SECS);

    match Self::new(api_key, base_url, model, Duration::from_secs(timeout)) {
      Ok(oa) => Some(oa),
      Err(e) => {
        error!(target: "lc_maths_tutor", error = %e, "Failed to build OpenAI HTTP client");
        None
      }
    }
  }

  /// Chat completion. JSON-object mode is requested for the structured contract only.
  #[instrument(level = "info", skip(self, prompt), fields(model = %self.model, contract = ?prompt.contract))]
  async fn chat(&self, prompt: &PromptPair) -> Result<CompletionResult, AppError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: prompt.system.clone() },
        ChatMessageReq { role: "user".into(), content: prompt.user.clone() },
      ],
      temperature: prompt.temperature,
      response_format: match prompt.contract {
        OutputContract::StructuredJson => Some(ResponseFormat { r#type: "json_object".into() }),
        OutputContract::LineList | OutputContract::FreeText => None,
      },
    };

    let start = Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, concat!("lc-maths-tutor/", env!("CARGO_PKG_VERSION")))
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req)
      .send()
      .await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      error!(elapsed = ?start.elapsed(), %status, "OpenAI call failed");
      return Err(AppError::Transport(format!("OpenAI HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse = res.json().await?;
    let usage = body.usage.map(|u| TokenUsage {
      prompt_tokens: u.prompt_tokens,
      completion_tokens: u.completion_tokens,
      total_tokens: u.total_tokens,
    });
    if let Some(u) = &usage {
      info!(prompt_tokens = ?u.prompt_tokens, completion_tokens = ?u.completion_tokens, total_tokens = ?u.total_tokens, "OpenAI usage");
    }

    let choice = body
      .choices
      .into_iter()
      .next()
      .ok_or_else(|| AppError::Transport("OpenAI returned no choices".into()))?;
    let raw_text = choice.message.content.unwrap_or_default();
    info!(elapsed = ?start.elapsed(), response_len = raw_text.len(), "Model response received");

    Ok(CompletionResult { raw_text, usage })
  }
}

#[async_trait]
impl CompletionService for OpenAI {
  async fn complete(&self, prompt: &PromptPair) -> Result<CompletionResult, AppError> {
    self.chat(prompt).await
  }

  fn model(&self) -> &str { &self.model }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  #[serde(skip_serializing_if = "Option::is_none")]
  temperature: Option<f32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
