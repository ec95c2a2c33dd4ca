//! The completion-service seam. Tutor operations only see this trait; the
//! OpenAI client implements it in production and tests script it.

use async_trait::async_trait;

use crate::domain::CompletionResult;
use crate::error::AppError;
use crate::prompts::PromptPair;

#[async_trait]
pub trait CompletionService: Send + Sync {
  /// One request/response round trip. Transport-level problems come back as `AppError::Transport`.
  async fn complete(&self, prompt: &PromptPair) -> Result<CompletionResult, AppError>;

  /// Model name, for logs.
  fn model(&self) -> &str;
}
