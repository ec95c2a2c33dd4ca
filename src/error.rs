//! Error taxonomy shared by the core and the HTTP/WS surface.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AppError {
  /// Structured output did not match the schema. `raw` is the model text, untouched.
  #[error("Malformed response: {reason}")]
  MalformedResponse { raw: String, reason: String },

  #[error("Completion service failure: {0}")]
  Transport(String),

  #[error("Invalid request: {0}")]
  InvalidRequest(String),

  #[error("Completion service not configured (OPENAI_API_KEY is not set)")]
  Unavailable,

  #[error("Nothing to regenerate: the session holds no previous request")]
  NothingToRegenerate,
}

impl AppError {
  pub fn error_code(&self) -> &'static str {
    match self {
      AppError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
      AppError::Transport(_) => "TRANSPORT_FAILURE",
      AppError::InvalidRequest(_) => "INVALID_REQUEST",
      AppError::Unavailable => "UNAVAILABLE",
      AppError::NothingToRegenerate => "NOTHING_TO_REGENERATE",
    }
  }

  pub fn status_code(&self) -> StatusCode {
    match self {
      AppError::MalformedResponse { .. } | AppError::Transport(_) => StatusCode::BAD_GATEWAY,
      AppError::InvalidRequest(_) | AppError::NothingToRegenerate => StatusCode::BAD_REQUEST,
      AppError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
  }

  /// Raw model text, when the failure carries one.
  pub fn raw(&self) -> Option<&str> {
    match self {
      AppError::MalformedResponse { raw, .. } => Some(raw),
      _ => None,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub error: String,
  pub code: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub raw: Option<String>,
}

impl From<&AppError> for ErrorResponse {
  fn from(e: &AppError) -> Self {
    ErrorResponse { error: e.to_string(), code: e.error_code(), raw: e.raw().map(str::to_string) }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> axum::response::Response {
    (self.status_code(), Json(ErrorResponse::from(&self))).into_response()
  }
}

impl From<reqwest::Error> for AppError {
  fn from(err: reqwest::Error) -> Self {
    AppError::Transport(err.to_string())
  }
}
