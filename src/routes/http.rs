//! HTTP endpoint handlers. These are thin wrappers that forward to the tutor operations.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::curriculum::catalogue;
use crate::domain::Session;
use crate::error::AppError;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, completion: state.completion.is_some() })
}

#[instrument(level = "info")]
pub async fn http_get_curriculum() -> impl IntoResponse {
  Json(catalogue())
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic, total_marks = body.total_marks))]
pub async fn http_post_exam_question(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ExamQuestionIn>,
) -> Result<Json<ExamQuestionOut>, AppError> {
  let session = body.session.unwrap_or_default();
  let (question, session) = logic::exam_question(&state, session, &body.topic, body.total_marks).await?;
  info!(target: "tutor", session_id = %session.id, parts = question.parts.len(), "HTTP exam question served");
  Ok(Json(ExamQuestionOut { question, session }))
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic, style = ?body.style, subtopics = body.subtopics.len()))]
pub async fn http_post_worksheet(
  State(state): State<Arc<AppState>>,
  Json(body): Json<WorksheetIn>,
) -> Result<Json<WorksheetOut>, AppError> {
  let session = body.session.unwrap_or_default();
  let (out, session) =
    logic::worksheet(&state, session, &body.topic, body.subtopics, body.style, body.difficulty, body.random).await?;
  info!(target: "tutor", session_id = %session.id, items = out.items.len(), "HTTP worksheet served");
  Ok(Json(WorksheetOut { mode: out.mode, difficulty: out.difficulty, items: out.items, session }))
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic, question_len = body.question.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuestionIn>,
) -> Result<Json<TextOut>, AppError> {
  let text = logic::show_answer(&state, &body.topic, body.difficulty, &body.question).await?;
  Ok(Json(TextOut { text }))
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic, question_len = body.question.len()))]
pub async fn http_post_similar(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuestionIn>,
) -> Result<Json<TextOut>, AppError> {
  let text = logic::similar_question(&state, &body.topic, body.difficulty, &body.question).await?;
  Ok(Json(TextOut { text }))
}

#[instrument(level = "info", skip(state, body), fields(session_id = %body.session.id))]
pub async fn http_post_regenerate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<RegenerateIn>,
) -> Result<Json<RegenerateOut>, AppError> {
  let session: Session = body.session;
  let (result, session) = logic::regenerate(&state, session).await?;
  Ok(Json(RegenerateOut { result, session }))
}
