//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to the tutor operations. We reply with a single JSON message per request.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::curriculum::catalogue;
use crate::error::{AppError, ErrorResponse};
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "lc_maths_tutor", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "lc_maths_tutor", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "lc_maths_tutor", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error(ErrorResponse::from(&AppError::InvalidRequest(format!("Invalid JSON: {}", e)))),
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "error": format!("Serialization error: {}", e), "code": "INTERNAL" }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "lc_maths_tutor", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => {
        let _ = socket.send(Message::Pong(payload)).await;
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "lc_maths_tutor", "WebSocket disconnected");
}

#[instrument(level = "info", skip_all)]
pub async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match dispatch(msg, state).await {
    Ok(reply) => reply,
    Err(e) => {
      info!(target: "tutor", code = e.error_code(), error = %e, "WS request failed");
      ServerWsMessage::Error(ErrorResponse::from(&e))
    }
  }
}

async fn dispatch(msg: ClientWsMessage, state: &AppState) -> Result<ServerWsMessage, AppError> {
  Ok(match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Curriculum => ServerWsMessage::Curriculum(catalogue()),

    ClientWsMessage::ExamQuestion(body) => {
      let session = body.session.unwrap_or_default();
      let (question, session) = logic::exam_question(state, session, &body.topic, body.total_marks).await?;
      info!(target: "tutor", session_id = %session.id, "WS exam question served");
      ServerWsMessage::ExamQuestion(ExamQuestionOut { question, session })
    }

    ClientWsMessage::Worksheet(body) => {
      let session = body.session.unwrap_or_default();
      let (out, session) =
        logic::worksheet(state, session, &body.topic, body.subtopics, body.style, body.difficulty, body.random).await?;
      info!(target: "tutor", session_id = %session.id, items = out.items.len(), "WS worksheet served");
      ServerWsMessage::Worksheet(WorksheetOut { mode: out.mode, difficulty: out.difficulty, items: out.items, session })
    }

    ClientWsMessage::Answer(body) => {
      let text = logic::show_answer(state, &body.topic, body.difficulty, &body.question).await?;
      ServerWsMessage::Answer(TextOut { text })
    }

    ClientWsMessage::Similar(body) => {
      let text = logic::similar_question(state, &body.topic, body.difficulty, &body.question).await?;
      ServerWsMessage::Similar(TextOut { text })
    }

    ClientWsMessage::Regenerate(body) => {
      let (result, session) = logic::regenerate(state, body.session).await?;
      ServerWsMessage::Regenerated(RegenerateOut { result, session })
    }
  })
}
