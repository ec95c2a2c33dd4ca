//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::curriculum::Catalogue;
use crate::domain::{Difficulty, Mode, Session, StructuredQuestion, WorksheetItem, WorksheetStyle};
use crate::error::ErrorResponse;
use crate::logic::Generated;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Curriculum,
    ExamQuestion(ExamQuestionIn),
    Worksheet(WorksheetIn),
    Answer(QuestionIn),
    Similar(QuestionIn),
    Regenerate(RegenerateIn),
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Curriculum(Catalogue),
    ExamQuestion(ExamQuestionOut),
    Worksheet(WorksheetOut),
    Answer(TextOut),
    Similar(TextOut),
    Regenerated(RegenerateOut),
    Error(ErrorResponse),
}

//
// HTTP request/response DTOs (shared with WS payloads)
//

#[derive(Debug, Deserialize)]
pub struct ExamQuestionIn {
    pub topic: String,
    #[serde(rename = "totalMarks")]
    pub total_marks: u32,
    #[serde(default)]
    pub session: Option<Session>,
}
#[derive(Debug, Serialize)]
pub struct ExamQuestionOut {
    pub question: StructuredQuestion,
    pub session: Session,
}

#[derive(Debug, Deserialize)]
pub struct WorksheetIn {
    pub topic: String,
    #[serde(default)]
    pub subtopics: Vec<String>,
    #[serde(default = "default_style")]
    pub style: WorksheetStyle,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub random: bool,
    #[serde(default)]
    pub session: Option<Session>,
}
fn default_style() -> WorksheetStyle { WorksheetStyle::Standard }

#[derive(Debug, Serialize)]
pub struct WorksheetOut {
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub items: Vec<WorksheetItem>,
    pub session: Session,
}

/// Body of "show answer" and "more like this" for one worksheet item.
#[derive(Debug, Deserialize)]
pub struct QuestionIn {
    pub topic: String,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    pub question: String,
}
#[derive(Debug, Serialize)]
pub struct TextOut {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct RegenerateIn {
    pub session: Session,
}
#[derive(Debug, Serialize)]
pub struct RegenerateOut {
    #[serde(flatten)]
    pub result: Generated,
    pub session: Session,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub completion: bool,
}
