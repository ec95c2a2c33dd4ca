//! Tutor operations shared by both HTTP and WebSocket handlers.
//!
//! Each operation is one build → complete → interpret → normalize pass. Operations
//! that produce something worth re-displaying take the caller's `Session` and hand
//! back an updated one; the server keeps nothing.

use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::domain::{
  Difficulty, GenerationRequest, Mode, Session, SessionContent, StructuredQuestion, WorksheetItem, WorksheetStyle,
};
use crate::error::AppError;
use crate::interpret::{interpret, Interpreted};
use crate::markup::{normalize, strip_ordinal};
use crate::prompts;
use crate::state::AppState;

/// Display-ready output of one generation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Generated {
  ExamQuestion { question: StructuredQuestion },
  Worksheet { mode: Mode, difficulty: Difficulty, items: Vec<WorksheetItem> },
  Text { text: String },
}

/// Run one request end to end. Validation failures never reach the completion service.
#[instrument(level = "info", skip(state, request), fields(mode = %request.mode, topic = %request.topic))]
pub async fn generate(state: &AppState, request: &GenerationRequest) -> Result<Generated, AppError> {
  request.validate()?;
  let completion = state.completion()?;
  let prompt = prompts::build(request, &state.prompts, &state.settings);

  let result = completion.complete(&prompt).await.map_err(|e| {
    error!(target: "tutor", mode = %request.mode, model = %completion.model(), error = %e, "Completion call failed");
    e
  })?;
  debug!(
    target: "tutor",
    model = %completion.model(),
    response_len = result.raw_text.len(),
    total_tokens = ?result.usage.and_then(|u| u.total_tokens),
    "Completion received"
  );

  let generated = match interpret(&result.raw_text, prompt.contract)? {
    Interpreted::Structured(question) => Generated::ExamQuestion { question: normalize_question(question, state) },
    Interpreted::Lines(lines) => Generated::Worksheet {
      mode: request.mode,
      difficulty: request.difficulty,
      items: lines.iter().map(|l| display_item(l, state)).collect(),
    },
    Interpreted::Text(text) => Generated::Text { text: normalize(&text, state.settings.markup) },
  };

  if let Generated::Worksheet { items, .. } = &generated {
    let expected = prompts::expected_count(request);
    if items.len() != expected {
      info!(target: "tutor", expected, got = items.len(), "Worksheet item count differs from the requested count");
    }
  }
  Ok(generated)
}

fn normalize_question(mut q: StructuredQuestion, state: &AppState) -> StructuredQuestion {
  let markup = state.settings.markup;
  for part in &mut q.parts {
    part.question_text = normalize(&part.question_text, markup);
    part.solution_text = normalize(&part.solution_text, markup);
  }
  q
}

fn display_item(line: &str, state: &AppState) -> WorksheetItem {
  let item = normalize(line, state.settings.markup);
  if state.settings.strip_ordinals { strip_ordinal(&item) } else { item }
}

/// Record a re-displayable result in the caller's session.
fn remember(session: Session, request: GenerationRequest, generated: &Generated) -> Session {
  match generated {
    Generated::ExamQuestion { question } => {
      session.with_result(request, SessionContent::ExamQuestion { question: question.clone() })
    }
    Generated::Worksheet { mode, difficulty, items } => session.with_result(
      request,
      SessionContent::Worksheet { mode: *mode, difficulty: *difficulty, items: items.clone() },
    ),
    Generated::Text { .. } => session,
  }
}

#[instrument(level = "info", skip_all, fields(session_id = %session.id, %topic, total_marks = total_marks))]
pub async fn exam_question(
  state: &AppState,
  session: Session,
  topic: &str,
  total_marks: u32,
) -> Result<(StructuredQuestion, Session), AppError> {
  let request = GenerationRequest {
    mode: Mode::SingleExamQuestion,
    topic: topic.to_string(),
    subtopics: Vec::new(),
    difficulty: Difficulty::HigherLevel,
    total_marks: Some(total_marks),
    question: None,
  };
  let generated = generate(state, &request).await?;
  let session = remember(session, request, &generated);
  match generated {
    Generated::ExamQuestion { question } => {
      info!(target: "tutor", parts = question.parts.len(), "Exam question generated");
      Ok((question, session))
    }
    _ => Err(AppError::Transport("unexpected output for exam question".into())),
  }
}

/// Difficulty a worksheet is generated at. `random` picks among Easy/Medium/Hard.
pub fn resolve_worksheet_difficulty(
  style: WorksheetStyle,
  difficulty: Option<Difficulty>,
  random: bool,
) -> Result<Difficulty, AppError> {
  match style {
    WorksheetStyle::ExamStyle => Ok(Difficulty::ExamStyle),
    WorksheetStyle::Balanced => Ok(difficulty.unwrap_or(Difficulty::Medium)),
    WorksheetStyle::Standard if random => {
      Ok(Difficulty::WORKSHEET.choose(&mut rand::thread_rng()).copied().unwrap_or(Difficulty::Medium))
    }
    WorksheetStyle::Standard => match difficulty {
      Some(d) if Difficulty::WORKSHEET.contains(&d) => Ok(d),
      Some(d) => Err(AppError::InvalidRequest(format!("a worksheet cannot be generated at difficulty {}", d))),
      None => Err(AppError::InvalidRequest("choose a difficulty or random".into())),
    },
  }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorksheetOut {
  pub mode: Mode,
  pub difficulty: Difficulty,
  pub items: Vec<WorksheetItem>,
}

#[instrument(level = "info", skip_all, fields(session_id = %session.id, %topic, ?style, subtopics = subtopics.len(), random = random))]
pub async fn worksheet(
  state: &AppState,
  session: Session,
  topic: &str,
  subtopics: Vec<String>,
  style: WorksheetStyle,
  difficulty: Option<Difficulty>,
  random: bool,
) -> Result<(WorksheetOut, Session), AppError> {
  let difficulty = resolve_worksheet_difficulty(style, difficulty, random)?;
  let request = GenerationRequest {
    mode: style.mode(),
    topic: topic.to_string(),
    subtopics,
    difficulty,
    total_marks: None,
    question: None,
  };
  let generated = generate(state, &request).await?;
  let session = remember(session, request, &generated);
  match generated {
    Generated::Worksheet { mode, difficulty, items } => {
      info!(target: "tutor", %mode, %difficulty, items = items.len(), "Worksheet generated");
      Ok((WorksheetOut { mode, difficulty, items }, session))
    }
    _ => Err(AppError::Transport("unexpected output for worksheet".into())),
  }
}

async fn about_question(
  state: &AppState,
  mode: Mode,
  topic: &str,
  difficulty: Option<Difficulty>,
  question: &str,
) -> Result<String, AppError> {
  let request = GenerationRequest {
    mode,
    topic: topic.to_string(),
    subtopics: Vec::new(),
    difficulty: difficulty.unwrap_or(Difficulty::HigherLevel),
    total_marks: None,
    question: Some(question.to_string()),
  };
  match generate(state, &request).await? {
    Generated::Text { text } => Ok(text),
    _ => Err(AppError::Transport(format!("unexpected output for {}", mode))),
  }
}

/// "Show answer": a worked solution for one question.
#[instrument(level = "info", skip_all, fields(%topic, question_len = question.len()))]
pub async fn show_answer(
  state: &AppState,
  topic: &str,
  difficulty: Option<Difficulty>,
  question: &str,
) -> Result<String, AppError> {
  about_question(state, Mode::Answer, topic, difficulty, question).await
}

/// "More like this" for one worksheet item.
#[instrument(level = "info", skip_all, fields(%topic, question_len = question.len()))]
pub async fn similar_question(
  state: &AppState,
  topic: &str,
  difficulty: Option<Difficulty>,
  question: &str,
) -> Result<String, AppError> {
  about_question(state, Mode::SimilarQuestion, topic, difficulty, question).await
}

/// Re-run the last recorded request ("More like this" for a whole exam question or worksheet).
#[instrument(level = "info", skip_all, fields(session_id = %session.id))]
pub async fn regenerate(state: &AppState, session: Session) -> Result<(Generated, Session), AppError> {
  let request = session.last_request.clone().ok_or(AppError::NothingToRegenerate)?;
  let generated = generate(state, &request).await?;
  info!(target: "tutor", mode = %request.mode, "Regenerated from session");
  let session = remember(session, request, &generated);
  Ok((generated, session))
}
