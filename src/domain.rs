//! Domain models: generation requests, structured exam questions, worksheets,
//! and the caller-owned session record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::curriculum::MARK_OPTIONS;
use crate::error::AppError;

/// What the user asked for. Each mode maps to one prompt template and one output contract.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
  /// One multi-part exam question with per-part marks and worked solutions.
  SingleExamQuestion,
  /// Ten questions at a chosen difficulty.
  Worksheet,
  /// One question per selected subtopic.
  BalancedWorksheet,
  /// Three exam-paper style questions.
  ExamStyleWorksheet,
  /// Worked solution for an existing question.
  Answer,
  /// A new question in the style of an existing one.
  SimilarQuestion,
}

impl Mode {
  pub fn contract(self) -> OutputContract {
    match self {
      Mode::SingleExamQuestion => OutputContract::StructuredJson,
      Mode::Worksheet | Mode::BalancedWorksheet | Mode::ExamStyleWorksheet => OutputContract::LineList,
      Mode::Answer | Mode::SimilarQuestion => OutputContract::FreeText,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Mode::SingleExamQuestion => "single_exam_question",
      Mode::Worksheet => "worksheet",
      Mode::BalancedWorksheet => "balanced_worksheet",
      Mode::ExamStyleWorksheet => "exam_style_worksheet",
      Mode::Answer => "answer",
      Mode::SimilarQuestion => "similar_question",
    }
  }

  fn requires_subtopics(self) -> bool {
    matches!(self, Mode::Worksheet | Mode::BalancedWorksheet | Mode::ExamStyleWorksheet)
  }

  fn requires_question(self) -> bool {
    matches!(self, Mode::Answer | Mode::SimilarQuestion)
  }
}

impl std::fmt::Display for Mode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
  #[serde(rename = "Higher Level")]
  HigherLevel,
  #[serde(rename = "Exam Style")]
  ExamStyle,
}

impl Difficulty {
  /// Difficulties a plain worksheet can be generated at (and the pool for "Random").
  pub const WORKSHEET: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

  pub fn label(self) -> &'static str {
    match self {
      Difficulty::Easy => "Easy",
      Difficulty::Medium => "Medium",
      Difficulty::Hard => "Hard",
      Difficulty::HigherLevel => "Higher Level",
      Difficulty::ExamStyle => "Exam Style",
    }
  }
}

impl std::fmt::Display for Difficulty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// Worksheet flavours offered by the UI.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorksheetStyle {
  Standard,
  Balanced,
  ExamStyle,
}

impl WorksheetStyle {
  pub fn mode(self) -> Mode {
    match self {
      WorksheetStyle::Standard => Mode::Worksheet,
      WorksheetStyle::Balanced => Mode::BalancedWorksheet,
      WorksheetStyle::ExamStyle => Mode::ExamStyleWorksheet,
    }
  }
}

/// The shape the completion text is expected to take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputContract {
  StructuredJson,
  LineList,
  FreeText,
}

/// A single generation request as assembled by the tutor operations.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
  pub mode: Mode,
  pub topic: String,
  #[serde(default)]
  pub subtopics: Vec<String>,
  pub difficulty: Difficulty,
  #[serde(default)]
  pub total_marks: Option<u32>,
  /// Existing question used as context by `Answer` and `SimilarQuestion`.
  #[serde(default)]
  pub question: Option<String>,
}

impl GenerationRequest {
  /// Check mode-dependent invariants before any completion call is made.
  pub fn validate(&self) -> Result<(), AppError> {
    if self.topic.trim().is_empty() {
      return Err(AppError::InvalidRequest("topic must not be empty".into()));
    }
    if self.mode.requires_subtopics() && self.subtopics.iter().all(|s| s.trim().is_empty()) {
      return Err(AppError::InvalidRequest(format!("{} requires at least one subtopic", self.mode)));
    }
    match self.total_marks {
      Some(m) if !MARK_OPTIONS.contains(&m) => {
        return Err(AppError::InvalidRequest(format!(
          "total marks must be one of {:?}, got {}",
          MARK_OPTIONS, m
        )));
      }
      None if self.mode == Mode::SingleExamQuestion => {
        return Err(AppError::InvalidRequest("an exam question requires total marks".into()));
      }
      _ => {}
    }
    if self.mode == Mode::Worksheet && !Difficulty::WORKSHEET.contains(&self.difficulty) {
      return Err(AppError::InvalidRequest(format!(
        "a worksheet cannot be generated at difficulty {}",
        self.difficulty
      )));
    }
    if self.mode.requires_question() && self.question.as_deref().map_or(true, |q| q.trim().is_empty()) {
      return Err(AppError::InvalidRequest(format!("{} requires the original question", self.mode)));
    }
    Ok(())
  }
}

/// One multi-part exam question, exactly as the wire format describes it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructuredQuestion {
  pub total_marks: u32,
  pub topic: String,
  pub difficulty: String,
  pub parts: Vec<QuestionPart>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionPart {
  pub label: String,
  pub marks: u32,
  #[serde(rename = "question")]
  pub question_text: String,
  #[serde(rename = "solution")]
  pub solution_text: String,
}

impl StructuredQuestion {
  pub fn marks_sum(&self) -> u32 {
    self.parts.iter().map(|p| p.marks).sum()
  }
}

/// One question statement on a worksheet.
pub type WorksheetItem = String;

/// Raw output of one completion call.
#[derive(Clone, Debug, Default)]
pub struct CompletionResult {
  pub raw_text: String,
  pub usage: Option<TokenUsage>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TokenUsage {
  pub prompt_tokens: Option<u32>,
  pub completion_tokens: Option<u32>,
  pub total_tokens: Option<u32>,
}

/// Caller-owned record of the last generation, passed in and handed back by each operation.
/// The server never keeps a copy.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Session {
  pub id: String,
  #[serde(default)]
  pub last_request: Option<GenerationRequest>,
  #[serde(default)]
  pub content: Option<SessionContent>,
}

impl Session {
  pub fn new() -> Self {
    Self { id: Uuid::new_v4().to_string(), last_request: None, content: None }
  }

  /// Record a fresh result, replacing whatever was shown before.
  pub fn with_result(mut self, request: GenerationRequest, content: SessionContent) -> Self {
    self.last_request = Some(request);
    self.content = Some(content);
    self
  }
}

impl Default for Session {
  fn default() -> Self { Self::new() }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionContent {
  ExamQuestion { question: StructuredQuestion },
  Worksheet { mode: Mode, difficulty: Difficulty, items: Vec<WorksheetItem> },
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request(mode: Mode) -> GenerationRequest {
    GenerationRequest {
      mode,
      topic: "Algebra".into(),
      subtopics: vec!["Quadratics".into()],
      difficulty: Difficulty::Medium,
      total_marks: None,
      question: None,
    }
  }

  #[test]
  fn contracts_follow_mode() {
    assert_eq!(Mode::SingleExamQuestion.contract(), OutputContract::StructuredJson);
    assert_eq!(Mode::BalancedWorksheet.contract(), OutputContract::LineList);
    assert_eq!(Mode::SimilarQuestion.contract(), OutputContract::FreeText);
  }

  #[test]
  fn worksheet_requires_subtopics() {
    let mut r = request(Mode::Worksheet);
    assert!(r.validate().is_ok());
    r.subtopics = vec!["  ".into()];
    assert!(matches!(r.validate(), Err(AppError::InvalidRequest(_))));
  }

  #[test]
  fn worksheet_difficulty_is_limited() {
    let mut r = request(Mode::Worksheet);
    r.difficulty = Difficulty::HigherLevel;
    assert!(matches!(r.validate(), Err(AppError::InvalidRequest(_))));
    r.mode = Mode::BalancedWorksheet;
    assert!(r.validate().is_ok());
  }

  #[test]
  fn exam_question_requires_known_marks() {
    let mut r = request(Mode::SingleExamQuestion);
    r.subtopics.clear();
    assert!(r.validate().is_err());
    r.total_marks = Some(30);
    assert!(r.validate().is_err());
    r.total_marks = Some(50);
    assert!(r.validate().is_ok());
  }

  #[test]
  fn answer_requires_question() {
    let mut r = request(Mode::Answer);
    r.subtopics.clear();
    assert!(r.validate().is_err());
    r.question = Some("Solve $x^2=9$".into());
    assert!(r.validate().is_ok());
  }

  #[test]
  fn difficulty_uses_display_labels_on_the_wire() {
    let s = serde_json::to_string(&Difficulty::HigherLevel).unwrap();
    assert_eq!(s, "\"Higher Level\"");
    let d: Difficulty = serde_json::from_str("\"Exam Style\"").unwrap();
    assert_eq!(d, Difficulty::ExamStyle);
  }

  #[test]
  fn session_content_is_tagged() {
    let content = SessionContent::Worksheet {
      mode: Mode::Worksheet,
      difficulty: Difficulty::Easy,
      items: vec!["Solve $x+1=2$".into()],
    };
    let v = serde_json::to_value(&content).unwrap();
    assert_eq!(v["kind"], "worksheet");
    assert_eq!(v["items"][0], "Solve $x+1=2$");
  }
}
