//! Prompt builder: turns a `GenerationRequest` into a (system, user) instruction pair.
//!
//! Persona and task wording come from the template table in `config::Prompts`.
//! The markup rule and the output-contract clause are generated here from the
//! configured convention and the mode, and appended to every system prompt.

use crate::config::{GenerationSettings, Prompts};
use crate::domain::{GenerationRequest, Mode, OutputContract};
use crate::markup::MarkupConvention;
use crate::util::fill_template;

/// Questions on a plain worksheet.
pub const WORKSHEET_SIZE: usize = 10;
/// Questions on an exam-style worksheet.
pub const EXAM_STYLE_SIZE: usize = 3;

/// Everything the completion client needs for one call.
#[derive(Clone, Debug, PartialEq)]
pub struct PromptPair {
  pub system: String,
  pub user: String,
  pub contract: OutputContract,
  /// `None` leaves the provider default in place.
  pub temperature: Option<f32>,
}

/// How many items the model is asked for.
pub fn expected_count(request: &GenerationRequest) -> usize {
  match request.mode {
    Mode::Worksheet => WORKSHEET_SIZE,
    Mode::BalancedWorksheet => non_blank(&request.subtopics).count(),
    Mode::ExamStyleWorksheet => EXAM_STYLE_SIZE,
    Mode::SingleExamQuestion | Mode::Answer | Mode::SimilarQuestion => 1,
  }
}

fn non_blank(items: &[String]) -> impl Iterator<Item = &str> {
  items.iter().map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn contract_clause(mode: Mode, markup: MarkupConvention) -> String {
  match mode {
    Mode::SingleExamQuestion => format!(
      "Output format:\n\
       Return ONLY one JSON object, with no prose before or after it and no code fences or backticks, in exactly this structure:\n\
       {{\n  \"total_marks\": <int>,\n  \"topic\": \"<topic>\",\n  \"difficulty\": \"<difficulty>\",\n  \"parts\": [\n    {{ \"label\": \"a\", \"marks\": <int>, \"question\": \"<question text>\", \"solution\": \"<worked solution>\" }}\n  ]\n}}\n\
       - \"parts\" lists every part in order; labels are single lowercase letters a, b, c, ...\n\
       - The marks of all parts add up to total_marks.\n\
       - Maths inside \"question\" and \"solution\" follows the notation rules above, e.g. {}. Escape backslashes as JSON requires.",
      markup.inline_example()
    ),
    Mode::Worksheet | Mode::BalancedWorksheet | Mode::ExamStyleWorksheet => "Output format:\n\
       Return the questions as a numbered list, exactly one question per line; keep every multi-part question on its single line.\n\
       Do NOT include solutions, answers, hints, headings or any other text."
      .to_string(),
    Mode::Answer => "Output format:\n\
       Return only the worked solution text, step by step. No preamble."
      .to_string(),
    Mode::SimilarQuestion => "Output format:\n\
       Return only the new question text. Do NOT include a solution."
      .to_string(),
  }
}

/// Build the instruction pair for `request`. Pure; never calls the completion service.
pub fn build(request: &GenerationRequest, prompts: &Prompts, settings: &GenerationSettings) -> PromptPair {
  let template = prompts.template(request.mode);

  let subtopics = non_blank(&request.subtopics).collect::<Vec<_>>().join(", ");
  let total_marks = request.total_marks.map(|m| m.to_string()).unwrap_or_default();
  let count = expected_count(request).to_string();
  let question = request.question.as_deref().unwrap_or("").trim();
  let pairs = [
    ("curriculum", settings.curriculum.as_str()),
    ("topic", request.topic.trim()),
    ("subtopics", subtopics.as_str()),
    ("difficulty", request.difficulty.label()),
    ("total_marks", total_marks.as_str()),
    ("count", count.as_str()),
    ("question", question),
  ];

  let system = format!(
    "{}\n\n{}\n\n{}",
    fill_template(template.system.trim(), &pairs),
    settings.markup.rule(),
    contract_clause(request.mode, settings.markup)
  );
  let user = fill_template(template.user.trim(), &pairs);

  let temperature = match request.mode {
    Mode::SingleExamQuestion => Some(settings.exam_temperature),
    _ => None,
  };

  PromptPair { system, user, contract: request.mode.contract(), temperature }
}
