//! Loading tutor configuration (prompt templates + generation settings) from TOML.
//!
//! See `TutorConfig`, `Prompts` and `GenerationSettings` for the expected schema:
//!
//! ```toml
//! [generation]
//! markup = "dollar"          # or "paren"
//! strip_ordinals = true
//! curriculum = "Leaving Cert Higher Level Maths"
//! exam_temperature = 0.4
//!
//! [prompts.worksheet]
//! system = "You are a friendly {curriculum} tutor."
//! user = "Write {count} {difficulty} questions on {topic} ({subtopics})."
//! ```

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Mode;
use crate::markup::MarkupConvention;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TutorConfig {
  #[serde(default)]
  pub generation: GenerationSettings,
  #[serde(default)]
  pub prompts: Prompts,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
  /// The single inline-math convention every prompt asks for and every output is normalized to.
  pub markup: MarkupConvention,
  /// Strip "1." style ordinals from worksheet lines before returning them.
  pub strip_ordinals: bool,
  /// Substituted for `{curriculum}` in every template.
  pub curriculum: String,
  pub exam_temperature: f32,
}

impl Default for GenerationSettings {
  fn default() -> Self {
    Self {
      markup: MarkupConvention::Dollar,
      strip_ordinals: true,
      curriculum: "Leaving Cert Higher Level Maths".into(),
      exam_temperature: 0.4,
    }
  }
}

/// One persona/task pair. Placeholders: `{curriculum}`, `{topic}`, `{subtopics}`,
/// `{difficulty}`, `{total_marks}`, `{count}`, `{question}`.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
  pub system: String,
  pub user: String,
}

impl Template {
  fn new(system: &str, user: &str) -> Self {
    Self { system: system.into(), user: user.into() }
  }

  fn overridden(self, with: Option<TemplateOverride>) -> Self {
    let Some(o) = with else { return self };
    Self { system: o.system.unwrap_or(self.system), user: o.user.unwrap_or(self.user) }
  }
}

/// TOML shape of one template: either half may be left out to keep the built-in text.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TemplateOverride {
  system: Option<String>,
  user: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PromptOverrides {
  single_exam_question: Option<TemplateOverride>,
  worksheet: Option<TemplateOverride>,
  balanced_worksheet: Option<TemplateOverride>,
  exam_style_worksheet: Option<TemplateOverride>,
  answer: Option<TemplateOverride>,
  similar_question: Option<TemplateOverride>,
}

impl From<PromptOverrides> for Prompts {
  fn from(o: PromptOverrides) -> Self {
    let d = Prompts::default();
    Self {
      single_exam_question: d.single_exam_question.overridden(o.single_exam_question),
      worksheet: d.worksheet.overridden(o.worksheet),
      balanced_worksheet: d.balanced_worksheet.overridden(o.balanced_worksheet),
      exam_style_worksheet: d.exam_style_worksheet.overridden(o.exam_style_worksheet),
      answer: d.answer.overridden(o.answer),
      similar_question: d.similar_question.overridden(o.similar_question),
    }
  }
}

/// Template table keyed by mode. The output contract and markup rule are not part of
/// these strings: the prompt builder appends them, so overrides cannot drop them.
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "PromptOverrides")]
pub struct Prompts {
  pub single_exam_question: Template,
  pub worksheet: Template,
  pub balanced_worksheet: Template,
  pub exam_style_worksheet: Template,
  pub answer: Template,
  pub similar_question: Template,
}

impl Prompts {
  pub fn template(&self, mode: Mode) -> &Template {
    match mode {
      Mode::SingleExamQuestion => &self.single_exam_question,
      Mode::Worksheet => &self.worksheet,
      Mode::BalancedWorksheet => &self.balanced_worksheet,
      Mode::ExamStyleWorksheet => &self.exam_style_worksheet,
      Mode::Answer => &self.answer,
      Mode::SimilarQuestion => &self.similar_question,
    }
  }
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      single_exam_question: Template::new(
        "You are a {curriculum} examiner. Generate questions that follow the style, structure, tone and difficulty of real exam papers.\n\
         - Create NEW, original questions. Never quote or reproduce past papers.\n\
         - Use a multi-part structure (a), (b), (c) where appropriate, with exam-style progression.\n\
         - Use clear mathematical reasoning.",
        "Generate ONE exam-style question for {curriculum}.\n\
         - Topic: {topic}\n\
         - Total marks: {total_marks}\n\
         - Difficulty: {difficulty}\n\
         - Structure: multi-part (a), (b), (c)\n\
         - Provide a full worked solution for each part.\n\
         - Distribute the marks sensibly across the parts.",
      ),
      worksheet: Template::new(
        "You are a {curriculum} tutor. Generate exactly {count} unique exam-style questions at difficulty level {difficulty}. Focus ONLY on these subtopics: {subtopics}.",
        "Create a {difficulty} worksheet on {topic}.\nSubtopics: {subtopics}",
      ),
      balanced_worksheet: Template::new(
        "You are a {curriculum} tutor. Generate ONE exam-style question for EACH selected subtopic, {count} questions in total.",
        "Topic: {topic}\nSubtopics: {subtopics}",
      ),
      exam_style_worksheet: Template::new(
        "You are a {curriculum} examiner. Generate questions that follow the style, structure, tone and difficulty of real exam papers: \
         multi-part structure, mark-style progression and the level of rigor expected. \
         You may include multi-part questions (a), (b), (c) and diagrams described in words. \
         Do NOT quote or reproduce any past exam paper; only create new, original questions.",
        "Topic: {topic}\nSubtopics: {subtopics}\nGenerate exactly {count} exam-style questions.",
      ),
      answer: Template::new(
        "You are a {curriculum} tutor. Provide a full step-by-step worked solution. Match the difficulty: {difficulty}.",
        "Topic: {topic}\nQuestion: {question}",
      ),
      similar_question: Template::new(
        "You are a {curriculum} tutor. Generate ONE new question similar in style and difficulty ({difficulty}) to the original, but not identical.",
        "Topic: {topic}\nOriginal question: {question}",
      ),
    }
  }
}

/// Attempt to load `TutorConfig` from TUTOR_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_tutor_config_from_env() -> Option<TutorConfig> {
  let path = std::env::var("TUTOR_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<TutorConfig>(&s) {
      Ok(cfg) => {
        info!(target: "lc_maths_tutor", %path, markup = ?cfg.generation.markup, "Loaded tutor config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lc_maths_tutor", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lc_maths_tutor", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_toml_gives_defaults() {
    let cfg: TutorConfig = toml::from_str("").unwrap();
    assert_eq!(cfg.generation.markup, MarkupConvention::Dollar);
    assert!(cfg.generation.strip_ordinals);
    assert_eq!(cfg.prompts.worksheet, Prompts::default().worksheet);
  }

  #[test]
  fn partial_override_keeps_other_templates() {
    let cfg: TutorConfig = toml::from_str(
      r#"
        [generation]
        markup = "paren"
        strip_ordinals = false

        [prompts.answer]
        system = "Be brief."
        user = "Q: {question}"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.generation.markup, MarkupConvention::Paren);
    assert!(!cfg.generation.strip_ordinals);
    assert_eq!(cfg.generation.curriculum, "Leaving Cert Higher Level Maths");
    assert_eq!(cfg.prompts.template(Mode::Answer).system, "Be brief.");
    assert_eq!(cfg.prompts.similar_question, Prompts::default().similar_question);
  }

  #[test]
  fn half_a_template_keeps_the_other_half() {
    let cfg: TutorConfig = toml::from_str(
      r#"
        [prompts.worksheet]
        system = "You write short worksheets on {topic}."
      "#,
    )
    .unwrap();
    let defaults = Prompts::default();
    assert_eq!(cfg.prompts.worksheet.system, "You write short worksheets on {topic}.");
    assert_eq!(cfg.prompts.worksheet.user, defaults.worksheet.user);
    assert_eq!(cfg.prompts.answer, defaults.answer);
  }

  #[test]
  fn unknown_markup_is_rejected() {
    assert!(toml::from_str::<TutorConfig>("[generation]\nmarkup = \"brackets\"").is_err());
  }
}
