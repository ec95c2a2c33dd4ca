//! Response interpreter: validates the completion text against the contract the
//! prompt promised. Only the structured path can fail.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::domain::{OutputContract, StructuredQuestion, WorksheetItem};
use crate::error::AppError;
use crate::util::trunc_for_log;

/// Result of one interpretation pass, tagged by the contract it was checked against.
#[derive(Clone, Debug, PartialEq)]
pub enum Interpreted {
  Structured(StructuredQuestion),
  Lines(Vec<WorksheetItem>),
  Text(String),
}

pub fn interpret(raw: &str, expected: OutputContract) -> Result<Interpreted, AppError> {
  match expected {
    OutputContract::StructuredJson => parse_structured(raw).map(Interpreted::Structured),
    OutputContract::LineList => Ok(Interpreted::Lines(split_lines(raw))),
    OutputContract::FreeText => Ok(Interpreted::Text(raw.trim().to_string())),
  }
}

/// Strict decode into `StructuredQuestion`. No fence stripping, no partial recovery.
pub fn parse_structured(raw: &str) -> Result<StructuredQuestion, AppError> {
  let malformed = |reason: String| {
    warn!(target: "tutor", %reason, raw = %trunc_for_log(raw, 200), "Structured response rejected");
    AppError::MalformedResponse { raw: raw.to_string(), reason }
  };

  let question: StructuredQuestion =
    serde_json::from_str(raw.trim()).map_err(|e| malformed(format!("JSON parse error: {}", e)))?;

  if question.parts.is_empty() {
    return Err(malformed("\"parts\" is empty".into()));
  }
  {
    let mut seen = HashSet::new();
    for part in &question.parts {
      if !is_part_label(&part.label) {
        return Err(malformed(format!("part label {:?} is not a single lowercase letter", part.label)));
      }
      if !seen.insert(part.label.as_str()) {
        return Err(malformed(format!("duplicate part label {:?}", part.label)));
      }
    }
  }

  let sum = question.marks_sum();
  if sum != question.total_marks {
    warn!(target: "tutor", total_marks = question.total_marks, parts_sum = sum, "Part marks do not add up to the total");
  }
  debug!(target: "tutor", parts = question.parts.len(), total_marks = question.total_marks, "Structured response accepted");
  Ok(question)
}

/// Labels are "a", "b", "c", ...
fn is_part_label(label: &str) -> bool {
  let mut chars = label.chars();
  matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_lowercase())
}

/// One item per non-blank line, trimmed, in order.
pub fn split_lines(raw: &str) -> Vec<WorksheetItem> {
  raw
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;
  use crate::domain::QuestionPart;

  const ALGEBRA: &str = r#"{"total_marks":25,"topic":"Algebra","difficulty":"Higher Level","parts":[{"label":"a","marks":10,"question":"x^2=4","solution":"x=\\pm2"}]}"#;

  fn structured(raw: &str) -> StructuredQuestion {
    match interpret(raw, OutputContract::StructuredJson) {
      Ok(Interpreted::Structured(q)) => q,
      other => panic!("expected structured, got {:?}", other),
    }
  }

  fn malformed_raw(raw: &str) -> String {
    match interpret(raw, OutputContract::StructuredJson) {
      Err(AppError::MalformedResponse { raw, .. }) => raw,
      other => panic!("expected MalformedResponse, got {:?}", other),
    }
  }

  #[test]
  fn parses_the_algebra_example() {
    let q = structured(ALGEBRA);
    assert_eq!(q.total_marks, 25);
    assert_eq!(q.topic, "Algebra");
    assert_eq!(q.difficulty, "Higher Level");
    assert_eq!(q.parts.len(), 1);
    assert_eq!(q.parts[0].label, "a");
    assert_eq!(q.parts[0].marks, 10);
    assert_eq!(q.parts[0].solution_text, "x=\\pm2");
  }

  #[test]
  fn structured_round_trips() {
    let raw = r#"{
      "total_marks": 50, "topic": "Calculus", "difficulty": "Higher Level",
      "parts": [
        {"label": "a", "marks": 15, "question": "Differentiate $x^3$", "solution": "$3x^2$"},
        {"label": "b", "marks": 20, "question": "Integrate $2x$", "solution": "$x^2 + C$"},
        {"label": "c", "marks": 15, "question": "Find the turning point", "solution": "$(0,0)$"}
      ]
    }"#;
    let q = structured(raw);
    let again = structured(&serde_json::to_string(&q).unwrap());
    assert_eq!(q, again);
    let labels: Vec<_> = again.parts.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, ["a", "b", "c"]);
  }

  #[test]
  fn unknown_fields_are_ignored() {
    let raw = r#"{"total_marks":25,"topic":"T","difficulty":"D","notes":"x","parts":[{"label":"a","marks":25,"question":"q","solution":"s","hint":"h"}]}"#;
    assert_eq!(structured(raw).parts[0].question_text, "q");
  }

  #[test]
  fn not_json_carries_raw_text() {
    assert_eq!(malformed_raw("not json"), "not json");
  }

  #[test]
  fn truncated_json_carries_raw_text() {
    let raw = &ALGEBRA[..ALGEBRA.len() - 2];
    assert_eq!(malformed_raw(raw), raw);
  }

  #[test]
  fn missing_parts_is_malformed() {
    let raw = r#"{"total_marks":25,"topic":"Algebra","difficulty":"Higher Level"}"#;
    assert_eq!(malformed_raw(raw), raw);
  }

  #[test]
  fn fenced_json_is_not_recovered() {
    let raw = format!("```json\n{}\n```", ALGEBRA);
    assert_eq!(malformed_raw(&raw), raw);
  }

  #[test]
  fn empty_parts_and_duplicate_labels_are_malformed() {
    malformed_raw(r#"{"total_marks":25,"topic":"A","difficulty":"B","parts":[]}"#);
    malformed_raw(
      r#"{"total_marks":25,"topic":"A","difficulty":"B","parts":[
        {"label":"a","marks":10,"question":"q","solution":"s"},
        {"label":"a","marks":15,"question":"q","solution":"s"}]}"#,
    );
  }

  #[test]
  fn labels_must_be_single_lowercase_letters() {
    for label in ["", " ", "(A) part one", "A", "ab", "1", "(a)", "é"] {
      let raw = format!(
        r#"{{"total_marks":25,"topic":"A","difficulty":"B","parts":[{{"label":{:?},"marks":25,"question":"q","solution":"s"}}]}}"#,
        label
      );
      assert_eq!(malformed_raw(&raw), raw, "label {:?}", label);
    }
  }

  #[test]
  fn marks_mismatch_is_accepted() {
    let raw = r#"{"total_marks":75,"topic":"A","difficulty":"B","parts":[{"label":"a","marks":10,"question":"q","solution":"s"}]}"#;
    assert_eq!(structured(raw).marks_sum(), 10);
  }

  #[test]
  fn line_list_example() {
    let out = interpret("1. Solve $x^2-4=0$\n2. Factor $x^2+5x+6$\n", OutputContract::LineList).unwrap();
    assert_eq!(
      out,
      Interpreted::Lines(vec!["1. Solve $x^2-4=0$".into(), "2. Factor $x^2+5x+6$".into()])
    );
  }

  #[test]
  fn line_list_drops_blank_lines_and_trims() {
    let raw = "\n  first  \r\n\t\n second\n   \nthird";
    assert_eq!(split_lines(raw), ["first", "second", "third"]);
  }

  #[test]
  fn line_list_of_blank_input_is_empty() {
    assert_eq!(interpret("", OutputContract::LineList).unwrap(), Interpreted::Lines(vec![]));
    assert_eq!(interpret(" \n\t \n", OutputContract::LineList).unwrap(), Interpreted::Lines(vec![]));
  }

  #[test]
  fn free_text_is_trimmed_verbatim() {
    let out = interpret("\n  Step 1: $x=2$\nStep 2: done \n", OutputContract::FreeText).unwrap();
    assert_eq!(out, Interpreted::Text("Step 1: $x=2$\nStep 2: done".into()));
  }

  fn question_strategy() -> impl Strategy<Value = StructuredQuestion> {
    let part = (0u32..40, r"[ -~]{0,30}", r"[ -~]{0,30}");
    (any::<u32>(), "[A-Za-z ]{1,20}", "[A-Za-z ]{1,12}", prop::collection::vec(part, 1..8)).prop_map(
      |(total_marks, topic, difficulty, parts)| StructuredQuestion {
        total_marks,
        topic,
        difficulty,
        parts: parts
          .into_iter()
          .enumerate()
          .map(|(i, (marks, question_text, solution_text))| QuestionPart {
            label: ((b'a' + i as u8) as char).to_string(),
            marks,
            question_text,
            solution_text,
          })
          .collect(),
      },
    )
  }

  proptest! {
    #[test]
    fn serialized_questions_interpret_back(q in question_strategy()) {
      let raw = serde_json::to_string(&q).unwrap();
      prop_assert_eq!(interpret(&raw, OutputContract::StructuredJson), Ok(Interpreted::Structured(q)));
    }

    #[test]
    fn line_count_matches_non_blank_lines(raw in "[ab \t\r\n]{0,80}") {
      let expected = raw.lines().filter(|l| !l.trim().is_empty()).count();
      let lines = split_lines(&raw);
      prop_assert_eq!(lines.len(), expected);
      for line in &lines {
        prop_assert!(!line.is_empty() && !line.contains('\n'));
        prop_assert_eq!(line.trim(), line.as_str());
      }
    }
  }
}
