//! Built-in Leaving Cert Higher Level catalogue: worksheet topics with their
//! subtopics, exam-question topics, and the allowed mark totals.

use serde::Serialize;

use crate::domain::Difficulty;

/// Mark totals an exam question may be generated for.
pub const MARK_OPTIONS: [u32; 3] = [25, 50, 75];

/// Topics offered on the exam-question generator.
pub const EXAM_TOPICS: [&str; 9] = [
  "Algebra",
  "Calculus",
  "Trigonometry",
  "Complex Numbers",
  "Probability",
  "Functions",
  "Geometry",
  "Sequences & Series",
  "Financial Maths",
];

#[derive(Clone, Debug, Serialize)]
pub struct TopicEntry {
  pub topic: &'static str,
  pub subtopics: Vec<&'static str>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Catalogue {
  pub worksheet_topics: Vec<TopicEntry>,
  pub exam_topics: Vec<&'static str>,
  pub mark_options: Vec<u32>,
  pub worksheet_difficulties: Vec<Difficulty>,
}

/// Worksheet topics in display order.
pub fn worksheet_topics() -> Vec<TopicEntry> {
  vec![
    TopicEntry {
      topic: "Probability",
      subtopics: vec![
        "Combined events",
        "Conditional probability",
        "Expected value",
        "Permutations and combinations",
        "Binomial distribution",
        "Bernoulli Trials",
        "Normal Distribution",
      ],
    },
    TopicEntry {
      topic: "Trigonometry",
      subtopics: vec![
        "Trig identities",
        "Trig equations",
        "Graphs",
        "Radians",
        "Sine rule / Cosine rule",
        "Unit Circle",
      ],
    },
    TopicEntry {
      topic: "Algebra",
      subtopics: vec!["Quadratics", "Functions", "Logs", "Sequences & series", "Inequalities"],
    },
    TopicEntry {
      topic: "Circle",
      subtopics: vec![
        "Center (0,0) and radius r",
        "Center (h,k) and radius r",
        "Equations of the form x^2 + y^2 + 2gx + 2fy + c = 0",
        "Points outside, inside or on the Circle",
        "Intersection of a line and circle",
      ],
    },
    TopicEntry {
      topic: "Calculus",
      subtopics: vec![
        "Differentiation",
        "Integration",
        "Rates of change",
        "Area under curves",
        "Product/Quotient/Chain rule",
      ],
    },
  ]
}

pub fn catalogue() -> Catalogue {
  Catalogue {
    worksheet_topics: worksheet_topics(),
    exam_topics: EXAM_TOPICS.to_vec(),
    mark_options: MARK_OPTIONS.to_vec(),
    worksheet_difficulties: Difficulty::WORKSHEET.to_vec(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_worksheet_topic_has_subtopics() {
    for entry in worksheet_topics() {
      assert!(!entry.subtopics.is_empty(), "{} has no subtopics", entry.topic);
    }
  }

  #[test]
  fn catalogue_serializes_difficulty_labels() {
    let v = serde_json::to_value(catalogue()).unwrap();
    assert_eq!(v["mark_options"], serde_json::json!([25, 50, 75]));
    assert_eq!(v["worksheet_difficulties"], serde_json::json!(["Easy", "Medium", "Hard"]));
    assert_eq!(v["worksheet_topics"][0]["topic"], "Probability");
  }
}
