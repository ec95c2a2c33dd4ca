//! Math-markup normalization and worksheet display policy.
//!
//! The model is told to use one inline-math convention, but it drifts back to
//! LaTeX parentheses every so often. `normalize` rewrites the other convention
//! into the configured one so the browser renderer only ever sees one style.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Deserialize;

/// Inline-math delimiter convention used in prompts and enforced on output.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarkupConvention {
  /// `$...$` inline, `$$...$$` display.
  #[default]
  Dollar,
  /// `\(...\)` inline, `\[...\]` display.
  Paren,
}

impl MarkupConvention {
  /// The instruction block every prompt carries. Generated here so templates cannot contradict it.
  pub fn rule(self) -> String {
    match self {
      MarkupConvention::Dollar => [
        "Math notation rules:",
        "- Write EVERY mathematical expression in LaTeX wrapped in single dollar signs, e.g. $2x^2 - 4x - 6 = 0$, $\\frac{1}{6}$, $\\sqrt{x}$.",
        "- Do NOT use \\( ... \\) or \\[ ... \\] delimiters.",
        "- Never write plain-text maths such as x^2, 1/6 or sqrt(x).",
      ]
      .join("\n"),
      MarkupConvention::Paren => [
        "Math notation rules:",
        "- Write EVERY mathematical expression in LaTeX wrapped in \\( ... \\), e.g. \\(2x^2 - 4x - 6 = 0\\), \\(\\frac{1}{6}\\), \\(\\sqrt{x}\\).",
        "- Do NOT use dollar-sign delimiters of any kind.",
        "- Never write plain-text maths such as x^2, 1/6 or sqrt(x).",
      ]
      .join("\n"),
    }
  }

  /// Short example used inside schema descriptions.
  pub fn inline_example(self) -> &'static str {
    match self {
      MarkupConvention::Dollar => "$x^2 - 4 = 0$",
      MarkupConvention::Paren => "\\(x^2 - 4 = 0\\)",
    }
  }
}

fn paren_display() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?s)\\\[(.+?)\\\]").expect("valid regex"))
}

fn paren_inline() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?s)\\\((.+?)\\\)").expect("valid regex"))
}

fn dollar_display() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?s)\$\$(.+?)\$\$").expect("valid regex"))
}

/// Inline dollar span: no space just inside either delimiter, so "$5 and $6" is not math.
fn dollar_inline() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\$([^$\s](?:[^$\n]*?[^$\s])?)\$").expect("valid regex"))
}

/// `$\(x\)$`: the model wrapped parens in dollars.
fn dollar_wrapped_paren() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\$\s*\\\(([^$]+?)\\\)\s*\$").expect("valid regex"))
}

/// `\($x$\)`: the model wrapped dollars in parens.
fn paren_wrapped_dollar() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\\\(\s*\$([^$\n]+?)\$\s*\\\)").expect("valid regex"))
}

fn ordinal_prefix() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"(?i)^\s*(?:q(?:uestion)?\s*)?\d{1,3}\s*[.):]\s+").expect("valid regex")
  })
}

/// Rewrite `$x$` spans as `\(x\)`. A closing `$` followed by a digit is currency, not math.
fn dollar_inline_to_paren(text: &str) -> String {
  let re = dollar_inline();
  let mut out = String::with_capacity(text.len());
  let mut pos = 0;
  while let Some(caps) = re.captures_at(text, pos) {
    let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else { break };
    if text[whole.end()..].starts_with(|c: char| c.is_ascii_digit()) {
      out.push_str(&text[pos..whole.start() + 1]);
      pos = whole.start() + 1;
      continue;
    }
    out.push_str(&text[pos..whole.start()]);
    out.push_str("\\(");
    out.push_str(body.as_str());
    out.push_str("\\)");
    pos = whole.end();
  }
  out.push_str(&text[pos..]);
  out
}

fn single_pass(text: &str, target: MarkupConvention) -> String {
  match target {
    MarkupConvention::Dollar => {
      let t = dollar_wrapped_paren().replace_all(text, |c: &Captures| format!("${}$", c[1].trim()));
      let t = paren_display().replace_all(&t, |c: &Captures| format!("$${}$$", c[1].trim()));
      paren_inline()
        .replace_all(&t, |c: &Captures| format!("${}$", c[1].trim()))
        .into_owned()
    }
    MarkupConvention::Paren => {
      let t = paren_wrapped_dollar().replace_all(text, |c: &Captures| format!("\\({}\\)", c[1].trim()));
      let t = dollar_display().replace_all(&t, |c: &Captures| format!("\\[{}\\]", c[1].trim()));
      dollar_inline_to_paren(&t)
    }
  }
}

/// Rewrite math delimiters into `target`. Runs to a fixed point, so it is idempotent.
pub fn normalize(text: &str, target: MarkupConvention) -> String {
  let mut current = text.to_string();
  loop {
    let next = single_pass(&current, target);
    if next == current {
      return current;
    }
    current = next;
  }
}

/// Drop a leading "1.", "2)", "Q3:" style ordinal the model put on a worksheet line.
pub fn strip_ordinal(item: &str) -> String {
  let stripped = ordinal_prefix().replace(item, "");
  if stripped.trim().is_empty() {
    item.trim().to_string()
  } else {
    stripped.trim().to_string()
  }
}
