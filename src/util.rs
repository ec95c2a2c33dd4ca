//! Small utility helpers used across modules.

use std::sync::OnceLock;

use regex::{Captures, Regex};

fn placeholder() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("valid regex"))
}

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values, in one pass:
/// braces inside a substituted value are never expanded again.
/// Unknown placeholders are left as they are.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  placeholder()
    .replace_all(tpl, |c: &Captures| {
      pairs
        .iter()
        .find(|(k, _)| *k == &c[1])
        .map_or_else(|| c[0].to_string(), |(_, v)| v.to_string())
    })
    .into_owned()
}

/// Log-safe truncation for large strings, on a char boundary.
/// Avoids spamming logs with whole model responses.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}
