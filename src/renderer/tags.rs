//! Minimal HTML tag construction.

use std::collections::BTreeMap;

use tracing::warn;

/// Escape text for use inside a double-quoted HTML attribute.
pub fn escape_html(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  for ch in input.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(ch),
    }
  }
  out
}

/// Render an opening tag from generated attributes plus caller-supplied `html` attributes.
///
/// Caller attributes replace generated ones with the same name. Caller attributes whose
/// name could break out of the tag are dropped with a warning.
pub fn open_tag(name: &str, attrs: &[(&str, &str)], html: &BTreeMap<String, String>) -> String {
  let mut merged: Vec<(&str, &str)> = attrs.to_vec();
  for (key, value) in html {
    if !is_valid_attribute_name(key) {
      warn!(attribute = %key, tag = name, "dropping attribute with invalid name");
      continue;
    }
    match merged.iter_mut().find(|(existing, _)| *existing == key.as_str()) {
      Some(slot) => slot.1 = value.as_str(),
      None => merged.push((key.as_str(), value.as_str())),
    }
  }

  let mut tag = format!("<{name}");
  for (key, value) in merged {
    tag.push_str(&format!(" {key}=\"{}\"", escape_html(value)));
  }
  tag.push('>');
  tag
}

fn is_valid_attribute_name(name: &str) -> bool {
  !name.is_empty()
    && !name
      .chars()
      .any(|ch| ch.is_whitespace() || ch.is_control() || matches!(ch, '"' | '\'' | '=' | '<' | '>' | '/'))
}
