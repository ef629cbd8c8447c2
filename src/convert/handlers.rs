//! Built-in handlers for the dialect's special tags.
//!
//! Each handler is a pure function from the source tag's attributes to an
//! output fragment. They are registered by [`Flash2Html::new`] and can be
//! replaced or removed through the registry.
//!
//! [`Flash2Html::new`]: super::Flash2Html::new

use super::escape::escape_attribute;
use super::registry::{Attributes, StartFragment};

/// `A` start: `<a href="...">`, with `target` carried over only when the
/// source attribute is present and non-empty. The href value is
/// attribute-escaped; the target value is not.
pub(crate) fn anchor_start(_tag: &str, attrs: &Attributes) -> Option<StartFragment> {
  let href = attrs.get("HREF").map(String::as_str).unwrap_or_default();
  let mut markup = format!(r#"<a href="{}""#, escape_attribute(href));
  if let Some(target) = attrs.get("TARGET")
    && !target.is_empty()
  {
    markup.push_str(&format!(r#" target="{target}""#));
  }
  markup.push('>');
  Some(StartFragment::open("a", markup))
}

/// `FONT` start: an inline `<span style="...">` accumulating font-family,
/// font-size, color and letter-spacing, in that order, each only when the
/// corresponding source attribute exists.
pub(crate) fn font_start(_tag: &str, attrs: &Attributes) -> Option<StartFragment> {
  let mut markup = String::from(r#"<span style=""#);
  if let Some(face) = attrs.get("FACE") {
    markup.push_str(&format!("font-family: '{face}'; "));
  }
  if let Some(size) = attrs.get("SIZE") {
    markup.push_str(&format!("font-size: {size}px; "));
  }
  if let Some(color) = attrs.get("COLOR") {
    markup.push_str(&format!("color: {color}; "));
  }
  if let Some(spacing) = attrs.get("LETTERSPACING") {
    markup.push_str(&format!("letter-spacing: {spacing}px; "));
  }
  markup.push_str(r#"">"#);
  Some(StartFragment::open("span", markup))
}

/// `IMG` start: a single self-closing `<img>` floated left or right with a
/// 10px margin on the text side. The source path is carried over unescaped.
pub(crate) fn image_start(_tag: &str, attrs: &Attributes) -> Option<StartFragment> {
  let style = if attrs.get("ALIGN").is_some_and(|align| align == "right") {
    "float: right; margin-left: 10px; "
  } else {
    "float: left; margin-right: 10px; "
  };
  let src = attrs.get("SRC").map(String::as_str).unwrap_or_default();
  Some(StartFragment::complete(format!(r#"<img style="{style}" src="{src}" alt="" />"#)))
}

/// `P` start: suppressed, but the element stays open so the end handler
/// fires.
pub(crate) fn paragraph_start(_tag: &str, _attrs: &Attributes) -> Option<StartFragment> {
  Some(StartFragment::silent())
}

/// `P` end: paragraphs become break-separated rather than block-wrapped.
pub(crate) fn paragraph_end(_tag: &str) -> String {
  String::from("<br />\n")
}

/// `TEXTFORMAT` start: an indentation `<div>` only when a block indent is
/// requested. Without one the tag vanishes entirely; returning `None` tells
/// the engine to skip the closing tag as well, keeping the stream balanced.
pub(crate) fn textformat_start(_tag: &str, attrs: &Attributes) -> Option<StartFragment> {
  let indent = attrs.get("BLOCKINDENT")?;
  Some(StartFragment::open(
    "div",
    format!(r#"<div style="margin-left: {indent}px; ">"#),
  ))
}

/// `U` start: an underline span, closed by the default closing-tag rule.
pub(crate) fn underline_start(_tag: &str, _attrs: &Attributes) -> Option<StartFragment> {
  Some(StartFragment::open(
    "span",
    r#"<span style="text-decoration: underline; ">"#,
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  #[test]
  fn test_anchor_with_target() {
    let fragment = anchor_start("A", &attrs(&[("HREF", "http://e.com"), ("TARGET", "_blank")])).unwrap();
    assert_eq!(fragment.markup, r#"<a href="http://e.com" target="_blank">"#);
    assert_eq!(fragment.resolved_tag.as_deref(), Some("a"));
  }

  #[test]
  fn test_anchor_without_target() {
    let fragment = anchor_start("A", &attrs(&[("HREF", "http://e.com"), ("TARGET", "")])).unwrap();
    assert_eq!(fragment.markup, r#"<a href="http://e.com">"#);
  }

  #[test]
  fn test_anchor_escapes_href() {
    let fragment = anchor_start("A", &attrs(&[("HREF", r#"http://e.com/?a=1&b="2""#)])).unwrap();
    assert_eq!(fragment.markup, r#"<a href="http://e.com/?a=1&amp;b=&quot;2&quot;">"#);
  }

  #[test]
  fn test_font_full_style() {
    let fragment = font_start(
      "FONT",
      &attrs(&[("FACE", "Arial"), ("SIZE", "12"), ("COLOR", "#ff0000"), ("LETTERSPACING", "2")]),
    )
    .unwrap();
    assert_eq!(
      fragment.markup,
      r#"<span style="font-family: 'Arial'; font-size: 12px; color: #ff0000; letter-spacing: 2px; ">"#
    );
  }

  #[test]
  fn test_font_without_attributes_is_empty_span() {
    let fragment = font_start("FONT", &attrs(&[])).unwrap();
    assert_eq!(fragment.markup, r#"<span style="">"#);
  }

  #[test]
  fn test_image_alignment() {
    let right = image_start("IMG", &attrs(&[("SRC", "pic.jpg"), ("ALIGN", "right")])).unwrap();
    assert_eq!(
      right.markup,
      r#"<img style="float: right; margin-left: 10px; " src="pic.jpg" alt="" />"#
    );
    assert_eq!(right.self_closing, Some(true));

    let left = image_start("IMG", &attrs(&[("SRC", "pic.jpg")])).unwrap();
    assert!(left.markup.contains("float: left; margin-right: 10px; "));
  }

  #[test]
  fn test_paragraph_handlers() {
    let start = paragraph_start("P", &attrs(&[])).unwrap();
    assert!(start.markup.is_empty());
    assert_eq!(start.self_closing, None);
    assert_eq!(paragraph_end("P"), "<br />\n");
  }

  #[test]
  fn test_textformat_with_block_indent() {
    let fragment = textformat_start("TEXTFORMAT", &attrs(&[("BLOCKINDENT", "40")])).unwrap();
    assert_eq!(fragment.markup, r#"<div style="margin-left: 40px; ">"#);
    assert_eq!(fragment.resolved_tag.as_deref(), Some("div"));
  }

  #[test]
  fn test_textformat_without_block_indent_is_suppressed() {
    assert!(textformat_start("TEXTFORMAT", &attrs(&[])).is_none());
  }

  #[test]
  fn test_underline() {
    let fragment = underline_start("U", &attrs(&[])).unwrap();
    assert_eq!(fragment.markup, r#"<span style="text-decoration: underline; ">"#);
  }
}
