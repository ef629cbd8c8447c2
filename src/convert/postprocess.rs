//! Whole-document cleanup pipeline.
//!
//! The streaming pass emits tags one at a time and cannot see across tag
//! boundaries, so a handful of artifacts are fixed here on the assembled
//! output: list items get grouped and indented, empty spans are dropped,
//! underline spans inside anchors are collapsed, and breaks adjacent to
//! lists are absorbed. The steps run in a fixed order; later steps assume
//! the earlier cleanups already happened.

use std::sync::LazyLock;

use regex::Regex;

/// Spans with no content at all, typically produced by handlers whose source
/// attributes were all absent.
static EMPTY_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<span[^>]*></span>").unwrap());

/// An anchor wrapping nothing but an underline span.
static UNDERLINED_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"<a([^>]*)><span style="text-decoration: underline; ">(.*?)</span></a>"#).unwrap()
});

/// A run of list items on one line. `.` does not cross newlines, so separate
/// item runs in the document stay separate.
static LIST_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<li>.*</li>").unwrap());

/// Runs the ordered cleanup steps over the fully-assembled output.
pub(crate) fn run(content: &str) -> String {
  let mut result = strip_trailing_break(content);
  result = remove_empty_spans(&result);
  result = UNDERLINED_ANCHOR.replace_all(&result, "<a${1}>${2}</a>").into_owned();
  result = group_list_items(&result);
  result = indent_list_items(&result);
  result = result.replace("<br />\n<ul>", "<ul>");
  result = result.replace("</ul>\n<br />", "</ul>");
  result
}

/// Strips a single trailing `<br />` + newline at the very end of the
/// document, usually left behind by the final paragraph.
fn strip_trailing_break(content: &str) -> String {
  content.strip_suffix("<br />\n").unwrap_or(content).to_string()
}

/// Removes empty span pairs until none remain, so that unwrapping one pair
/// never leaves a newly-empty outer pair behind.
fn remove_empty_spans(content: &str) -> String {
  let mut result = content.to_string();
  loop {
    let next = EMPTY_SPAN.replace_all(&result, "").into_owned();
    if next == result {
      return result;
    }
    result = next;
  }
}

/// Wraps each per-line run of `<li>...</li>` in a `<ul>` element.
///
/// List wrappers never come out of the streaming pass; grouping needs the
/// whole document. Lines already indented by [`indent_list_items`] are left
/// alone, which keeps the pipeline idempotent on processed output.
fn group_list_items(content: &str) -> String {
  let mut out = String::with_capacity(content.len());

  for line in content.split_inclusive('\n') {
    if line.starts_with('\t') {
      out.push_str(line);
      continue;
    }
    match LIST_RUN.find(line) {
      Some(run) => {
        out.push_str(&line[..run.start()]);
        out.push_str("<ul>");
        out.push_str(run.as_str());
        out.push_str("\n</ul>\n");
        out.push_str(&line[run.end()..]);
      }
      None => out.push_str(line),
    }
  }

  out
}

/// Puts every `<li>` on its own tab-indented line.
fn indent_list_items(content: &str) -> String {
  let mut out = String::with_capacity(content.len());
  let mut rest = content;

  while let Some(idx) = rest.find("<li>") {
    out.push_str(&rest[..idx]);
    if !out.ends_with('\t') {
      out.push_str("\n\t");
    }
    out.push_str("<li>");
    rest = &rest[idx + "<li>".len()..];
  }

  out.push_str(rest);
  out
}
