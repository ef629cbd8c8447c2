//! Conversion engine for the Flash authoring markup dialect.
//!
//! This module turns the uppercase-tag markup emitted by Flash authoring
//! tools into standard HTML (or plain text) with a single streaming pass.
//!
//! # Architecture
//!
//! The conversion is split into focused modules:
//! - [`registry`] - per-tag transformation rules and handler registration
//! - [`handlers`] - built-in handlers for the dialect's special tags
//! - [`escape`] - attribute escaping, unicode shielding, email obfuscation
//! - [`postprocess`] - ordered whole-document cleanup rewrites
//!
//! # Example
//!
//! ```
//! use flash2html::convert::Flash2Html;
//!
//! let engine = Flash2Html::new();
//! let html = engine.convert(r##"<P><FONT COLOR="#ff0000">hi</FONT></P>"##).unwrap();
//! assert_eq!(html, r##"<span style="color: #ff0000; ">hi</span>"##);
//! ```

use std::borrow::Cow;
use std::sync::LazyLock;
use std::time::Instant;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use tracing::{debug, trace};

mod escape;
mod handlers;
mod postprocess;
mod registry;

pub use registry::{Attributes, DataHandler, EndHandler, StartFragment, StartHandler, TagRegistry, TagRule};

use crate::error::ConvertError;

/// Runs of two or more whitespace characters in character data.
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// `HREF` attribute values whose quoting must be repaired before parsing.
static HREF_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"HREF="(.*?)""#).unwrap());

/// `IMG` tags, which the dialect does not reliably self-close.
static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<IMG(.*?)>").unwrap());

/// Options that control one conversion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertOptions {
  /// Suppress all tag rewriting; emit only paragraph breaks and raw text.
  pub plain_text: bool,
  /// Rewrite `mailto:` href values into hexadecimal character references.
  pub protect_email: bool,
}

impl ConvertOptions {
  /// Sets an option by name.
  ///
  /// The option set is fixed and enumerable; unknown names are an error
  /// rather than a silent no-op.
  pub fn set(&mut self, name: &str, value: bool) -> Result<(), ConvertError> {
    match name {
      "plain_text" => self.plain_text = value,
      "protect_email" => self.protect_email = value,
      _ => return Err(ConvertError::UnknownOption(name.to_string())),
    }
    Ok(())
  }
}

/// Stack entry for an element whose start tag has been processed.
///
/// Snapshots the rule resolved at start time, so the end tag closes whatever
/// the start handler actually emitted even when the handler renamed the tag
/// dynamically.
struct OpenNode {
  source_tag: String,
  output_tag: String,
  self_closing: bool,
}

/// Mutable state of one conversion call. Built fresh per call, so the engine
/// itself stays immutable during conversion and calls never share state.
struct ConversionContext {
  options: ConvertOptions,
  out: String,
  nodes: Vec<OpenNode>,
}

/// The dialect conversion engine: a tag registry plus instance-level default
/// options.
///
/// Conversion borrows the engine immutably; registry and option mutation
/// require `&mut self` and are therefore statically excluded while a
/// conversion is running.
pub struct Flash2Html {
  registry: TagRegistry,
  options: ConvertOptions,
}

impl Default for Flash2Html {
  fn default() -> Self {
    Self::new()
  }
}

impl Flash2Html {
  /// Creates an engine with the dialect's standard rules: `B`/`I`/`LI`
  /// renames plus handlers for `A`, `FONT`, `IMG`, `P`, `TEXTFORMAT` and
  /// `U`.
  pub fn new() -> Self {
    let mut registry = TagRegistry::new();
    registry.define_mapping("B", "strong");
    registry.define_mapping("I", "em");
    registry.define_mapping("LI", "li");
    registry.set_start_handler("A", handlers::anchor_start);
    registry.set_start_handler("FONT", handlers::font_start);
    registry.set_start_handler("IMG", handlers::image_start);
    registry.set_start_handler("P", handlers::paragraph_start);
    registry.set_end_handler("P", handlers::paragraph_end);
    registry.set_start_handler("TEXTFORMAT", handlers::textformat_start);
    registry.set_start_handler("U", handlers::underline_start);
    Self {
      registry,
      options: ConvertOptions::default(),
    }
  }

  /// Read access to the tag registry.
  pub fn registry(&self) -> &TagRegistry {
    &self.registry
  }

  /// Mutable access to the tag registry (the extension surface).
  pub fn registry_mut(&mut self) -> &mut TagRegistry {
    &mut self.registry
  }

  /// Instance-level default options used by [`convert`](Self::convert).
  pub fn options_mut(&mut self) -> &mut ConvertOptions {
    &mut self.options
  }

  /// Converts dialect markup using the instance-level default options.
  pub fn convert(&self, input: &str) -> Result<String, ConvertError> {
    self.convert_with_options(input, &self.options)
  }

  /// Converts dialect markup to standard HTML, or to plain text when
  /// `options.plain_text` is set.
  ///
  /// # Arguments
  /// * `input` - Markup in the source dialect (uppercase or mixed-case tag
  ///   names, possibly with multiple top-level nodes).
  /// * `options` - Effective options for this call only; instance defaults
  ///   are not touched.
  ///
  /// # Returns
  /// The converted document, or [`ConvertError::MarkupParse`] when the
  /// streaming parser rejects fundamentally non-well-formed input.
  pub fn convert_with_options(&self, input: &str, options: &ConvertOptions) -> Result<String, ConvertError> {
    let shielded = escape::shield_non_ascii(input);
    let prepared = prepare(&shielded.text, options);

    let mut reader = Reader::from_str(&prepared);
    let config = reader.config_mut();
    config.trim_text(false);
    config.expand_empty_elements = true;
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut ctx = ConversionContext {
      options: *options,
      out: String::with_capacity(input.len()),
      nodes: Vec::new(),
    };

    let parse_start = Instant::now();
    loop {
      match reader.read_event() {
        Ok(Event::Start(e)) => self.handle_start_tag(&e, &mut ctx),
        Ok(Event::End(e)) => {
          let tag = fold_name(e.name().as_ref());
          self.handle_end_tag(&tag, &mut ctx);
        }
        Ok(Event::Text(e)) => {
          let chunk = String::from_utf8_lossy(&e).into_owned();
          self.handle_character_data(&chunk, &mut ctx);
        }
        Ok(Event::GeneralRef(e)) => {
          let chunk = resolve_entity(&String::from_utf8_lossy(&e));
          self.handle_character_data(&chunk, &mut ctx);
        }
        Ok(Event::CData(e)) => {
          let chunk = String::from_utf8_lossy(&e).into_owned();
          self.handle_character_data(&chunk, &mut ctx);
        }
        Ok(Event::Eof) => break,
        Ok(_) => {}
        Err(source) => {
          return Err(ConvertError::MarkupParse {
            position: reader.error_position(),
            source,
          });
        }
      }
    }

    debug!(
      "streamed {length} chars in {duration:?}",
      length = prepared.len(),
      duration = parse_start.elapsed()
    );

    let mut result = escape::substitute_glyphs(&ctx.out);
    result = escape::legacy_decode(&result);
    if ctx.options.protect_email {
      result = escape::obfuscate_mailto(&result);
    }
    result = escape::restore_entities(&result, &shielded.marker);

    Ok(postprocess::run(&result))
  }

  fn handle_start_tag(&self, e: &BytesStart, ctx: &mut ConversionContext) {
    if ctx.options.plain_text {
      return;
    }

    let tag = fold_name(e.name().as_ref());
    let Some(rule) = self.registry.get(&tag) else {
      trace!("skipping unregistered tag: {tag}");
      return;
    };

    let node = if let Some(handler) = rule.start_handler() {
      let attrs = collect_attributes(e);
      match handler(&tag, &attrs) {
        Some(fragment) => {
          let output_tag = fragment.resolved_tag.unwrap_or_else(|| rule.output_tag().to_string());
          let self_closing = fragment.self_closing.unwrap_or_else(|| rule.is_self_closing());
          ctx.out.push_str(&fragment.markup);
          OpenNode {
            source_tag: tag,
            output_tag,
            self_closing,
          }
        }
        // Suppressed: nothing emitted now, and nothing to close later
        None => OpenNode {
          source_tag: tag,
          output_tag: rule.output_tag().to_string(),
          self_closing: true,
        },
      }
    } else {
      ctx.out.push('<');
      ctx.out.push_str(rule.output_tag());
      if let Some(attributes) = rule.attribute_literal()
        && !attributes.is_empty()
      {
        ctx.out.push(' ');
        ctx.out.push_str(attributes);
      }
      ctx.out.push_str(if rule.is_self_closing() { " />" } else { ">" });
      OpenNode {
        source_tag: tag,
        output_tag: rule.output_tag().to_string(),
        self_closing: rule.is_self_closing(),
      }
    };

    ctx.nodes.push(node);
  }

  fn handle_end_tag(&self, tag: &str, ctx: &mut ConversionContext) {
    if self.registry.get(tag).is_none() {
      return;
    }

    if ctx.options.plain_text {
      if tag == "P" {
        ctx.out.push('\n');
      }
      return;
    }

    // Stray end tags (more ends than starts) are tolerated as no-ops
    let Some(node) = ctx.nodes.pop() else {
      trace!("ignoring unbalanced end tag: {tag}");
      return;
    };

    if node.self_closing {
      return;
    }

    if let Some(handler) = self.registry.get(&node.source_tag).and_then(TagRule::end_handler) {
      let markup = handler(tag);
      ctx.out.push_str(&markup);
    } else {
      ctx.out.push_str("</");
      ctx.out.push_str(&node.output_tag);
      ctx.out.push('>');
    }
  }

  fn handle_character_data(&self, chunk: &str, ctx: &mut ConversionContext) {
    if ctx.options.plain_text {
      ctx.out.push_str(chunk);
      return;
    }

    // A registered data handler replaces the default normalization entirely
    // and receives the original chunk.
    if let Some(handler) = self.registry.data_handler() {
      let replaced = handler(chunk);
      ctx.out.push_str(&replaced);
    } else if chunk == "&" {
      ctx.out.push_str("&amp;");
    } else {
      ctx.out.push_str(&collapse_whitespace(chunk));
    }
  }
}

/// Repairs the input enough for a standards-compliant streaming parser and
/// wraps it in a synthetic root element, since the dialect permits multiple
/// top-level nodes.
fn prepare(data: &str, options: &ConvertOptions) -> String {
  if options.plain_text {
    return format!("<root>{data}</root>");
  }

  let fixed = HREF_VALUE.replace_all(data, |caps: &regex::Captures| {
    format!(r#"HREF="{}""#, escape::escape_attribute(&caps[1]))
  });
  let fixed = IMG_TAG.replace_all(&fixed, |caps: &regex::Captures| {
    let attributes = caps[1].trim_end().trim_end_matches('/').trim_end();
    format!("<IMG{attributes} />")
  });

  format!("<root>{fixed}</root>")
}

/// Case-folds a raw tag name for registry lookup; registry keys are
/// conventionally uppercase.
fn fold_name(name: &[u8]) -> String {
  String::from_utf8_lossy(name).to_uppercase()
}

/// Collects a start tag's attributes with uppercased names and unescaped
/// values. Malformed attributes are skipped rather than reported.
fn collect_attributes(e: &BytesStart) -> Attributes {
  let mut attrs = Attributes::new();
  for attr in e.attributes().flatten() {
    let key = String::from_utf8_lossy(attr.key.as_ref()).to_uppercase();
    let value = attr
      .unescape_value()
      .map_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned(), Cow::into_owned);
    attrs.insert(key, value);
  }
  attrs
}

/// Resolves an entity reference chunk to the text the data handler sees.
///
/// The parser reports each reference as its own event, so a literal `&amp;`
/// in the input reaches [`Flash2Html::handle_character_data`] as a lone `&`
/// chunk.
fn resolve_entity(entity: &str) -> String {
  match entity {
    "lt" => "<".to_string(),
    "gt" => ">".to_string(),
    "amp" => "&".to_string(),
    "apos" => "'".to_string(),
    "quot" => "\"".to_string(),
    s if s.starts_with('#') => {
      let code = if s.starts_with("#x") || s.starts_with("#X") {
        u32::from_str_radix(&s[2..], 16).ok()
      } else {
        s[1..].parse::<u32>().ok()
      };
      code
        .and_then(char::from_u32)
        .map_or_else(|| format!("&{entity};"), |c| c.to_string())
    }
    _ => format!("&{entity};"),
  }
}

/// Replaces each run of two or more whitespace characters with one
/// non-breaking-space entity per character, preserving the visual spacing
/// that markup rendering would otherwise collapse.
fn collapse_whitespace(chunk: &str) -> String {
  WHITESPACE_RUN
    .replace_all(chunk, |caps: &regex::Captures| "&nbsp;".repeat(caps[0].len()))
    .into_owned()
}
