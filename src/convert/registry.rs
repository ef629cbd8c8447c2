//! Tag transformation registry.
//!
//! Maps source dialect tag names (conventionally uppercase) to transformation
//! rules. A rule is either declarative (rename the tag, optionally carrying a
//! literal attribute string) or programmatic (start/end handlers that build
//! the output fragment from the source attributes).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Attributes of one start tag, keyed by uppercased attribute name.
pub type Attributes = HashMap<String, String>;

/// Handler invoked for a start tag. Returning `None` suppresses the tag
/// entirely: no output now, and no closing tag later.
pub type StartHandler = Box<dyn Fn(&str, &Attributes) -> Option<StartFragment> + Send + Sync>;

/// Handler invoked for an end tag; the returned markup is appended verbatim.
pub type EndHandler = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Engine-wide character data hook. When registered, its result replaces the
/// default whitespace/entity normalization (it receives the original chunk).
pub type DataHandler = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Bare identifier form accepted by [`TagRegistry::define_mapping`].
static BARE_TARGET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+$").unwrap());

/// Template form: `<tag attr="..." />` with an optional self-closing marker.
static TEMPLATE_TARGET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<(\w+)\s+(.*?)\s*(/)?>$").unwrap());

/// Structured result of a start handler.
///
/// Carries the markup to append plus the resolved output tag and self-closing
/// flag, so the engine never has to re-parse its own generated markup to
/// learn what closing tag to emit.
pub struct StartFragment {
  /// Markup appended to the output buffer.
  pub markup: String,
  /// Output tag name for the matching end tag; `None` keeps the rule's tag.
  pub resolved_tag: Option<String>,
  /// Whether the fragment is already complete; `None` keeps the rule's flag.
  pub self_closing: Option<bool>,
}

impl StartFragment {
  /// Fragment that opens an element to be closed as `</tag>` later.
  pub fn open(tag: impl Into<String>, markup: impl Into<String>) -> Self {
    Self {
      markup: markup.into(),
      resolved_tag: Some(tag.into()),
      self_closing: Some(false),
    }
  }

  /// Fragment that is fully emitted at start; no closing tag follows.
  pub fn complete(markup: impl Into<String>) -> Self {
    Self {
      markup: markup.into(),
      resolved_tag: None,
      self_closing: Some(true),
    }
  }

  /// Emits nothing at start but keeps the rule's closing behaviour, so a
  /// registered end handler still fires.
  pub fn silent() -> Self {
    Self {
      markup: String::new(),
      resolved_tag: None,
      self_closing: None,
    }
  }
}

/// Transformation rule for one source tag.
pub struct TagRule {
  /// Output tag name used when no handler overrides it.
  pub(crate) output_tag: String,
  /// Literal attribute text copied verbatim when no start handler is set.
  pub(crate) attributes: Option<String>,
  /// Emit the tag as `<tag ... />` with no separate closing tag.
  pub(crate) self_closing: bool,
  pub(crate) start_handler: Option<StartHandler>,
  pub(crate) end_handler: Option<EndHandler>,
}

impl TagRule {
  /// Output tag name used when no handler overrides it.
  pub fn output_tag(&self) -> &str {
    &self.output_tag
  }

  /// Literal attribute text stored from a template mapping, if any.
  pub fn attribute_literal(&self) -> Option<&str> {
    self.attributes.as_deref()
  }

  /// Whether the tag is emitted as `<tag ... />`.
  pub fn is_self_closing(&self) -> bool {
    self.self_closing
  }

  pub(crate) fn start_handler(&self) -> Option<&StartHandler> {
    self.start_handler.as_ref()
  }

  pub(crate) fn end_handler(&self) -> Option<&EndHandler> {
    self.end_handler.as_ref()
  }

  fn renamed(output_tag: String) -> Self {
    Self {
      output_tag,
      attributes: None,
      self_closing: false,
      start_handler: None,
      end_handler: None,
    }
  }
}

/// Registry of per-tag transformation rules plus the single engine-wide data
/// handler.
///
/// Tags absent from the registry are transparent: the engine emits neither
/// the tag nor a replacement, but their character data still streams through.
#[derive(Default)]
pub struct TagRegistry {
  rules: HashMap<String, TagRule>,
  data_handler: Option<DataHandler>,
}

impl TagRegistry {
  /// Creates an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Declares a tag mapping.
  ///
  /// `target` is either a bare identifier ("rename to this tag") or a
  /// template of the form `<tag attr="..." />` whose attribute text is reused
  /// verbatim on every occurrence. Re-invoking for the same source tag
  /// replaces the rule, clearing any handlers. Malformed targets are silently
  /// ignored; this lenient policy is part of the dialect contract.
  pub fn define_mapping(&mut self, source_tag: &str, target: &str) {
    if BARE_TARGET.is_match(target) {
      self.rules.insert(source_tag.to_string(), TagRule::renamed(target.to_string()));
    } else if let Some(caps) = TEMPLATE_TARGET.captures(target) {
      let rule = TagRule {
        output_tag: caps[1].to_string(),
        attributes: Some(caps[2].to_string()),
        self_closing: caps.get(3).is_some(),
        start_handler: None,
        end_handler: None,
      };
      self.rules.insert(source_tag.to_string(), rule);
    } else {
      debug!("ignoring malformed tag mapping target for {source_tag}: {target}");
    }
  }

  /// Registers a start handler, auto-creating a rule (output tag defaults to
  /// the lower-cased source tag) when none exists yet.
  pub fn set_start_handler<F>(&mut self, source_tag: &str, handler: F)
  where
    F: Fn(&str, &Attributes) -> Option<StartFragment> + Send + Sync + 'static,
  {
    self.ensure_rule(source_tag);
    if let Some(rule) = self.rules.get_mut(source_tag) {
      rule.start_handler = Some(Box::new(handler));
    }
  }

  /// Registers an end handler, auto-creating a rule when none exists yet.
  pub fn set_end_handler<F>(&mut self, source_tag: &str, handler: F)
  where
    F: Fn(&str) -> String + Send + Sync + 'static,
  {
    self.ensure_rule(source_tag);
    if let Some(rule) = self.rules.get_mut(source_tag) {
      rule.end_handler = Some(Box::new(handler));
    }
  }

  /// Registers the engine-wide character data handler.
  pub fn set_data_handler<F>(&mut self, handler: F)
  where
    F: Fn(&str) -> String + Send + Sync + 'static,
  {
    self.data_handler = Some(Box::new(handler));
  }

  /// Clears the start handler without deleting the rule. No-op on unknown
  /// tags.
  pub fn remove_start_handler(&mut self, source_tag: &str) {
    if let Some(rule) = self.rules.get_mut(source_tag) {
      rule.start_handler = None;
    }
  }

  /// Clears the end handler without deleting the rule. No-op on unknown tags.
  pub fn remove_end_handler(&mut self, source_tag: &str) {
    if let Some(rule) = self.rules.get_mut(source_tag) {
      rule.end_handler = None;
    }
  }

  /// Clears the engine-wide data handler.
  pub fn remove_data_handler(&mut self) {
    self.data_handler = None;
  }

  /// Deletes the rule entirely, so the tag (but not its children or text) is
  /// dropped from future conversions. No-op on unknown tags.
  pub fn ignore_tag(&mut self, source_tag: &str) {
    self.rules.remove(source_tag);
  }

  pub(crate) fn get(&self, source_tag: &str) -> Option<&TagRule> {
    self.rules.get(source_tag)
  }

  pub(crate) fn data_handler(&self) -> Option<&DataHandler> {
    self.data_handler.as_ref()
  }

  fn ensure_rule(&mut self, source_tag: &str) {
    if !self.rules.contains_key(source_tag) {
      self.define_mapping(source_tag, &source_tag.to_lowercase());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_define_bare_mapping() {
    let mut registry = TagRegistry::new();
    registry.define_mapping("B", "strong");

    let rule = registry.get("B").unwrap();
    assert_eq!(rule.output_tag, "strong");
    assert_eq!(rule.attributes, None);
    assert!(!rule.self_closing);
  }

  #[test]
  fn test_define_template_mapping() {
    let mut registry = TagRegistry::new();
    registry.define_mapping("HR", r#"<hr class="rule" />"#);

    let rule = registry.get("HR").unwrap();
    assert_eq!(rule.output_tag, "hr");
    assert_eq!(rule.attributes.as_deref(), Some(r#"class="rule""#));
    assert!(rule.self_closing);
  }

  #[test]
  fn test_define_template_mapping_without_marker() {
    let mut registry = TagRegistry::new();
    registry.define_mapping("Q", r#"<blockquote class="pull">"#);

    let rule = registry.get("Q").unwrap();
    assert_eq!(rule.output_tag, "blockquote");
    assert_eq!(rule.attributes.as_deref(), Some(r#"class="pull""#));
    assert!(!rule.self_closing);
  }

  #[test]
  fn test_malformed_target_is_ignored() {
    let mut registry = TagRegistry::new();
    registry.define_mapping("B", "<not a template");
    assert!(registry.get("B").is_none());

    registry.define_mapping("B", "str ong");
    assert!(registry.get("B").is_none());
  }

  #[test]
  fn test_redefining_replaces_rule_and_clears_handlers() {
    let mut registry = TagRegistry::new();
    registry.set_start_handler("B", |_, _| Some(StartFragment::open("b", "<b>")));
    registry.define_mapping("B", "strong");

    let rule = registry.get("B").unwrap();
    assert_eq!(rule.output_tag, "strong");
    assert!(rule.start_handler.is_none());
  }

  #[test]
  fn test_handler_registration_auto_creates_rule() {
    let mut registry = TagRegistry::new();
    registry.set_end_handler("SPECIAL", |_| String::from("</em>"));

    let rule = registry.get("SPECIAL").unwrap();
    assert_eq!(rule.output_tag, "special");
    assert!(rule.end_handler.is_some());
  }

  #[test]
  fn test_ignore_tag_removes_rule() {
    let mut registry = TagRegistry::new();
    registry.define_mapping("B", "strong");
    registry.ignore_tag("B");
    assert!(registry.get("B").is_none());

    // Idempotent on unknown tags
    registry.ignore_tag("B");
    registry.remove_start_handler("B");
    registry.remove_end_handler("B");
  }
}
