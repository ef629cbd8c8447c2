//! Character escaping collaborators for the rewrite engine.
//!
//! Groups the narrow string-in/string-out contracts the engine depends on:
//! attribute escaping, shielding of non-ASCII input from the structural
//! parser, the dialect's glyph substitutions, the legacy byte-level decode
//! step, and `mailto:` obfuscation.

use std::fmt::Write as _;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;

/// `mailto:` href values, up to the closing attribute quote.
static MAILTO_HREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"mailto:(.*?)""#).unwrap());

/// Sequence counter folded into shield markers so concurrent conversions
/// never share one.
static SHIELD_SEQ: AtomicU64 = AtomicU64::new(0);

/// Input with non-ASCII characters replaced by reversible placeholders.
pub struct ShieldedInput {
  /// ASCII-only text safe to hand to the structural parser.
  pub text: String,
  /// Placeholder prefix; each occurrence is followed by 4 lowercase hex
  /// digits naming one UTF-16 code unit.
  pub marker: String,
}

/// Escapes a raw string for use inside a double-quoted attribute value.
///
/// `&` is escaped unconditionally, so values that already contain entities
/// are escaped a second time; the dialect relies on this.
pub fn escape_attribute(value: &str) -> String {
  value
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
}

/// Replaces every non-ASCII character with one placeholder per UTF-16 code
/// unit, shielding it from the structural parser.
///
/// [`restore_entities`] later rewrites each placeholder as a `&#x...;`
/// numeric character reference. Astral characters therefore come back as a
/// surrogate pair of references. ASCII text, including literal `\uXXXX`
/// escape sequences, passes through bit-for-bit.
pub fn shield_non_ascii(input: &str) -> ShieldedInput {
  let stamp = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_nanos())
    .unwrap_or_default();
  let marker = format!("u{stamp:x}x{:x}e", SHIELD_SEQ.fetch_add(1, Ordering::Relaxed));

  let mut text = String::with_capacity(input.len());
  let mut units = [0u16; 2];
  for c in input.chars() {
    if c.is_ascii() {
      text.push(c);
    } else {
      for unit in c.encode_utf16(&mut units) {
        text.push_str(&marker);
        let _ = write!(text, "{unit:04x}");
      }
    }
  }

  ShieldedInput { text, marker }
}

/// Rewrites shield placeholders back into `&#x...;` numeric references.
pub fn restore_entities(text: &str, marker: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut rest = text;

  while let Some(idx) = rest.find(marker) {
    let after = &rest[idx + marker.len()..];
    let hex = after
      .get(..4)
      .filter(|h| h.chars().all(|c| c.is_ascii_digit() || (c.is_ascii_lowercase() && c.is_ascii_hexdigit())));

    match hex {
      Some(hex) => {
        out.push_str(&rest[..idx]);
        out.push_str("&#x");
        out.push_str(hex);
        out.push(';');
        rest = &after[4..];
      }
      None => {
        out.push_str(&rest[..idx + marker.len()]);
        rest = after;
      }
    }
  }

  out.push_str(rest);
  out
}

/// Applies the dialect's glyph substitutions: en dash and right single quote
/// become their entity equivalents.
pub fn substitute_glyphs(text: &str) -> String {
  text.replace('\u{2013}', "&#8211;").replace('\u{2019}', "&rsquo;")
}

/// Legacy byte-level decode applied once near the end of a conversion.
///
/// Characters outside the single-byte range degrade to `?`, matching the
/// historical behaviour of the dialect's byte-oriented pipeline. On shielded
/// content this is the identity.
pub fn legacy_decode(text: &str) -> String {
  text.chars().map(|c| if (c as u32) > 0xFF { '?' } else { c }).collect()
}

/// Rewrites every `mailto:` href value into per-byte hexadecimal numeric
/// character references to defeat naive address harvesting.
///
/// The rewrite is scoped strictly to the href value; surrounding markup is
/// untouched.
pub fn obfuscate_mailto(text: &str) -> String {
  MAILTO_HREF
    .replace_all(text, |caps: &regex::Captures| {
      let mut encoded = String::new();
      for byte in caps[1].bytes() {
        let _ = write!(encoded, "&#x{byte:X};");
      }
      format!("mailto:{encoded}\"")
    })
    .into_owned()
}
