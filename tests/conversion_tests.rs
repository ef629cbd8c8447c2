//! End-to-end conversion tests against the public API.
//!
//! These exercise complete documents through the full path: shielding,
//! preparation, the streaming pass, and the cleanup pipeline.

use flash2html::convert::{ConvertOptions, Flash2Html};
use flash2html::error::ConvertError;
use pretty_assertions::assert_eq;

const SAMPLE: &str = concat!(
  r#"<TEXTFORMAT BLOCKINDENT="20"><P>Intro  text &amp; more</P></TEXTFORMAT>"#,
  r#"<P><FONT FACE="Arial" SIZE="12">styled</FONT></P>"#,
  r#"<LI><A HREF="http://e.com"><U>link</U></A></LI><LI><B>bold</B> item</LI>"#,
  r#"<P>outro</P>"#
);

#[test]
fn test_full_document() {
  let engine = Flash2Html::new();
  let output = engine.convert(SAMPLE).unwrap();

  insta::assert_snapshot!(
    output.escape_default(),
    @r#"<div style=\"margin-left: 20px; \">Intro&nbsp;&nbsp;text &amp; more<br />\n</div><span style=\"font-family: \'Arial\'; font-size: 12px; \">styled</span><ul>\n\t<li><a href=\"http://e.com\">link</a></li>\n\t<li><strong>bold</strong> item</li>\n</ul>\noutro"#
  );
}

#[test]
fn test_full_document_plain_text() {
  let engine = Flash2Html::new();
  let options = ConvertOptions {
    plain_text: true,
    ..Default::default()
  };
  let output = engine.convert_with_options(SAMPLE, &options).unwrap();
  assert_eq!(output, "Intro  text & more\nstyled\nlinkbold itemoutro\n");
}

#[test]
fn test_engine_is_reusable_across_calls() {
  let engine = Flash2Html::new();
  let first = engine.convert(SAMPLE).unwrap();
  let second = engine.convert(SAMPLE).unwrap();
  assert_eq!(first, second);

  // A conversion with per-call options does not disturb later default calls
  let options = ConvertOptions {
    plain_text: true,
    ..Default::default()
  };
  engine.convert_with_options(SAMPLE, &options).unwrap();
  assert_eq!(engine.convert(SAMPLE).unwrap(), first);
}

#[test]
fn test_instance_options_apply_to_default_conversions() {
  let mut engine = Flash2Html::new();
  engine.options_mut().set("plain_text", true).unwrap();
  assert_eq!(engine.convert("<P>a</P>").unwrap(), "a\n");
}

#[test]
fn test_unknown_option_name_is_rejected() {
  let mut engine = Flash2Html::new();
  let err = engine.options_mut().set("protectEmail", true).unwrap_err();
  assert!(matches!(err, ConvertError::UnknownOption(_)));
}

#[test]
fn test_custom_template_mapping_with_self_closing_marker() {
  let mut engine = Flash2Html::new();
  engine.registry_mut().define_mapping("HR", r#"<hr class="sep" />"#);
  assert_eq!(engine.convert("<HR></HR>x").unwrap(), r#"<hr class="sep" />x"#);
}

#[test]
fn test_removing_start_handler_falls_back_to_rename() {
  let mut engine = Flash2Html::new();
  engine.registry_mut().remove_start_handler("U");
  assert_eq!(engine.convert("<U>x</U>").unwrap(), "<u>x</u>");
}

#[test]
fn test_removing_data_handler_restores_default_normalization() {
  let mut engine = Flash2Html::new();
  engine.registry_mut().set_data_handler(|_| String::from("?"));
  assert_eq!(engine.convert("ab").unwrap(), "?");

  engine.registry_mut().remove_data_handler();
  assert_eq!(engine.convert("ab").unwrap(), "ab");
}

#[test]
fn test_empty_font_span_is_cleaned_up() {
  let engine = Flash2Html::new();
  assert_eq!(engine.convert("<FONT></FONT>done").unwrap(), "done");
}

#[test]
fn test_protect_email_hides_address() {
  let engine = Flash2Html::new();
  let options = ConvertOptions {
    protect_email: true,
    ..Default::default()
  };
  let output = engine
    .convert_with_options(r#"<P><A HREF="mailto:team@example.org">write us</A></P>"#, &options)
    .unwrap();
  assert!(!output.contains("team@example.org"));
  assert!(output.contains(r#"<a href="mailto:&#x74;"#));
  assert!(output.ends_with(r#">write us</a>"#));
}

#[test]
fn test_malformed_markup_is_reported() {
  let engine = Flash2Html::new();
  let err = engine.convert("fine until <!-- the end").unwrap_err();
  let message = err.to_string();
  assert!(message.starts_with("malformed markup at byte"), "unexpected: {message}");
}
