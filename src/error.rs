//! Error types for the conversion engine.

/// Errors surfaced by the conversion engine.
///
/// Almost everything in the dialect is handled leniently (unknown tags are
/// skipped, malformed mapping templates are ignored, stray end tags are
/// no-ops). Only two conditions are reported to the caller.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConvertError {
  /// The underlying streaming parser rejected the input as not well-formed,
  /// even after the preparation pass.
  #[error("malformed markup at byte {position}: {source}")]
  MarkupParse {
    /// Byte offset into the prepared (wrapped) input.
    position: u64,
    /// Parser error.
    source: quick_xml::Error,
  },

  /// A conversion option was referenced by a name outside the fixed option
  /// set.
  #[error("unknown conversion option: {0}")]
  UnknownOption(String),
}
