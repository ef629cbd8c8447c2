//! flash2html library
//!
//! This library converts the non-standard HTML dialect produced by Flash
//! authoring tools (uppercase tags such as `FONT`, `TEXTFORMAT`, `U`) into
//! standard HTML or plain text.

pub mod cli;
pub mod convert;
pub mod error;
