//! Command-line interface definitions for flash2html.

use std::path::PathBuf;

use clap::Parser;

use crate::convert::ConvertOptions;

/// flash2html - Convert Flash-authoring markup to standard HTML
#[derive(Debug, Parser)]
#[command(
  name = "flash2html",
  version,
  about = "Convert Flash-authoring markup to standard HTML",
  long_about = "Converts the non-standard HTML dialect produced by Flash authoring tools\n\
                (uppercase tags such as FONT, TEXTFORMAT, U) into standard HTML or plain text."
)]
pub struct Cli {
  /// Input file; reads stdin when absent or "-"
  #[arg(value_name = "FILE")]
  pub input: Option<PathBuf>,

  /// Write output to FILE instead of stdout
  #[arg(short, long, value_name = "FILE")]
  pub output: Option<PathBuf>,

  /// Emit plain text instead of HTML
  #[arg(long)]
  pub plain_text: bool,

  /// Hex-encode mailto: addresses to defeat harvesting
  #[arg(long)]
  pub protect_email: bool,

  /// Increase logging verbosity (-v, -vv, -vvv)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Only log errors
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,
}

impl Cli {
  /// Parse command-line arguments.
  pub fn parse_args() -> Self {
    Self::parse()
  }

  /// Conversion options selected by the flags.
  pub fn options(&self) -> ConvertOptions {
    ConvertOptions {
      plain_text: self.plain_text,
      protect_email: self.protect_email,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_flags_map_to_options() {
    let cli = Cli::parse_from(["flash2html", "--plain-text", "in.txt"]);
    assert!(cli.options().plain_text);
    assert!(!cli.options().protect_email);
    assert_eq!(cli.input.as_deref().unwrap().to_str(), Some("in.txt"));
  }

  #[test]
  fn test_defaults() {
    let cli = Cli::parse_from(["flash2html"]);
    assert_eq!(cli.options(), ConvertOptions::default());
    assert!(cli.input.is_none());
    assert!(cli.output.is_none());
  }
}
