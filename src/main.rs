//! flash2html - Convert Flash-authoring markup to standard HTML
//!
//! This is the main entry point for the CLI application.

use std::io::Read;
use std::process;
use std::{fs, io};

use anyhow::Context;
use flash2html::cli::Cli;
use flash2html::convert::Flash2Html;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

fn main() {
  let cli = Cli::parse_args();

  init_tracing(&cli);

  if let Err(e) = run(&cli) {
    eprintln!("Error: {e:#}");
    process::exit(1);
  }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
  let input = match &cli.input {
    Some(path) if path.as_os_str() != "-" => {
      fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    }
    _ => {
      let mut buffer = String::new();
      io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read standard input")?;
      buffer
    }
  };

  let engine = Flash2Html::new();
  let output = engine
    .convert_with_options(&input, &cli.options())
    .context("conversion failed")?;

  match &cli.output {
    Some(path) => {
      fs::write(path, &output).with_context(|| format!("failed to write {}", path.display()))?;
    }
    None => print!("{output}"),
  }

  Ok(())
}

fn init_tracing(cli: &Cli) {
  let level = if cli.quiet {
    LevelFilter::ERROR
  } else {
    match cli.verbose {
      0 => LevelFilter::WARN,
      1 => LevelFilter::INFO,
      2 => LevelFilter::DEBUG,
      _ => LevelFilter::TRACE,
    }
  };

  let env_filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();

  let _ = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}
