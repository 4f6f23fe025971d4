//! Parse command - field extraction from already-recognized text.
//!
//! Useful for replaying stored OCR output against the extraction rules
//! without a browser, OCR models, or network access.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use databcra_core::BulletinParser;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Input text file with recognized bulletin text
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let tz = super::resolve_timezone(&config)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let text = fs::read_to_string(&args.input)?;
    let parser = BulletinParser::new(tz, config.extraction.bands.clone());
    let record = parser.parse(&text)?;

    let output = serde_json::to_string_pretty(&record)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{output}");
    }

    Ok(())
}
