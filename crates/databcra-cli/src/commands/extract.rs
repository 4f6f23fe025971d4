//! Extract command - OCR and field extraction on a local bulletin image.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use tracing::info;

use databcra_core::extract::date::today_in;
use databcra_core::{BackendChain, BulletinImage, BulletinParser, OcrOutcome};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input image file (JPEG or PNG)
    #[arg(required = true)]
    input: PathBuf,

    /// Bulletin date to attach (default: today in the configured timezone)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Preferred OCR backend order (local, cloud, vision); repeatable
    #[arg(long = "ocr-backend")]
    ocr_backends: Vec<String>,

    /// Vision backend API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    vision_api_key: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    if !args.ocr_backends.is_empty() {
        config.ocr.backend_order = args.ocr_backends.clone();
    }
    if args.vision_api_key.is_some() {
        config.ocr.vision_api_key = args.vision_api_key.clone();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let tz = super::resolve_timezone(&config)?;
    let date = args.date.unwrap_or_else(|| today_in(tz));

    let bytes = fs::read(&args.input)?;
    let image = BulletinImage {
        date,
        path: args.input.clone(),
        bytes,
    };

    let chain = BackendChain::from_config(&config.ocr)?;
    let record = match chain.extract(&image).await? {
        OcrOutcome::Record(record) => record,
        OcrOutcome::Text(text) => {
            info!(chars = text.len(), "parsing recognized text");
            let parser = BulletinParser::new(tz, config.extraction.bands.clone());
            parser.parse(&text)?
        }
    };

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
