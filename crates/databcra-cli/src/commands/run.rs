//! Run command - the full daily harvest pipeline.
//!
//! Session, discovery, download, OCR, extraction, persistence. Credentials
//! and connection parameters come from the environment when not given as
//! flags.

use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::Args;
use console::style;
use tracing::{info, warn};

use databcra_core::extract::date::today_in;
use databcra_core::models::config::HarvestConfig;
use databcra_core::{
    AcquisitionClient, BackendChain, BulletinParser, OcrOutcome, PersistenceGateway,
    SessionManager,
};

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Target bulletin date (default: today in the configured timezone)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Preferred OCR backend order (local, cloud, vision); repeatable
    #[arg(long = "ocr-backend")]
    ocr_backends: Vec<String>,

    /// Extract only, skip the database write
    #[arg(long)]
    no_store: bool,

    /// Platform account username
    #[arg(long, env = "X_USERNAME")]
    username: Option<String>,

    /// Platform account password
    #[arg(long, env = "X_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Vision backend API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    vision_api_key: Option<String>,

    /// Document-OCR service endpoint
    #[arg(long, env = "OCR_SERVICE_URL")]
    ocr_service_url: Option<String>,

    /// Document-OCR service API key
    #[arg(long, env = "OCR_SERVICE_KEY", hide_env_values = true)]
    ocr_service_key: Option<String>,

    /// Database host
    #[arg(long, env = "POSTGRES_HOST")]
    db_host: Option<String>,

    /// Database user
    #[arg(long, env = "POSTGRES_USER")]
    db_user: Option<String>,

    /// Database password
    #[arg(long, env = "POSTGRES_PASSWORD", hide_env_values = true)]
    db_password: Option<String>,

    /// Database name
    #[arg(long, env = "POSTGRES_DB")]
    db_name: Option<String>,
}

pub async fn run(args: RunArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    apply_overrides(&mut config, &args);

    let tz = super::resolve_timezone(&config)?;
    let date = args.date.unwrap_or_else(|| today_in(tz));

    println!(
        "{} Harvesting bulletin for {}",
        style("→").cyan(),
        style(date).bold()
    );

    let client = AcquisitionClient::new(config.source.clone(), tz)?;

    // A cached day never touches the platform; the browser only comes
    // up on a miss.
    let image = match client.cached(date)? {
        Some(image) => {
            println!(
                "{} Using cached image ({} bytes)",
                style("✓").green(),
                image.bytes.len()
            );
            image
        }
        None => {
            let session = SessionManager::connect(config.session.clone()).await?;
            let acquired = client.acquire(&session, date).await;

            // The browser must come down even when acquisition failed.
            if let Err(e) = session.close().await {
                warn!(error = %e, "browser session did not close cleanly");
            }

            let image = acquired?;
            println!(
                "{} Image acquired ({} bytes)",
                style("✓").green(),
                image.bytes.len()
            );
            image
        }
    };

    let record = recognize(&config, tz, &image).await?;
    println!("{} Extracted record:", style("✓").green());
    println!("{}", serde_json::to_string_pretty(&record)?);

    if args.no_store {
        println!(
            "{} Skipping database write (--no-store)",
            style("ℹ").blue()
        );
        return Ok(());
    }

    let gateway = PersistenceGateway::connect(&config.store).await?;
    let outcome = gateway.upsert(&record).await;
    gateway.close().await;
    outcome?;

    println!("{} Stored record for {}", style("✓").green(), record.date);
    Ok(())
}

async fn recognize(
    config: &HarvestConfig,
    tz: Tz,
    image: &databcra_core::BulletinImage,
) -> anyhow::Result<databcra_core::BulletinRecord> {
    let chain = BackendChain::from_config(&config.ocr)?;
    match chain.extract(image).await? {
        OcrOutcome::Record(record) => Ok(record),
        OcrOutcome::Text(text) => {
            info!(chars = text.len(), "parsing recognized text");
            let parser = BulletinParser::new(tz, config.extraction.bands.clone());
            Ok(parser.parse(&text)?)
        }
    }
}

fn apply_overrides(config: &mut HarvestConfig, args: &RunArgs) {
    if args.username.is_some() {
        config.session.username = args.username.clone();
    }
    if args.password.is_some() {
        config.session.password = args.password.clone();
    }
    if !args.ocr_backends.is_empty() {
        config.ocr.backend_order = args.ocr_backends.clone();
    }
    if args.vision_api_key.is_some() {
        config.ocr.vision_api_key = args.vision_api_key.clone();
    }
    if args.ocr_service_url.is_some() {
        config.ocr.service_url = args.ocr_service_url.clone();
    }
    if args.ocr_service_key.is_some() {
        config.ocr.service_key = args.ocr_service_key.clone();
    }
    if let Some(host) = &args.db_host {
        config.store.host = host.clone();
    }
    if let Some(user) = &args.db_user {
        config.store.user = user.clone();
    }
    if let Some(password) = &args.db_password {
        config.store.password = password.clone();
    }
    if let Some(dbname) = &args.db_name {
        config.store.dbname = dbname.clone();
    }
}
