//! CLI subcommands.

pub mod config;
pub mod extract;
pub mod parse;
pub mod run;

use std::path::Path;

use chrono_tz::Tz;

use databcra_core::models::config::HarvestConfig;

/// Load configuration from the given path, or defaults when absent.
pub(crate) fn load_config(path: Option<&str>) -> anyhow::Result<HarvestConfig> {
    match path {
        Some(p) => Ok(HarvestConfig::from_file(Path::new(p))?),
        None => Ok(HarvestConfig::default()),
    }
}

/// Parse the configured IANA timezone.
pub(crate) fn resolve_timezone(config: &HarvestConfig) -> anyhow::Result<Tz> {
    config
        .source
        .timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {}", config.source.timezone))
}
