//! Bulletin data models.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The daily bulletin image, as stored in the local cache.
#[derive(Debug, Clone)]
pub struct BulletinImage {
    /// Calendar date the bulletin was published for.
    pub date: NaiveDate,

    /// Local cache path the image was stored under.
    pub path: PathBuf,

    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

impl BulletinImage {
    /// Decode the cached bytes into an image.
    pub fn decode(&self) -> Result<image::DynamicImage, image::ImageError> {
        image::load_from_memory(&self.bytes)
    }
}

/// The two figures extracted from one daily bulletin.
///
/// `reserves_millions_usd` is mandatory and non-negative. The net
/// currency-market flow is signed (purchases positive, sales negative) and
/// defaults to 0.0 when the bulletin reports no intervention or no figure
/// could be found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletinRecord {
    /// Bulletin date (ISO calendar date).
    pub date: NaiveDate,

    /// Total international reserves, in millions of USD.
    pub reserves_millions_usd: f64,

    /// Net currency-market intervention for the day, in millions of USD.
    #[serde(default)]
    pub net_flow_millions_usd: f64,
}

impl BulletinRecord {
    pub fn new(date: NaiveDate, reserves_millions_usd: f64, net_flow_millions_usd: f64) -> Self {
        Self {
            date,
            reserves_millions_usd,
            net_flow_millions_usd,
        }
    }
}
