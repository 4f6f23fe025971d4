//! Bulletin image acquisition: session, discovery, download, cache.

pub mod locator;
pub mod session;

pub use locator::{ContentLocator, DiscoveryStrategy};
pub use session::SessionManager;

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::error::{AcquireError, LocateError, Result};
use crate::models::bulletin::BulletinImage;
use crate::models::config::SourceConfig;

/// Generic browser user agent for the media download.
const DOWNLOAD_USER_AGENT: &str = "Mozilla/5.0";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Downloads the located bulletin image, serving the local cache when a
/// copy for the date already exists.
pub struct AcquisitionClient {
    image_dir: PathBuf,
    locator: ContentLocator,
    http: reqwest::Client,
}

impl AcquisitionClient {
    pub fn new(source: SourceConfig, timezone: Tz) -> std::result::Result<Self, AcquireError> {
        let image_dir = source.image_dir.clone();
        let locator = ContentLocator::new(source, timezone);
        let http = reqwest::Client::builder()
            .user_agent(DOWNLOAD_USER_AGENT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;

        Ok(Self {
            image_dir,
            locator,
            http,
        })
    }

    /// Deterministic cache path for a date.
    pub fn image_path(&self, date: NaiveDate) -> PathBuf {
        self.image_dir.join(format!("bcra_{date}.jpg"))
    }

    /// The cached image for the date, if a non-empty file exists.
    pub fn cached(&self, date: NaiveDate) -> std::result::Result<Option<BulletinImage>, AcquireError> {
        let path = self.image_path(date);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.len() > 0 => {
                let bytes = std::fs::read(&path)?;
                Ok(Some(BulletinImage { date, path, bytes }))
            }
            _ => Ok(None),
        }
    }

    /// Acquire the bulletin image for the date.
    ///
    /// Cache first (no network at all on a hit). Otherwise locate the
    /// post and download the image. A session-expired signal from the
    /// locator triggers exactly one login-and-retry cycle; any other
    /// failure is fatal for the run.
    pub async fn acquire(
        &self,
        session: &SessionManager,
        date: NaiveDate,
    ) -> Result<BulletinImage> {
        if let Some(image) = self.cached(date).map_err(crate::error::HarvestError::Acquire)? {
            info!(path = %image.path.display(), "serving cached bulletin image");
            return Ok(image);
        }

        let url = match self.locator.find_image_url(session, date).await {
            Ok(url) => url,
            Err(LocateError::SessionExpired { url }) => {
                warn!(%url, "session expired, re-authenticating");
                session.login().await?;
                self.locator.find_image_url(session, date).await?
            }
            Err(e) => return Err(e.into()),
        };

        info!(%url, "downloading bulletin image");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(AcquireError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquireError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(AcquireError::Network)?.to_vec();

        std::fs::create_dir_all(&self.image_dir).map_err(AcquireError::Io)?;
        let path = self.image_path(date);
        std::fs::write(&path, &bytes).map_err(AcquireError::Io)?;
        info!(path = %path.display(), size = bytes.len(), "bulletin image stored");

        Ok(BulletinImage { date, path, bytes })
    }
}
