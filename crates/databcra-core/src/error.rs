//! Error types for the databcra-core library.

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for the harvester.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Session/login error.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Bulletin discovery error.
    #[error("locate error: {0}")]
    Locate(#[from] LocateError),

    /// Image download error.
    #[error("acquisition error: {0}")]
    Acquire(#[from] AcquireError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Destination store error.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors from session management and automated login.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The session is invalid and no credentials are configured.
    #[error("session invalid and no credentials configured")]
    NoCredentials,

    /// A login form field could not be located with any known selector.
    #[error("login field not found: {0}")]
    FieldNotFound(String),

    /// The login flow completed but the platform rejected it.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// WebDriver-level failure.
    #[error("webdriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),
}

/// Errors from bulletin discovery.
#[derive(Error, Debug)]
pub enum LocateError {
    /// A strategy landed on a login surface; the session must be refreshed.
    #[error("session expired (redirected to {url})")]
    SessionExpired { url: String },

    /// Every strategy exhausted its budget without a match.
    #[error("bulletin not found for {date} (last url: {last_url}, page title: {page_title:?})")]
    NotFound {
        date: NaiveDate,
        last_url: String,
        page_title: String,
    },

    /// WebDriver-level failure.
    #[error("webdriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),
}

/// Errors from image download and caching.
#[derive(Error, Debug)]
pub enum AcquireError {
    /// The media server answered with a non-success status.
    #[error("download failed with status {status} for {url}")]
    Status { status: u16, url: String },

    /// Network-level download failure (including timeouts).
    #[error("download failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Local cache read/write failure.
    #[error("image cache I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from OCR backends and the backend chain.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load local OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Local recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Remote OCR service failure.
    #[error("OCR service error: {0}")]
    Service(String),

    /// Vision model failure (transport or malformed reply).
    #[error("vision model error: {0}")]
    Vision(String),

    /// A backend produced no usable text.
    #[error("backend produced empty output")]
    EmptyOutput,

    /// The backend is not configured (missing endpoint or API key).
    #[error("backend not configured: {0}")]
    NotConfigured(String),

    /// Every configured backend failed.
    #[error("all OCR backends failed: {}", format_failures(.0))]
    Exhausted(Vec<BackendFailure>),
}

/// One backend's failure, kept for the aggregated chain error.
#[derive(Debug)]
pub struct BackendFailure {
    pub backend: String,
    pub reason: String,
}

fn format_failures(failures: &[BackendFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.backend, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from bulletin field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Required field is missing after all heuristics.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Failed to parse a value.
    #[error("failed to parse {field}: {value:?}")]
    Parse { field: String, value: String },
}

/// Errors from the destination store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Pre-write validation failed; nothing was written.
    #[error("validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A destination table write failed.
    #[error("write to {table} failed: {source}")]
    Write {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    /// Connection-level database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for the databcra library.
pub type Result<T> = std::result::Result<T, HarvestError>;
