//! Core library for the BCRA daily bulletin harvester.
//!
//! This crate provides:
//! - Authenticated session management and bulletin discovery
//! - Image acquisition with a local per-date cache
//! - OCR via an ordered chain of interchangeable backends
//! - Spanish-locale field extraction (date, reserves, FX net flow)
//! - Idempotent persistence into the destination Postgres tables

pub mod acquire;
pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod store;

pub use acquire::{AcquisitionClient, ContentLocator, DiscoveryStrategy, SessionManager};
pub use error::{HarvestError, Result};
pub use extract::BulletinParser;
pub use models::bulletin::{BulletinImage, BulletinRecord};
pub use models::config::HarvestConfig;
pub use ocr::{BackendChain, OcrBackend, OcrOutcome};
pub use store::PersistenceGateway;
