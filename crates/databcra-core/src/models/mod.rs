//! Data models for the bulletin harvester.

pub mod bulletin;
pub mod config;

pub use bulletin::{BulletinImage, BulletinRecord};
pub use config::HarvestConfig;
