//! Interchangeable OCR backends and the chain that tries them in order.
//!
//! Each backend is one implementation of a shared capability: given the
//! bulletin image, produce raw text or the structured record directly.
//! The chain tries backends in configured order and returns the first
//! success; per-backend failures are collected so the final error names
//! every cause.

mod cloud;
mod local;
mod vision;

pub use cloud::DocumentOcrBackend;
pub use local::LocalOcrBackend;
pub use vision::VisionBackend;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{BackendFailure, OcrError};
use crate::models::bulletin::{BulletinImage, BulletinRecord};
use crate::models::config::OcrConfig;

/// What a backend produced: raw text for the parser, or the structured
/// record directly (vision backends emit the target schema themselves).
#[derive(Debug, Clone)]
pub enum OcrOutcome {
    Text(String),
    Record(BulletinRecord),
}

/// One OCR capability: bulletin image in, text or record out.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Stable backend name, used in configuration and error reporting.
    fn name(&self) -> &'static str;

    /// Run this backend once. No internal retry.
    async fn extract(&self, image: &BulletinImage) -> Result<OcrOutcome, OcrError>;
}

/// Known backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Local detection+recognition models.
    Local,
    /// Remote document-OCR service.
    Cloud,
    /// Vision-capable language model emitting the record directly.
    Vision,
}

impl BackendKind {
    /// Default preference order, tried after any operator override.
    pub const DEFAULT_ORDER: [BackendKind; 3] =
        [BackendKind::Local, BackendKind::Vision, BackendKind::Cloud];
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "cloud" => Ok(BackendKind::Cloud),
            "vision" => Ok(BackendKind::Vision),
            other => Err(format!("unknown OCR backend: {other:?}")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::Cloud => write!(f, "cloud"),
            BackendKind::Vision => write!(f, "vision"),
        }
    }
}

/// Resolve the effective backend order: operator override first, then the
/// defaults, de-duplicated.
pub fn resolve_order(preferred: &[BackendKind]) -> Vec<BackendKind> {
    let mut order = Vec::new();
    for kind in preferred.iter().chain(BackendKind::DEFAULT_ORDER.iter()) {
        if !order.contains(kind) {
            order.push(*kind);
        }
    }
    order
}

/// Ordered chain of OCR backends.
pub struct BackendChain {
    backends: Vec<Box<dyn OcrBackend>>,
}

impl fmt::Debug for BackendChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendChain")
            .field(
                "backends",
                &self.backends.iter().map(|b| b.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl BackendChain {
    pub fn new(backends: Vec<Box<dyn OcrBackend>>) -> Self {
        Self { backends }
    }

    /// Build the chain from configuration.
    ///
    /// Unconfigured backends are still constructed; they fail fast at
    /// extraction time and the chain advances past them. An unknown
    /// backend name in the configured order is a configuration error.
    pub fn from_config(config: &OcrConfig) -> crate::error::Result<Self> {
        let preferred = config
            .backend_order
            .iter()
            .map(|s| s.parse::<BackendKind>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(crate::error::HarvestError::Config)?;

        let backends = resolve_order(&preferred)
            .into_iter()
            .map(|kind| -> crate::error::Result<Box<dyn OcrBackend>> {
                Ok(match kind {
                    BackendKind::Local => Box::new(LocalOcrBackend::new(config.model_dir.clone())),
                    BackendKind::Cloud => Box::new(DocumentOcrBackend::new(config)?),
                    BackendKind::Vision => Box::new(VisionBackend::new(config)?),
                })
            })
            .collect::<crate::error::Result<Vec<_>>>()?;

        Ok(Self::new(backends))
    }

    /// Try backends in order; first success wins.
    pub async fn extract(&self, image: &BulletinImage) -> Result<OcrOutcome, OcrError> {
        let mut failures = Vec::new();

        for backend in &self.backends {
            info!(backend = backend.name(), "running OCR backend");
            match backend.extract(image).await {
                Ok(OcrOutcome::Text(text)) if text.trim().is_empty() => {
                    warn!(backend = backend.name(), "backend produced empty output");
                    failures.push(BackendFailure {
                        backend: backend.name().to_string(),
                        reason: OcrError::EmptyOutput.to_string(),
                    });
                }
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "backend failed");
                    failures.push(BackendFailure {
                        backend: backend.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(OcrError::Exhausted(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct StubBackend {
        name: &'static str,
        text: Option<&'static str>,
    }

    #[async_trait]
    impl OcrBackend for StubBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn extract(&self, _image: &BulletinImage) -> Result<OcrOutcome, OcrError> {
            match self.text {
                Some(text) => Ok(OcrOutcome::Text(text.to_string())),
                None => Err(OcrError::Service("connection refused".to_string())),
            }
        }
    }

    fn dummy_image() -> BulletinImage {
        BulletinImage {
            date: chrono::NaiveDate::from_ymd_opt(2026, 1, 19).unwrap(),
            path: std::path::PathBuf::new(),
            bytes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let chain = BackendChain::new(vec![
            Box::new(StubBackend { name: "a", text: None }),
            Box::new(StubBackend { name: "b", text: Some("texto de b") }),
        ]);
        match chain.extract(&dummy_image()).await.unwrap() {
            OcrOutcome::Text(text) => assert_eq!(text, "texto de b"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exhausted_names_all_backends() {
        let chain = BackendChain::new(vec![
            Box::new(StubBackend { name: "a", text: None }),
            Box::new(StubBackend { name: "b", text: None }),
        ]);
        let err = chain.extract(&dummy_image()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("a:"), "missing backend a in {message}");
        assert!(message.contains("b:"), "missing backend b in {message}");
    }

    #[tokio::test]
    async fn test_empty_output_advances() {
        let chain = BackendChain::new(vec![
            Box::new(StubBackend { name: "a", text: Some("   ") }),
            Box::new(StubBackend { name: "b", text: Some("ok") }),
        ]);
        match chain.extract(&dummy_image()).await.unwrap() {
            OcrOutcome::Text(text) => assert_eq!(text, "ok"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_from_config_builds_all_backends() {
        let chain = BackendChain::from_config(&OcrConfig::default()).unwrap();
        assert_eq!(chain.backends.len(), 3);
    }

    #[test]
    fn test_from_config_unknown_backend_is_config_error() {
        let config = OcrConfig {
            backend_order: vec!["tesseract".to_string()],
            ..Default::default()
        };
        let err = BackendChain::from_config(&config).unwrap_err();
        assert!(matches!(err, crate::error::HarvestError::Config(_)));
    }

    #[test]
    fn test_resolve_order_dedup() {
        let order = resolve_order(&[BackendKind::Vision, BackendKind::Local]);
        assert_eq!(
            order,
            vec![BackendKind::Vision, BackendKind::Local, BackendKind::Cloud]
        );
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("local".parse::<BackendKind>().unwrap(), BackendKind::Local);
        assert_eq!(" Vision ".parse::<BackendKind>().unwrap(), BackendKind::Vision);
        assert!("tesseract".parse::<BackendKind>().is_err());
    }
}
