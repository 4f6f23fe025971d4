//! Local OCR backend backed by `pure-onnx-ocr`.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::bulletin::BulletinImage;

use super::{OcrBackend, OcrOutcome};

/// OCR backend running detection and recognition models locally.
///
/// Models are loaded from `model_dir` on first use; a missing model file
/// is this backend's failure and lets the chain advance.
pub struct LocalOcrBackend {
    model_dir: PathBuf,
}

impl LocalOcrBackend {
    pub fn new(model_dir: PathBuf) -> Self {
        Self { model_dir }
    }

    fn load_engine(&self) -> Result<pure_onnx_ocr::engine::OcrEngine, OcrError> {
        let det_path = self.model_dir.join("det.onnx");
        let rec_path = self.model_dir.join("latin_rec.onnx");
        let dict_path = self.model_dir.join("latin_dict.txt");

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {e}")))?;

        info!("loaded OCR models from {}", self.model_dir.display());
        Ok(engine)
    }
}

#[async_trait]
impl OcrBackend for LocalOcrBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn extract(&self, image: &BulletinImage) -> Result<OcrOutcome, OcrError> {
        let engine = self.load_engine()?;

        let decoded = image
            .decode()
            .map_err(|e| OcrError::Recognition(format!("image decode: {e}")))?;

        let mut regions = engine
            .run_from_image(&decoded)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {e}")))?;

        debug!(regions = regions.len(), "local OCR finished");

        // Reading order: group by approximate row, then left-to-right.
        regions.sort_by(|a, b| {
            let (ax, ay) = top_left(&a.bounding_box);
            let (bx, by) = top_left(&b.bounding_box);
            let row_a = (ay / 20.0) as i64;
            let row_b = (by / 20.0) as i64;
            if row_a != row_b {
                row_a.cmp(&row_b)
            } else {
                ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
            }
        });

        let text = regions
            .iter()
            .map(|r| r.text.replace("[UNK]", " "))
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(OcrError::EmptyOutput);
        }

        Ok(OcrOutcome::Text(text))
    }
}

/// First exterior coordinate of a region polygon.
fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f64, f64) {
    polygon
        .exterior()
        .coords()
        .next()
        .map(|c| (c.x, c.y))
        .unwrap_or((0.0, 0.0))
}
