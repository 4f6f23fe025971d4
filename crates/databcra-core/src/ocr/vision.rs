//! Vision language-model backend.
//!
//! Prompts a vision-capable chat-completions model to emit the target
//! schema directly, bypassing free-text parsing for this backend only.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::OcrError;
use crate::models::bulletin::{BulletinImage, BulletinRecord};
use crate::models::config::OcrConfig;

use super::{OcrBackend, OcrOutcome};

const SYSTEM_PROMPT: &str = "Sos un extractor que devuelve JSON válido y nada más.";

const USER_PROMPT: &str = "Procesá la imagen y devolvé SOLO un JSON con los campos: \
'fecha' (yyyy-mm-dd), 'reservas_millones_usd' (float), \
'compra_venta_divisas_millones_usd' (float). \
Si Compra/Venta dice 'Sin intervención', devolvé 0.0. \
Si dice Venta de divisas en millones de USD, usá ese valor negativo. \
Si dice Compra de divisas en millones de USD, usá ese valor positivo. \
No incluyas texto fuera del JSON.";

/// OCR backend asking a vision model for the structured record.
pub struct VisionBackend {
    api_base: String,
    api_key: Option<String>,
    model: String,
    http: reqwest::Client,
}

/// The schema the model is instructed to emit.
#[derive(Debug, Deserialize)]
struct VisionReply {
    fecha: String,
    reservas_millones_usd: f64,
    #[serde(default)]
    compra_venta_divisas_millones_usd: f64,
}

impl VisionBackend {
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OcrError::Vision(format!("http client: {e}")))?;

        Ok(Self {
            api_base: config.vision_api_base.trim_end_matches('/').to_string(),
            api_key: config.vision_api_key.clone(),
            model: config.vision_model.clone(),
            http,
        })
    }
}

#[async_trait]
impl OcrBackend for VisionBackend {
    fn name(&self) -> &'static str {
        "vision"
    }

    async fn extract(&self, image: &BulletinImage) -> Result<OcrOutcome, OcrError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| OcrError::NotConfigured("no vision API key".to_string()))?;

        let mime = match image.path.extension().and_then(|e| e.to_str()) {
            Some("png") => "image/png",
            _ => "image/jpeg",
        };
        let data_url = format!("data:{mime};base64,{}", BASE64.encode(&image.bytes));

        let payload = json!({
            "model": self.model,
            "temperature": 0,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": [
                    {"type": "text", "text": USER_PROMPT},
                    {"type": "image_url", "image_url": {"url": data_url}},
                ]},
            ],
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| OcrError::Vision(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OcrError::Vision(format!("API answered {status}")));
        }

        let reply: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OcrError::Vision(format!("malformed reply: {e}")))?;

        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| OcrError::Vision("reply has no message content".to_string()))?;

        debug!(chars = content.len(), "vision model replied");

        let record = parse_reply(content)?;
        Ok(OcrOutcome::Record(record))
    }
}

/// Parse the model's JSON reply into a record.
fn parse_reply(content: &str) -> Result<BulletinRecord, OcrError> {
    let reply: VisionReply = serde_json::from_str(content.trim())
        .map_err(|e| OcrError::Vision(format!("reply is not the expected JSON: {e}")))?;

    let date = NaiveDate::parse_from_str(&reply.fecha, "%Y-%m-%d")
        .map_err(|_| OcrError::Vision(format!("invalid date in reply: {:?}", reply.fecha)))?;

    Ok(BulletinRecord::new(
        date,
        reply.reservas_millones_usd,
        reply.compra_venta_divisas_millones_usd,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_reply() {
        let content = r#"{"fecha": "2026-01-19", "reservas_millones_usd": 44808.0,
            "compra_venta_divisas_millones_usd": 231.0}"#;
        let record = parse_reply(content).unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 1, 19).unwrap());
        assert_eq!(record.reserves_millions_usd, 44_808.0);
        assert_eq!(record.net_flow_millions_usd, 231.0);
    }

    #[test]
    fn test_parse_reply_missing_flow_defaults() {
        let content = r#"{"fecha": "2026-01-19", "reservas_millones_usd": 44808.0}"#;
        let record = parse_reply(content).unwrap();
        assert_eq!(record.net_flow_millions_usd, 0.0);
    }

    #[test]
    fn test_parse_reply_bad_date() {
        let content = r#"{"fecha": "19/01/2026", "reservas_millones_usd": 44808.0}"#;
        assert!(parse_reply(content).is_err());
    }

    #[test]
    fn test_parse_reply_not_json() {
        assert!(parse_reply("lo siento, no puedo").is_err());
    }
}
