use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::LearningStyleConfig;
use crate::db::operations::UserMetric;

use super::sanitize::sanitize_payload;

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("No data to send to ML service")]
    EmptyBatch,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: reqwest::StatusCode, body: String },
    #[error("Invalid response from ML service")]
    InvalidResponse,
    #[error("JSON encode/decode failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// One batch call to the learning-style model.
///
/// Implementations return the raw `predictions` member of the response; its
/// shape is checked by the caller.
#[async_trait]
pub trait PredictionClient: Send + Sync {
    async fn predict(&self, metrics: &[UserMetric]) -> Result<Value, PredictionError>;
}

#[derive(Clone)]
pub struct HttpPredictionClient {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpPredictionClient {
    pub fn new(config: &LearningStyleConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.ml_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            url: config.predict_url(),
            timeout: config.ml_timeout,
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict(&self, metrics: &[UserMetric]) -> Result<Value, PredictionError> {
        if metrics.is_empty() {
            return Err(PredictionError::EmptyBatch);
        }

        let payload = sanitize_payload(serde_json::to_value(metrics)?);
        tracing::debug!(url = %self.url, users = metrics.len(), "sending metrics to prediction service");

        let resp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PredictionError::HttpStatus { status, body });
        }

        let bytes = resp.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        extract_predictions(body)
    }
}

fn extract_predictions(body: Value) -> Result<Value, PredictionError> {
    let Value::Object(mut fields) = body else {
        return Err(PredictionError::InvalidResponse);
    };
    match fields.remove("predictions") {
        Some(value) if is_truthy(&value) => Ok(value),
        _ => Err(PredictionError::InvalidResponse),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A prediction entry after lenient field extraction. Entries without a
/// usable `user_id` or `learning_style` are skipped by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub user_id: Option<i64>,
    pub learning_style: Option<String>,
    pub description: Option<String>,
    pub recommendations: Vec<String>,
    pub avg_completion_ratio: Option<f64>,
}

impl RawPrediction {
    pub fn from_value(value: &Value) -> Self {
        let recommendations = value
            .get("suggestions")
            .or_else(|| value.get("recommendations"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            user_id: value.get("user_id").and_then(parse_user_id),
            learning_style: non_blank(value.get("learning_style")),
            description: non_blank(value.get("description")),
            recommendations,
            avg_completion_ratio: value
                .get("avg_completion_ratio")
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite()),
        }
    }
}

fn parse_user_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    (id > 0).then_some(id)
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
