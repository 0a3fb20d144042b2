use std::collections::HashMap;
use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::operations::{LearningStyleUpsert, UserMetric};
use crate::db::{Repository, StorageError};

use super::fallback;
use super::period::{Period, PeriodError};
use super::prediction::{PredictionClient, RawPrediction};

const MISSING_DESCRIPTION: &str = "Description not available";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidPeriod(#[from] PeriodError),
    #[error("Invalid predictions format received from ML service")]
    InvalidPredictions,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReport {
    pub processed_users: usize,
    pub period: String,
    pub status: String,
    pub message: String,
}

impl ProcessReport {
    fn success(processed_users: usize, period: &Period, message: String) -> Self {
        Self {
            processed_users,
            period: period.to_string(),
            status: "success".to_string(),
            message,
        }
    }
}

/// Where the predictions of one run came from. Both arms end up as the same
/// list of entries before anything is written.
#[derive(Debug)]
pub enum PredictionOutcome {
    Predicted(Value),
    Degraded(Vec<RawPrediction>),
}

impl PredictionOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    pub fn into_predictions(self) -> Result<Vec<RawPrediction>, PipelineError> {
        match self {
            Self::Predicted(Value::Array(items)) => {
                Ok(items.iter().map(RawPrediction::from_value).collect())
            }
            Self::Predicted(_) => Err(PipelineError::InvalidPredictions),
            Self::Degraded(predictions) => Ok(predictions),
        }
    }
}

/// Monthly learning-style classification: aggregate, predict, upsert.
pub struct LearningStylePipeline {
    repo: Arc<dyn Repository>,
    predictor: Arc<dyn PredictionClient>,
    timezone: FixedOffset,
}

impl LearningStylePipeline {
    pub fn new(
        repo: Arc<dyn Repository>,
        predictor: Arc<dyn PredictionClient>,
        timezone: FixedOffset,
    ) -> Self {
        Self {
            repo,
            predictor,
            timezone,
        }
    }

    pub fn timezone(&self) -> FixedOffset {
        self.timezone
    }

    /// Parses `raw` as `YYYY-MM` before touching storage.
    pub async fn process(&self, raw: &str) -> Result<ProcessReport, PipelineError> {
        let period: Period = raw.parse()?;
        self.process_period(period).await
    }

    pub async fn process_period(&self, period: Period) -> Result<ProcessReport, PipelineError> {
        let range = period.date_range(self.timezone)?;
        let period_key = period.first_day()?;

        info!(
            period = %period,
            start = %range.start,
            end = %range.end,
            "processing learning data"
        );

        let metrics = self
            .repo
            .aggregate_learning_metrics(range.start_utc(), range.end_utc())
            .await?;

        info!(period = %period, users = metrics.len(), "aggregated learning metrics");

        if metrics.is_empty() {
            return Ok(ProcessReport::success(0, &period, "No data to process".to_string()));
        }

        let outcome = self.predict(&metrics, &period).await;
        let degraded = outcome.is_degraded();
        let predictions = outcome.into_predictions()?;

        let ratios: HashMap<i64, f64> = metrics
            .iter()
            .map(|m| (m.user_id, m.avg_completion_ratio))
            .collect();

        let mut saved = 0usize;
        for prediction in predictions {
            let (Some(user_id), Some(learning_style)) =
                (prediction.user_id, prediction.learning_style.clone())
            else {
                warn!(?prediction, "skipping invalid prediction");
                continue;
            };

            let Some(&avg_completion_ratio) = ratios.get(&user_id) else {
                warn!(user_id, "skipping prediction for a user outside the aggregated batch");
                continue;
            };

            self.repo
                .upsert_learning_style(LearningStyleUpsert {
                    user_id,
                    period: period_key,
                    learning_style,
                    description: prediction
                        .description
                        .unwrap_or_else(|| MISSING_DESCRIPTION.to_string()),
                    recommendations: prediction.recommendations,
                    avg_completion_ratio,
                    created_at: Utc::now(),
                })
                .await?;
            saved += 1;
        }

        info!(period = %period, processed = saved, degraded, "learning style processing completed");

        Ok(ProcessReport::success(
            saved,
            &period,
            format!("Processed {saved} users"),
        ))
    }

    async fn predict(&self, metrics: &[UserMetric], period: &Period) -> PredictionOutcome {
        match self.predictor.predict(metrics).await {
            Ok(predictions) => PredictionOutcome::Predicted(predictions),
            Err(err) => {
                warn!(
                    error = %err,
                    users = metrics.len(),
                    "prediction service unavailable, using fallback predictions"
                );
                PredictionOutcome::Degraded(fallback::simulate(metrics, period))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn non_array_predictions_are_rejected() {
        let outcome = PredictionOutcome::Predicted(json!({ "user_id": 1 }));
        assert!(matches!(
            outcome.into_predictions(),
            Err(PipelineError::InvalidPredictions)
        ));
    }

    #[test]
    fn degraded_predictions_pass_through() {
        let outcome = PredictionOutcome::Degraded(vec![RawPrediction {
            user_id: Some(1),
            learning_style: Some("Consistent".to_string()),
            description: None,
            recommendations: vec![],
            avg_completion_ratio: None,
        }]);
        assert!(outcome.is_degraded());
        assert_eq!(outcome.into_predictions().unwrap().len(), 1);
    }
}
