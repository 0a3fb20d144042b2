use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::Config;
use crate::db::{DatabaseProxy, Repository};
use crate::services::learning_style::{HttpPredictionClient, LearningStylePipeline};

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    config: Arc<Config>,
    repo: Arc<dyn Repository>,
    pipeline: Arc<LearningStylePipeline>,
    db_proxy: Option<Arc<DatabaseProxy>>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        repo: Arc<dyn Repository>,
        pipeline: Arc<LearningStylePipeline>,
        db_proxy: Option<Arc<DatabaseProxy>>,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            config,
            repo,
            pipeline,
            db_proxy,
        }
    }

    /// Wires the pipeline to the HTTP prediction client from `config`.
    pub fn create_pipeline(config: &Config, repo: Arc<dyn Repository>) -> Arc<LearningStylePipeline> {
        let predictor = Arc::new(HttpPredictionClient::new(&config.learning_style));
        tracing::info!(url = predictor.url(), "prediction client configured");
        Arc::new(LearningStylePipeline::new(
            repo,
            predictor,
            config.learning_style.timezone,
        ))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repo(&self) -> &dyn Repository {
        self.repo.as_ref()
    }

    pub fn pipeline(&self) -> Arc<LearningStylePipeline> {
        Arc::clone(&self.pipeline)
    }

    pub fn db_proxy(&self) -> Option<Arc<DatabaseProxy>> {
        self.db_proxy.clone()
    }
}
