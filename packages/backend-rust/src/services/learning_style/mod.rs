//! Monthly learning-style classification and its read side.

pub mod fallback;
pub mod period;
pub mod pipeline;
pub mod prediction;
pub mod queries;
pub mod sanitize;

pub use period::{DateRange, Period, PeriodError};
pub use pipeline::{LearningStylePipeline, PipelineError, PredictionOutcome, ProcessReport};
pub use prediction::{HttpPredictionClient, PredictionClient, PredictionError, RawPrediction};
