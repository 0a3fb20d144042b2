use crate::db::operations::UserMetric;

use super::period::Period;
use super::prediction::RawPrediction;

pub const FAST_LEARNER: &str = "Fast Learner";
pub const REFLECTIVE: &str = "Reflective";
pub const CONSISTENT: &str = "Consistent";

const FALLBACK_SUGGESTIONS: [&str; 4] = [
    "Try to increase your daily study duration",
    "Focus on the modules you have not fully mastered yet",
    "Use the pomodoro technique to keep your focus",
    "Discuss the material with other learners to deepen your understanding",
];

/// Label used when the prediction service cannot be reached.
pub fn classify(metric: &UserMetric) -> &'static str {
    if metric.avg_completion_ratio >= 0.75 {
        FAST_LEARNER
    } else if metric.avg_study_per_module >= 60.0 {
        REFLECTIVE
    } else {
        CONSISTENT
    }
}

/// One local prediction per input user, in input order.
pub fn simulate(metrics: &[UserMetric], period: &Period) -> Vec<RawPrediction> {
    metrics
        .iter()
        .map(|metric| {
            let label = classify(metric);
            RawPrediction {
                user_id: Some(metric.user_id),
                learning_style: Some(label.to_string()),
                description: Some(format!(
                    "Based on your learning activity during {period}, your pattern is closest to the \
                     {label} profile. It is estimated from your study duration and how much of each \
                     module you completed."
                )),
                recommendations: FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
                avg_completion_ratio: Some(metric.avg_completion_ratio),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(user_id: i64, per_module: f64, ratio: f64) -> UserMetric {
        UserMetric {
            user_id,
            module_count: 1,
            total_study_duration: per_module as i64,
            avg_study_per_module: per_module,
            avg_submission_rating: 0.0,
            avg_completion_ratio: ratio,
        }
    }

    #[test]
    fn classification_is_deterministic() {
        assert_eq!(classify(&metric(1, 10.0, 0.9)), FAST_LEARNER);
        assert_eq!(classify(&metric(1, 90.0, 0.2)), REFLECTIVE);
        assert_eq!(classify(&metric(1, 10.0, 0.2)), CONSISTENT);
    }

    #[test]
    fn simulates_one_prediction_per_user() {
        let period: Period = "2024-02".parse().unwrap();
        let predictions = simulate(&[metric(3, 10.0, 0.1), metric(5, 80.0, 0.8)], &period);

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].user_id, Some(3));
        assert_eq!(predictions[1].learning_style.as_deref(), Some(FAST_LEARNER));
        assert_eq!(predictions[1].recommendations.len(), 4);
        assert!(predictions[0]
            .description
            .as_deref()
            .is_some_and(|d| d.contains("2024-02")));
    }
}
