use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::db::operations::{JourneyCompletion, NewCompletion};
use crate::db::Repository;

use super::journeys::require_journey;
use super::ServiceError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudyDurationPayload {
    /// Seconds spent in this session.
    pub duration: Option<f64>,
}

/// Seconds to whole minutes, halves rounded up.
pub fn seconds_to_minutes(seconds: f64) -> Option<i32> {
    if !seconds.is_finite() {
        return None;
    }
    let minutes = (seconds / 60.0 + 0.5).floor();
    if minutes <= 0.0 || minutes > f64::from(i32::MAX) {
        return None;
    }
    Some(minutes as i32)
}

/// Adds a study session to the user's completion row for the journey,
/// creating the row on first report.
pub async fn record_study_duration(
    repo: &dyn Repository,
    journey_id: i64,
    user_id: i64,
    payload: StudyDurationPayload,
    now: DateTime<Utc>,
) -> Result<JourneyCompletion, ServiceError> {
    let minutes = payload
        .duration
        .and_then(seconds_to_minutes)
        .ok_or_else(|| ServiceError::Validation("Invalid duration".to_string()))?;

    require_journey(repo, journey_id).await?;
    if repo.find_user(user_id).await?.is_none() {
        return Err(ServiceError::NotFound("User not found".to_string()));
    }

    let completion = match repo.find_completion(journey_id, user_id).await? {
        Some(existing) => repo
            .add_study_duration(existing.id, minutes, now)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Completion not found".to_string()))?,
        None => {
            repo.create_completion(NewCompletion {
                journey_id,
                user_id,
                study_duration: minutes,
                enrolled_at: now,
            })
            .await?
        }
    };

    tracing::debug!(
        journey_id,
        user_id,
        minutes,
        total = completion.study_duration,
        "study duration recorded"
    );
    Ok(completion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::operations::{NewJourney, NewUser};
    use crate::db::InMemoryRepository;

    #[test]
    fn rounds_half_up() {
        assert_eq!(seconds_to_minutes(90.0), Some(2));
        assert_eq!(seconds_to_minutes(89.0), Some(1));
        assert_eq!(seconds_to_minutes(29.0), None);
        assert_eq!(seconds_to_minutes(30.0), Some(1));
        assert_eq!(seconds_to_minutes(-120.0), None);
        assert_eq!(seconds_to_minutes(f64::NAN), None);
    }

    #[tokio::test]
    async fn accumulates_per_user_and_journey() {
        let repo = InMemoryRepository::new();
        let user = repo
            .create_user(NewUser {
                display_name: "dev".to_string(),
                name: "Dev".to_string(),
                email: "dev@example.com".to_string(),
                password: "x".to_string(),
                phone: None,
                user_role: 0,
            })
            .await
            .unwrap();
        let journey = repo
            .create_journey(NewJourney {
                name: "Rust".to_string(),
                ..NewJourney::default()
            })
            .await
            .unwrap();

        let report = |secs: f64| StudyDurationPayload {
            duration: Some(secs),
        };
        let first = record_study_duration(&repo, journey.id, user.id, report(600.0), Utc::now())
            .await
            .unwrap();
        assert_eq!(first.study_duration, 10);
        assert_eq!(first.enrolling_times, 1);

        let second = record_study_duration(&repo, journey.id, user.id, report(300.0), Utc::now())
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.study_duration, 15);
        assert!(second.last_enrolled_at >= first.last_enrolled_at);
    }

    #[tokio::test]
    async fn invalid_duration_is_rejected_before_lookup() {
        let repo = InMemoryRepository::new();
        let err = record_study_duration(
            &repo,
            1,
            1,
            StudyDurationPayload { duration: Some(10.0) },
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg == "Invalid duration"));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let repo = InMemoryRepository::new();
        let journey = repo
            .create_journey(NewJourney {
                name: "Go".to_string(),
                ..NewJourney::default()
            })
            .await
            .unwrap();

        let err = record_study_duration(
            &repo,
            journey.id,
            4242,
            StudyDurationPayload { duration: Some(600.0) },
            Utc::now(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(msg) if msg == "User not found"));
        assert!(repo.find_completion(journey.id, 4242).await.unwrap().is_none());
    }
}
