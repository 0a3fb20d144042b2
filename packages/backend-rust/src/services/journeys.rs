use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::operations::{Journey, NewJourney};
use crate::db::Repository;

use super::{non_negative, required_text, tutorials, ServiceError};

const NOT_FOUND: &str = "Developer journey not found";

/// Create/update body. Absent fields keep their current value on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JourneyPayload {
    pub name: Option<String>,
    pub summary: Option<String>,
    pub point: Option<i32>,
    pub required_point: Option<i32>,
    pub xp: Option<i32>,
    pub required_xp: Option<i32>,
    pub status: Option<i32>,
    pub listed: Option<i32>,
    pub dead_line: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
}

impl JourneyPayload {
    fn validate_numbers(&self) -> Result<(), ServiceError> {
        let fields = [
            (self.point, "point"),
            (self.required_point, "required_point"),
            (self.xp, "xp"),
            (self.required_xp, "required_xp"),
            (self.duration, "duration"),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                non_negative(value, field)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TutorialSummary {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JourneyDetail {
    #[serde(flatten)]
    pub journey: Journey,
    pub tutorials: Vec<TutorialSummary>,
}

pub async fn list_journeys(repo: &dyn Repository) -> Result<Vec<Journey>, ServiceError> {
    Ok(repo.list_journeys().await?)
}

pub(crate) async fn require_journey(
    repo: &dyn Repository,
    id: i64,
) -> Result<Journey, ServiceError> {
    repo.find_journey(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))
}

pub async fn get_journey(repo: &dyn Repository, id: i64) -> Result<JourneyDetail, ServiceError> {
    let journey = require_journey(repo, id).await?;
    let tutorials = repo
        .list_tutorials(id)
        .await?
        .into_iter()
        .map(|t| TutorialSummary {
            id: t.id,
            title: t.title,
        })
        .collect();

    Ok(JourneyDetail { journey, tutorials })
}

pub async fn create_journey(
    repo: &dyn Repository,
    payload: JourneyPayload,
) -> Result<Journey, ServiceError> {
    let name = required_text(payload.name.as_deref(), "name")?;
    payload.validate_numbers()?;

    if repo.find_journey_by_name(&name).await?.is_some() {
        return Err(ServiceError::BadRequest("Journey already exists".to_string()));
    }

    let journey = repo
        .create_journey(NewJourney {
            name,
            summary: payload.summary,
            point: payload.point.unwrap_or(0),
            required_point: payload.required_point.unwrap_or(0),
            xp: payload.xp.unwrap_or(0),
            required_xp: payload.required_xp.unwrap_or(0),
            status: payload.status.unwrap_or(0),
            listed: payload.listed.unwrap_or(0),
            dead_line: payload.dead_line,
            duration: payload.duration.unwrap_or(0),
        })
        .await?;

    tracing::info!(journey_id = journey.id, name = %journey.name, "journey created");
    Ok(journey)
}

pub async fn update_journey(
    repo: &dyn Repository,
    id: i64,
    payload: JourneyPayload,
) -> Result<Journey, ServiceError> {
    payload.validate_numbers()?;
    let existing = require_journey(repo, id).await?;

    let name = match payload.name.as_deref().map(str::trim) {
        Some("") => return Err(ServiceError::Validation("name is required".to_string())),
        Some(name) => name.to_string(),
        None => existing.name.clone(),
    };

    if name != existing.name {
        if let Some(other) = repo.find_journey_by_name(&name).await? {
            if other.id != id {
                return Err(ServiceError::BadRequest(
                    "Journey with this name already exists".to_string(),
                ));
            }
        }
    }

    let updated = Journey {
        name,
        summary: payload.summary.or(existing.summary.clone()),
        point: payload.point.unwrap_or(existing.point),
        required_point: payload.required_point.unwrap_or(existing.required_point),
        xp: payload.xp.unwrap_or(existing.xp),
        required_xp: payload.required_xp.unwrap_or(existing.required_xp),
        status: payload.status.unwrap_or(existing.status),
        listed: payload.listed.unwrap_or(existing.listed),
        dead_line: payload.dead_line.or(existing.dead_line),
        duration: payload.duration.unwrap_or(existing.duration),
        ..existing
    };

    Ok(repo.update_journey(updated).await?)
}

/// Removes the journey after its tutorials, their questions and options.
pub async fn delete_journey(repo: &dyn Repository, id: i64) -> Result<Journey, ServiceError> {
    let journey = require_journey(repo, id).await?;

    let tutorials = repo.list_tutorials(id).await?;
    for tutorial in &tutorials {
        tutorials::delete_tutorial_cascade(repo, tutorial.id).await?;
    }
    repo.delete_journey(id).await?;

    tracing::info!(journey_id = id, tutorials = tutorials.len(), "journey deleted");
    Ok(journey)
}
