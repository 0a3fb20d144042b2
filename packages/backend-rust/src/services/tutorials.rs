use serde::{Deserialize, Serialize};

use crate::db::operations::{Journey, NewTutorial, Tutorial};
use crate::db::Repository;

use super::journeys::require_journey;
use super::{non_negative, questions, required_text, ServiceError};

const NOT_FOUND: &str = "Tutorial not found";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TutorialPayload {
    pub title: Option<String>,
    pub position: Option<i32>,
    pub status: Option<i32>,
}

/// A tutorial with the name and summary of its journey.
#[derive(Debug, Clone, Serialize)]
pub struct TutorialView {
    #[serde(flatten)]
    pub tutorial: Tutorial,
    pub developer_journey_name: String,
    pub developer_journey_summary: Option<String>,
}

impl TutorialView {
    fn new(tutorial: Tutorial, journey: &Journey) -> Self {
        Self {
            tutorial,
            developer_journey_name: journey.name.clone(),
            developer_journey_summary: journey.summary.clone(),
        }
    }
}

pub async fn list_tutorials(
    repo: &dyn Repository,
    journey_id: i64,
) -> Result<Vec<TutorialView>, ServiceError> {
    let journey = require_journey(repo, journey_id).await?;
    let tutorials = repo.list_tutorials(journey_id).await?;
    Ok(tutorials
        .into_iter()
        .map(|t| TutorialView::new(t, &journey))
        .collect())
}

async fn require_tutorial(
    repo: &dyn Repository,
    journey_id: i64,
    tutorial_id: i64,
) -> Result<Tutorial, ServiceError> {
    repo.find_tutorial(journey_id, tutorial_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))
}

pub async fn get_tutorial(
    repo: &dyn Repository,
    journey_id: i64,
    tutorial_id: i64,
) -> Result<TutorialView, ServiceError> {
    let journey = require_journey(repo, journey_id).await?;
    let tutorial = require_tutorial(repo, journey_id, tutorial_id).await?;
    Ok(TutorialView::new(tutorial, &journey))
}

pub async fn create_tutorial(
    repo: &dyn Repository,
    journey_id: i64,
    author_id: i64,
    payload: TutorialPayload,
) -> Result<Tutorial, ServiceError> {
    let title = required_text(payload.title.as_deref(), "title")?;
    let position = payload
        .position
        .ok_or_else(|| ServiceError::Validation("position is required".to_string()))?;
    non_negative(position, "position")?;

    require_journey(repo, journey_id).await?;

    if repo
        .find_duplicate_tutorial(journey_id, &title, position, None)
        .await?
        .is_some()
    {
        return Err(ServiceError::BadRequest("Tutorial already exists".to_string()));
    }

    Ok(repo
        .create_tutorial(NewTutorial {
            journey_id,
            title,
            position,
            status: payload.status.unwrap_or(0),
            author_id: Some(author_id),
        })
        .await?)
}

pub async fn update_tutorial(
    repo: &dyn Repository,
    journey_id: i64,
    tutorial_id: i64,
    payload: TutorialPayload,
) -> Result<TutorialView, ServiceError> {
    if let Some(position) = payload.position {
        non_negative(position, "position")?;
    }

    let journey = require_journey(repo, journey_id).await?;
    let existing = require_tutorial(repo, journey_id, tutorial_id).await?;

    let title = payload
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| existing.title.clone());
    let position = payload.position.unwrap_or(existing.position);

    if repo
        .find_duplicate_tutorial(journey_id, &title, position, Some(tutorial_id))
        .await?
        .is_some()
    {
        return Err(ServiceError::BadRequest(
            "Tutorial with this title and position already exists".to_string(),
        ));
    }

    let updated = repo
        .update_tutorial(Tutorial {
            title,
            position,
            status: payload.status.unwrap_or(existing.status),
            ..existing
        })
        .await?;

    Ok(TutorialView::new(updated, &journey))
}

pub async fn delete_tutorial(
    repo: &dyn Repository,
    journey_id: i64,
    tutorial_id: i64,
) -> Result<Tutorial, ServiceError> {
    require_journey(repo, journey_id).await?;
    let tutorial = require_tutorial(repo, journey_id, tutorial_id).await?;
    delete_tutorial_cascade(repo, tutorial_id).await?;
    Ok(tutorial)
}

/// Deletes the tutorial's questions (and their options) first.
pub(crate) async fn delete_tutorial_cascade(
    repo: &dyn Repository,
    tutorial_id: i64,
) -> Result<(), ServiceError> {
    for question in repo.list_questions(tutorial_id).await? {
        questions::delete_question_cascade(repo, question.id).await?;
    }
    repo.delete_tutorial(tutorial_id).await?;
    Ok(())
}
