use serde::Deserialize;

use crate::db::operations::{NewQuestion, Tutorial, TutorialQuestion};
use crate::db::Repository;

use super::{non_negative, required_text, ServiceError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionPayload {
    pub question_text: Option<String>,
    pub position: Option<i32>,
}

async fn require_tutorial(repo: &dyn Repository, tutorial_id: i64) -> Result<Tutorial, ServiceError> {
    repo.find_tutorial_by_id(tutorial_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Tutorial not found".to_string()))
}

async fn require_question(
    repo: &dyn Repository,
    tutorial_id: i64,
    question_id: i64,
) -> Result<TutorialQuestion, ServiceError> {
    repo.find_question(tutorial_id, question_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Question not found".to_string()))
}

pub async fn list_questions(
    repo: &dyn Repository,
    tutorial_id: i64,
) -> Result<Vec<TutorialQuestion>, ServiceError> {
    require_tutorial(repo, tutorial_id).await?;
    Ok(repo.list_questions(tutorial_id).await?)
}

pub async fn get_question(
    repo: &dyn Repository,
    tutorial_id: i64,
    question_id: i64,
) -> Result<TutorialQuestion, ServiceError> {
    require_tutorial(repo, tutorial_id).await?;
    require_question(repo, tutorial_id, question_id).await
}

pub async fn create_question(
    repo: &dyn Repository,
    tutorial_id: i64,
    payload: QuestionPayload,
) -> Result<TutorialQuestion, ServiceError> {
    let question_text = required_text(payload.question_text.as_deref(), "question_text")?;
    let position = payload
        .position
        .ok_or_else(|| ServiceError::Validation("position is required".to_string()))?;
    non_negative(position, "position")?;

    require_tutorial(repo, tutorial_id).await?;

    if repo
        .find_duplicate_question(tutorial_id, &question_text, position, None)
        .await?
        .is_some()
    {
        return Err(ServiceError::BadRequest(
            "Tutorial question already exists".to_string(),
        ));
    }

    Ok(repo
        .create_question(NewQuestion {
            tutorial_id,
            question_text,
            position,
        })
        .await?)
}

pub async fn update_question(
    repo: &dyn Repository,
    tutorial_id: i64,
    question_id: i64,
    payload: QuestionPayload,
) -> Result<TutorialQuestion, ServiceError> {
    if let Some(position) = payload.position {
        non_negative(position, "position")?;
    }

    require_tutorial(repo, tutorial_id).await?;
    let existing = repo
        .find_question(tutorial_id, question_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Tutorial question not found".to_string()))?;

    let question_text = payload
        .question_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| existing.question_text.clone());
    let position = payload.position.unwrap_or(existing.position);

    if repo
        .find_duplicate_question(tutorial_id, &question_text, position, Some(question_id))
        .await?
        .is_some()
    {
        return Err(ServiceError::BadRequest(
            "Tutorial question already exists".to_string(),
        ));
    }

    Ok(repo
        .update_question(TutorialQuestion {
            question_text,
            position,
            ..existing
        })
        .await?)
}

pub async fn delete_question(
    repo: &dyn Repository,
    tutorial_id: i64,
    question_id: i64,
) -> Result<TutorialQuestion, ServiceError> {
    require_tutorial(repo, tutorial_id).await?;
    let question = require_question(repo, tutorial_id, question_id).await?;
    delete_question_cascade(repo, question_id).await?;
    Ok(question)
}

pub(crate) async fn delete_question_cascade(
    repo: &dyn Repository,
    question_id: i64,
) -> Result<(), ServiceError> {
    repo.delete_options_for_question(question_id).await?;
    repo.delete_question(question_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::operations::{NewJourney, NewOption, NewTutorial};
    use crate::db::InMemoryRepository;

    async fn setup() -> (InMemoryRepository, i64) {
        let repo = InMemoryRepository::new();
        let journey = repo
            .create_journey(NewJourney {
                name: "Rust".to_string(),
                ..NewJourney::default()
            })
            .await
            .unwrap();
        let tutorial = repo
            .create_tutorial(NewTutorial {
                journey_id: journey.id,
                title: "Intro".to_string(),
                position: 1,
                status: 1,
                author_id: None,
            })
            .await
            .unwrap();
        (repo, tutorial.id)
    }

    fn payload(text: &str, position: i32) -> QuestionPayload {
        QuestionPayload {
            question_text: Some(text.to_string()),
            position: Some(position),
        }
    }

    #[tokio::test]
    async fn duplicates_are_scoped_to_the_tutorial() {
        let (repo, tutorial_id) = setup().await;
        let first = create_question(&repo, tutorial_id, payload("What is a borrow?", 1))
            .await
            .unwrap();

        let err = create_question(&repo, tutorial_id, payload("What is a borrow?", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        // Saving a question unchanged is not a duplicate of itself
        let same = update_question(&repo, tutorial_id, first.id, payload("What is a borrow?", 1))
            .await
            .unwrap();
        assert_eq!(same.id, first.id);
    }

    #[tokio::test]
    async fn delete_removes_options() {
        let (repo, tutorial_id) = setup().await;
        let question = create_question(&repo, tutorial_id, payload("Q", 1)).await.unwrap();
        repo.create_option(NewOption {
            question_id: question.id,
            option_label: "A".to_string(),
            option_text: "Yes".to_string(),
        })
        .await
        .unwrap();

        delete_question(&repo, tutorial_id, question.id).await.unwrap();

        assert!(repo.list_options(question.id).await.unwrap().is_empty());
        assert!(repo.find_question_by_id(question.id).await.unwrap().is_none());
    }
}
