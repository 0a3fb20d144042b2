use serde::Deserialize;

use crate::db::operations::{NewOption, TutorialOption};
use crate::db::Repository;

use super::{required_text, ServiceError};

const DUPLICATE: &str = "Option already exists";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionPayload {
    pub option_label: Option<String>,
    pub option_text: Option<String>,
}

async fn require_question(repo: &dyn Repository, question_id: i64) -> Result<(), ServiceError> {
    match repo.find_question_by_id(question_id).await? {
        Some(_) => Ok(()),
        None => Err(ServiceError::NotFound("Tutorial question not found".to_string())),
    }
}

async fn require_option(
    repo: &dyn Repository,
    question_id: i64,
    option_id: i64,
) -> Result<TutorialOption, ServiceError> {
    repo.find_option(question_id, option_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Tutorial question option not found".to_string()))
}

pub async fn list_options(
    repo: &dyn Repository,
    question_id: i64,
) -> Result<Vec<TutorialOption>, ServiceError> {
    require_question(repo, question_id).await?;
    Ok(repo.list_options(question_id).await?)
}

pub async fn create_option(
    repo: &dyn Repository,
    question_id: i64,
    payload: OptionPayload,
) -> Result<TutorialOption, ServiceError> {
    let option_label = required_text(payload.option_label.as_deref(), "option_label")?;
    let option_text = required_text(payload.option_text.as_deref(), "option_text")?;

    require_question(repo, question_id).await?;

    if repo
        .find_duplicate_option(question_id, Some(&option_label), &option_text, None)
        .await?
        .is_some()
    {
        return Err(ServiceError::BadRequest(DUPLICATE.to_string()));
    }

    Ok(repo
        .create_option(NewOption {
            question_id,
            option_label,
            option_text,
        })
        .await?)
}

/// Only the text of an option can change.
pub async fn update_option(
    repo: &dyn Repository,
    question_id: i64,
    option_id: i64,
    payload: OptionPayload,
) -> Result<TutorialOption, ServiceError> {
    let option_text = required_text(payload.option_text.as_deref(), "option_text")?;
    require_option(repo, question_id, option_id).await?;

    if repo
        .find_duplicate_option(question_id, None, &option_text, Some(option_id))
        .await?
        .is_some()
    {
        return Err(ServiceError::BadRequest(DUPLICATE.to_string()));
    }

    repo.update_option_text(option_id, &option_text)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Tutorial question option not found".to_string()))
}

pub async fn delete_option(
    repo: &dyn Repository,
    question_id: i64,
    option_id: i64,
) -> Result<TutorialOption, ServiceError> {
    let option = require_option(repo, question_id, option_id).await?;
    repo.delete_option(option_id).await?;
    Ok(option)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::operations::{NewJourney, NewQuestion, NewTutorial};
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
        let question = repo
            .create_question(NewQuestion {
                tutorial_id: tutorial.id,
                question_text: "Pick one".to_string(),
                position: 1,
            })
            .await
            .unwrap();
        (repo, question.id)
    }

    fn payload(label: &str, text: &str) -> OptionPayload {
        OptionPayload {
            option_label: Some(label.to_string()),
            option_text: Some(text.to_string()),
        }
    }

    #[tokio::test]
    async fn label_and_text_are_required() {
        let (repo, question_id) = setup().await;
        let err = create_option(
            &repo,
            question_id,
            OptionPayload {
                option_label: Some("A".to_string()),
                option_text: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn update_rejects_text_used_by_a_sibling() {
        let (repo, question_id) = setup().await;
        let a = create_option(&repo, question_id, payload("A", "Yes")).await.unwrap();
        create_option(&repo, question_id, payload("B", "No")).await.unwrap();

        let err = update_option(&repo, question_id, a.id, payload("A", "No"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(msg) if msg == DUPLICATE));

        let updated = update_option(&repo, question_id, a.id, payload("A", "Maybe"))
            .await
            .unwrap();
        assert_eq!(updated.option_text, "Maybe");
        assert_eq!(updated.option_label, "A");
    }

    #[tokio::test]
    async fn unknown_question_is_not_found() {
        let (repo, _) = setup().await;
        let err = list_options(&repo, 9999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
