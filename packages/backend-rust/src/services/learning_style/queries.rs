use crate::db::operations::{LearningStyleRecord, LearningStyleWithUser};
use crate::db::Repository;
use crate::services::ServiceError;

use super::period::Period;

const NOT_FOUND: &str = "Learning style not found";
const INVALID_PERIOD: &str = "Invalid period format. Expected format: YYYY-MM";

/// Missing or blank means no filter; anything else must be `YYYY-MM`.
pub fn parse_optional_period(raw: Option<&str>) -> Result<Option<Period>, ServiceError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw
            .parse::<Period>()
            .map(Some)
            .map_err(|_| ServiceError::Validation(INVALID_PERIOD.to_string())),
        None => Ok(None),
    }
}

pub fn parse_required_period(raw: Option<&str>) -> Result<Period, ServiceError> {
    parse_optional_period(raw)?
        .ok_or_else(|| ServiceError::Validation("Period is required".to_string()))
}

pub async fn user_learning_style(
    repo: &dyn Repository,
    user_id: i64,
    period: Option<&str>,
) -> Result<LearningStyleRecord, ServiceError> {
    let period_key = match parse_optional_period(period)? {
        Some(period) => Some(period.first_day().map_err(|_| {
            ServiceError::Validation(INVALID_PERIOD.to_string())
        })?),
        None => None,
    };

    repo.find_learning_style(user_id, period_key)
        .await?
        .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))
}

pub async fn latest_user_learning_style(
    repo: &dyn Repository,
    user_id: i64,
) -> Result<LearningStyleWithUser, ServiceError> {
    repo.latest_learning_style(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))
}

pub async fn learning_styles_for_period(
    repo: &dyn Repository,
    period: Option<&str>,
) -> Result<Vec<LearningStyleWithUser>, ServiceError> {
    let period = parse_required_period(period)?;
    let period_key = period
        .first_day()
        .map_err(|_| ServiceError::Validation(INVALID_PERIOD.to_string()))?;
    Ok(repo.list_learning_styles_by_period(period_key).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_period_means_no_filter() {
        assert_eq!(parse_optional_period(None).unwrap(), None);
        assert_eq!(parse_optional_period(Some("  ")).unwrap(), None);
        assert!(parse_optional_period(Some("2024-02")).unwrap().is_some());
    }

    #[test]
    fn required_period_must_be_present_and_well_formed() {
        assert!(matches!(
            parse_required_period(None),
            Err(ServiceError::Validation(msg)) if msg == "Period is required"
        ));
        assert!(matches!(
            parse_required_period(Some("2024-13")),
            Err(ServiceError::Validation(_))
        ));
    }
}
