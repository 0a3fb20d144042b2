use crate::db::Repository;

use super::ServiceError;

/// Forgets a refresh token.
pub async fn logout(repo: &dyn Repository, refresh_token: Option<&str>) -> Result<(), ServiceError> {
    let token = refresh_token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::BadRequest("Refresh token is required".to_string()))?;

    if !repo.delete_refresh_token(token).await? {
        return Err(ServiceError::BadRequest("Refresh token not found".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryRepository;

    #[tokio::test]
    async fn deletes_known_tokens_once() {
        let repo = InMemoryRepository::new();
        repo.create_refresh_token("abc", None).await.unwrap();

        logout(&repo, Some("abc")).await.unwrap();

        let err = logout(&repo, Some("abc")).await.unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(msg) if msg == "Refresh token not found"));
        assert!(matches!(logout(&repo, None).await, Err(ServiceError::BadRequest(_))));
    }
}
