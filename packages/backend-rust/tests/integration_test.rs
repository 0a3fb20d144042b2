use axum::http::{Method, StatusCode};
use serde_json::json;

use devjourney_backend::db::Repository;

mod common;

use common::{
    create_test_app, local_noon, seed_completion, seed_journey, seed_user, send, send_json,
    sign_claims, sign_token,
};

#[tokio::test]
async fn test_welcome_message() {
    let t = create_test_app();

    let (status, body) = send_json(&t.app, Method::GET, "/", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to api Learning App");
}

#[tokio::test]
async fn test_health_root() {
    let t = create_test_app();

    let (status, body) = send_json(&t.app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "in-memory");
}

#[tokio::test]
async fn test_health_live_and_ready() {
    let t = create_test_app();

    let (status, body) = send_json(&t.app, Method::GET, "/health/live", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send_json(&t.app, Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let t = create_test_app();

    let (status, body) = send_json(&t.app, Method::GET, "/api/nope", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_unauthorized_without_token() {
    let t = create_test_app();

    let (status, body) = send_json(&t.app, Method::GET, "/api/journeys", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication token is required");
}

#[tokio::test]
async fn test_rejects_tampered_and_expired_tokens() {
    let t = create_test_app();

    let mut token = sign_token(1);
    token.push('x');
    let response = send(&t.app, Method::GET, "/api/journeys", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let expired = sign_claims(json!({ "userId": 1, "exp": 1 }));
    let (status, body) = send_json(&t.app, Method::GET, "/api/journeys", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication failed");
}

#[tokio::test]
async fn test_journey_crud() {
    let t = create_test_app();
    let token = sign_token(1);

    let (status, body) = send_json(
        &t.app,
        Method::POST,
        "/api/journeys",
        Some(&token),
        Some(json!({ "name": "Backend Basics", "summary": "APIs", "duration": 120 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send_json(
        &t.app,
        Method::POST,
        "/api/journeys",
        Some(&token),
        Some(json!({ "name": "Backend Basics" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Journey already exists");

    let (status, body) = send_json(
        &t.app,
        Method::PUT,
        &format!("/api/journeys/{id}"),
        Some(&token),
        Some(json!({ "summary": "HTTP APIs" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Backend Basics");
    assert_eq!(body["data"]["summary"], "HTTP APIs");

    let (status, body) =
        send_json(&t.app, Method::GET, &format!("/api/journeys/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tutorials"], json!([]));

    let (status, _) =
        send_json(&t.app, Method::DELETE, &format!("/api/journeys/{id}"), Some(&token), None)
            .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        send_json(&t.app, Method::GET, &format!("/api/journeys/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Developer journey not found");
}

#[tokio::test]
async fn test_invalid_path_id_is_rejected() {
    let t = create_test_app();
    let token = sign_token(1);

    let (status, _) =
        send_json(&t.app, Method::GET, "/api/journeys/abc", Some(&token), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_content_hierarchy() {
    let t = create_test_app();
    let token = sign_token(3);
    let journey_id = seed_journey(&t.repo, "Frontend", 60).await;

    let (status, body) = send_json(
        &t.app,
        Method::POST,
        &format!("/api/journeys/{journey_id}/tutorials"),
        Some(&token),
        Some(json!({ "title": "HTML", "position": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["author_id"], 3);
    let tutorial_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send_json(
        &t.app,
        Method::GET,
        &format!("/api/journeys/{journey_id}/tutorials/{tutorial_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["developer_journey_name"], "Frontend");

    let (status, body) = send_json(
        &t.app,
        Method::POST,
        &format!("/api/tutorials/{tutorial_id}/questions"),
        Some(&token),
        Some(json!({ "question_text": "What is a tag?", "position": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let question_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send_json(
        &t.app,
        Method::POST,
        &format!("/api/questions/{question_id}/options"),
        Some(&token),
        Some(json!({ "option_label": "A", "option_text": "A markup element" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let option_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send_json(
        &t.app,
        Method::POST,
        &format!("/api/questions/{question_id}/options"),
        Some(&token),
        Some(json!({ "option_label": "A", "option_text": "A markup element" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Option already exists");

    let (status, body) = send_json(
        &t.app,
        Method::PUT,
        &format!("/api/questions/{question_id}/options/{option_id}"),
        Some(&token),
        Some(json!({ "option_text": "An element" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["option_text"], "An element");

    let (status, _) = send_json(
        &t.app,
        Method::DELETE,
        &format!("/api/journeys/{journey_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert!(t.repo.find_question_by_id(question_id).await.unwrap().is_none());
    assert!(t.repo.find_tutorial_by_id(tutorial_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_study_duration_accumulates() {
    let t = create_test_app();
    let user = seed_user(&t.repo, "learner@example.com").await;
    let token = sign_token(user.id);
    let journey_id = seed_journey(&t.repo, "Cloud", 60).await;
    let uri = format!("/api/journeys/{journey_id}/study-duration");

    let (status, body) =
        send_json(&t.app, Method::POST, &uri, Some(&token), Some(json!({ "duration": 90 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Created successfully");
    assert_eq!(body["data"]["study_duration"], 2);
    assert_eq!(body["data"]["enrolling_times"], 1);

    let (status, body) =
        send_json(&t.app, Method::POST, &uri, Some(&token), Some(json!({ "duration": 600 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["study_duration"], 12);

    let (status, body) =
        send_json(&t.app, Method::POST, &uri, Some(&token), Some(json!({ "duration": -5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid duration");

    let (status, _) = send_json(
        &t.app,
        Method::POST,
        "/api/journeys/999/study-duration",
        Some(&token),
        Some(json!({ "duration": 60 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_study_duration_for_unknown_user_is_not_found() {
    let t = create_test_app();
    let token = sign_token(4242);
    let journey_id = seed_journey(&t.repo, "Mobile", 60).await;

    let (status, body) = send_json(
        &t.app,
        Method::POST,
        &format!("/api/journeys/{journey_id}/study-duration"),
        Some(&token),
        Some(json!({ "duration": 600 })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_logout() {
    let t = create_test_app();
    t.repo.create_refresh_token("refresh-1", None).await.unwrap();

    let (status, body) = send_json(
        &t.app,
        Method::DELETE,
        "/api/auth/logout",
        None,
        Some(json!({ "refreshToken": "refresh-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Refresh token deleted successfully");

    let (status, body) = send_json(
        &t.app,
        Method::DELETE,
        "/api/auth/logout",
        None,
        Some(json!({ "refreshToken": "refresh-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Refresh token not found");

    let (status, _) = send_json(&t.app, Method::DELETE, "/api/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_learning_style_endpoints() {
    let t = create_test_app();
    let user = seed_user(&t.repo, "ana@example.com").await;
    let token = sign_token(user.id);
    let journey_id = seed_journey(&t.repo, "Data", 100).await;
    seed_completion(&t.repo, journey_id, user.id, 80, local_noon(2024, 2, 10)).await;

    let (status, body) = send_json(
        &t.app,
        Method::POST,
        "/api/process-learning-style",
        Some(&token),
        Some(json!({ "period": "2024-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Learning style processing completed");
    assert_eq!(body["data"]["processedUsers"], 1);
    assert_eq!(body["data"]["period"], "2024-02");

    let (status, body) = send_json(
        &t.app,
        Method::GET,
        "/api/my-learning-style?period=2024-02",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["learning_style"], "Consistent");
    assert_eq!(body["data"]["period"], "2024-02-01");

    let (status, body) = send_json(
        &t.app,
        Method::GET,
        &format!("/api/user-learning-style/latest/{}", user.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Latest learning style retrieved successfully");
    assert_eq!(body["data"]["user"]["email"], "ana@example.com");

    let (status, body) = send_json(
        &t.app,
        Method::GET,
        "/api/user-learning-styles?period=2024-02",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, body) =
        send_json(&t.app, Method::GET, "/api/user-learning-styles", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Period is required");

    let (status, body) = send_json(
        &t.app,
        Method::GET,
        "/api/my-learning-style?period=2024-03",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Learning style not found");
}

#[tokio::test]
async fn test_process_learning_style_rejects_bad_periods() {
    let t = create_test_app();
    let token = sign_token(1);

    for body in [json!({}), json!({ "period": "2024-13" }), json!({ "period": "24-02" })] {
        let (status, _) = send_json(
            &t.app,
            Method::POST,
            "/api/process-learning-style",
            Some(&token),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    assert_eq!(t.repo.aggregate_calls(), 0);
    assert_eq!(t.predictor.calls(), 0);
}
