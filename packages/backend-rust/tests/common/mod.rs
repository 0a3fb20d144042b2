#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;

use devjourney_backend::config::{Config, LearningStyleConfig};
use devjourney_backend::db::operations::{
    JourneyCompletion, NewCompletion, NewJourney, NewUser, User, UserMetric,
};
use devjourney_backend::db::{InMemoryRepository, Repository};
use devjourney_backend::services::learning_style::{
    LearningStylePipeline, PredictionClient, PredictionError,
};
use devjourney_backend::state::AppState;

pub const TEST_SECRET: &str = "test-secret";

pub fn jakarta() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).unwrap()
}

pub fn test_config() -> Config {
    Config {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        log_level: "info".to_string(),
        jwt_secret: Some(TEST_SECRET.to_string()),
        learning_style: LearningStyleConfig {
            worker_leader: false,
            worker_enabled: false,
            ..LearningStyleConfig::default()
        },
    }
}

/// Scripted prediction service. Counts calls and answers with whatever was
/// last queued, or fails when nothing is.
#[derive(Default)]
pub struct FakePredictor {
    calls: AtomicUsize,
    response: Mutex<Option<Value>>,
    last_batch: Mutex<Vec<UserMetric>>,
}

impl FakePredictor {
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn responding(predictions: Value) -> Self {
        let predictor = Self::default();
        predictor.respond_with(predictions);
        predictor
    }

    /// Answers every batch with one entry per user echoing its ratio.
    pub fn echo() -> Self {
        Self::responding(Value::Null)
    }

    pub fn respond_with(&self, predictions: Value) {
        *self.response.lock() = Some(predictions);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_batch(&self) -> Vec<UserMetric> {
        self.last_batch.lock().clone()
    }
}

#[async_trait]
impl PredictionClient for FakePredictor {
    async fn predict(&self, metrics: &[UserMetric]) -> Result<Value, PredictionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_batch.lock() = metrics.to_vec();

        match self.response.lock().clone() {
            Some(Value::Null) => Ok(Value::Array(
                metrics
                    .iter()
                    .map(|m| {
                        json!({
                            "user_id": m.user_id,
                            "learning_style": "Consistent",
                            "description": "steady",
                            "suggestions": ["keep going"],
                            "avg_completion_ratio": m.avg_completion_ratio,
                        })
                    })
                    .collect(),
            )),
            Some(predictions) => Ok(predictions),
            None => Err(PredictionError::InvalidResponse),
        }
    }
}

pub struct TestApp {
    pub app: Router,
    pub repo: Arc<InMemoryRepository>,
    pub predictor: Arc<FakePredictor>,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(FakePredictor::echo())
}

pub fn create_test_app_with(predictor: FakePredictor) -> TestApp {
    let repo = Arc::new(InMemoryRepository::new());
    let predictor = Arc::new(predictor);
    let pipeline = Arc::new(LearningStylePipeline::new(
        repo.clone(),
        predictor.clone(),
        jakarta(),
    ));
    let state = AppState::new(Arc::new(test_config()), repo.clone(), pipeline, None);

    TestApp {
        app: devjourney_backend::create_app(state),
        repo,
        predictor,
    }
}

pub fn sign_token(user_id: i64) -> String {
    let exp = Utc::now().timestamp() + 3600;
    sign_claims(json!({
        "userId": user_id,
        "email": format!("user{user_id}@example.com"),
        "displayName": format!("user{user_id}"),
        "exp": exp,
    }))
}

pub fn sign_claims(claims: Value) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SECRET.as_bytes()).unwrap();
    mac.update(format!("{header_b64}.{payload_b64}").as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{header_b64}.{payload_b64}.{sig_b64}")
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = send(app, method, uri, token, body).await;
    let status = response.status();
    (status, json_body(response).await)
}

pub async fn seed_user(repo: &InMemoryRepository, email: &str) -> User {
    repo.create_user(NewUser {
        display_name: email.to_string(),
        name: email.to_string(),
        email: email.to_string(),
        password: "hashed".to_string(),
        phone: None,
        user_role: 0,
    })
    .await
    .unwrap()
}

pub async fn seed_journey(repo: &InMemoryRepository, name: &str, duration: i32) -> i64 {
    repo.create_journey(NewJourney {
        name: name.to_string(),
        summary: None,
        point: 0,
        required_point: 0,
        xp: 0,
        required_xp: 0,
        status: 1,
        listed: 1,
        dead_line: None,
        duration,
    })
    .await
    .unwrap()
    .id
}

pub async fn seed_completion(
    repo: &InMemoryRepository,
    journey_id: i64,
    user_id: i64,
    minutes: i32,
    at: DateTime<Utc>,
) -> JourneyCompletion {
    repo.create_completion(NewCompletion {
        journey_id,
        user_id,
        study_duration: minutes,
        enrolled_at: at,
    })
    .await
    .unwrap()
}

/// Noon of the given day in UTC+7.
pub fn local_noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    jakarta()
        .with_ymd_and_hms(year, month, day, 12, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}
