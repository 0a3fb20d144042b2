use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};

const DEFAULT_ML_API_URL: &str = "http://localhost:5001";
const DEFAULT_ML_PREDICT_PATH: &str = "/predict-gaya-belajar";
const DEFAULT_ML_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_LEARNING_STYLE_SCHEDULE: &str = "0 0 2 1 * *";
// Asia/Jakarta
const DEFAULT_UTC_OFFSET_SECS: i32 = 7 * 3600;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub jwt_secret: Option<String>,
    pub learning_style: LearningStyleConfig,
}

/// Settings for the monthly learning-style job and its prediction service.
#[derive(Debug, Clone)]
pub struct LearningStyleConfig {
    pub ml_api_url: String,
    pub ml_predict_path: String,
    pub ml_timeout: Duration,
    pub schedule: String,
    pub timezone: FixedOffset,
    pub worker_leader: bool,
    pub worker_enabled: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            host,
            port,
            log_level,
            jwt_secret: env_string("JWT_SECRET"),
            learning_style: LearningStyleConfig::from_env(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl LearningStyleConfig {
    fn from_env() -> Self {
        let timezone = env_string("LEARNING_STYLE_UTC_OFFSET")
            .as_deref()
            .and_then(parse_utc_offset)
            .unwrap_or_else(default_timezone);

        Self {
            ml_api_url: env_string("ML_API_URL").unwrap_or_else(|| DEFAULT_ML_API_URL.to_string()),
            ml_predict_path: env_string("ML_PREDICT_PATH")
                .unwrap_or_else(|| DEFAULT_ML_PREDICT_PATH.to_string()),
            ml_timeout: Duration::from_millis(env_u64("ML_TIMEOUT_MS").unwrap_or(DEFAULT_ML_TIMEOUT_MS)),
            schedule: env_string("LEARNING_STYLE_SCHEDULE")
                .unwrap_or_else(|| DEFAULT_LEARNING_STYLE_SCHEDULE.to_string()),
            timezone,
            worker_leader: env_bool("WORKER_LEADER", true),
            worker_enabled: env_bool("ENABLE_LEARNING_STYLE_WORKER", true),
        }
    }

    pub fn predict_url(&self) -> String {
        format!(
            "{}/{}",
            self.ml_api_url.trim_end_matches('/'),
            self.ml_predict_path.trim_start_matches('/')
        )
    }
}

impl Default for LearningStyleConfig {
    fn default() -> Self {
        Self {
            ml_api_url: DEFAULT_ML_API_URL.to_string(),
            ml_predict_path: DEFAULT_ML_PREDICT_PATH.to_string(),
            ml_timeout: Duration::from_millis(DEFAULT_ML_TIMEOUT_MS),
            schedule: DEFAULT_LEARNING_STYLE_SCHEDULE.to_string(),
            timezone: default_timezone(),
            worker_leader: true,
            worker_enabled: true,
        }
    }
}

fn default_timezone() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Parses `+07:00`, `-05:30`, `+7` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Some(Utc.fix());
    }

    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None => (rest.parse::<i32>().ok()?, 0),
    };

    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

pub(crate) fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}

pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    match env_string(key) {
        Some(v) => v == "true" || v == "1",
        None => default,
    }
}
