use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::gemini::DEMO_KEY;

const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub gemini_model: String,
    pub allowed_domains: Vec<String>,
    pub request_timeout: Duration,
    pub scrape_timeout: Duration,
    pub worker_concurrency: usize,
    pub job_history: usize,
    pub toast_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            gemini_api_key: DEMO_KEY.to_string(),
            gemini_api_base: DEFAULT_GEMINI_BASE.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            allowed_domains: Vec::new(),
            request_timeout: Duration::from_secs(30),
            scrape_timeout: Duration::from_secs(15),
            worker_concurrency: 5,
            job_history: 100,
            toast_ttl: Duration::from_millis(5000),
        }
    }
}

impl AppConfig {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            port: parsed(&get, "PORT", defaults.port),
            gemini_api_key: get("GEMINI_API_KEY").unwrap_or(defaults.gemini_api_key),
            gemini_api_base: get("GEMINI_API_BASE")
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gemini_api_base),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            allowed_domains: get("ALLOWED_DOMAINS")
                .map(|v| v.split(',').map(|d| d.trim().to_lowercase()).filter(|d| !d.is_empty()).collect())
                .unwrap_or_default(),
            request_timeout: Duration::from_secs(parsed(&get, "REQUEST_TIMEOUT_SECS", defaults.request_timeout.as_secs())),
            scrape_timeout: Duration::from_secs(parsed(&get, "SCRAPE_TIMEOUT_SECS", defaults.scrape_timeout.as_secs())),
            worker_concurrency: parsed(&get, "WORKER_CONCURRENCY", defaults.worker_concurrency).max(1),
            job_history: parsed(&get, "JOB_HISTORY", defaults.job_history),
            toast_ttl: Duration::from_millis(parsed(&get, "TOAST_TTL_MS", defaults.toast_ttl.as_millis() as u64)),
        }
    }
}

fn parsed<T: FromStr + Copy>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match get(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("⚠️ Ignoring invalid {}={:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}
