use std::time::Duration;

use anyhow::{Context, Result};

/// Default model for all extraction calls.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Low temperature — extraction must quote, not improvise.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Token budget for a single extraction reply.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Per-attempt request deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Retry behavior for a single `ExtractionClient`. Immutable once built —
/// policy changes mean building a new client, never mutating a live one.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            // 529 is the provider's "overloaded" status
            retryable_statuses: vec![429, 500, 502, 503, 529],
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Exponential backoff for the given zero-based attempt: base, 2×base, 4×base, …
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Extraction configuration, passed explicitly into each client — there is
/// deliberately no process-wide mutable "current prompt" or model state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider credential. `None` switches every extraction into the
    /// heuristic fallback path instead of failing.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables (and `.env` if present).
    /// A missing `ANTHROPIC_API_KEY` is not an error — it selects degraded
    /// heuristic extraction.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        let model =
            std::env::var("MATCHLIGHT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let temperature = match std::env::var("MATCHLIGHT_TEMPERATURE") {
            Ok(raw) => raw
                .parse::<f32>()
                .context("MATCHLIGHT_TEMPERATURE must be a float")?,
            Err(_) => DEFAULT_TEMPERATURE,
        };

        Ok(Config {
            api_key,
            model,
            temperature,
            ..Config::default()
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
