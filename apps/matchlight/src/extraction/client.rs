//! Extraction client — the single point of entry for all provider calls.
//!
//! No other module may talk to the Anthropic API directly; everything goes
//! through `ExtractionClient`, which owns retry, backoff, per-attempt
//! deadlines, and the no-credential degradation path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::extraction::fallback;
use crate::extraction::prompts;
use crate::extraction::repair::repair;
use crate::records::{CvRecord, JobRecord};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no provider credential configured")]
    ProviderUnavailable,

    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("request deadline exceeded")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// A document handed to the extraction client.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    /// Plain text, annotated and budgeted locally.
    Text(String),
    /// Raw file bytes, embedded base64; the provider extracts the text.
    File { bytes: Vec<u8>, filename: String },
}

impl DocumentInput {
    /// Media type inferred from the filename extension.
    fn media_type(filename: &str) -> &'static str {
        let ext = filename.rsplit('.').next().unwrap_or("");
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => "application/pdf",
            "docx" => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            "doc" => "application/msword",
            "txt" => "text/plain",
            _ => "application/octet-stream",
        }
    }
}

/// One provider reply as seen by the retry loop. The transport flattens
/// HTTP-level details into this so tests can drive the loop without a
/// network.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub status: u16,
    /// Seconds from a `retry-after` header, if the provider sent one.
    pub retry_after: Option<u64>,
    pub body: String,
}

/// Transport seam: anything that can deliver one request to the provider.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    async fn send(&self, api_key: &str, payload: &Value) -> Result<ProviderReply, ExtractError>;
}

/// Production transport — posts to the Anthropic Messages API.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(request_timeout: Duration) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ExtractError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ProviderTransport for HttpTransport {
    async fn send(&self, api_key: &str, payload: &Value) -> Result<ProviderReply, ExtractError> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::Timeout
                } else {
                    ExtractError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();

        Ok(ProviderReply {
            status,
            retry_after,
            body,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Wraps the provider with retry logic and the document prompt templates.
/// One client per configuration; policy changes mean a new client.
#[derive(Clone)]
pub struct ExtractionClient {
    config: Config,
    transport: Arc<dyn ProviderTransport>,
}

impl ExtractionClient {
    pub fn new(config: Config) -> Result<Self, ExtractError> {
        let transport = HttpTransport::new(config.request_timeout)?;
        Ok(Self {
            config,
            transport: Arc::new(transport),
        })
    }

    /// Builds a client over a caller-supplied transport. Tests use this to
    /// drive the retry loop deterministically.
    pub fn with_transport(config: Config, transport: Arc<dyn ProviderTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extracts a CV. Without a credential, text inputs degrade to the
    /// heuristic extractor; file inputs need the provider and error out.
    pub async fn extract_cv(&self, input: &DocumentInput) -> Result<CvRecord, ExtractError> {
        if self.config.api_key.is_none() {
            return match input {
                DocumentInput::Text(text) => {
                    warn!("no provider credential, using heuristic CV extraction");
                    Ok(fallback::extract_cv(text))
                }
                DocumentInput::File { .. } => Err(ExtractError::ProviderUnavailable),
            };
        }

        let raw = self
            .request_extraction(prompts::CV_PARSE_PROMPT_TEMPLATE, "{cv_text}", input)
            .await?;
        let value = repair(&raw);
        let record = CvRecord::from_value(&value);
        info!(
            confidence = record.confidence_score,
            skills = record.key_skills.len(),
            "CV extraction complete"
        );
        Ok(record)
    }

    /// Extracts a job posting. Same degradation rules as `extract_cv`.
    pub async fn extract_jd(&self, input: &DocumentInput) -> Result<JobRecord, ExtractError> {
        if self.config.api_key.is_none() {
            return match input {
                DocumentInput::Text(text) => {
                    warn!("no provider credential, using heuristic JD extraction");
                    Ok(fallback::extract_jd(text))
                }
                DocumentInput::File { .. } => Err(ExtractError::ProviderUnavailable),
            };
        }

        let raw = self
            .request_extraction(prompts::JD_PARSE_PROMPT_TEMPLATE, "{jd_text}", input)
            .await?;
        let value = repair(&raw);
        let record = JobRecord::from_value(&value);
        info!(
            confidence = record.confidence_score,
            required_skills = record.required_skills.len(),
            "JD extraction complete"
        );
        Ok(record)
    }

    /// One complete prompt round-trip, returning the reply's text payload.
    /// Used directly by the gap-analysis stage.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, ExtractError> {
        let content = json!([{ "type": "text", "text": prompt }]);
        self.call(system, content).await
    }

    async fn request_extraction(
        &self,
        template: &str,
        text_slot: &str,
        input: &DocumentInput,
    ) -> Result<String, ExtractError> {
        let content = match input {
            DocumentInput::Text(text) => {
                let prompt = template.replace(text_slot, text);
                json!([{ "type": "text", "text": prompt }])
            }
            DocumentInput::File { bytes, filename } => {
                debug!(filename, size = bytes.len(), "embedding document for extraction");
                let prompt = format!(
                    "{}\n\n{}",
                    prompts::FILE_EXTRACTION_PREAMBLE,
                    template.replace(text_slot, "(see the attached document)")
                );
                json!([
                    {
                        "type": "document",
                        "source": {
                            "type": "base64",
                            "media_type": DocumentInput::media_type(filename),
                            "data": BASE64.encode(bytes),
                        }
                    },
                    { "type": "text", "text": prompt }
                ])
            }
        };
        self.call(prompts::EXTRACTION_SYSTEM, content).await
    }

    /// The retry loop. Makes at most `max_attempts` sequential calls, each
    /// under the configured deadline; 429 honors `retry-after`, other
    /// retryable failures back off exponentially.
    async fn call(&self, system: &str, content: Value) -> Result<String, ExtractError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ExtractError::ProviderUnavailable)?;

        let payload = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": system,
            "messages": [{ "role": "user", "content": content }],
        });

        let policy = &self.config.retry;
        let mut last_error = ExtractError::RateLimited {
            attempts: policy.max_attempts,
        };
        let mut rate_limited = false;
        let mut next_delay: Option<Duration> = None;

        for attempt in 0..policy.max_attempts {
            if let Some(delay) = next_delay.take() {
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "provider call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }

            let reply = match tokio::time::timeout(
                self.config.request_timeout,
                self.transport.send(api_key, &payload),
            )
            .await
            {
                Err(_elapsed) => Err(ExtractError::Timeout),
                Ok(result) => result,
            };

            let reply = match reply {
                Ok(r) => r,
                Err(err @ (ExtractError::Timeout | ExtractError::Network(_))) => {
                    next_delay = Some(policy.backoff_delay(attempt));
                    last_error = err;
                    continue;
                }
                Err(err) => return Err(err),
            };

            if (200..300).contains(&reply.status) {
                return Ok(reply_text(&reply.body));
            }

            if policy.is_retryable(reply.status) {
                // 429 may carry the provider's own wait; 529 is overloaded
                let delay = match (reply.status, reply.retry_after) {
                    (429, Some(secs)) => Duration::from_secs(secs),
                    _ => policy.backoff_delay(attempt),
                };
                warn!(status = reply.status, "provider returned retryable status");
                rate_limited = reply.status == 429;
                last_error = ExtractError::Api {
                    status: reply.status,
                    message: error_message(&reply.body),
                };
                next_delay = Some(delay);
                continue;
            }

            return Err(ExtractError::Api {
                status: reply.status,
                message: error_message(&reply.body),
            });
        }

        if rate_limited {
            return Err(ExtractError::RateLimited {
                attempts: policy.max_attempts,
            });
        }
        Err(last_error)
    }
}

/// Pulls the text payload out of a messages reply. A success body that is
/// not shaped as expected is passed through whole — the repair ladder
/// downstream turns it into a noted default rather than an error.
fn reply_text(body: &str) -> String {
    match serde_json::from_str::<MessagesReply>(body) {
        Ok(reply) => reply
            .content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.clone())
            .unwrap_or_else(|| body.to_string()),
        Err(_) => body.to_string(),
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ProviderError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedTransport {
        calls: AtomicU32,
        replies: Vec<ProviderReply>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<ProviderReply>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                replies,
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderTransport for ScriptedTransport {
        async fn send(
            &self,
            _api_key: &str,
            _payload: &Value,
        ) -> Result<ProviderReply, ExtractError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            Ok(self.replies[n.min(self.replies.len() - 1)].clone())
        }
    }

    fn reply(status: u16, body: &str) -> ProviderReply {
        ProviderReply {
            status,
            retry_after: None,
            body: body.to_string(),
        }
    }

    fn success_body(text: &str) -> String {
        serde_json::to_string(&json!({
            "content": [{ "type": "text", "text": text }],
        }))
        .unwrap()
    }

    fn test_config() -> Config {
        Config::default()
            .with_api_key("test-key")
            .with_retry(RetryPolicy {
                base_delay: Duration::from_millis(10),
                ..RetryPolicy::default()
            })
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_rate_limit_makes_exactly_max_attempts_calls() {
        let transport = Arc::new(ScriptedTransport::new(vec![reply(429, "slow down")]));
        let client = ExtractionClient::with_transport(test_config(), transport.clone());

        let err = client
            .extract_cv(&DocumentInput::Text("CV".to_string()))
            .await
            .unwrap_err();

        assert_eq!(transport.call_count(), 3);
        assert!(matches!(err, ExtractError::RateLimited { attempts: 3 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_overload() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            reply(529, "overloaded"),
            reply(200, &success_body(r#"{"full_name": "Jane Roe"}"#)),
        ]));
        let client = ExtractionClient::with_transport(test_config(), transport.clone());

        let record = client
            .extract_cv(&DocumentInput::Text("CV".to_string()))
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 2);
        assert_eq!(record.full_name, "Jane Roe");
    }

    #[tokio::test]
    async fn test_client_error_is_terminal_after_one_call() {
        let transport = Arc::new(ScriptedTransport::new(vec![reply(
            400,
            r#"{"error": {"message": "bad request"}}"#,
        )]));
        let client = ExtractionClient::with_transport(test_config(), transport.clone());

        let err = client
            .extract_jd(&DocumentInput::Text("JD".to_string()))
            .await
            .unwrap_err();

        assert_eq!(transport.call_count(), 1);
        match err {
            ExtractError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad request");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mangled_success_body_degrades_instead_of_erroring() {
        let transport = Arc::new(ScriptedTransport::new(vec![reply(
            200,
            &success_body("```json\n{\"job_title\": \"Engineer\"\n```"),
        )]));
        let client = ExtractionClient::with_transport(test_config(), transport);

        let record = client
            .extract_jd(&DocumentInput::Text("JD".to_string()))
            .await
            .unwrap();

        assert_eq!(record.job_title, "Engineer");
    }

    #[tokio::test]
    async fn test_missing_credential_falls_back_for_text() {
        let config = Config::default(); // no api key
        let transport = Arc::new(ScriptedTransport::new(vec![reply(200, "unused")]));
        let client = ExtractionClient::with_transport(config, transport.clone());

        let record = client
            .extract_cv(&DocumentInput::Text(
                "JANE ROE\njane@example.com".to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 0);
        assert!(record.confidence_score <= 0.2);
        assert_eq!(record.email, "jane@example.com");
    }

    #[tokio::test]
    async fn test_missing_credential_errors_for_file_input() {
        let config = Config::default();
        let transport = Arc::new(ScriptedTransport::new(vec![reply(200, "unused")]));
        let client = ExtractionClient::with_transport(config, transport);

        let err = client
            .extract_cv(&DocumentInput::File {
                bytes: vec![0x25, 0x50, 0x44, 0x46],
                filename: "cv.pdf".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractError::ProviderUnavailable));
    }

    #[test]
    fn test_media_type_inference() {
        assert_eq!(DocumentInput::media_type("cv.pdf"), "application/pdf");
        assert_eq!(
            DocumentInput::media_type("cv.DOCX"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(
            DocumentInput::media_type("mystery"),
            "application/octet-stream"
        );
    }
}
