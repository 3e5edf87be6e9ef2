use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{error, info, warn};

use intel_core::{Error, InferenceBackend, Result};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    system: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for the Ollama-style inference service.
///
/// One `generate` call is one non-streaming request with low-temperature
/// decoding parameters. Request timeouts and 5xx responses are retried with
/// exponential backoff up to the configured ceiling; everything else
/// propagates immediately.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_retries,
        })
    }

    pub async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: user_prompt.to_string(),
            system: system_prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                temperature: 0.1,
                top_p: 0.9,
            },
        };
        let url = format!("{}/api/generate", self.base_url);
        let client = self.client.clone();

        info!(
            model = %self.model,
            prompt_length = user_prompt.len(),
            "sending generate request"
        );

        let outcome = with_retries(self.max_retries, |attempt| {
            let client = client.clone();
            let url = url.clone();
            let request = request.clone();
            async move { send_generate(client, url, request, attempt).await }
        })
        .await;

        match outcome {
            Ok(text) => {
                info!(response_length = text.len(), model = %self.model, "received generate response");
                Ok(text)
            }
            Err((message, attempts)) => {
                error!(attempts, "generate request failed: {}", message);
                Err(Error::Inference { message, attempts })
            }
        }
    }

    /// Probes the models-listing endpoint with a short fixed timeout.
    /// Returns false on any error.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("inference health check failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl InferenceBackend for OllamaClient {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        OllamaClient::generate(self, system_prompt, user_prompt).await
    }

    async fn health_check(&self) -> bool {
        OllamaClient::health_check(self).await
    }
}

async fn send_generate(
    client: Client,
    url: String,
    request: GenerateRequest,
    attempt: u32,
) -> std::result::Result<String, TryError> {
    let response = client
        .post(&url)
        .json(&request)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                TryError::transient(format!("request timed out on attempt {}: {}", attempt, e))
            } else {
                TryError::fatal(format!("request failed: {}", e))
            }
        })?;

    let status = response.status();
    if status.is_server_error() {
        return Err(TryError::transient(format!("server error: {}", status)));
    }
    if !status.is_success() {
        return Err(TryError::fatal(format!("HTTP {}", status)));
    }

    let payload: GenerateResponse = response
        .json()
        .await
        .map_err(|e| TryError::fatal(format!("malformed response payload: {}", e)))?;

    Ok(payload.response)
}

#[derive(Debug)]
pub(crate) struct TryError {
    transient: bool,
    message: String,
}

impl TryError {
    pub(crate) fn transient(message: impl Into<String>) -> Self {
        Self {
            transient: true,
            message: message.into(),
        }
    }

    pub(crate) fn fatal(message: impl Into<String>) -> Self {
        Self {
            transient: false,
            message: message.into(),
        }
    }
}

/// Bounded retry loop with exponential backoff, sleeping 2^attempt seconds
/// after each transient failure. `max_retries` counts extra attempts beyond
/// the first. On exhaustion, returns the last message with the total attempt
/// count.
pub(crate) async fn with_retries<T, F, Fut>(
    max_retries: u32,
    mut op: F,
) -> std::result::Result<T, (String, u32)>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, TryError>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.transient || attempt > max_retries {
                    return Err((err.message, attempt));
                }
                let backoff = Duration::from_secs(1u64 << attempt);
                warn!(
                    attempt,
                    backoff_secs = backoff.as_secs(),
                    "transient inference failure, backing off: {}",
                    err.message
                );
                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_with_exponential_backoff() {
        let calls = Arc::new(AtomicU32::new(0));
        let started = tokio::time::Instant::now();

        let result = with_retries(2, |_attempt| {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(TryError::transient("timeout"))
                } else {
                    Ok("generated".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "generated");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 2^1 + 2^2 seconds of backoff, exact under paused time.
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: std::result::Result<String, _> = with_retries(2, |_attempt| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TryError::fatal("HTTP 400 Bad Request"))
            }
        })
        .await;

        let (message, attempts) = result.unwrap_err();
        assert_eq!(attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(message.contains("400"));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_retries_reports_attempt_count() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: std::result::Result<String, _> = with_retries(1, |_attempt| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TryError::transient("server error: 503"))
            }
        })
        .await;

        let (_, attempts) = result.unwrap_err();
        assert_eq!(attempts, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
