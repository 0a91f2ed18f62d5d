use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error};
use url::Url;
use uuid::Uuid;

use super::http::{send_with_retry, RetryPolicy};

/// Default OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("tutorboot/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

/// Result of a successful ping.
#[derive(Debug, Clone)]
pub struct PingResult {
    /// Model id the call was made with
    pub requested_model: String,
    /// Model id the provider reported back, if any
    pub served_model: Option<String>,
    pub completion_id: Option<String>,
    pub latency: Duration,
}

/// Client for an OpenAI-compatible chat completions API.
///
/// The model id is passed through untouched; the only assumption made about
/// it is that it is a non-empty trimmed string.
pub struct ProviderClient {
    client: Client,
    base_url: Url,
    api_key: String,
    retry: RetryPolicy,
}

impl ProviderClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            anyhow::bail!("Provider API key is empty; set OPENAI_API_KEY");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: Self::normalize_base_url(base_url)?,
            api_key,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Parse `base_url`, making sure relative joins keep its path.
    fn normalize_base_url(base_url: &str) -> Result<Url> {
        let mut raw = base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).with_context(|| format!("Invalid provider base URL: {}", base_url))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Failed to build URL for endpoint: {}", path))
    }

    /// Send a minimal one-token completion to check that `model` is served.
    pub async fn ping(&self, model: &str) -> Result<PingResult> {
        let url = self.endpoint("chat/completions")?;
        let body = ChatCompletionRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: "ping",
            }],
            max_completion_tokens: 1,
        };
        let request_id = Uuid::new_v4().to_string();

        debug!("=== Provider Request ===");
        debug!("URL: {}", url);
        debug!("Model: {}", model);

        let started = Instant::now();
        let response = send_with_retry(self.retry, || {
            self.client
                .post(url.clone())
                .bearer_auth(&self.api_key)
                .header("x-request-id", &request_id)
                .json(&body)
        })
        .await
        .with_context(|| format!("Failed to send request to {}", url))?;
        let latency = started.elapsed();

        let status = response.status();
        debug!("Status: {} in {:?}", status, latency);

        let text = response
            .text()
            .await
            .context("Failed to read provider response body")?;

        if !status.is_success() {
            let message = provider_error_message(&text);
            error!("Provider rejected model '{}': {}", model, message);
            anyhow::bail!("Provider returned {}: {}", status, message);
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).context("Failed to parse provider response")?;

        Ok(PingResult {
            requested_model: model.to_string(),
            served_model: parsed.model,
            completion_id: parsed.id,
            latency,
        })
    }
}

/// Pull the human-readable message out of an error body, if it has one.
fn provider_error_message(body: &str) -> String {
    match serde_json::from_str::<ProviderErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
