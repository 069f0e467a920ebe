//! Completion client, cost estimation and the spend ledger.
//!
//! The only thing the rest of the crate needs from a language model is
//! [`CompletionClient::complete`]. [`OpenAiClient`] implements it against a
//! chat-completions endpoint; tests substitute their own implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{AnalyticsError, Result};
use crate::validation::InputValidator;

/// Tokens consumed by one completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u64,
    /// Tokens in the completion
    pub completion_tokens: u64,
}

impl TokenUsage {
    /// Prompt plus completion tokens
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// One prompt to complete
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model name
    pub model: String,
    /// User message content
    pub prompt: String,
    /// Completion length limit
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

/// Completion text plus what it cost in tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Generated text
    pub text: String,
    /// Tokens billed for the call
    pub usage: TokenUsage,
}

/// Anything that can turn a prompt into text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}

/// Exponential backoff settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): `base × 2^attempt`, capped.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_completion(self) -> Result<Completion> {
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AnalyticsError::Llm("response contained no message content".to_string()))?;
        Ok(Completion {
            text,
            usage: self.usage.unwrap_or_default(),
        })
    }
}

/// Chat-completions client over HTTPS
pub struct OpenAiClient {
    http: Client,
    endpoint: String,
    api_key: String,
    retry: RetryPolicy,
}

impl OpenAiClient {
    /// Build a client from the `llm` settings and an API key.
    pub fn new(api_key: String, settings: &LlmConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", settings.api_base.trim_end_matches('/')),
            api_key,
            retry: RetryPolicy {
                max_retries: settings.max_retries,
                base_delay: Duration::from_millis(settings.retry_backoff_ms),
                ..RetryPolicy::default()
            },
        })
    }

    async fn send_once(&self, request: &CompletionRequest) -> std::result::Result<ChatResponse, reqwest::Error> {
        let body = ChatRequest {
            model: &request.model,
            messages: [ChatMessage { role: "user", content: &request.prompt }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        self.http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await
    }
}

fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_timeout()
        || err.is_connect()
        || err
            .status()
            .is_some_and(|s| s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error())
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(response) => return response.into_completion(),
                Err(err) if attempt < self.retry.max_retries && is_retryable(&err) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "Completion request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Dollar cost of `usage` on `model`, from per-1k-token rates.
#[must_use]
pub fn estimate_cost(model: &str, usage: &TokenUsage) -> f64 {
    let (input_rate, output_rate) = if model.to_ascii_lowercase().contains("gpt-4") {
        (0.03, 0.06)
    } else {
        (0.0005, 0.0015)
    };
    (usage.prompt_tokens as f64 / 1000.0) * input_rate + (usage.completion_tokens as f64 / 1000.0) * output_rate
}

/// Running spend against a fixed budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostLedger {
    budget: f64,
    total_tokens: u64,
    total_cost: f64,
}

/// Final spend figures, as persisted under `cost_summary`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    /// Tokens across successful completions
    pub total_tokens: u64,
    /// Estimated dollars spent
    pub total_cost: f64,
    /// Budget minus spend
    pub remaining_budget: f64,
}

impl CostLedger {
    #[must_use]
    pub const fn new(budget: f64) -> Self {
        Self { budget, total_tokens: 0, total_cost: 0.0 }
    }

    /// Ledger after one more completion.
    #[must_use]
    pub fn record(self, usage: &TokenUsage, cost: f64) -> Self {
        Self {
            total_tokens: self.total_tokens + usage.total(),
            total_cost: self.total_cost + cost,
            ..self
        }
    }

    #[must_use]
    pub fn summary(&self) -> CostSummary {
        CostSummary {
            total_tokens: self.total_tokens,
            total_cost: self.total_cost,
            remaining_budget: self.budget - self.total_cost,
        }
    }
}

/// Read the API key from the environment variable `env_var`.
pub fn read_api_key(env_var: &str) -> Result<String> {
    let key = std::env::var(env_var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AnalyticsError::MissingCredential(env_var.to_string()))?;
    InputValidator::validate_api_key(&key)?;
    debug!(env_var, "API key loaded");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_rates() {
        let usage = TokenUsage { prompt_tokens: 1000, completion_tokens: 1000 };
        assert!((estimate_cost("gpt-3.5-turbo", &usage) - 0.002).abs() < 1e-12);
        assert!((estimate_cost("gpt-4-turbo", &usage) - 0.09).abs() < 1e-12);
    }

    #[test]
    fn test_cost_rate_ignores_model_case() {
        let usage = TokenUsage { prompt_tokens: 1000, completion_tokens: 1000 };
        assert!((estimate_cost("GPT-4o", &usage) - 0.09).abs() < 1e-12);
        assert!((estimate_cost("azure/Gpt-4", &usage) - 0.09).abs() < 1e-12);
    }

    #[test]
    fn test_ledger_accumulates() {
        let ledger = CostLedger::new(100.0)
            .record(&TokenUsage { prompt_tokens: 100, completion_tokens: 50 }, 0.25)
            .record(&TokenUsage { prompt_tokens: 10, completion_tokens: 5 }, 0.5);
        let summary = ledger.summary();
        assert_eq!(summary.total_tokens, 165);
        assert!((summary.total_cost - 0.75).abs() < 1e-12);
        assert!((summary.remaining_budget - 99.25).abs() < 1e-12);
    }

    #[test]
    fn test_retry_delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(4), Duration::from_secs(1));
        assert_eq!(policy.delay_for(40), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_api_key() {
        let err = read_api_key("CALL_INSIGHTS_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, AnalyticsError::MissingCredential(_)));
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Themes: ..."}}],
                       "usage":{"prompt_tokens":12,"completion_tokens":30,"total_tokens":42}}"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        let completion = response.into_completion().unwrap();
        assert_eq!(completion.text, "Themes: ...");
        assert_eq!(completion.usage.total(), 42);
    }

    #[test]
    fn test_empty_choices_is_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(response.into_completion().is_err());
    }
}
