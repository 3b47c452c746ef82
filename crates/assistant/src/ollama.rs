use serde::{Deserialize, Serialize};

use crate::{AssistantConfig, AssistantError, CompletionService, Result};

const SYSTEM_PROMPT: &str = "You are an AI assistant for Velocity, a professional video editing application.
Help users with video editing tasks, explain features, and provide guidance on:
- J-K-L shuttle controls for playback
- Professional editing tools (Ripple, Roll, Slip, Slide, Blade)
- Proxy workflows for better performance
- Color grading and effects
- Timeline management

Keep responses concise and actionable. Use video editing terminology.";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    error: Option<String>,
}

pub fn build_prompt(user: &str) -> String { format!("{SYSTEM_PROMPT}\n\nUser: {user}\n\nAssistant:") }

/// Extracts the completion text from an `/api/generate` body.
pub fn parse_generate_response(body: &str) -> Result<String> {
    let parsed: GenerateResponse = serde_json::from_str(body).map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;
    if let Some(err) = parsed.error {
        return Err(AssistantError::Rejected(err));
    }
    parsed
        .response
        .map(|text| text.trim().to_string())
        .ok_or_else(|| AssistantError::InvalidResponse("missing `response` field".into()))
}

/// Maps a non-success status: 4xx is the caller's fault, anything else the server's.
pub fn status_error(status: reqwest::StatusCode) -> Option<AssistantError> {
    if status.is_success() {
        None
    } else if status.is_client_error() {
        Some(AssistantError::Rejected(format!("HTTP {status}")))
    } else {
        Some(AssistantError::ServiceUnavailable(format!("HTTP {status}")))
    }
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    config: AssistantConfig,
}

impl OllamaClient {
    pub fn new(config: AssistantConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout().min(std::time::Duration::from_secs(5)))
            .build()
            .map_err(|e| AssistantError::ServiceUnavailable(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AssistantConfig { &self.config }

    async fn generate_once(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            model: &self.config.model,
            prompt: build_prompt(prompt),
            stream: false,
            options: GenerateOptions { temperature: self.config.temperature.clamp(0.0, 2.0), num_predict: self.config.num_predict },
        };
        let response = self
            .http
            .post(self.config.endpoint("/api/generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::ServiceUnavailable(e.to_string()))?;
        if let Some(err) = status_error(response.status()) {
            return Err(err);
        }
        let text = response.text().await.map_err(|e| AssistantError::ServiceUnavailable(e.to_string()))?;
        parse_generate_response(&text)
    }
}

impl CompletionService for OllamaClient {
    /// Retries unreachable-service and 5xx failures with exponential backoff.
    /// Rejections and malformed bodies are returned at once.
    async fn send_prompt(&self, prompt: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.generate_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.backoff(attempt);
                    tracing::warn!(attempt, ?delay, error = %err, "ollama request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn check_connection(&self) -> bool {
        match self.http.get(self.config.endpoint("/api/tags")).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                tracing::debug!(error = %err, "ollama connection check failed");
                false
            }
        }
    }
}
