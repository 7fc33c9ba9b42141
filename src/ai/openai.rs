// src/ai/openai.rs
//! OpenAI provider: chat completions for post copy, image generations for
//! illustrations. Requires an API key resolved by config.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ImageGenerator, PromptSpec, TextGenerator};
use crate::error::{BotError, Result};
use crate::media::MediaAsset;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    image_model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: &str, image_model: &str) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("headline-bot/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: model.to_string(),
            image_model: image_model.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}
#[derive(Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}
#[derive(Deserialize)]
struct ChatResp {
    choices: Vec<Choice>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

#[derive(Serialize)]
struct ImageReq<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}
#[derive(Deserialize)]
struct ImageResp {
    data: Vec<ImageData>,
}
#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// Pull the first completion out of a chat response body.
pub fn extract_completion(body: &str) -> Result<String> {
    let resp: ChatResp = serde_json::from_str(body)
        .map_err(|e| BotError::GenerationFailed(format!("malformed completion: {e}")))?;
    let content = resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    let cleaned = strip_wrapping_quotes(content.trim());
    if cleaned.is_empty() {
        return Err(BotError::GenerationEmpty);
    }
    Ok(cleaned.to_string())
}

/// Models often wrap a tweet in quotes; drop one matching pair.
fn strip_wrapping_quotes(s: &str) -> &str {
    let quoted = s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"'))
            || (s.starts_with('\u{201C}') && s.ends_with('\u{201D}')));
    if !quoted {
        return s;
    }
    let mut chars = s.chars();
    chars.next();
    chars.next_back();
    chars.as_str().trim()
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate_text(&self, prompt: &PromptSpec) -> Result<String> {
        let req = ChatReq {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: &prompt.system,
                },
                Msg {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: 0.7,
            max_tokens: prompt.max_tokens,
        };

        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| BotError::GenerationFailed(format!("request: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BotError::GenerationFailed(format!("body: {e}")))?;
        if !status.is_success() {
            return Err(BotError::GenerationFailed(format!("HTTP {status}")));
        }
        extract_completion(&body)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate_image(&self, prompt: &str) -> Result<MediaAsset> {
        let failed = |what: &str, e: String| BotError::ImageGenerationFailed(format!("{what}: {e}"));

        let req = ImageReq {
            model: &self.image_model,
            prompt,
            n: 1,
            size: "1024x1024",
        };
        let resp = self
            .http
            .post(format!("{}/v1/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| failed("request", e.to_string()))?;
        let body: ImageResp = resp.json().await.map_err(|e| failed("parse", e.to_string()))?;
        let url = body
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or_else(|| BotError::ImageGenerationFailed("empty image result".into()))?;

        let img = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| failed("download", e.to_string()))?;
        let mime = img
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = img.bytes().await.map_err(|e| failed("download body", e.to_string()))?;
        if bytes.is_empty() {
            return Err(BotError::ImageGenerationFailed("empty image body".into()));
        }

        Ok(MediaAsset {
            bytes: bytes.to_vec(),
            mime,
            source_url: Some(url),
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
