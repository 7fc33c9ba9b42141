// src/publish/x.rs
//! X API v2 client with a user-context bearer token.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::PostingClient;
use crate::error::{BotError, Result};
use crate::media::MediaAsset;

pub const DEFAULT_BASE_URL: &str = "https://api.x.com";

#[derive(Clone)]
pub struct XClient {
    base_url: String,
    bearer: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl XClient {
    pub fn new(bearer: String) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            bearer,
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// Longest a single call can take: every attempt timing out plus every
    /// backoff sleep, plus one second of slack. Callers bounding a call must
    /// not use less, or the final attempt is cancelled mid-flight.
    pub fn deadline_secs(&self) -> u64 {
        let attempts = u64::from(self.max_retries);
        let backoff_ms: u64 = (1..self.max_retries).map(backoff_ms).sum();
        self.timeout.as_secs() * attempts + backoff_ms.div_ceil(1_000) + 1
    }

    /// Send the request built by `build`, retrying network errors, 429 and 5xx
    /// with exponential backoff. Returns the response body on 2xx.
    async fn send_with_retry<F>(&self, build: F) -> Result<String>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = build()
                .bearer_auth(&self.bearer)
                .timeout(self.timeout)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => {
                    let status = rsp.status();
                    let body = rsp.text().await.unwrap_or_default();
                    if status.is_success() {
                        return Ok(body);
                    }
                    BotError::PublishRejected {
                        status: Some(status.as_u16()),
                        reason: api_error_detail(&body).unwrap_or_else(|| status.to_string()),
                    }
                }
                Err(e) => BotError::PublishRejected {
                    status: None,
                    reason: format!("request failed: {e}"),
                },
            };

            if err.is_transient() && attempt < self.max_retries {
                tracing::debug!(attempt, error = %err, "x api retry");
                tokio::time::sleep(Duration::from_millis(backoff_ms(attempt))).await;
                continue;
            }
            return Err(err);
        }
    }
}

/// Sleep after failed attempt `attempt` (1-based).
fn backoff_ms(attempt: u8) -> u64 {
    500u64 << (attempt - 1)
}

#[derive(Serialize)]
struct TweetMedia<'a> {
    media_ids: Vec<&'a str>,
}

#[derive(Serialize)]
struct TweetReq<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<TweetMedia<'a>>,
}

#[derive(Deserialize)]
struct DataResp {
    data: IdData,
}

#[derive(Deserialize)]
struct IdData {
    id: String,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// `detail` (or `title`) from an X API problem body.
fn api_error_detail(body: &str) -> Option<String> {
    let e: ApiError = serde_json::from_str(body).ok()?;
    e.detail.or(e.title)
}

fn parse_id(body: &str) -> std::result::Result<String, String> {
    serde_json::from_str::<DataResp>(body)
        .map(|r| r.data.id)
        .map_err(|e| format!("unexpected response: {e}"))
}

#[async_trait]
impl PostingClient for XClient {
    async fn upload_media(&self, asset: &MediaAsset) -> Result<String> {
        let url = format!("{}/2/media/upload", self.base_url);
        let ext = asset.mime.rsplit('/').next().unwrap_or("png");
        let body = self
            .send_with_retry(|| {
                let part = Part::bytes(asset.bytes.clone())
                    .file_name(format!("image.{ext}"))
                    .mime_str(&asset.mime)
                    .unwrap_or_else(|_| Part::bytes(asset.bytes.clone()));
                let form = Form::new()
                    .text("media_category", "tweet_image")
                    .part("media", part);
                self.client.post(&url).multipart(form)
            })
            .await
            .map_err(|e| BotError::MediaUploadFailed(e.to_string()))?;
        parse_id(&body).map_err(BotError::MediaUploadFailed)
    }

    async fn submit_post(&self, text: &str, media_id: Option<&str>) -> Result<String> {
        let url = format!("{}/2/tweets", self.base_url);
        let payload = TweetReq {
            text,
            media: media_id.map(|id| TweetMedia { media_ids: vec![id] }),
        };
        let body = self
            .send_with_retry(|| self.client.post(&url).json(&payload))
            .await?;
        parse_id(&body).map_err(|reason| BotError::PublishRejected { status: None, reason })
    }

    fn name(&self) -> &'static str {
        "x"
    }
}
