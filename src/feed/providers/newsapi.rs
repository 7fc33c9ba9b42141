// src/feed/providers/newsapi.rs
//! NewsAPI "top headlines" partition: one client per country/region.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::error::{BotError, Result};
use crate::feed::normalize_text;
use crate::feed::types::{ContentItem, FeedClient};

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org";

/// NewsAPI marks takedowns with this literal title.
const REMOVED_MARKER: &str = "[Removed]";

#[derive(Debug, Deserialize)]
struct Resp {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

pub struct NewsApiFeed {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    country: String,
    page_size: u32,
    name: String,
}

impl NewsApiFeed {
    pub fn new(api_key: String, country: &str, page_size: u32) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("headline-bot/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        let country = country.to_ascii_lowercase();
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            name: format!("newsapi:{country}"),
            country,
            page_size: page_size.clamp(1, 100),
        }
    }

    /// Point at a different host (mirror or local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Parse a `/v2/top-headlines` body. Articles without a URL or title, and
    /// takedown placeholders, are dropped here.
    pub fn parse_articles(body: &str, partition: &str) -> Result<Vec<ContentItem>> {
        let resp: Resp = serde_json::from_str(body).map_err(|e| BotError::FeedUnavailable {
            partition: partition.to_string(),
            reason: format!("parse newsapi json: {e}"),
        })?;
        if resp.status != "ok" {
            return Err(BotError::FeedUnavailable {
                partition: partition.to_string(),
                reason: resp.message.unwrap_or_else(|| format!("status {}", resp.status)),
            });
        }

        let mut out = Vec::with_capacity(resp.articles.len());
        for a in resp.articles {
            let title = normalize_text(a.title.as_deref().unwrap_or_default());
            let url = a.url.unwrap_or_default().trim().to_string();
            if url.is_empty() || title.is_empty() || title == REMOVED_MARKER {
                continue;
            }
            out.push(ContentItem {
                link: Some(url.clone()),
                id: url,
                title,
                description: a
                    .description
                    .map(|d| normalize_text(&d))
                    .filter(|d| !d.is_empty()),
                published_at: a.published_at.as_deref().and_then(parse_rfc3339_to_unix),
                body: a.content.map(|c| normalize_text(&c)).filter(|c| !c.is_empty()),
                partition: partition.to_string(),
            });
        }
        Ok(out)
    }
}

fn parse_rfc3339_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts, &Rfc3339)
        .ok()
        .and_then(|dt| u64::try_from(dt.unix_timestamp()).ok())
}

#[async_trait]
impl FeedClient for NewsApiFeed {
    async fn fetch_items(&self) -> Result<Vec<ContentItem>> {
        let unavailable = |reason: String| BotError::FeedUnavailable {
            partition: self.name.clone(),
            reason,
        };
        let url = format!("{}/v2/top-headlines", self.base_url);
        let page_size = self.page_size.to_string();
        let resp = self
            .http
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("country", self.country.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| unavailable(format!("newsapi request: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| unavailable(format!("newsapi body: {e}")))?;
        if !status.is_success() && !body.contains("\"status\"") {
            return Err(unavailable(format!("newsapi HTTP {status}")));
        }
        Self::parse_articles(&body, &self.name)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
