// src/feed/providers/rss.rs
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::error::{BotError, Result};
use crate::feed::normalize_text;
use crate::feed::types::{ContentItem, FeedClient};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
}

pub struct RssFeed {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssFeed {
    /// Parse a fixed XML document on every fetch (tests, offline runs).
    pub fn from_fixture(name: &str, xml: &str) -> Self {
        Self {
            name: format!("rss:{name}"),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(url: &str) -> Self {
        let host = url
            .split("://")
            .nth(1)
            .and_then(|rest| rest.split('/').next())
            .unwrap_or(url);
        Self {
            name: format!("rss:{host}"),
            mode: Mode::Http {
                url: url.to_string(),
                client: reqwest::Client::new(),
            },
        }
    }

    fn parse_items_from_str(&self, s: &str) -> Result<Vec<ContentItem>> {
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).map_err(|e| BotError::FeedUnavailable {
            partition: self.name.clone(),
            reason: format!("parsing rss xml: {e}"),
        })?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let link = it
                .link
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            // link is the dedupe key; guid only when the feed omits links
            let id = link
                .clone()
                .or_else(|| it.guid.map(|s| s.trim().to_string()))
                .unwrap_or_default();
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            if id.is_empty() || title.is_empty() {
                continue;
            }
            out.push(ContentItem {
                id,
                link,
                title,
                description: it
                    .description
                    .map(|d| normalize_text(&d))
                    .filter(|d| !d.is_empty()),
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822_to_unix),
                body: None,
                partition: self.name.clone(),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl FeedClient for RssFeed {
    async fn fetch_items(&self) -> Result<Vec<ContentItem>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| BotError::FeedUnavailable {
                        partition: self.name.clone(),
                        reason: format!("rss http get: {e}"),
                    })?
                    .text()
                    .await
                    .map_err(|e| BotError::FeedUnavailable {
                        partition: self.name.clone(),
                        reason: format!("rss http body: {e}"),
                    })?;
                self.parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
