// src/config/bot.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

use crate::error::BotError;
use crate::media::DEFAULT_KEYWORDS;

pub const ENV_CONFIG_PATH: &str = "BOT_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/bot.toml";
pub const DEFAULT_JSON_PATH: &str = "config/bot.json";

/// Sentinel meaning "read this credential from its environment variable".
const ENV_SENTINEL: &str = "ENV";

const DEFAULT_INSTRUCTION: &str = "Rewrite the news headline below as a single post under 280 characters. \
Plain, factual tone. No hashtags or emojis. Output only the post text.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub schedule: ScheduleConfig,
    pub feed: FeedConfig,
    pub generation: GenerationConfig,
    pub media: MediaConfig,
    pub publish: PublishConfig,
    pub dedupe: DedupeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
    /// Bound on every single network call.
    pub call_timeout_secs: u64,
    pub shuffle_candidates: bool,
    /// 0 = try every candidate.
    pub max_attempts_per_tick: usize,
    /// Fixed seed for candidate shuffling and decoration.
    pub seed: Option<u64>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 15 * 60,
            call_timeout_secs: 20,
            shuffle_candidates: false,
            max_attempts_per_tick: 0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// NewsAPI countries, one partition each.
    pub regions: Vec<String>,
    pub page_size: u32,
    pub api_key: String,
    pub base_url: Option<String>,
    pub rss_urls: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            regions: vec!["in".to_string()],
            page_size: 5,
            api_key: ENV_SENTINEL.to_string(),
            base_url: None,
            rss_urls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub enabled: bool,
    pub model: String,
    pub image_model: String,
    pub instruction: String,
    pub max_tokens: u32,
    pub api_key: String,
    pub base_url: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4o-mini".to_string(),
            image_model: "dall-e-3".to_string(),
            instruction: DEFAULT_INSTRUCTION.to_string(),
            max_tokens: 100,
            api_key: ENV_SENTINEL.to_string(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub enabled: bool,
    pub daily_ceiling: u32,
    pub keywords: Vec<String>,
    pub state_path: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_ceiling: 3,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            state_path: PathBuf::from("state/media_quota.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub max_chars: usize,
    pub suffix: Option<String>,
    pub hashtags: Vec<String>,
    pub dry_run: bool,
    pub bearer_token: String,
    pub base_url: Option<String>,
    pub max_retries: u8,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            max_chars: crate::transform::DEFAULT_MAX_CHARS,
            suffix: None,
            hashtags: Vec::new(),
            dry_run: false,
            bearer_token: ENV_SENTINEL.to_string(),
            base_url: None,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupeConfig {
    pub path: PathBuf,
    /// Retention: most recent N identifiers (0 = unbounded).
    pub max_entries: usize,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("state/published.json"),
            max_entries: 1_000,
        }
    }
}

/// Resolved secrets. `None` means the owning feature is off.
#[derive(Clone, Default)]
pub struct Credentials {
    pub news_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub x_bearer_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = |v: &Option<String>| v.as_ref().map(|s| s.len());
        f.debug_struct("Credentials")
            .field("news_api_key_len", &len(&self.news_api_key))
            .field("openai_api_key_len", &len(&self.openai_api_key))
            .field("x_bearer_token_len", &len(&self.x_bearer_token))
            .finish()
    }
}

impl BotConfig {
    /// Load from an explicit path. Supports TOML or JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading bot config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mut cfg = parse_config(&content, &ext)
            .with_context(|| format!("parsing bot config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $BOT_CONFIG_PATH
    /// 2) config/bot.toml
    /// 3) config/bot.json
    /// 4) built-in defaults
    ///
    /// Env overrides are applied last.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else if Path::new(DEFAULT_TOML_PATH).exists() {
            Self::load_from(Path::new(DEFAULT_TOML_PATH))?
        } else if Path::new(DEFAULT_JSON_PATH).exists() {
            Self::load_from(Path::new(DEFAULT_JSON_PATH))?
        } else {
            Self::default()
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// `TICK_INTERVAL_SECS`, `DRY_RUN=1`.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env::var("TICK_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()) {
            self.schedule.interval_secs = v;
        }
        if let Ok(v) = env::var("DRY_RUN") {
            self.publish.dry_run = matches!(v.trim(), "1" | "true" | "yes");
        }
        self.sanitize();
    }

    /// Clamp values that would break the pipeline.
    fn sanitize(&mut self) {
        self.schedule.interval_secs = self.schedule.interval_secs.max(1);
        self.schedule.call_timeout_secs = self.schedule.call_timeout_secs.max(1);
        self.feed.page_size = self.feed.page_size.clamp(1, 100);
        self.publish.max_chars = self.publish.max_chars.max(4);
        self.publish.max_retries = self.publish.max_retries.max(1);
        self.feed.regions.retain(|r| !r.trim().is_empty());
        self.feed.rss_urls.retain(|u| !u.trim().is_empty());
    }

    /// Resolve every credential the enabled features need. A missing one is
    /// fatal: the process must not start ticking half-configured.
    pub fn resolve_credentials(&self) -> Result<Credentials, BotError> {
        if self.feed.regions.is_empty() && self.feed.rss_urls.is_empty() {
            return Err(BotError::Misconfigured("no feed regions or rss urls configured".into()));
        }
        let news_api_key = if self.feed.regions.is_empty() {
            None
        } else {
            Some(resolve_secret(&self.feed.api_key, "NEWS_API_KEY")?)
        };
        let openai_api_key = if self.generation.enabled || self.media.enabled {
            Some(resolve_secret(&self.generation.api_key, "OPENAI_API_KEY")?)
        } else {
            None
        };
        let x_bearer_token = if self.publish.dry_run {
            None
        } else {
            Some(resolve_secret(&self.publish.bearer_token, "X_BEARER_TOKEN")?)
        };
        Ok(Credentials {
            news_api_key,
            openai_api_key,
            x_bearer_token,
        })
    }
}

fn resolve_secret(value: &str, env_key: &str) -> Result<String, BotError> {
    let v = value.trim();
    if v.eq_ignore_ascii_case(ENV_SENTINEL) || v.is_empty() {
        return env::var(env_key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BotError::Misconfigured(format!("missing {env_key} env var")));
    }
    Ok(v.to_string())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<BotConfig> {
    match hint_ext {
        "json" => Ok(serde_json::from_str(s)?),
        "toml" => Ok(toml::from_str(s)?),
        _ => toml::from_str(s)
            .map_err(anyhow::Error::from)
            .or_else(|_| serde_json::from_str(s).map_err(anyhow::Error::from))
            .map_err(|_| anyhow!("unsupported bot config format")),
    }
}
