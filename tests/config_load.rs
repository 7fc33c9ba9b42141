// tests/config_load.rs
use headline_bot::config::BotConfig;
use headline_bot::error::BotError;
use std::{env, fs};

/// Restores the listed env vars on drop.
struct EnvSnapshot(Vec<(&'static str, Option<String>)>);

impl EnvSnapshot {
    fn take(keys: &[&'static str]) -> Self {
        Self(keys.iter().map(|k| (*k, env::var(k).ok())).collect())
    }
}

impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (k, v) in &self.0 {
            match v {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }
    }
}

const KEYS: &[&str] = &[
    "BOT_CONFIG_PATH",
    "TICK_INTERVAL_SECS",
    "DRY_RUN",
    "NEWS_API_KEY",
    "OPENAI_API_KEY",
    "X_BEARER_TOKEN",
];

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("bot.toml");
    fs::write(
        &p_toml,
        r#"
[feed]
regions = ["us", " ", "gb"]
rss_urls = ["https://feeds.example.org/rss"]

[publish]
max_chars = 140
hashtags = ["news"]
"#,
    )
    .unwrap();
    let cfg = BotConfig::load_from(&p_toml).unwrap();
    assert_eq!(cfg.feed.regions, vec!["us".to_string(), "gb".to_string()]);
    assert_eq!(cfg.publish.max_chars, 140);
    assert_eq!(cfg.schedule.interval_secs, 900);

    let p_json = dir.path().join("bot.json");
    fs::write(&p_json, r#"{"schedule":{"interval_secs":0},"media":{"enabled":false}}"#).unwrap();
    let cfg = BotConfig::load_from(&p_json).unwrap();
    assert_eq!(cfg.schedule.interval_secs, 1, "clamped to a positive interval");
    assert!(!cfg.media.enabled);

    let p_bad = dir.path().join("bot.toml.bak");
    fs::write(&p_bad, "this is = = not config").unwrap();
    assert!(BotConfig::load_from(&p_bad).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    let _env = EnvSnapshot::take(KEYS);
    // Isolate CWD so the repo's own config/ is not read
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    for k in KEYS {
        env::remove_var(k);
    }

    // 1) nothing on disk → defaults
    let cfg = BotConfig::load_default().unwrap();
    assert_eq!(cfg.schedule.interval_secs, 900);

    // 2) ./config/bot.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/bot.toml"),
        "[schedule]\ninterval_secs = 300\n",
    )
    .unwrap();
    assert_eq!(BotConfig::load_default().unwrap().schedule.interval_secs, 300);

    // 3) explicit path wins; env overrides apply last
    let p_env = tmp.path().join("other.json");
    fs::write(&p_env, r#"{"schedule":{"interval_secs":120}}"#).unwrap();
    env::set_var("BOT_CONFIG_PATH", p_env.display().to_string());
    env::set_var("TICK_INTERVAL_SECS", "45");
    env::set_var("DRY_RUN", "1");
    let cfg = BotConfig::load_default().unwrap();
    assert_eq!(cfg.schedule.interval_secs, 45);
    assert!(cfg.publish.dry_run);

    // 4) a dangling explicit path is an error, not a silent fallback
    env::set_var("BOT_CONFIG_PATH", tmp.path().join("missing.toml").display().to_string());
    assert!(BotConfig::load_default().is_err());

    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn missing_credentials_are_fatal_and_env_sentinel_resolves() {
    let _env = EnvSnapshot::take(KEYS);
    for k in KEYS {
        env::remove_var(k);
    }
    let cfg = BotConfig::default();

    let err = cfg.resolve_credentials().unwrap_err();
    assert!(matches!(err, BotError::Misconfigured(ref m) if m.contains("NEWS_API_KEY")));

    env::set_var("NEWS_API_KEY", "news-secret");
    env::set_var("OPENAI_API_KEY", "oa-secret");
    assert!(matches!(
        cfg.resolve_credentials(),
        Err(BotError::Misconfigured(ref m)) if m.contains("X_BEARER_TOKEN")
    ));

    env::set_var("X_BEARER_TOKEN", "x-secret");
    let creds = cfg.resolve_credentials().unwrap();
    assert_eq!(creds.news_api_key.as_deref(), Some("news-secret"));
    assert_eq!(creds.openai_api_key.as_deref(), Some("oa-secret"));
    assert_eq!(creds.x_bearer_token.as_deref(), Some("x-secret"));

    // dry run needs no posting token; generation off needs no OpenAI key
    env::remove_var("X_BEARER_TOKEN");
    env::remove_var("OPENAI_API_KEY");
    let mut offline = BotConfig::default();
    offline.publish.dry_run = true;
    offline.generation.enabled = false;
    offline.media.enabled = false;
    let creds = offline.resolve_credentials().unwrap();
    assert!(creds.x_bearer_token.is_none());
    assert!(creds.openai_api_key.is_none());
}
