use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed process configuration, read from the environment (and `.env`).
///
/// The per-community settings live in the JSON document managed by
/// [`crate::store::ConfigStore`]; this only carries what is needed to start.
#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub config_path: PathBuf,
    pub command_prefix: String,

    // Moderation
    pub warning_ttl: Duration,
    pub banned_words: Vec<String>,
    pub block_links: bool,
    pub max_mentions: usize,

    // Presence
    pub status_text: String,
    pub status_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::load_from(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_str = |key: &str| lookup(key);
        let env_bool = |key: &str| env_str(key).map(|s| parse_bool(&s));
        let env_u64 = |key: &str| env_str(key).and_then(|s| s.trim().parse::<u64>().ok());
        let env_usize = |key: &str| env_str(key).and_then(|s| s.trim().parse::<usize>().ok());

        let discord_token = env_str("DISCORD_TOKEN").unwrap_or_default();
        if discord_token.trim().is_empty() {
            return Err(Error::Config(
                "DISCORD_TOKEN environment variable is required".to_string(),
            ));
        }

        let config_path = env_str("MODBOT_CONFIG_PATH")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let command_prefix = env_str("COMMAND_PREFIX")
            .and_then(non_empty)
            .unwrap_or_else(|| "!".to_string());

        let warning_ttl = Duration::from_secs(env_u64("WARNING_TTL_SECS").unwrap_or(5));
        let banned_words = parse_csv_lower(env_str("MODERATION_BANNED_WORDS"));
        let block_links = env_bool("MODERATION_BLOCK_LINKS").unwrap_or(true);
        let max_mentions = env_usize("MODERATION_MAX_MENTIONS").unwrap_or(5);

        let status_text = env_str("BOT_STATUS_TEXT")
            .and_then(non_empty)
            .unwrap_or_else(|| "Rollexs West".to_string());
        let status_url = match env_str("BOT_STATUS_URL") {
            Some(v) => non_empty(v),
            None => Some("https://twitch.tv/rollexs".to_string()),
        };

        Ok(Self {
            discord_token,
            config_path,
            command_prefix,
            warning_ttl,
            banned_words,
            block_links,
            max_mentions,
            status_text,
            status_url,
        })
    }
}

pub const DEFAULT_CONFIG_PATH: &str = "data/config.json";

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, strip_quotes(v.trim()));
    }
}

fn strip_quotes(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_csv_lower(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
