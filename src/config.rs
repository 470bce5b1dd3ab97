//! Environment-derived daemon configuration.
//!
//! Everything the `heraldd` binary needs is read once at startup from
//! `HERALD_*` variables. The library itself never touches the environment;
//! collaborators are constructed from this struct and passed in.

use crate::error::Error;
use crate::gateway::RetryPolicy;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const DEFAULT_CACHE_DIR: &str = "herald-cache";
const DEFAULT_OUTPUT_FORMAT: &str = "mp3";
const DEFAULT_PLAYER: &str = "mpv --no-terminal --no-video";
const DEFAULT_VOLUME_FLAG: &str = "--volume=";

/// Resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct HeraldConfig {
    /// Root directory of the durable cache tier.
    pub cache_dir: PathBuf,
    /// Base URL of the optional HTTP fast tier. `None` disables it.
    pub fast_tier_url: Option<Url>,
    /// Speech synthesis endpoint.
    pub synthesis_url: Url,
    /// Bearer token for the synthesis endpoint.
    pub synthesis_api_key: Option<String>,
    /// Default voice merged beneath per-message options.
    pub voice: Option<String>,
    /// Default output format merged beneath per-message options.
    pub output_format: String,
    pub max_retries: u32,
    pub retry_min_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Player executable and fixed arguments. Empty disables playback.
    pub player_command: Vec<String>,
    /// Flag prefix the per-request volume is appended to. `None` disables it.
    pub volume_flag: Option<String>,
    /// Sound file played before every announcement.
    pub chime_path: Option<PathBuf>,
    /// Capacity of the in-process fast tier used when no fast-tier URL is set.
    /// Zero disables it.
    pub memory_cache_entries: usize,
}

impl HeraldConfig {
    /// Reads the configuration from `HERALD_*` environment variables.
    ///
    /// `HERALD_SYNTHESIS_URL` is the only required variable. Invalid URLs are
    /// rejected here rather than at first use.
    pub fn from_env() -> crate::Result<Self> {
        let cache_dir = env::var("HERALD_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR));

        let fast_tier_url = match env::var("HERALD_FAST_TIER_URL") {
            Ok(raw) => Some(Url::parse(&raw).map_err(|e| {
                Error::configuration(format!("invalid HERALD_FAST_TIER_URL `{}`: {}", raw, e))
            })?),
            Err(_) => None,
        };

        let raw_synthesis_url = env::var("HERALD_SYNTHESIS_URL")
            .map_err(|_| Error::configuration("HERALD_SYNTHESIS_URL is not set"))?;
        let synthesis_url = Url::parse(&raw_synthesis_url).map_err(|e| {
            Error::configuration(format!(
                "invalid HERALD_SYNTHESIS_URL `{}`: {}",
                raw_synthesis_url, e
            ))
        })?;

        let synthesis_api_key = env::var("HERALD_SYNTHESIS_API_KEY")
            .ok()
            .or_else(|| env::var("OPENAI_API_KEY").ok());

        let player_command = match env::var("HERALD_PLAYER") {
            Ok(raw) => raw.split_whitespace().map(str::to_string).collect(),
            Err(_) => DEFAULT_PLAYER
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        };

        let volume_flag = match env::var("HERALD_VOLUME_FLAG") {
            Ok(raw) if raw.is_empty() => None,
            Ok(raw) => Some(raw),
            Err(_) => Some(DEFAULT_VOLUME_FLAG.to_string()),
        };

        Ok(Self {
            cache_dir,
            fast_tier_url,
            synthesis_url,
            synthesis_api_key,
            voice: env::var("HERALD_VOICE").ok(),
            output_format: env::var("HERALD_OUTPUT_FORMAT")
                .unwrap_or_else(|_| DEFAULT_OUTPUT_FORMAT.to_string()),
            max_retries: env::var("HERALD_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(3),
            retry_min_delay_ms: env::var("HERALD_RETRY_MIN_DELAY_MS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(500),
            retry_max_delay_ms: env::var("HERALD_RETRY_MAX_DELAY_MS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(30_000),
            request_timeout_secs: env::var("HERALD_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(30),
            player_command,
            volume_flag,
            chime_path: env::var("HERALD_CHIME").ok().map(PathBuf::from),
            memory_cache_entries: env::var("HERALD_MEMORY_CACHE_ENTRIES")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(0),
        })
    }

    /// Retry policy for the synthesis gateway.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_min_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }

    /// Synthesis defaults merged beneath every message's options.
    ///
    /// Changing these changes cache keys, so a deployment-level voice switch
    /// naturally invalidates old entries.
    pub fn synthesis_defaults(&self) -> BTreeMap<String, String> {
        let mut defaults = BTreeMap::new();
        if let Some(voice) = &self.voice {
            defaults.insert("voice".to_string(), voice.clone());
        }
        defaults.insert("response_format".to_string(), self.output_format.clone());
        defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var mutation is process-global; everything runs in one test to
    // avoid cross-test races.
    #[test]
    fn test_from_env() {
        env::remove_var("HERALD_SYNTHESIS_URL");
        assert!(HeraldConfig::from_env().is_err());

        env::set_var("HERALD_SYNTHESIS_URL", "not a url");
        assert!(HeraldConfig::from_env().is_err());

        env::set_var("HERALD_SYNTHESIS_URL", "https://api.example.com/v1/audio/speech");
        env::remove_var("HERALD_CACHE_DIR");
        env::remove_var("HERALD_FAST_TIER_URL");
        env::remove_var("HERALD_VOICE");
        env::remove_var("HERALD_OUTPUT_FORMAT");
        env::remove_var("HERALD_PLAYER");
        env::remove_var("HERALD_VOLUME_FLAG");
        let config = HeraldConfig::from_env().unwrap();
        assert_eq!(config.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
        assert!(config.fast_tier_url.is_none());
        assert_eq!(config.output_format, "mp3");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.player_command[0], "mpv");
        assert_eq!(config.volume_flag.as_deref(), Some("--volume="));

        env::set_var("HERALD_VOICE", "alloy");
        env::set_var("HERALD_OUTPUT_FORMAT", "opus");
        env::set_var("HERALD_VOLUME_FLAG", "");
        let config = HeraldConfig::from_env().unwrap();
        assert!(config.volume_flag.is_none());
        let defaults = config.synthesis_defaults();
        assert_eq!(defaults.get("voice").map(String::as_str), Some("alloy"));
        assert_eq!(
            defaults.get("response_format").map(String::as_str),
            Some("opus")
        );

        env::remove_var("HERALD_SYNTHESIS_URL");
        env::remove_var("HERALD_VOICE");
        env::remove_var("HERALD_OUTPUT_FORMAT");
        env::remove_var("HERALD_VOLUME_FLAG");
    }
}
