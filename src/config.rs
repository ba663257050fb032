// src/config.rs
// Service configuration: optional `flashwire.toml` at the working directory,
// with environment variables taking precedence. `.env` is loaded by main
// before this runs.

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

pub const ENV_BIND: &str = "FLASHWIRE_BIND";
pub const ENV_TIMEOUT_SECS: &str = "FLASHWIRE_TIMEOUT_SECS";
pub const ENV_CACHE_TTL_SECS: &str = "FLASHWIRE_CACHE_TTL_SECS";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: String,
    pub request_timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl Config {
    /// Defaults <- flashwire.toml <- environment, later layers winning.
    pub fn load() -> Self {
        let mut cfg = std::fs::read_to_string("flashwire.toml")
            .ok()
            .and_then(|text| match toml::from_str::<Config>(&text) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring malformed flashwire.toml");
                    None
                }
            })
            .unwrap_or_default();

        if let Ok(bind) = std::env::var(ENV_BIND) {
            cfg.bind = bind;
        }
        if let Some(secs) = env_u64(ENV_TIMEOUT_SECS) {
            cfg.request_timeout_secs = secs;
        }
        if let Some(secs) = env_u64(ENV_CACHE_TTL_SECS) {
            cfg.cache_ttl_secs = secs;
        }
        cfg
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.bind, DEFAULT_BIND);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str("request_timeout_secs = 5").unwrap();
        assert_eq!(cfg.request_timeout_secs, 5);
        assert_eq!(cfg.bind, DEFAULT_BIND);
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let cfg = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(cfg.request_timeout(), Duration::from_secs(1));
    }
}
