use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domains::matching::MatchmakingConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
    pub match_timeout_secs: u64,
    pub match_poll_min_ms: u64,
    pub match_poll_max_ms: u64,
    pub session_ttl_hours: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: parse_or("PORT", 8080)?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "disagree-to-agree".to_string()),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            match_timeout_secs: parse_or("MATCH_TIMEOUT_SECS", 60)?,
            match_poll_min_ms: parse_or("MATCH_POLL_MIN_MS", 100)?,
            match_poll_max_ms: parse_or("MATCH_POLL_MAX_MS", 2000)?,
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", 24)?,
        })
    }

    pub fn matchmaking(&self) -> MatchmakingConfig {
        MatchmakingConfig {
            match_timeout: Duration::from_secs(self.match_timeout_secs),
            poll_min_interval: Duration::from_millis(self.match_poll_min_ms),
            poll_max_interval: Duration::from_millis(self.match_poll_max_ms),
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_skips_blanks() {
        assert_eq!(
            parse_list(" https://a.example , ,https://b.example,"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_matchmaking_from_config() {
        let config = Config {
            database_url: String::new(),
            port: 8080,
            jwt_secret: String::new(),
            jwt_issuer: String::new(),
            allowed_origins: vec![],
            match_timeout_secs: 30,
            match_poll_min_ms: 50,
            match_poll_max_ms: 500,
            session_ttl_hours: 12,
        };

        let matchmaking = config.matchmaking();
        assert_eq!(matchmaking.match_timeout, Duration::from_secs(30));
        assert_eq!(matchmaking.poll_min_interval, Duration::from_millis(50));
        assert_eq!(matchmaking.poll_max_interval, Duration::from_millis(500));
        assert_eq!(config.session_ttl(), chrono::Duration::hours(12));
    }
}
