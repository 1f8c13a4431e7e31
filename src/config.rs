use crate::data::{image_url, pool_url};
use gloo_net::http::Request;
use log::{warn, LevelFilter};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

const CONFIG_PATH: &str = "assets/config.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub api_base: String,
    pub pool_limit: u32,
    pub pool_skip: u32,
    pub image_host: String,
    pub image_width: u32,
    pub batch_size: usize,
    pub initial_preload: usize,
    pub lookahead: usize,
    pub summary_delay_ms: u32,
    pub swipe_threshold: f64,
    pub log_level: String,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            api_base: "https://cataas.com".to_string(),
            pool_limit: 30,
            pool_skip: 0,
            image_host: "https://cataas.com".to_string(),
            image_width: 600,
            batch_size: 15,
            initial_preload: 3,
            lookahead: 2,
            summary_delay_ms: 500,
            swipe_threshold: 80.0,
            log_level: "info".to_string(),
        }
    }
}

impl DeckConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<DeckConfig>(text).map(DeckConfig::sanitized)
    }

    pub fn pool_url(&self) -> String {
        pool_url(&self.api_base, self.pool_limit, self.pool_skip)
    }

    pub fn image_url(&self, id: &str) -> String {
        image_url(&self.image_host, id, self.image_width)
    }

    pub fn summary_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.summary_delay_ms))
    }

    pub fn log_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or_else(|_| {
            warn!("Unknown log level '{}', using info", self.log_level);
            LevelFilter::Info
        })
    }

    fn sanitized(mut self) -> Self {
        if self.batch_size == 0 {
            warn!("batch_size must be positive, using 1");
            self.batch_size = 1;
        }
        if self.pool_limit == 0 {
            warn!("pool_limit must be positive, using 1");
            self.pool_limit = 1;
        }
        if !self.swipe_threshold.is_finite() || self.swipe_threshold <= 0.0 {
            warn!(
                "Invalid swipe_threshold {}, using default",
                self.swipe_threshold
            );
            self.swipe_threshold = DeckConfig::default().swipe_threshold;
        }
        self
    }
}

/// Loads overrides from `assets/config.json`. A missing or broken file is not
/// an error: the built-in defaults apply.
pub async fn load_config() -> DeckConfig {
    let response = match Request::get(CONFIG_PATH).send().await {
        Ok(response) if response.ok() => response,
        Ok(response) => {
            warn!(
                "No config at {} (HTTP {}), using defaults",
                CONFIG_PATH,
                response.status()
            );
            return DeckConfig::default();
        }
        Err(err) => {
            warn!("Falling back to default config: {}", err);
            return DeckConfig::default();
        }
    };

    let text = match response.text().await {
        Ok(text) => text,
        Err(err) => {
            warn!("Failed to read {}: {}", CONFIG_PATH, err);
            return DeckConfig::default();
        }
    };

    match DeckConfig::from_json(&text) {
        Ok(config) => config,
        Err(err) => {
            warn!("Invalid {}: {}", CONFIG_PATH, err);
            DeckConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_public_api() {
        let config = DeckConfig::default();
        assert_eq!(
            config.pool_url(),
            "https://cataas.com/api/cats?limit=30&skip=0"
        );
        assert_eq!(config.image_url("abc"), "https://cataas.com/cat/abc?w=600");
        assert_eq!(config.summary_delay(), Duration::from_millis(500));
        assert_eq!(config.batch_size, 15);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config = DeckConfig::from_json(r#"{"batch_size": 5, "log_level": "debug"}"#).unwrap();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.log_filter(), LevelFilter::Debug);
        assert_eq!(config.pool_limit, 30);
        assert_eq!(config.image_host, "https://cataas.com");
    }

    #[test]
    fn invalid_values_are_clamped() {
        let config =
            DeckConfig::from_json(r#"{"batch_size": 0, "pool_limit": 0, "swipe_threshold": -3}"#)
                .unwrap();
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.pool_limit, 1);
        assert_eq!(config.swipe_threshold, 80.0);
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = DeckConfig {
            log_level: "chatty".into(),
            ..DeckConfig::default()
        };
        assert_eq!(config.log_filter(), LevelFilter::Info);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(DeckConfig::from_json("not json").is_err());
    }
}
