use std::env;
use std::time::Duration;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub tracking_tick: Duration,
    pub tracking_steps: u32,
    pub seed_demo: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            tracking_tick: Duration::from_millis(1000),
            tracking_steps: 20,
            seed_demo: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let gemini_api_key = value("GEMINI_API_KEY").or_else(|| value("API_KEY"));
        if gemini_api_key.is_none() {
            log::warn!("GEMINI_API_KEY not set; price estimates will be disabled");
        }

        let tracking_steps = value("TRACKING_STEPS")
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|steps| *steps > 0)
            .unwrap_or(defaults.tracking_steps);
        let tracking_tick = value("TRACKING_TICK_MS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.tracking_tick);

        Self {
            bind_addr: value("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: value("PORT")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(defaults.port),
            gemini_api_key,
            gemini_base_url: value("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gemini_base_url),
            gemini_model: value("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            tracking_tick,
            tracking_steps,
            seed_demo: value("SEED_DEMO")
                .map(|raw| !matches!(raw.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(defaults.seed_demo),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config(&[]);
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert!(config.seed_demo);
    }

    #[test]
    fn api_key_falls_back_to_legacy_name() {
        assert_eq!(
            config(&[("API_KEY", "legacy")]).gemini_api_key.as_deref(),
            Some("legacy")
        );
        assert_eq!(
            config(&[("API_KEY", "legacy"), ("GEMINI_API_KEY", "new")])
                .gemini_api_key
                .as_deref(),
            Some("new")
        );
    }

    #[test]
    fn bad_numbers_keep_defaults() {
        let config = config(&[
            ("PORT", "eighty"),
            ("TRACKING_STEPS", "0"),
            ("TRACKING_TICK_MS", "-5"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.tracking_steps, 20);
        assert_eq!(config.tracking_tick, Duration::from_millis(1000));
    }

    #[test]
    fn parses_overrides() {
        let config = config(&[
            ("BIND_ADDR", "127.0.0.1"),
            ("PORT", "9000"),
            ("GEMINI_BASE_URL", "http://localhost:1234/"),
            ("TRACKING_TICK_MS", "250"),
            ("SEED_DEMO", "false"),
        ]);
        assert_eq!(config.address(), "127.0.0.1:9000");
        assert_eq!(config.gemini_base_url, "http://localhost:1234");
        assert_eq!(config.tracking_tick, Duration::from_millis(250));
        assert!(!config.seed_demo);
    }
}
