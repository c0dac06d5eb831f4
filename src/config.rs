use reqwest::header::HeaderValue;

use crate::error::ConfigError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://coin_history.db";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Runtime settings, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub market_data_url: String,
    pub market_data_api_key: Option<String>,
}

impl AppConfig {
    /// Read settings from the process environment, honouring a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let port = match lookup("PORT") {
            Some(raw) => parse_port(&raw)?,
            None => DEFAULT_PORT,
        };
        let market_data_url = lookup("COINGECKO_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let market_data_api_key = lookup("COINGECKO_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let config = Self {
            database_url,
            port,
            market_data_url,
            market_data_api_key,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let database_url = self.database_url.trim();
        if database_url.is_empty() {
            return Err(ConfigError::Empty { name: "DATABASE_URL" });
        }
        if !database_url.starts_with("sqlite:") {
            return Err(ConfigError::UnsupportedDatabase(self.database_url.clone()));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port.to_string()));
        }
        if self.market_data_url.is_empty() {
            return Err(ConfigError::Empty { name: "COINGECKO_API_URL" });
        }
        if !(self.market_data_url.starts_with("https://") || self.market_data_url.starts_with("http://")) {
            return Err(ConfigError::InvalidApiUrl(self.market_data_url.clone()));
        }
        if let Some(key) = &self.market_data_api_key {
            if HeaderValue::from_str(key).is_err() {
                return Err(ConfigError::InvalidApiKey);
            }
        }
        Ok(())
    }
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.market_data_url, DEFAULT_API_URL);
        assert!(config.market_data_api_key.is_none());
    }

    #[test]
    fn reads_all_recognised_fields() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite://data/history.db"),
            ("PORT", "8080"),
            ("COINGECKO_API_URL", "http://localhost:9999/api/v3/"),
            ("COINGECKO_API_KEY", " demo-key "),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite://data/history.db");
        assert_eq!(config.port, 8080);
        assert_eq!(config.market_data_url, "http://localhost:9999/api/v3");
        assert_eq!(config.market_data_api_key.as_deref(), Some("demo-key"));
    }

    #[test]
    fn rejects_bad_port() {
        for raw in ["abc", "0", "70000", "-1"] {
            let err = AppConfig::from_lookup(lookup_from(&[("PORT", raw)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidPort(_)), "port {raw}");
        }
    }

    #[test]
    fn rejects_non_sqlite_database() {
        let err = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "mongodb://localhost/coins")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedDatabase(_)));

        let err = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Empty { name: "DATABASE_URL" }));
    }

    #[test]
    fn blank_api_key_is_ignored() {
        let config = AppConfig::from_lookup(lookup_from(&[("COINGECKO_API_KEY", "   ")])).unwrap();
        assert!(config.market_data_api_key.is_none());
    }

    #[test]
    fn rejects_api_key_that_cannot_be_sent_as_a_header() {
        let err = AppConfig::from_lookup(lookup_from(&[("COINGECKO_API_KEY", "demo\u{7f}key")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidApiKey));
    }

    #[test]
    fn rejects_non_http_api_url() {
        let err = AppConfig::from_lookup(lookup_from(&[("COINGECKO_API_URL", "ftp://example.com")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidApiUrl(_)));
    }
}
