use std::fmt;
use std::path::Path;

use serde::Deserialize;

pub const DEFAULT_UPSTREAM_URL: &str = "https://newsapi.org/v2/top-headlines";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Port the proxy listens on
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub api_key: ApiKey,
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,
    /// Upstream request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,
    /// Where list clients reach this proxy
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
}

fn default_port() -> u16 {
    5000
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

fn default_upstream_timeout() -> u64 {
    30
}

fn default_backend_url() -> String {
    "http://localhost:5000".to_string()
}

/// Server-held provider credential. Never printed.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("ApiKey(<unset>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            api_key: ApiKey::default(),
            upstream_url: default_upstream_url(),
            upstream_timeout_secs: default_upstream_timeout(),
            backend_url: default_backend_url(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Overlay environment variables, read through `lookup` so callers
    /// control where they come from.
    pub fn apply_env<F>(mut self, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = port
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PORT '{}': {}", port, e))?;
        }

        // REACT_APP_NEWS_API is what older deployments export
        if let Some(key) = lookup("NEWS_API_KEY").or_else(|| lookup("REACT_APP_NEWS_API")) {
            self.api_key = ApiKey::new(key);
        }

        if let Some(url) = lookup("NEWS_API_URL") {
            self.upstream_url = url;
        }

        if let Some(url) = lookup("BACKEND_URL") {
            self.backend_url = url;
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.upstream_timeout_secs, 30);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
            port = 8080
            api_key = "file-key"
            upstream_url = "http://localhost:9999/v2/top-headlines"
            upstream_timeout_secs = 5
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.api_key.expose(), "file-key");
        assert_eq!(config.upstream_url, "http://localhost:9999/v2/top-headlines");
        assert_eq!(config.upstream_timeout_secs, 5);
        assert_eq!(config.backend_url, "http://localhost:5000");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.upstream_timeout_secs, 30);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = Config::load("/nonexistent/path/readynews.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let content = "this is not valid toml {{{";

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let config = Config::from_str("port = 8080\napi_key = \"file-key\"")
            .unwrap()
            .apply_env(env(&[("PORT", "7000"), ("NEWS_API_KEY", "env-key")]))
            .unwrap();

        assert_eq!(config.port, 7000);
        assert_eq!(config.api_key.expose(), "env-key");
    }

    #[test]
    fn test_legacy_key_variable() {
        let config = Config::default()
            .apply_env(env(&[("REACT_APP_NEWS_API", "legacy")]))
            .unwrap();
        assert_eq!(config.api_key.expose(), "legacy");

        let config = Config::default()
            .apply_env(env(&[("REACT_APP_NEWS_API", "legacy"), ("NEWS_API_KEY", "new")]))
            .unwrap();
        assert_eq!(config.api_key.expose(), "new");
    }

    #[test]
    fn test_invalid_port() {
        let result = Config::default().apply_env(env(&[("PORT", "not-a-port")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let config = Config::default()
            .apply_env(env(&[("NEWS_API_KEY", "super-secret")]))
            .unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
