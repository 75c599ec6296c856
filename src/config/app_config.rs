use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub store: StoreSettings,
    pub cache: CacheSettings,
    /// Resource kinds served by the gateway; each gets its own collection
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Persistent store settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Backend name: `in_memory` or `postgres`
    pub backend: String,
    /// Connection URL; falls back to `DATABASE_URL`
    pub url: Option<String>,
    pub max_connections: u32,
}

/// Cache settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Backend name: `in_memory` or `redis`
    pub backend: String,
    /// Connection URL; falls back to `REDIS_URL`
    pub url: Option<String>,
    /// Default TTL for gateway cache fills, in seconds; `CACHE_TTL_SECONDS`
    /// overrides it
    pub ttl_seconds: u64,
    /// Key prefix for namespacing a shared Redis
    pub key_prefix: Option<String>,
    /// Maximum entries for the in-memory backend
    pub max_capacity: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            store: StoreSettings::default(),
            cache: CacheSettings::default(),
            resources: default_resources(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: "in_memory".to_string(),
            url: None,
            max_connections: 10,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: "in_memory".to_string(),
            url: None,
            ttl_seconds: 120,
            key_prefix: None,
            max_capacity: 10_000,
        }
    }
}

fn default_resources() -> Vec<String> {
    ["games", "clients", "movies", "people", "users", "friends"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl AppConfig {
    /// Loads configuration from files and the environment.
    ///
    /// Layering, later sources winning: `config/default`, `config/local`,
    /// `APP__`-prefixed environment variables, then the bare
    /// `DATABASE_URL` / `REDIS_URL` / `CACHE_TTL_SECONDS` variables the
    /// deployment environment has always provided.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: Self = config.try_deserialize()?;
        app_config.apply_env_overrides(|name| std::env::var(name).ok());

        Ok(app_config)
    }

    /// Applies the legacy single-variable overrides through a lookup fn so
    /// tests can inject values without touching the process environment
    fn apply_env_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if self.store.url.is_none() {
            self.store.url = get("DATABASE_URL");
        }

        if self.cache.url.is_none() {
            self.cache.url = get("REDIS_URL");
        }

        if let Some(ttl) = get("CACHE_TTL_SECONDS").and_then(|v| v.parse().ok()) {
            self.cache.ttl_seconds = ttl;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, "in_memory");
        assert_eq!(config.cache.backend, "in_memory");
        assert_eq!(config.cache.ttl_seconds, 120);
        assert!(config.resources.contains(&"games".to_string()));
        assert_eq!(config.resources.len(), 6);
    }

    #[test]
    fn test_env_overrides_fill_missing_urls() {
        let mut config = AppConfig::default();

        config.apply_env_overrides(|name| match name {
            "DATABASE_URL" => Some("postgres://db/example".to_string()),
            "REDIS_URL" => Some("redis://cache:6379".to_string()),
            "CACHE_TTL_SECONDS" => Some("45".to_string()),
            _ => None,
        });

        assert_eq!(config.store.url.as_deref(), Some("postgres://db/example"));
        assert_eq!(config.cache.url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.cache.ttl_seconds, 45);
    }

    #[test]
    fn test_env_overrides_do_not_clobber_explicit_urls() {
        let mut config = AppConfig::default();
        config.store.url = Some("postgres://explicit".to_string());

        config.apply_env_overrides(|name| match name {
            "DATABASE_URL" => Some("postgres://env".to_string()),
            _ => None,
        });

        assert_eq!(config.store.url.as_deref(), Some("postgres://explicit"));
    }

    #[test]
    fn test_non_numeric_ttl_override_ignored() {
        let mut config = AppConfig::default();

        config.apply_env_overrides(|name| match name {
            "CACHE_TTL_SECONDS" => Some("soon".to_string()),
            _ => None,
        });

        assert_eq!(config.cache.ttl_seconds, 120);
    }

    #[test]
    fn test_log_format_deserializes() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
