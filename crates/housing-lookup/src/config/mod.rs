use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub lookup: LookupConfig,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let debounce_ms = parse_var("LOOKUP_DEBOUNCE_MS", 300u64)?;
        let min_query_len = parse_var("LOOKUP_MIN_QUERY_LEN", 2usize)?;
        if min_query_len == 0 {
            return Err(ConfigError::InvalidNumber {
                name: "LOOKUP_MIN_QUERY_LEN",
            });
        }

        let api_url = env::var("CATALOG_API_URL")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{port}"))
            .trim_end_matches('/')
            .to_string();
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidApiUrl(api_url));
        }
        let timeout_secs = parse_var("CATALOG_TIMEOUT_SECS", 10u64)?;
        let seed_dir = env::var("CATALOG_SEED_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            lookup: LookupConfig {
                debounce_ms,
                min_query_len,
            },
            catalog: CatalogConfig {
                api_url,
                timeout_secs,
                seed_dir,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Debounce and suppression rules shared by every lookup field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    pub debounce_ms: u64,
    pub min_query_len: usize,
}

impl LookupConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_query_len: 2,
        }
    }
}

/// Where the city/institution catalog lives, both as a remote and as seed data.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub seed_dir: Option<PathBuf>,
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str },
    InvalidApiUrl(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name } => {
                write!(f, "{name} must be a positive integer")
            }
            ConfigError::InvalidApiUrl(url) => {
                write!(f, "CATALOG_API_URL must be an http(s) URL, got '{url}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidApiUrl(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "LOOKUP_DEBOUNCE_MS",
            "LOOKUP_MIN_QUERY_LEN",
            "CATALOG_API_URL",
            "CATALOG_TIMEOUT_SECS",
            "CATALOG_SEED_DIR",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.lookup, LookupConfig::default());
        assert_eq!(config.lookup.debounce(), Duration::from_millis(300));
        assert_eq!(config.catalog.api_url, "http://127.0.0.1:3000");
        assert_eq!(config.catalog.timeout(), Duration::from_secs(10));
        assert!(config.catalog.seed_dir.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn lookup_and_catalog_overrides_are_applied() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LOOKUP_DEBOUNCE_MS", "150");
        env::set_var("LOOKUP_MIN_QUERY_LEN", "3");
        env::set_var("CATALOG_API_URL", "https://catalog.example.com/");
        env::set_var("CATALOG_SEED_DIR", "/srv/catalog");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.lookup.debounce_ms, 150);
        assert_eq!(config.lookup.min_query_len, 3);
        assert_eq!(config.catalog.api_url, "https://catalog.example.com");
        assert_eq!(config.catalog.seed_dir, Some(PathBuf::from("/srv/catalog")));
        reset_env();
    }

    #[test]
    fn rejects_zero_minimum_query_length() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LOOKUP_MIN_QUERY_LEN", "0");
        let err = AppConfig::load().expect_err("zero length is invalid");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                name: "LOOKUP_MIN_QUERY_LEN"
            }
        ));
        reset_env();
    }

    #[test]
    fn rejects_non_http_api_url() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CATALOG_API_URL", "ftp://catalog");
        let err = AppConfig::load().expect_err("ftp is not supported");
        assert!(matches!(err, ConfigError::InvalidApiUrl(_)));
        reset_env();
    }
}
