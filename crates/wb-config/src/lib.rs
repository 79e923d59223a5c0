//! # wb-config
//!
//! Layered settings for the Wassup-Board server.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. an optional TOML file (`wassup.toml`, or the path in `WASSUP_CONFIG`)
//! 3. `WASSUP__SECTION__KEY` environment variables
//! 4. the bare `PORT` variable, which wins for `server.port`
//!
//! ```no_run
//! let settings = wb_config::Settings::load().expect("invalid configuration");
//! println!("listening on {}", settings.server.socket_addr());
//! ```

mod error;

pub use error::{ConfigError, ValidationError};

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use wb_hub::{HubConfig, DEFAULT_QUEUE_CAPACITY};

pub const DEFAULT_CONFIG_FILE: &str = "wassup.toml";
pub const CONFIG_PATH_ENV: &str = "WASSUP_CONFIG";
pub const ENV_PREFIX: &str = "WASSUP";
pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_LOG_FILTER: &str = "wassup_board=info,wb_hub=info,wb_api=info,tower_http=info";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub hub: HubSettings,
    pub cors: CorsSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    /// 0 asks the OS for a free port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Flat-file location; ignored by the in-memory store.
    pub path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: "threads.db.json".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    pub queue_capacity: usize,
    /// Per-send limit for fan-out writes; 0 disables it.
    pub send_timeout_ms: u64,
    /// Limit on a new connection's first push while `send_timeout_ms` is 0.
    pub initial_push_timeout_ms: u64,
    pub welcome_text: String,
    pub deregister_on_send_failure: bool,
    pub deregister_on_invalid_thread: bool,
}

impl Default for HubSettings {
    fn default() -> Self {
        let hub = HubConfig::default();
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            send_timeout_ms: 0,
            initial_push_timeout_ms: hub.initial_push_timeout.as_millis() as u64,
            welcome_text: hub.welcome_text,
            deregister_on_send_failure: hub.deregister_on_send_failure,
            deregister_on_invalid_thread: hub.deregister_on_invalid_thread,
        }
    }
}

impl HubSettings {
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            queue_capacity: self.queue_capacity,
            send_timeout: (self.send_timeout_ms > 0).then(|| Duration::from_millis(self.send_timeout_ms)),
            initial_push_timeout: Duration::from_millis(self.initial_push_timeout_ms),
            welcome_text: self.welcome_text.clone(),
            deregister_on_send_failure: self.deregister_on_send_failure,
            deregister_on_invalid_thread: self.deregister_on_invalid_thread,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".into(),
                "https://wassup-bub.netlify.app".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_LOG_FILTER.into(),
        }
    }
}

impl Settings {
    /// Loads `.env`, then every layer from the process environment, and
    /// validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let file = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
        let settings = Self::from_sources(Some(Path::new(&file)), None, std::env::var(PORT_ENV).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Builds settings from explicit sources.
    ///
    /// `env` replaces the process environment when given; it uses the same
    /// `WASSUP__SECTION__KEY` names.
    pub fn from_sources(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
        port: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(false));
        }

        builder = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .source(env),
            )
            .set_override_option("server.port", port)?;

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.hub.queue_capacity == 0 {
            return Err(ValidationError::ZeroQueueCapacity);
        }
        if self.hub.initial_push_timeout_ms == 0 {
            return Err(ValidationError::ZeroInitialPushTimeout);
        }
        if self.store.path.trim().is_empty() {
            return Err(ValidationError::EmptyStorePath);
        }
        if self.cors.allowed_origins.iter().any(|o| o.trim().is_empty()) {
            return Err(ValidationError::EmptyOrigin);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let settings = Settings::from_sources(None, env(&[]), None).unwrap();

        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.store.path, "threads.db.json");
        assert_eq!(settings.hub.queue_capacity, 3);
        assert_eq!(settings.hub.welcome_text, "hi, enter text here");
        assert_eq!(settings.log.format, LogFormat::Pretty);
        assert_eq!(settings.cors.allowed_origins.len(), 2);
        assert!(settings.hub.hub_config().send_timeout.is_none());
        assert_eq!(settings.hub.hub_config().initial_push_timeout, Duration::from_secs(5));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let settings = Settings::from_sources(
            Some(Path::new("/nonexistent/wassup.toml")),
            env(&[]),
            None,
        )
        .unwrap();
        assert_eq!(settings.server.port, 5000);
    }

    #[test]
    fn environment_overrides_file() {
        let file = toml_file(
            r#"
            [server]
            port = 7000

            [hub]
            queue_capacity = 8
            send_timeout_ms = 250

            [log]
            format = "json"
            "#,
        );

        let settings = Settings::from_sources(
            Some(file.path()),
            env(&[
                ("WASSUP__HUB__QUEUE_CAPACITY", "16"),
                ("WASSUP__HUB__DEREGISTER_ON_SEND_FAILURE", "true"),
                ("WASSUP__CORS__ALLOWED_ORIGINS", "http://a.example,http://b.example"),
            ]),
            None,
        )
        .unwrap();

        assert_eq!(settings.server.port, 7000);
        assert_eq!(settings.hub.queue_capacity, 16);
        assert!(settings.hub.deregister_on_send_failure);
        assert_eq!(settings.log.format, LogFormat::Json);
        assert_eq!(
            settings.cors.allowed_origins,
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );

        let hub = settings.hub.hub_config();
        assert_eq!(hub.queue_capacity, 16);
        assert_eq!(hub.send_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn bare_port_variable_wins() {
        let settings = Settings::from_sources(
            None,
            env(&[("WASSUP__SERVER__PORT", "6000")]),
            Some("8080".into()),
        )
        .unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let settings = Settings::from_sources(
            None,
            env(&[("WASSUP__HUB__QUEUE_CAPACITY", "0")]),
            None,
        )
        .unwrap();
        assert_eq!(settings.validate(), Err(ValidationError::ZeroQueueCapacity));
    }

    #[test]
    fn unbounded_initial_push_is_rejected() {
        let settings = Settings::from_sources(
            None,
            env(&[("WASSUP__HUB__INITIAL_PUSH_TIMEOUT_MS", "0")]),
            None,
        )
        .unwrap();
        assert_eq!(settings.validate(), Err(ValidationError::ZeroInitialPushTimeout));
    }

    #[test]
    fn unknown_log_format_fails_to_load() {
        let result = Settings::from_sources(None, env(&[("WASSUP__LOG__FORMAT", "xml")]), None);
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
