//! Server settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file named
//! by `PULSE_CONFIG`, then `PULSE_*` environment variables with `__` as the
//! section separator (`PULSE_SERVER__PORT=8080`).

use std::net::SocketAddr;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an optional settings file.
pub const CONFIG_PATH_VAR: &str = "PULSE_CONFIG";

#[derive(Debug, Error)]
pub enum SettingsError {
    /// Los sources no se pudieron leer o deserializar
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// Valores cargados pero invalidos
    #[error("invalid setting '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl SettingsError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerSettings {
    /// Direccion de escucha.
    pub fn addr(&self) -> Result<SocketAddr, SettingsError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| SettingsError::invalid("server.host", format!("{}", e)))
    }
}

/// Downstream services proxied by `/google` and `/call-endpoint`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    pub google_url: String,
    pub call_endpoint_url: String,
    pub timeout_ms: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            google_url: "https://google.com".to_string(),
            call_endpoint_url: "http://app-2.retail-store".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl UpstreamSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Quantiles reported by the duration summary.
    pub quantiles: Vec<f64>,
    /// Bucket boundaries, in seconds, of the duration histogram.
    pub buckets: Vec<f64>,
    /// Count every request once when it starts, under `{method, endpoint}`,
    /// in addition to the `{method, endpoint, status}` count on completion.
    /// With `false` only the completion is counted.
    pub count_request_start: bool,
    /// Attach the `process_*` collector.
    pub process_metrics: bool,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            quantiles: vec![0.5, 0.9, 0.99],
            buckets: vec![0.1, 0.2, 0.5, 1.0, 5.0],
            count_request_start: true,
            process_metrics: true,
        }
    }
}

impl Settings {
    /// Loads settings from the optional file and the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        let file = std::env::var(CONFIG_PATH_VAR).ok();
        Self::load_from(file.as_deref(), None, Self::environment())
    }

    /// Loads settings from a TOML document layered over the defaults.
    pub fn from_toml(toml: &str) -> Result<Self, SettingsError> {
        Self::load_from(None, Some(toml), Environment::default().source(Some(Default::default())))
    }

    fn environment() -> Environment {
        Environment::with_prefix("PULSE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("metrics.quantiles")
            .with_list_parse_key("metrics.buckets")
    }

    fn load_from(
        path: Option<&str>,
        inline: Option<&str>,
        env: Environment,
    ) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }
        if let Some(inline) = inline {
            builder = builder.add_source(File::from_str(inline, FileFormat::Toml));
        }

        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rechaza valores que no permiten arrancar el servidor.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.server.port == 0 {
            return Err(SettingsError::invalid("server.port", "must not be 0"));
        }
        self.server.addr()?;

        if self.upstream.google_url.trim().is_empty() {
            return Err(SettingsError::invalid("upstream.google_url", "must not be empty"));
        }
        if self.upstream.call_endpoint_url.trim().is_empty() {
            return Err(SettingsError::invalid(
                "upstream.call_endpoint_url",
                "must not be empty",
            ));
        }
        if self.upstream.timeout_ms == 0 {
            return Err(SettingsError::invalid("upstream.timeout_ms", "must be positive"));
        }

        if self.metrics.quantiles.is_empty() {
            return Err(SettingsError::invalid("metrics.quantiles", "must not be empty"));
        }
        if self.metrics.buckets.is_empty() {
            return Err(SettingsError::invalid("metrics.buckets", "must not be empty"));
        }

        Ok(())
    }
}
