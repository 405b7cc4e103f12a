//! Loader for Sift configuration with YAML + environment overlays.
//!
//! Sources are merged in order: optional files, inline YAML, then
//! `SIFT__`-prefixed environment variables (`SIFT__PIPELINE__MAX_RETRIES=5`
//! overrides `pipeline.max_retries`). String values may reference other
//! environment variables as `${VAR}`; expansion is recursive up to a fixed
//! depth. Every field has a default, so an empty source set yields a usable
//! configuration.
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;
use sift_common::observability::LogFormat;
use sift_common::PipelineConfig;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to decode configuration: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl SiftConfig {
    /// Check cross-field constraints the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "server.request_timeout_secs must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Settings for the HTTP endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Hard deadline around one extraction request.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".into(),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub filter: String,
    pub dir: Option<PathBuf>,
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".into(),
            dir: None,
            stderr: false,
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => {
            let mut cur = std::mem::take(s);
            for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                let expanded = shellexpand::env(&cur)
                    .map(|cow| cow.into_owned())
                    .unwrap_or_else(|_| cur.clone());
                if expanded == cur {
                    break;
                }
                cur = expanded;
            }
            *s = cur;
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring.
pub struct SiftConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SiftConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SiftConfigLoader {
    /// Start with no sources; environment overrides are attached in [`load`](Self::load)
    /// so they always win over files.
    ///
    /// ```
    /// use sift_config::SiftConfigLoader;
    ///
    /// let cfg = SiftConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(cfg.pipeline.max_retries, 3);
    /// assert_eq!(cfg.server.listen_addr, "127.0.0.1:3000");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use sift_config::SiftConfigLoader;
    ///
    /// let cfg = SiftConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// pipeline:
    ///   max_retries: 5
    ///   problematic_sites: ["example.org"]
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.pipeline.max_retries, 5);
    /// assert_eq!(cfg.pipeline.problematic_sites, vec!["example.org"]);
    /// assert_eq!(cfg.pipeline.retry_delay_ms, 1000);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Consume the builder, expand `${VAR}` placeholders and deserialize into
    /// a validated [`SiftConfig`].
    pub fn load(self) -> Result<SiftConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("SIFT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);
        if v.is_null() {
            v = Value::Object(Default::default());
        }

        let typed: SiftConfig = serde_json::from_value(v)?;
        typed.validate()?;
        Ok(typed)
    }
}
