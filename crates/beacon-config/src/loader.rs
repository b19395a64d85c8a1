//! Layered configuration loading.
//!
//! Built-in defaults, then at most one file, then `PREFIX__*` environment
//! overrides. Each layer only replaces what it names.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{BeaconConfig, ConfigError};

/// Default location of the service configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/beacon-svc/beacon.toml";

/// Prefix of the override variables read by the beacon binary.
pub const DEFAULT_ENV_PREFIX: &str = "BEACON";

/// Builds a [`BeaconConfig`] from defaults, a file and the environment.
///
/// Overrides are read once, in [`load`](Self::load), and only when a prefix
/// was set.
///
/// # Example
///
/// ```no_run
/// use beacon_config::ConfigLoader;
///
/// # fn main() -> Result<(), beacon_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("/etc/beacon-svc/beacon.toml")?
///     .with_env_prefix("BEACON")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: BeaconConfig,
    env_prefix: Option<String>,
    source: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader holding the built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: BeaconConfig::default(),
            env_prefix: None,
            source: None,
        }
    }

    /// Replaces the defaults with the contents of `path`.
    ///
    /// `.toml` and `.json` are accepted. A relative path is joined to the
    /// working directory. Keys the file omits keep their defaults; keys the
    /// schema does not know are an error.
    ///
    /// # Errors
    ///
    /// `FileNotFound`, `ReadError`, `TomlError`/`JsonError`, or
    /// `ValidationError` for any other extension.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = absolute(path.as_ref());

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content =
            fs::read_to_string(&path).map_err(|e| ConfigError::read_error(&path, e))?;

        self.config = Self::parse_file(&content, &path)?;
        self.source = Some(path);

        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file keeps the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Fails only when the file exists and cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if absolute(path.as_ref()).exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Replaces the defaults with inline `content` in `format` (`toml` or
    /// `json`).
    ///
    /// # Errors
    ///
    /// Parse errors, or `ValidationError` for an unknown format.
    ///
    /// # Example
    ///
    /// ```
    /// use beacon_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("name = \"white peak\"\nport = 9090", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.name, "white peak");
    /// assert_eq!(config.port, 9090);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Reads `PREFIX__KEY` / `PREFIX__SECTION__KEY` overrides at load time,
    /// e.g. `BEACON__PORT=9000` or `BEACON__TLS__ENABLED=true`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads `.env` from the working directory into the process environment,
    /// if there is one.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        let _ = dotenvy::dotenv();
        self
    }

    /// The file the configuration was read from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Applies overrides, validates, and returns the configuration.
    ///
    /// # Errors
    ///
    /// `EnvParseError` for a malformed override, `InvalidValue` from
    /// [`BeaconConfig::validate`].
    pub fn load(mut self) -> Result<BeaconConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// The configuration as loaded so far: no overrides, no validation.
    #[must_use]
    pub fn load_unvalidated(self) -> BeaconConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<BeaconConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        parse(content, &extension).map_err(|e| match e {
            ConfigError::ValidationError(_) => ConfigError::validation_error(format!(
                "{} is neither .toml nor .json",
                path.display()
            )),
            other => other,
        })
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        env::vars()
            .filter(|(key, _)| key.starts_with(prefix))
            .try_for_each(|(key, value)| self.apply_env_var(&key, &value, prefix))
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(key_without_prefix) = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
        else {
            // BEACONFOO and similar are not ours.
            return Ok(());
        };

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            ["NAME"] => {
                self.config.name = value.to_string();
            }
            ["ADDRESS"] => {
                self.config.address = value.to_string();
            }
            ["PORT"] => {
                self.config.port = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected port number"))?;
            }
            ["SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.shutdown_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }

            ["LOGGING", "DEVELOPMENT"] => {
                let development = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
                self.config.logging.get_or_insert_with(Default::default).development = development;
            }

            ["TLS", "ENABLED"] => {
                let enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
                self.config.tls.get_or_insert_with(Default::default).enabled = enabled;
            }
            ["TLS", "KEY_FILE_PATH"] => {
                self.config.tls.get_or_insert_with(Default::default).key_file_path =
                    value.to_string();
            }
            ["TLS", "CERT_FILE_PATH"] => {
                self.config.tls.get_or_insert_with(Default::default).cert_file_path =
                    value.to_string();
            }

            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<BeaconConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::validation_error(format!(
            "unsupported format '{other}'"
        ))),
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
