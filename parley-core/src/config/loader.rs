//! Configuration loader supporting YAML, TOML and JSON.

use super::traits::{Configurable, Validatable};
use crate::error::ConfigError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// YAML format (.yaml, .yml)
    #[default]
    Yaml,
    /// TOML format (.toml)
    Toml,
    /// JSON format (.json)
    Json,
}

impl ConfigFormat {
    /// Detects the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "yaml" | "yml" => Some(Self::Yaml),
                "toml" => Some(Self::Toml),
                "json" => Some(Self::Json),
                _ => None,
            })
    }

    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }

    fn detect(path: &Path) -> Result<Self, ConfigError> {
        Self::from_path(path).ok_or_else(|| ConfigError::InvalidFormat {
            path: path.display().to_string(),
            reason: "Unrecognized file extension. Supported: .yaml, .yml, .toml, .json".to_string(),
        })
    }
}

/// Loads configuration files, then applies environment overrides and
/// validation.
///
/// # Example
///
/// ```rust,no_run
/// use parley_core::config::{ConfigLoader, ParleyConfig};
///
/// let config: ParleyConfig = ConfigLoader::new()
///     .with_env_prefix("PARLEY")
///     .load("parley.yaml")?;
/// # Ok::<(), parley_core::error::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: Option<String>,
    validate: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that validates and applies no environment overrides.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env_prefix: None,
            validate: true,
        }
    }

    /// Sets the environment variable prefix for overrides (e.g. `PARLEY`).
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Sets whether to validate the configuration after loading.
    #[must_use]
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Returns the environment variable prefix, if set.
    #[must_use]
    pub fn env_prefix(&self) -> Option<&str> {
        self.env_prefix.as_deref()
    }

    /// Loads a configuration file, applies overrides and validates it.
    pub fn load<T, P>(&self, path: P) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Configurable + Validatable,
        P: AsRef<Path>,
    {
        let config = self.load_file(path)?;
        self.finish(config)
    }

    /// Like [`load`](Self::load), but starts from `T::default()` when no path
    /// is given or the file does not exist.
    pub fn load_or_default<T, P>(&self, path: Option<P>) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Configurable + Validatable + Default,
        P: AsRef<Path>,
    {
        match path {
            Some(path) if path.as_ref().exists() => self.load(path),
            _ => self.finish(T::default()),
        }
    }

    /// Parses a configuration file without overrides or validation.
    pub fn load_file<T, P>(&self, path: P) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let format = ConfigFormat::detect(path)?;

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::parse(&content, format).map_err(|reason| ConfigError::InvalidFormat {
            path: path.display().to_string(),
            reason,
        })
    }

    /// Parses configuration from a string with the specified format.
    pub fn load_str<T>(&self, content: &str, format: ConfigFormat) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        Self::parse(content, format).map_err(|reason| ConfigError::InvalidFormat {
            path: "<string>".to_string(),
            reason,
        })
    }

    fn parse<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> Result<T, String> {
        match format {
            ConfigFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| format!("YAML parse error: {e}"))
            }
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| format!("TOML parse error: {e}")),
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| format!("JSON parse error: {e}"))
            }
        }
    }

    fn finish<T>(&self, mut config: T) -> Result<T, ConfigError>
    where
        T: Configurable + Validatable,
    {
        if let Some(prefix) = &self.env_prefix {
            config.apply_env_overrides(prefix);
        }
        if self.validate {
            config.validate()?;
        }
        Ok(config)
    }

    /// Serializes a configuration to a string in the specified format.
    pub fn serialize<T: Serialize>(config: &T, format: ConfigFormat) -> Result<String, ConfigError> {
        let result = match format {
            ConfigFormat::Yaml => serde_yaml::to_string(config).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
        };
        result.map_err(|reason| ConfigError::InvalidFormat {
            path: "<serialize>".to_string(),
            reason: format!("{} serialization error: {reason}", format.extension()),
        })
    }

    /// Saves a configuration to a file, creating parent directories.
    pub fn save_file<T, P>(config: &T, path: P) -> Result<(), ConfigError>
    where
        T: Serialize,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let format = ConfigFormat::detect(path)?;
        let content = Self::serialize(config, format)?;

        let write_err = |e: std::io::Error| ConfigError::FileWriteError {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, content).map_err(write_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Endpoint {
        url: String,
        #[serde(default)]
        retries: u32,
    }

    impl Default for Endpoint {
        fn default() -> Self {
            Self {
                url: "ws://localhost:8080/api/ws".to_string(),
                retries: 5,
            }
        }
    }

    impl Configurable for Endpoint {
        fn apply_env_overrides(&mut self, prefix: &str) {
            super::super::EnvOverride::apply_number(&format!("{prefix}_RETRIES"), &mut self.retries);
        }

        fn env_var_names(prefix: &str) -> Vec<String> {
            vec![format!("{prefix}_RETRIES")]
        }
    }

    impl Validatable for Endpoint {
        fn validate(&self) -> Result<(), ConfigError> {
            if self.retries > 100 {
                return Err(ConfigError::invalid_value("retries", "too many"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_path(Path::new("parley.yml")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("parley.toml")), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("parley.JSON")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("parley")), None);
    }

    #[test]
    fn test_load_str_formats() {
        let loader = ConfigLoader::new();

        let yaml: Endpoint = loader.load_str("url: ws://a/ws\nretries: 2\n", ConfigFormat::Yaml).unwrap();
        assert_eq!(yaml.retries, 2);

        let toml: Endpoint = loader.load_str("url = \"ws://a/ws\"\n", ConfigFormat::Toml).unwrap();
        assert_eq!(toml.retries, 0);

        let json: Endpoint = loader
            .load_str(r#"{"url": "wss://b/ws", "retries": 3}"#, ConfigFormat::Json)
            .unwrap();
        assert_eq!(json.url, "wss://b/ws");
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ConfigLoader::new()
            .load_str::<Endpoint>("url: [invalid", ConfigFormat::Yaml)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFormat { .. }));
        assert!(err.to_string().contains("YAML parse error"));
    }

    #[test]
    fn test_load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("endpoint.yaml");
        std::fs::write(&path, "url: ws://a/ws\nretries: 500\n").unwrap();

        let err = ConfigLoader::new().load::<Endpoint, _>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let raw: Endpoint = ConfigLoader::new().with_validation(false).load(&path).unwrap();
        assert_eq!(raw.retries, 500);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");

        let config: Endpoint = ConfigLoader::new().load_or_default(Some(&missing)).unwrap();
        assert_eq!(config, Endpoint::default());

        let config: Endpoint = ConfigLoader::new().load_or_default(None::<&Path>).unwrap();
        assert_eq!(config, Endpoint::default());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("endpoint.toml");

        let original = Endpoint {
            url: "wss://chat.example.com/api/ws".to_string(),
            retries: 7,
        };
        ConfigLoader::save_file(&original, &path).unwrap();

        let loaded: Endpoint = ConfigLoader::new().load_file(&path).unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn test_file_not_found() {
        let err = ConfigLoader::new()
            .load_file::<Endpoint, _>("/nonexistent/path/parley.yaml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }

    #[test]
    fn test_unrecognized_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parley.txt");
        std::fs::write(&path, "content").unwrap();

        let err = ConfigLoader::new().load_file::<Endpoint, _>(&path).unwrap_err();
        assert!(err.to_string().contains("Unrecognized file extension"));
    }

    #[test]
    fn test_env_prefix() {
        let loader = ConfigLoader::new().with_env_prefix("PARLEY");
        assert_eq!(loader.env_prefix(), Some("PARLEY"));
        assert_eq!(ConfigLoader::new().env_prefix(), None);
        assert_eq!(Endpoint::env_var_names("PARLEY"), vec!["PARLEY_RETRIES"]);
    }
}
