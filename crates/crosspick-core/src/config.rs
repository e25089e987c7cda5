use crate::pick::{DisplayServer, PickError, detect_display_server};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_format")]
    pub format: OutputFormat,
    #[serde(default)]
    pub copy_to_clipboard: bool,
    #[serde(default)]
    pub backend: Backend,
}

/// How a picked colour is written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `#rrggbb` on stdout, `r,g,b` on stderr
    Hex,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Hex => write!(f, "hex"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hex" => Ok(OutputFormat::Hex),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown format: {s}. use: hex, json")),
        }
    }
}

/// Which display server to pick from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Auto,
    X11,
    Wayland,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Auto => write!(f, "auto"),
            Backend::X11 => write!(f, "x11"),
            Backend::Wayland => write!(f, "wayland"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Backend::Auto),
            "x11" => Ok(Backend::X11),
            "wayland" => Ok(Backend::Wayland),
            _ => Err(format!("unknown backend: {s}. use: auto, x11, wayland")),
        }
    }
}

impl Backend {
    pub fn resolve(self) -> Result<DisplayServer, PickError> {
        match self {
            Backend::Auto => detect_display_server(),
            Backend::X11 => Ok(DisplayServer::X11),
            Backend::Wayland => Ok(DisplayServer::Wayland),
        }
    }
}

fn default_format() -> OutputFormat {
    OutputFormat::Hex
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: default_format(),
            copy_to_clipboard: false,
            backend: Backend::default(),
        }
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("crosspick")
            .join("config.toml")
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Read `path`, or return the defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "format" => self.format = value.parse()?,
            "backend" => self.backend = value.parse()?,
            "copy_to_clipboard" => {
                self.copy_to_clipboard = value
                    .parse()
                    .map_err(|_| format!("invalid bool: {value}. use: true/false"))?;
            }
            _ => return Err(format!("unknown config key: {key}")),
        }
        Ok(())
    }

    pub fn display(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|_| format!("{self:#?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.format, OutputFormat::Hex);
        assert_eq!(config.backend, Backend::Auto);
        assert!(!config.copy_to_clipboard);
    }

    #[test]
    fn parses_all_keys() {
        let config = Config::parse(
            r#"
            format = "json"
            copy_to_clipboard = true
            backend = "x11"
            "#,
        )
        .unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.backend, Backend::X11);
        assert!(config.copy_to_clipboard);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(matches!(
            Config::parse("format = \"cmyk\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn set_value_validates() {
        let mut config = Config::default();
        config.set_value("format", "JSON").unwrap();
        config.set_value("backend", "wayland").unwrap();
        config.set_value("copy_to_clipboard", "true").unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.backend, Backend::Wayland);
        assert!(config.copy_to_clipboard);

        assert!(config.set_value("copy_to_clipboard", "yes").is_err());
        assert!(config.set_value("backend", "quartz").is_err());
        assert!(config.set_value("colour", "red").is_err());
    }

    #[test]
    fn display_round_trips() {
        let mut config = Config::default();
        config.set_value("format", "json").unwrap();
        assert_eq!(Config::parse(&config.display()).unwrap(), config);
    }

    #[test]
    fn explicit_backend_skips_detection() {
        assert_eq!(Backend::X11.resolve().unwrap(), DisplayServer::X11);
        assert_eq!(Backend::Wayland.resolve().unwrap(), DisplayServer::Wayland);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn save_creates_parent_and_loads_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("crosspick").join("config.toml");
        let mut config = Config::default();
        config.set_value("backend", "x11").unwrap();
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn broken_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "format = \"cmyk\"\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert_eq!(err.to_string(), "failed to parse config");
    }
}
