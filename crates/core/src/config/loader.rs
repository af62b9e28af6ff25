//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an explicit path, or search the standard locations
    ///
    /// An explicit path that does not exist is an error; finding nothing in the
    /// standard locations yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(),
        };

        let schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        Ok(Self {
            schema,
            path: config_path,
        })
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    let mut candidates = vec![
        PathBuf::from(".macrolog.toml"),
        PathBuf::from("macrolog.toml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("macrolog").join("config.toml"));
    }

    candidates.into_iter().find(|c| c.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read config file {}: {e}", path.display()))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::new(
            crate::error::ErrorCode::ConfigParseError,
            format!("Failed to parse config file {}: {e}", path.display()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.logging.level, "warn");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("macrolog.toml");
        std::fs::write(
            &path,
            r#"
            [api]
            timeout_secs = 12

            [session]
            path = "/tmp/macrolog-session.json"

            [logging]
            level = "debug"
            json = true
            "#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.path.as_deref(), Some(path.as_path()));
        assert_eq!(config.schema.api.timeout_secs, Some(12));
        assert_eq!(
            config.schema.session.path.as_deref(),
            Some("/tmp/macrolog-session.json")
        );
        assert_eq!(config.schema.logging.level, "debug");
        assert!(config.schema.logging.json);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[api\nbase_url = ").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }
}
