//! Provider settings.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};

/// Knobs consumed by the file provider.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Load configuration from every fragment under this directory.
    pub directory: Option<PathBuf>,

    /// Load configuration from this single (templated) file.
    pub filename: Option<PathBuf>,

    /// Last-resort file, decoded without template expansion.
    pub fallback_file: Option<PathBuf>,

    /// Watch the source for changes and republish.
    pub watch: bool,
}

/// The source a provider builds from, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource<'a> {
    Directory(&'a Path),
    File(&'a Path),
    Fallback(&'a Path),
}

impl<'a> ConfigSource<'a> {
    /// The path that is stat'ed before every watch-triggered reload.
    pub fn path(&self) -> &'a Path {
        match self {
            ConfigSource::Directory(p) | ConfigSource::File(p) | ConfigSource::Fallback(p) => p,
        }
    }
}

impl ProviderConfig {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ProviderError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ProviderError::InvalidSettings {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the configured source. Empty paths count as unset.
    pub fn source(&self) -> Result<ConfigSource<'_>> {
        if let Some(dir) = non_empty(&self.directory) {
            return Ok(ConfigSource::Directory(dir));
        }
        if let Some(file) = non_empty(&self.filename) {
            return Ok(ConfigSource::File(file));
        }
        if let Some(file) = non_empty(&self.fallback_file) {
            return Ok(ConfigSource::Fallback(file));
        }
        Err(ProviderError::ConfigNotFound)
    }
}

fn non_empty(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_precedence() {
        let mut config = ProviderConfig {
            directory: Some("/etc/conf.d".into()),
            filename: Some("/etc/app.toml".into()),
            fallback_file: Some("/etc/fallback.toml".into()),
            watch: false,
        };
        assert_eq!(config.source().unwrap(), ConfigSource::Directory(Path::new("/etc/conf.d")));

        config.directory = None;
        assert_eq!(config.source().unwrap(), ConfigSource::File(Path::new("/etc/app.toml")));

        config.filename = Some(PathBuf::new());
        assert_eq!(
            config.source().unwrap().path(),
            Path::new("/etc/fallback.toml")
        );
    }

    #[test]
    fn test_no_source_is_config_not_found() {
        let err = ProviderConfig::default().source().unwrap_err();
        assert!(matches!(err, ProviderError::ConfigNotFound));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provider.toml");
        fs::write(&path, "directory = \"/etc/conf.d\"\nwatch = true\n").unwrap();

        let config = ProviderConfig::from_file(&path).unwrap();
        assert_eq!(config.directory, Some(PathBuf::from("/etc/conf.d")));
        assert!(config.watch);
        assert!(config.filename.is_none());
    }

    #[test]
    fn test_from_file_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provider.toml");
        fs::write(&path, "watch = maybe\n").unwrap();

        let err = ProviderConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidSettings { .. }));
    }
}
