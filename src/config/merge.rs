//! Merging of fragment trees into one snapshot.
//!
//! # Responsibilities
//! - Walk a directory tree recursively, subdirectories merged in place
//! - Load every recognized fragment in templated mode
//! - Fold fragments into one `Configuration` with first-write-wins naming
//!
//! # Design Decisions
//! - Traversal follows `read_dir` order, which the OS does not sort. A name
//!   defined twice goes to whichever file the walk reaches first.
//! - One bad fragment aborts the whole merge; partial trees are never published
//! - TLS entries are distinct by surrogate identity, not by content

use std::fs;
use std::path::Path;

use crate::config::loader::{is_fragment_file, ConfigLoader, LoadMode};
use crate::config::schema::{Configuration, Fragment};
use crate::error::{ProviderError, Result};
use crate::observability::metrics;

/// Recursively merges a directory of fragments.
#[derive(Debug, Clone, Default)]
pub struct ConfigMerger {
    loader: ConfigLoader,
}

impl ConfigMerger {
    pub fn new(loader: ConfigLoader) -> Self {
        Self { loader }
    }

    /// Merge every fragment under `directory` into `configuration`.
    ///
    /// A `None` accumulator starts from an empty configuration.
    pub fn merge_directory(
        &self,
        directory: &Path,
        configuration: Option<Configuration>,
    ) -> Result<Configuration> {
        let mut configuration = configuration.unwrap_or_default();
        self.merge_into(directory, &mut configuration)?;
        Ok(configuration)
    }

    fn merge_into(&self, directory: &Path, configuration: &mut Configuration) -> Result<()> {
        let entries = fs::read_dir(directory).map_err(|source| ProviderError::ReadDir {
            path: directory.to_path_buf(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| ProviderError::ReadDir {
                path: directory.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                self.merge_into(&path, configuration)?;
                continue;
            }
            if !is_fragment_file(&path) {
                tracing::trace!(path = %path.display(), "Skipping non-fragment file");
                continue;
            }

            let fragment = self.loader.load(&path, LoadMode::Templated)?;
            merge_fragment(configuration, fragment);
        }

        Ok(())
    }
}

/// Fold one fragment into the aggregate.
///
/// Returns the number of entries skipped because they were already present.
pub fn merge_fragment(configuration: &mut Configuration, fragment: Fragment) -> usize {
    let mut skipped = 0;

    for (name, backend) in fragment.backends {
        if configuration.backends.contains_key(&name) {
            tracing::warn!(backend = %name, "Backend already configured, skipping");
            skipped += 1;
        } else {
            configuration.backends.insert(name, backend);
        }
    }

    for (name, frontend) in fragment.frontends {
        if configuration.frontends.contains_key(&name) {
            tracing::warn!(frontend = %name, "Frontend already configured, skipping");
            skipped += 1;
        } else {
            configuration.frontends.insert(name, frontend);
        }
    }

    for entry in fragment.tls {
        if configuration.tls.iter().any(|existing| existing.id == entry.id) {
            tracing::warn!(tls = ?entry.id, "TLS configuration already configured, skipping");
            skipped += 1;
        } else {
            configuration.tls.push(entry);
        }
    }

    if skipped > 0 {
        metrics::record_merge_conflicts(skipped);
    }
    skipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{Backend, Frontend, TlsConfiguration, TlsEntry};
    use std::collections::HashMap;

    fn fragment_with_backend(name: &str, url: &str) -> Fragment {
        let mut backend = Backend::default();
        backend.servers.insert(
            "s".to_string(),
            crate::config::schema::Server {
                url: url.to_string(),
                weight: 1,
            },
        );
        Fragment {
            backends: HashMap::from([(name.to_string(), backend)]),
            ..Fragment::default()
        }
    }

    #[test]
    fn test_first_backend_wins() {
        let mut config = Configuration::default();
        assert_eq!(merge_fragment(&mut config, fragment_with_backend("web", "http://a")), 0);
        assert_eq!(merge_fragment(&mut config, fragment_with_backend("web", "http://b")), 1);

        assert_eq!(config.backends.len(), 1);
        assert_eq!(config.backends["web"].servers["s"].url, "http://a");
    }

    #[test]
    fn test_frontend_collision_skipped() {
        let mut config = Configuration::default();
        let first = Fragment {
            frontends: HashMap::from([(
                "site".to_string(),
                Frontend {
                    backend: "a".to_string(),
                    ..Frontend::default()
                },
            )]),
            ..Fragment::default()
        };
        let second = Fragment {
            frontends: HashMap::from([(
                "site".to_string(),
                Frontend {
                    backend: "b".to_string(),
                    ..Frontend::default()
                },
            )]),
            ..Fragment::default()
        };

        merge_fragment(&mut config, first);
        assert_eq!(merge_fragment(&mut config, second), 1);
        assert_eq!(config.frontends["site"].backend, "a");
    }

    #[test]
    fn test_tls_dedup_by_identity() {
        let entry = TlsEntry::new(TlsConfiguration::default());
        let lookalike = TlsEntry::new(TlsConfiguration::default());

        let mut config = Configuration::default();
        let fragment = Fragment {
            tls: vec![entry.clone(), lookalike],
            ..Fragment::default()
        };
        assert_eq!(merge_fragment(&mut config, fragment), 0);
        assert_eq!(config.tls.len(), 2);

        let again = Fragment {
            tls: vec![entry],
            ..Fragment::default()
        };
        assert_eq!(merge_fragment(&mut config, again), 1);
        assert_eq!(config.tls.len(), 2);
    }

    #[test]
    fn test_merge_directory_recurses_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.toml"), "[backends.x]\n").unwrap();
        fs::write(dir.path().join("a.toml.bak"), "not toml at all [[[").unwrap();
        fs::create_dir_all(dir.path().join("nested.toml/deeper")).unwrap();
        fs::write(dir.path().join("nested.toml/deeper/b.tmpl"), "[backends.y]\n").unwrap();

        let config = ConfigMerger::default().merge_directory(dir.path(), None).unwrap();
        let mut names: Vec<_> = config.backends.keys().cloned().collect();
        names.sort();
        assert_eq!(names, vec!["x", "y"]);
        assert!(config.frontends.is_empty());
        assert!(config.tls.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_loads_each_fragment_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.toml"),
            "[backends.x]\n\n[[tls]]\n[tls.certificate]\ncertFile = \"c.pem\"\nkeyFile = \"k.pem\"\n",
        )
        .unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let config = ConfigMerger::default().merge_directory(dir.path(), None).unwrap();
        assert_eq!(config.backends.len(), 1);
        assert_eq!(config.tls.len(), 1);
    }

    #[test]
    fn test_merge_directory_extends_accumulator() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.toml"), "[backends.x]\n[backends.seed]\n").unwrap();

        let seed = Configuration::from(fragment_with_backend("seed", "http://seed"));
        let config = ConfigMerger::default()
            .merge_directory(dir.path(), Some(seed))
            .unwrap();
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends["seed"].servers["s"].url, "http://seed");
    }

    #[test]
    fn test_bad_fragment_aborts_merge() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.toml"), "[backends.x]\n").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/bad.toml"), "[backends.y\n").unwrap();

        let err = ConfigMerger::default().merge_directory(dir.path(), None).unwrap_err();
        assert!(matches!(err, ProviderError::Decode { .. }));
    }

    #[test]
    fn test_missing_directory_is_read_dir_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigMerger::default()
            .merge_directory(&dir.path().join("nope"), None)
            .unwrap_err();
        assert!(matches!(err, ProviderError::ReadDir { .. }));
    }
}
