//! Fragment loading from disk.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use minijinja::Environment;

use crate::config::schema::{DecodedFragment, Fragment};
use crate::error::{DecodeError, ProviderError, Result};

/// Extension of fragments decoded directly.
pub const CONFIG_EXTENSION: &str = "toml";

/// Extension of fragments expanded as templates before decoding.
pub const TEMPLATE_EXTENSION: &str = "tmpl";

/// How a fragment's content is turned into a [`Fragment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Expand the content with the template engine, then decode.
    Templated,
    /// Decode the content as-is.
    Raw,
}

/// Turns (possibly expanded) fragment text into structured configuration.
///
/// `Ok(None)` means the content decoded to nothing at all.
pub trait Decoder: Send + Sync {
    fn decode(&self, content: &str) -> std::result::Result<Option<DecodedFragment>, DecodeError>;
}

/// Default decoder for TOML fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlDecoder;

impl Decoder for TomlDecoder {
    fn decode(&self, content: &str) -> std::result::Result<Option<DecodedFragment>, DecodeError> {
        if content.trim().is_empty() {
            return Ok(None);
        }
        let decoded: DecodedFragment = toml::from_str(content)?;
        Ok(Some(decoded))
    }
}

/// Template engine applied to templated fragments.
///
/// Wraps a [`minijinja::Environment`]. The function table starts empty;
/// callers register their own functions before handing the engine to the
/// provider.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Mutable access to the environment, to register functions and filters.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }

    /// Register `env(name)`, which reads a process environment variable.
    pub fn with_env_function(mut self) -> Self {
        self.env.add_function("env", env_function);
        self
    }

    /// Expand a template string with an empty context.
    pub fn expand(&self, source: &str) -> std::result::Result<String, minijinja::Error> {
        self.env.render_str(source, minijinja::context! {})
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateEngine").finish_non_exhaustive()
    }
}

/// Read an environment variable, or an empty string if it is unset.
fn env_function(name: String) -> String {
    match std::env::var(&name) {
        Ok(val) => val,
        Err(_) => {
            tracing::warn!(var = %name, "Environment variable not found, returning empty string");
            String::new()
        }
    }
}

/// Returns true if `path` has one of the recognized fragment extensions.
pub fn is_fragment_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(CONFIG_EXTENSION) | Some(TEMPLATE_EXTENSION)
    )
}

/// Loads single fragment files through a decoder and template engine.
#[derive(Clone)]
pub struct ConfigLoader {
    decoder: Arc<dyn Decoder>,
    templates: Arc<TemplateEngine>,
}

impl ConfigLoader {
    pub fn new(decoder: Arc<dyn Decoder>, templates: Arc<TemplateEngine>) -> Self {
        Self { decoder, templates }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_template_engine(mut self, templates: Arc<TemplateEngine>) -> Self {
        self.templates = templates;
        self
    }

    /// Load one fragment file.
    ///
    /// Never returns a fragment with missing containers: a file that decodes
    /// to nothing yields [`Fragment::default`].
    pub fn load(&self, path: &Path, mode: LoadMode) -> Result<Fragment> {
        let content = fs::read_to_string(path).map_err(|source| ProviderError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let content = match mode {
            LoadMode::Templated => {
                self.templates
                    .expand(&content)
                    .map_err(|source| ProviderError::Template {
                        path: path.to_path_buf(),
                        source,
                    })?
            }
            LoadMode::Raw => content,
        };

        let decoded = self
            .decoder
            .decode(&content)
            .map_err(|source| ProviderError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        let fragment = match decoded {
            Some(decoded) if !decoded.is_absent() => Fragment::from(decoded),
            _ => Fragment::default(),
        };

        tracing::trace!(
            path = %path.display(),
            backends = fragment.backends.len(),
            frontends = fragment.frontends.len(),
            tls = fragment.tls.len(),
            "Fragment loaded"
        );
        Ok(fragment)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(Arc::new(TomlDecoder), Arc::new(TemplateEngine::new()))
    }
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("templates", &self.templates)
            .finish_non_exhaustive()
    }
}
