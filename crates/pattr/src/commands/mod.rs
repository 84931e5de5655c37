//! Subcommands and what they share: page loading and file-backed data.

pub mod render;
pub mod scopes;

use std::path::{Component, Path, PathBuf};

use pattr_armature::parse;
use pattr_atelier::{DataSource, Engine, EngineError, FetchError};
use thiserror::Error;

use crate::config::PattrConfig;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("invalid --fire '{0}': expected <id>:<event>[=<value>]")]
    InvalidFire(String),

    #[error("invalid --set '{0}': expected <name>=<json>")]
    InvalidSet(String),

    #[error("no element with id '{0}'")]
    UnknownElement(String),
}

/// Read, parse and prepare a page. Does not hydrate.
pub fn load_engine(page: &Path, config: &PattrConfig) -> Result<Engine, CliError> {
    let source = std::fs::read_to_string(page).map_err(|source| CliError::Io {
        path: page.to_path_buf(),
        source,
    })?;
    let (doc, errors) = parse(&source);
    for error in &errors {
        tracing::warn!(page = %page.display(), "{}", error);
    }
    Ok(Engine::new(doc, config.engine.clone())?)
}

/// Hydrate the page and complete its `p-src` subtrees from disk
pub fn hydrate_with_files(engine: &mut Engine, data_dir: &Path) -> Result<(), CliError> {
    engine.hydrate()?;
    let source = FileDataSource::new(data_dir);
    let loaded = engine.load_pending(&source);
    tracing::info!("loaded {} remote subtree(s)", loaded.len());
    Ok(())
}

/// Directory `p-src` urls resolve against: the flag, the config, then the
/// page's own directory
pub fn data_dir(flag: Option<&Path>, config: &PattrConfig, page: &Path) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| config.data_dir.clone())
        .or_else(|| page.parent().map(Path::to_path_buf))
        .unwrap_or_default()
}

/// Serves `p-src` urls from a directory
#[derive(Debug, Clone)]
pub struct FileDataSource {
    base: PathBuf,
}

impl FileDataSource {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl DataSource for FileDataSource {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if url.contains("://") {
            return Err(FetchError::Refused(url.to_string()));
        }
        let relative = Path::new(url.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(FetchError::Refused(url.to_string()));
        }

        let path = self.base.join(relative);
        std::fs::read_to_string(&path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound(path.display().to_string()),
            _ => FetchError::Io {
                url: url.to_string(),
                message: err.to_string(),
            },
        })
    }
}
