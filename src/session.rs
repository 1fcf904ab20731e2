//! Everything a front end needs, opened together: configuration, the snippet store,
//! the translator and the runner.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{StorageError, StoreError};
use crate::i18n::Translator;
use crate::models::{Backend, FileStorage, MemoryStorage, Snippet, SnippetStore, export_file_name};
use crate::runner::{NodeExecutor, Runner};

#[derive(Debug)]
pub struct Session {
    pub config: Config,
    pub data_dir: PathBuf,
    pub translator: Translator,
    pub store: SnippetStore<Backend>,
    pub runner: Runner<NodeExecutor>,
}

impl Session {
    /// Opens the storage file in the data directory, or an in-memory backend when
    /// `ephemeral` is set.
    pub async fn open(config: Config, ephemeral: bool) -> Result<Self> {
        let data_dir = config.data_dir()?;
        let storage = if ephemeral {
            info!("ephemeral session, nothing will be written to storage");
            Backend::Memory(MemoryStorage::new())
        } else {
            let storage = FileStorage::new(&data_dir).with_context(|| {
                format!("Failed to open storage in {}", data_dir.display())
            })?;
            Backend::File(storage)
        };

        Self::with_storage(config, data_dir, storage).await
    }

    pub async fn with_storage(config: Config, data_dir: PathBuf, storage: Backend) -> Result<Self> {
        let translator = Translator::load(&storage, config.default_language())
            .await
            .context("Failed to read the stored language")?;

        let mut store = SnippetStore::new(storage, translator.store_labels());
        match store.load().await {
            Ok(snippets) => info!("session opened with {} snippets", snippets.len()),
            // The seed stays in memory and is written on the next change.
            Err(StoreError::Unpersisted(e)) => warn!("seed snippet not persisted: {e}"),
            Err(e) => return Err(e).context("Failed to load snippets"),
        }

        let runner = Runner::new(config.runner.executor());

        Ok(Self {
            config,
            data_dir,
            translator,
            store,
            runner,
        })
    }

    /// Switches and persists the language, relabelling the store's fallbacks.
    pub async fn set_language(&mut self, code: &str) -> Result<bool, StorageError> {
        let changed = self
            .translator
            .set_language(self.store.storage(), code)
            .await?;
        if changed {
            self.store.set_labels(self.translator.store_labels());
        }
        Ok(changed)
    }

    /// Writes the export document to `path`, or to a timestamped file in the data
    /// directory when no path is given.
    pub async fn export_to(&self, path: Option<&Path>) -> Result<PathBuf> {
        let json = self.store.export_json()?;
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.data_dir.join(export_file_name(Utc::now())),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("exported {} snippets to {}", self.store.len(), path.display());
        Ok(path)
    }

    /// Reads `path` and imports its records.
    pub async fn import_from(&mut self, path: &Path) -> Result<Vec<Snippet>> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(self.store.import_json(&text).await?)
    }

    /// Status line for an import attempt.
    pub fn import_status(&self, result: &Result<Vec<Snippet>>) -> String {
        match result {
            Ok(imported) => self
                .translator
                .t_with("importedCount", &[("count", &imported.len().to_string())]),
            Err(err) => match err.downcast_ref::<StoreError>() {
                Some(e) => self.translator.store_error(e),
                None => format!("{}: {err}", self.translator.t("importFailed")),
            },
        }
    }
}
