//! The canonical, ordered snippet collection and its persistence round-trip.
//!
//! Every mutating operation writes the full collection back to the
//! [`KeyValueStore`] before it returns. When that write fails the change stays in
//! memory, the store is marked dirty and the caller receives
//! [`StoreError::Unpersisted`]; [`SnippetStore::flush`] retries on request.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ImportError, StorageError, StoreError, StoreResult};
use crate::i18n::Translator;
use crate::models::export::{ExportData, ImportPayload, clean_record};
use crate::models::snippet::{new_id, now_millis};
use crate::models::storage::{KeyValueStore, SNIPPETS_KEY};
use crate::models::Snippet;

/// Localized labels the store falls back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLabels {
    pub seed_name: String,
    pub seed_code: String,
    pub new_name: String,
    pub untitled: String,
    pub copy_suffix: String,
}

impl Default for StoreLabels {
    fn default() -> Self {
        Translator::default().store_labels()
    }
}

#[derive(Debug)]
pub struct SnippetStore<S> {
    storage: S,
    snippets: Vec<Snippet>,
    labels: StoreLabels,
    dirty: bool,
}

impl<S: KeyValueStore> SnippetStore<S> {
    /// An empty, unloaded store. Call [`SnippetStore::load`] before use.
    pub fn new(storage: S, labels: StoreLabels) -> Self {
        Self {
            storage,
            snippets: Vec::new(),
            labels,
            dirty: false,
        }
    }

    pub async fn open(storage: S, labels: StoreLabels) -> StoreResult<Self> {
        let mut store = Self::new(storage, labels);
        store.load().await?;
        Ok(store)
    }

    /// Reads the whole collection, seeding one example snippet when storage is empty.
    pub async fn load(&mut self) -> StoreResult<&[Snippet]> {
        let stored = self.storage.get(SNIPPETS_KEY).await?;

        let mut snippets = match stored {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(records)) => self.read_records(&records),
            Some(_) => {
                return Err(StoreError::Unavailable(StorageError::Unavailable(
                    "stored snippets are not an array".to_string(),
                )));
            }
        };
        dedupe_ids(&mut snippets);
        self.snippets = snippets;
        self.dirty = false;

        if self.snippets.is_empty() {
            let seed = Snippet::new(self.labels.seed_name.clone(), self.labels.seed_code.clone());
            info!("storage empty, seeding snippet {}", seed.id);
            self.snippets.push(seed);
            self.persist().await?;
        } else {
            debug!("loaded {} snippets", self.snippets.len());
        }

        Ok(&self.snippets)
    }

    /// Inserts a new snippet at the front.
    pub async fn create(
        &mut self,
        name: impl Into<String>,
        code: impl Into<String>,
    ) -> StoreResult<Snippet> {
        let name = self.normalize_name(&name.into());
        let mut snippet = Snippet::new(name, code.into());
        snippet.id = self.fresh_id(&[]);

        self.snippets.insert(0, snippet.clone());
        self.persist().await?;
        debug!("created snippet {}", snippet.id);
        Ok(snippet)
    }

    /// Inserts a snippet named with the "new snippet" label and no code.
    pub async fn create_blank(&mut self) -> StoreResult<Snippet> {
        let name = self.labels.new_name.clone();
        self.create(name, String::new()).await
    }

    /// Overwrites name and code of `id`. The name is trimmed and falls back to the
    /// untitled label. Neither the id nor the position of any snippet changes.
    pub async fn update(&mut self, id: &str, name: &str, code: &str) -> StoreResult<Snippet> {
        let name = self.normalize_name(name);
        let snippet = self
            .snippets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        snippet.name = name;
        snippet.code = code.to_string();
        snippet.touch();
        let updated = snippet.clone();

        self.persist().await?;
        debug!("updated snippet {id}");
        Ok(updated)
    }

    /// Copies `id` under a fresh id, with the copy suffix appended to its name, at the front.
    pub async fn duplicate(&mut self, id: &str) -> StoreResult<Snippet> {
        let source = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut copy = Snippet::new(
            format!("{}{}", source.name, self.labels.copy_suffix),
            source.code.clone(),
        );
        copy.id = self.fresh_id(&[]);

        self.snippets.insert(0, copy.clone());
        self.persist().await?;
        debug!("duplicated snippet {id} as {}", copy.id);
        Ok(copy)
    }

    /// Deletes `id`. Absent ids are a no-op returning `Ok(None)` without touching storage.
    pub async fn remove(&mut self, id: &str) -> StoreResult<Option<Snippet>> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };

        let removed = self.snippets.remove(index);
        self.persist().await?;
        debug!("removed snippet {id}");
        Ok(Some(removed))
    }

    /// Moves `id` to `target_index` among the remaining entries, keeping the relative
    /// order of all others. `target_index` equal to the remaining length places it last.
    ///
    /// Always works against the full collection; refusing to reorder a filtered view is
    /// left to the caller.
    pub async fn reorder(&mut self, id: &str, target_index: usize) -> StoreResult<()> {
        let from = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let remaining = self.snippets.len() - 1;
        if target_index > remaining {
            return Err(StoreError::IndexOutOfBounds {
                index: target_index,
                len: remaining,
            });
        }
        if from == target_index {
            return Ok(());
        }

        let moved = self.snippets.remove(from);
        self.snippets.insert(target_index, moved);
        self.persist().await?;
        debug!("moved snippet {id} from {from} to {target_index}");
        Ok(())
    }

    /// Snapshot of the collection as an export document.
    pub fn export_all(&self) -> ExportData {
        ExportData::new(&self.snippets, Utc::now())
    }

    pub fn export_json(&self) -> serde_json::Result<String> {
        self.export_all().to_json()
    }

    /// Imports a loosely-typed payload: a bare array of records or an object with a
    /// `snippets` array. Records without a string `code` are skipped; every accepted
    /// record gets a fresh id. The batch is prepended in input order and persisted once.
    pub async fn import_many(&mut self, raw: Value) -> StoreResult<Vec<Snippet>> {
        let items = ImportPayload::classify(raw)?.into_items();
        let now = now_millis();

        let mut batch: Vec<Snippet> = Vec::with_capacity(items.len());
        for item in &items {
            let Some(record) = clean_record(item, &self.labels.untitled, now) else {
                continue;
            };
            let id = self.fresh_id(&batch);
            batch.push(Snippet {
                id,
                name: record.name,
                code: record.code,
                updated_at: record.updated_at,
            });
        }

        if batch.is_empty() {
            warn!("import of {} records yielded nothing usable", items.len());
            return Err(ImportError::NothingToImport.into());
        }

        let skipped = items.len() - batch.len();
        self.snippets.splice(0..0, batch.iter().cloned());
        self.persist().await?;
        info!("imported {} snippets ({skipped} skipped)", batch.len());
        Ok(batch)
    }

    /// Parses `text` as JSON and imports it.
    pub async fn import_json(&mut self, text: &str) -> StoreResult<Vec<Snippet>> {
        let value: Value = serde_json::from_str(text).map_err(ImportError::from)?;
        self.import_many(value).await
    }

    /// Writes the in-memory collection again, e.g. after [`StoreError::Unpersisted`].
    pub async fn flush(&mut self) -> StoreResult<()> {
        self.persist().await
    }

    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn get(&self, id: &str) -> Option<&Snippet> {
        self.snippets.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.snippets.iter().position(|s| s.id == id)
    }

    pub fn first_id(&self) -> Option<&str> {
        self.snippets.first().map(|s| s.id.as_str())
    }

    /// `active` when it still exists, otherwise the first snippet, otherwise none.
    pub fn fallback_active(&self, active: Option<&str>) -> Option<&Snippet> {
        active
            .and_then(|id| self.get(id))
            .or_else(|| self.snippets.first())
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    /// True when the last write failed and memory is ahead of storage.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn labels(&self) -> &StoreLabels {
        &self.labels
    }

    pub fn set_labels(&mut self, labels: StoreLabels) {
        self.labels = labels;
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Recovers stored records the way imports are cleaned, keeping their ids.
    /// Records without a string `code` are dropped; missing or reused ids are
    /// reissued by [`dedupe_ids`].
    fn read_records(&self, records: &[Value]) -> Vec<Snippet> {
        let now = now_millis();
        let mut snippets = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let Some(cleaned) = clean_record(record, &self.labels.untitled, now) else {
                warn!("skipping stored record {index}: no string `code`");
                continue;
            };
            let id = record
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            snippets.push(Snippet {
                id,
                name: cleaned.name,
                code: cleaned.code,
                updated_at: cleaned.updated_at,
            });
        }

        snippets
    }

    async fn persist(&mut self) -> StoreResult<()> {
        let value = serde_json::to_value(&self.snippets)
            .map_err(|e| StoreError::Unpersisted(e.into()))?;

        match self.storage.set(SNIPPETS_KEY, value).await {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                warn!("failed to persist {} snippets: {e}", self.snippets.len());
                Err(StoreError::Unpersisted(e))
            }
        }
    }

    fn normalize_name(&self, name: &str) -> String {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            self.labels.untitled.clone()
        } else {
            trimmed.to_string()
        }
    }

    fn fresh_id(&self, pending: &[Snippet]) -> String {
        loop {
            let id = new_id();
            let taken = self.get(&id).is_some() || pending.iter().any(|s| s.id == id);
            if !taken {
                return id;
            }
        }
    }
}

/// Re-issues ids that are empty or appear more than once, keeping the first occurrence.
fn dedupe_ids(snippets: &mut [Snippet]) {
    let mut seen: HashSet<String> = snippets
        .iter()
        .filter(|s| !s.id.is_empty())
        .map(|s| s.id.clone())
        .collect();
    if seen.len() == snippets.len() {
        return;
    }

    let mut kept = HashSet::new();
    for snippet in snippets.iter_mut() {
        if !snippet.id.is_empty() && kept.insert(snippet.id.clone()) {
            continue;
        }
        let mut id = new_id();
        while seen.contains(&id) {
            id = new_id();
        }
        if snippet.id.is_empty() {
            warn!("stored snippet without id, assigned {id}");
        } else {
            warn!("duplicate stored id {}, reassigned to {id}", snippet.id);
        }
        seen.insert(id.clone());
        kept.insert(id.clone());
        snippet.id = id;
    }
}
