use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use marmot_config::WorkingContext;

use crate::selector::Selector;
use crate::types::{AppRecord, AppStatus, RecordDraft, ServerError, ServerResult};

/// Contents of `apps.json`: every webapp marmot has ever started and not
/// removed, plus the id counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(rename = "lastIndex", default)]
    pub last_index: u64,
    #[serde(default)]
    pub list: Vec<AppRecord>,
}

impl RegistryFile {
    /// Raise `last_index` to the largest id present and clear pids on stopped
    /// records, repairing hand-edited files.
    pub fn normalize(&mut self) {
        let max_id = self.list.iter().map(|r| r.id).max().unwrap_or(0);
        if self.last_index < max_id {
            warn!(
                "Registry lastIndex {} is below the largest id {}, raising it",
                self.last_index, max_id
            );
            self.last_index = max_id;
        }
        for record in self.list.iter_mut() {
            if record.status == AppStatus::Stopped {
                record.pid = None;
            }
        }
    }

    pub fn find(&self, selector: &Selector) -> Option<&AppRecord> {
        self.list.iter().find(|r| selector.matches(r))
    }

    pub fn find_all(&self, selector: &Selector) -> Vec<&AppRecord> {
        self.list.iter().filter(|r| selector.matches(r)).collect()
    }

    /// Insert or update a record. The pathname wins over the id when locating
    /// the record to update; afterwards no other record shares the pathname.
    pub fn upsert(&mut self, draft: RecordDraft) -> AppRecord {
        let position = self
            .list
            .iter()
            .position(|r| r.pathname == draft.pathname)
            .or_else(|| {
                draft
                    .id
                    .and_then(|id| self.list.iter().position(|r| r.id == id))
            });

        let pid = match draft.status {
            AppStatus::Online => draft.pid,
            AppStatus::Stopped => None,
        };

        let saved = match position {
            Some(index) => {
                let record = &mut self.list[index];
                record.name = draft.name;
                record.port = draft.port;
                record.pid = pid;
                record.status = draft.status;
                record.pathname = draft.pathname;
                record.clone()
            }
            None => {
                self.last_index += 1;
                let record = AppRecord {
                    id: self.last_index,
                    name: draft.name,
                    port: draft.port,
                    pid,
                    status: draft.status,
                    pathname: draft.pathname,
                };
                self.list.push(record.clone());
                record
            }
        };

        self.list
            .retain(|r| r.id == saved.id || r.pathname != saved.pathname);
        saved
    }

    /// Remove the first matching record.
    pub fn remove(&mut self, selector: &Selector) -> Option<AppRecord> {
        let index = self.list.iter().position(|r| selector.matches(r))?;
        Some(self.list.remove(index))
    }

    /// Remove every matching record, returning them in list order.
    pub fn remove_all(&mut self, selector: &Selector) -> Vec<AppRecord> {
        let (removed, kept) = std::mem::take(&mut self.list)
            .into_iter()
            .partition(|r| selector.matches(r));
        self.list = kept;
        removed
    }
}

/// JSON-file backed webapp registry.
///
/// Every operation re-reads the file and writes it back whole; there is no
/// in-memory cache and no cross-process locking.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_context(context: &WorkingContext) -> Self {
        Self::new(context.registry_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry. Missing, unreadable or malformed files read as an
    /// empty registry.
    pub async fn load(&self) -> RegistryFile {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Webapp registry does not exist yet at {:?}", self.path);
                return RegistryFile::default();
            }
            Err(e) => {
                warn!("Failed to read webapp registry {:?}: {}", self.path, e);
                return RegistryFile::default();
            }
        };

        if content.trim().is_empty() {
            return RegistryFile::default();
        }

        match serde_json::from_str::<RegistryFile>(&content) {
            Ok(mut file) => {
                file.normalize();
                debug!("Loaded {} webapps from registry", file.list.len());
                file
            }
            Err(e) => {
                warn!(
                    "Webapp registry {:?} is corrupt ({}), treating it as empty",
                    self.path, e
                );
                RegistryFile::default()
            }
        }
    }

    /// Replace the registry file atomically (temp file + rename).
    pub async fn write(&self, file: &RegistryFile) -> ServerResult<()> {
        self.write_inner(file).await.map_err(|source| ServerError::Persistence {
            path: self.path.clone(),
            pid: None,
            source,
        })
    }

    async fn write_inner(&self, file: &RegistryFile) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(file)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        debug!("Saved {} webapps to registry", file.list.len());
        Ok(())
    }

    pub async fn find(&self, selector: &Selector) -> Option<AppRecord> {
        self.load().await.find(selector).cloned()
    }

    pub async fn find_all(&self, selector: &Selector) -> Vec<AppRecord> {
        self.load()
            .await
            .find_all(selector)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn list(&self) -> Vec<AppRecord> {
        self.load().await.list
    }

    pub async fn save(&self, draft: RecordDraft) -> ServerResult<AppRecord> {
        self.update(|file| file.upsert(draft)).await
    }

    /// Read-modify-write in one operation.
    pub async fn update<F, T>(&self, mutate: F) -> ServerResult<T>
    where
        F: FnOnce(&mut RegistryFile) -> T,
    {
        let mut file = self.load().await;
        let result = mutate(&mut file);
        self.write(&file).await?;
        Ok(result)
    }

    pub async fn remove(&self, selector: &Selector) -> ServerResult<Option<AppRecord>> {
        let mut file = self.load().await;
        let removed = file.remove(selector);
        if let Some(record) = &removed {
            self.write(&file).await?;
            info!("Removed webapp {} ({}) from registry", record.id, record.name);
        }
        Ok(removed)
    }

    pub async fn remove_all(&self, selector: &Selector) -> ServerResult<Vec<AppRecord>> {
        let mut file = self.load().await;
        let removed = file.remove_all(selector);
        if !removed.is_empty() {
            self.write(&file).await?;
            info!("Removed {} webapps from registry", removed.len());
        }
        Ok(removed)
    }
}
