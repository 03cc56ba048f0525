//! Disk Engine Module
//!
//! Persistent engine storing one JSON record per key in a directory.
//!
//! The index (sizes, expiry heap, eviction order) lives in memory and is
//! rebuilt from the records on open. Record files are named by a numeric id,
//! so keys of any length or content map to safe file names.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, warn};

use super::{
    EngineContext, EngineIndex, EngineKind, EngineOptions, EngineUsage, Lookup, StorageEngine,
};
use crate::cache::{entry_size, CacheEntry};
use crate::error::{CacheError, Result};

const RECORD_EXTENSION: &str = "json";

// == Disk Engine ==
/// Directory-backed engine for large or long-lived values.
#[derive(Debug)]
pub struct DiskEngine {
    kind: EngineKind,
    dir: PathBuf,
    index: EngineIndex,
    /// key → record id
    files: HashMap<String, u64>,
    next_id: u64,
}

impl DiskEngine {
    // == Open ==
    /// Opens (or creates) the engine rooted at `dir` and reloads surviving records.
    ///
    /// Expired records and records that no longer fit the budget are deleted.
    /// Unreadable records are skipped and left in place.
    ///
    /// # Errors
    /// `EngineUnavailable` if the directory cannot be created or listed,
    /// `UnknownStrategy` for an unregistered eviction strategy.
    pub async fn open(
        kind: EngineKind,
        dir: impl Into<PathBuf>,
        options: EngineOptions,
        context: &EngineContext,
    ) -> Result<Self> {
        let dir = dir.into();
        let index = EngineIndex::new(&options, context)?;

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::EngineUnavailable(format!("{}: {}", dir.display(), e)))?;

        let mut engine = Self {
            kind,
            dir,
            index,
            files: HashMap::new(),
            next_id: 0,
        };
        engine.reload().await?;
        Ok(engine)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn reload(&mut self) -> Result<()> {
        let mut listing = fs::read_dir(&self.dir)
            .await
            .map_err(|e| CacheError::EngineUnavailable(format!("{}: {}", self.dir.display(), e)))?;

        let mut records = Vec::new();
        while let Some(dirent) = listing.next_entry().await? {
            let path = dirent.path();
            let Some(id) = record_id(&path) else {
                continue;
            };
            self.next_id = self.next_id.max(id + 1);
            match read_record(&path).await {
                Ok(entry) => records.push((id, entry)),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable record"),
            }
        }

        // Replay oldest first so recency order matches write order.
        records.sort_by_key(|(id, entry)| (entry.created_at, *id));

        let now = self.index.now();
        let mut restored = 0usize;
        for (id, entry) in records {
            if entry.is_expired(now) {
                self.delete_file(id).await;
                continue;
            }

            let size = entry_size(&entry.key, &entry.value);
            let mut evicted = Vec::new();
            let admitted = self.index.make_room(&entry.key, size, &mut evicted);
            self.forget_files(&evicted).await;
            if admitted.is_err() {
                self.delete_file(id).await;
                continue;
            }

            let ttl = entry
                .expires_at
                .map(|expires_at| Duration::from_millis(expires_at.saturating_sub(now)));
            let mut meta = entry.meta();
            meta.size_bytes = size;
            self.index.commit(&entry.key, meta, ttl);
            if let Some(stale) = self.files.insert(entry.key, id) {
                self.delete_file(stale).await;
            }
            restored += 1;
        }

        info!(engine = %self.kind, dir = %self.dir.display(), restored, "disk engine opened");
        Ok(())
    }

    fn record_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{:016x}.{}", id, RECORD_EXTENSION))
    }

    /// Deletes a record file; a missing file is not an error.
    async fn delete_file(&self, id: u64) {
        let path = self.record_path(id);
        if let Err(err) = fs::remove_file(&path).await {
            if err.kind() != ErrorKind::NotFound {
                warn!(path = %path.display(), error = %err, "failed to delete record");
            }
        }
    }

    /// Drops the file mapping of keys the index already removed, then deletes their files.
    async fn forget_files(&mut self, keys: &[String]) {
        let ids: Vec<u64> = keys.iter().filter_map(|key| self.files.remove(key)).collect();
        for id in ids {
            self.delete_file(id).await;
        }
    }
}

#[async_trait]
impl StorageEngine for DiskEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    async fn set_item(&mut self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry::new(
            key.to_string(),
            value,
            self.index.now(),
            ttl.map(|t| t.as_millis() as u64),
        );

        let mut evicted = Vec::new();
        let admitted = self.index.make_room(key, entry.size_bytes, &mut evicted);
        self.forget_files(&evicted).await;
        if let Err(err) = admitted {
            warn!(engine = %self.kind, key, error = %err, "write rejected");
            return Err(err);
        }

        let id = match self.files.get(key) {
            Some(&id) => id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                self.files.insert(key.to_string(), id);
                id
            }
        };

        let bytes = serde_json::to_vec(&entry)?;
        if let Err(err) = fs::write(self.record_path(id), bytes).await {
            // The previous record, if any, may be truncated: drop the key entirely.
            self.index.remove(key);
            self.files.remove(key);
            self.delete_file(id).await;
            return Err(err.into());
        }

        self.index.commit(key, entry.meta(), ttl);
        Ok(())
    }

    async fn get_item(&mut self, key: &str) -> Result<Option<String>> {
        match self.index.lookup(key) {
            Lookup::Miss => Ok(None),
            Lookup::Expired => {
                self.forget_files(&[key.to_string()]).await;
                Ok(None)
            }
            Lookup::Hit(_) => {
                let Some(&id) = self.files.get(key) else {
                    return Ok(None);
                };
                match read_record(&self.record_path(id)).await {
                    Ok(entry) => Ok(Some(entry.value)),
                    Err(CacheError::Io(err)) if err.kind() == ErrorKind::NotFound => {
                        // Removed behind our back
                        self.index.remove(key);
                        self.files.remove(key);
                        Ok(None)
                    }
                    Err(err) => Err(err),
                }
            }
        }
    }

    async fn remove_item(&mut self, key: &str) -> Result<bool> {
        if self.index.remove(key).is_none() {
            return Ok(false);
        }
        self.forget_files(&[key.to_string()]).await;
        Ok(true)
    }

    async fn clear(&mut self) -> Result<()> {
        self.index.clear();
        let ids: Vec<u64> = self.files.drain().map(|(_, id)| id).collect();
        for id in ids {
            self.delete_file(id).await;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.index.live_keys())
    }

    async fn length(&self) -> Result<usize> {
        Ok(self.index.live_len())
    }

    async fn cleanup(&mut self) -> Result<usize> {
        let removed = self.index.sweep_expired();
        self.forget_files(&removed).await;
        if !removed.is_empty() {
            debug!(engine = %self.kind, removed = removed.len(), "swept expired records");
        }
        Ok(removed.len())
    }

    fn usage(&self) -> EngineUsage {
        self.index.usage(self.kind)
    }
}

// == Record Helpers ==
fn record_id(path: &Path) -> Option<u64> {
    if path.extension()?.to_str()? != RECORD_EXTENSION {
        return None;
    }
    u64::from_str_radix(path.file_stem()?.to_str()?, 16).ok()
}

async fn read_record(path: &Path) -> Result<CacheEntry> {
    let bytes = fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
