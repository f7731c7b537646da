use dashmap::DashMap;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

use crate::models::{AccountStatus, Watchlists};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("watchlist file error: {0}")]
    Io(#[from] io::Error),
    #[error("watchlist format error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shared handle over the per-chat watchlists and the last-observed statuses.
/// Cloning is cheap; all clones see the same state. Watchlist mutations are
/// written to disk before they are acknowledged, so the file always matches
/// what a successful command reported. Statuses live only in memory and reset
/// on restart.
#[derive(Clone)]
pub struct Storage {
    path: Arc<PathBuf>,
    watchlists: Arc<Mutex<Watchlists>>,
    statuses: Arc<DashMap<i64, HashMap<String, AccountStatus>>>,
}

impl Storage {
    /// Reads the watchlist file, treating a missing file as an empty store.
    /// A file that exists but does not parse is a startup error.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let watchlists = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Watchlists::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Arc::new(path),
            watchlists: Arc::new(Mutex::new(watchlists)),
            statuses: Arc::new(DashMap::new()),
        })
    }

    /// Adds a username to the chat's watchlist. `Ok(false)` means it was
    /// already tracked and nothing was written.
    pub async fn add(&self, chat_id: i64, username: &str) -> Result<bool, StorageError> {
        let mut lists = self.watchlists.lock().await;
        if !lists.add(chat_id, username) {
            return Ok(false);
        }
        self.persist(&lists).await?;
        Ok(true)
    }

    /// Removes a username from the chat's watchlist. `Ok(false)` means it was
    /// not tracked and nothing was written.
    pub async fn remove(&self, chat_id: i64, username: &str) -> Result<bool, StorageError> {
        let mut lists = self.watchlists.lock().await;
        if !lists.remove(chat_id, username) {
            return Ok(false);
        }
        self.persist(&lists).await?;
        Ok(true)
    }

    /// Tracked usernames for one chat, in insertion order.
    pub async fn names(&self, chat_id: i64) -> Vec<String> {
        self.watchlists.lock().await.names(chat_id)
    }

    /// Copy of the whole store, taken by the monitor at the start of a scan
    /// cycle. Commands that land mid-scan affect the next cycle.
    pub async fn snapshot(&self) -> Watchlists {
        self.watchlists.lock().await.clone()
    }

    pub fn last_status(&self, chat_id: i64, username: &str) -> Option<AccountStatus> {
        self.statuses
            .get(&chat_id)
            .and_then(|chat| chat.get(username).cloned())
    }

    pub fn record_status(&self, chat_id: i64, username: &str, status: AccountStatus) {
        self.statuses
            .entry(chat_id)
            .or_default()
            .insert(username.to_string(), status);
    }

    // Full-snapshot overwrite via a sibling temp file, renamed into place so
    // a crash mid-write cannot leave a half-written watchlist behind.
    async fn persist(&self, lists: &Watchlists) -> Result<(), StorageError> {
        let json = serde_json::to_string(lists)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, self.path.as_path()).await?;
        Ok(())
    }
}
