use crate::error::StorageError;
use crate::memory::MemoryStore;
use crate::snapshot::{read_snapshot, write_snapshot};
use crate::store::{SavedView, TradeStore};
use async_trait::async_trait;
use core_types::TradeRecord;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard, OnceCell};

/// A journal backed by a single JSON file.
///
/// The file is read on first use. A mutation is applied to a staged copy of the
/// journal, the copy is written to disk, and only then does it replace the
/// in-memory journal. A failed write leaves both file and memory as they were.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: OnceCell<MemoryStore>,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inner: OnceCell::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn store(&self) -> Result<&MemoryStore, StorageError> {
        self.inner
            .get_or_try_init(|| async {
                read_snapshot(&self.path).await.map(MemoryStore::from_snapshot)
            })
            .await
    }

    /// Takes the write lock and stages a copy of the loaded journal.
    async fn begin_write(&self) -> Result<PendingWrite<'_>, StorageError> {
        let guard = self.write_lock.lock().await;
        let live = self.store().await?;
        let staged = MemoryStore::from_snapshot(live.snapshot().await);
        Ok(PendingWrite {
            _guard: guard,
            live,
            staged,
        })
    }

    async fn commit(&self, pending: PendingWrite<'_>) -> Result<(), StorageError> {
        let snapshot = pending.staged.into_snapshot();
        write_snapshot(&self.path, &snapshot).await?;
        pending.live.restore(snapshot).await;
        tracing::debug!(path = %self.path.display(), "Journal saved.");
        Ok(())
    }
}

struct PendingWrite<'a> {
    _guard: MutexGuard<'a, ()>,
    live: &'a MemoryStore,
    staged: MemoryStore,
}

#[async_trait]
impl TradeStore for JsonFileStore {
    async fn get_all_trades(&self) -> Result<Vec<TradeRecord>, StorageError> {
        self.store().await?.get_all_trades().await
    }

    async fn get_trades_by_account(&self, account: &str) -> Result<Vec<TradeRecord>, StorageError> {
        self.store().await?.get_trades_by_account(account).await
    }

    async fn save_trade(&self, trade: TradeRecord) -> Result<(), StorageError> {
        let pending = self.begin_write().await?;
        pending.staged.save_trade(trade).await?;
        self.commit(pending).await
    }

    async fn save_trades_bulk(&self, trades: Vec<TradeRecord>) -> Result<(), StorageError> {
        let pending = self.begin_write().await?;
        pending.staged.save_trades_bulk(trades).await?;
        self.commit(pending).await
    }

    async fn replace_trades(&self, trades: Vec<TradeRecord>) -> Result<(), StorageError> {
        let pending = self.begin_write().await?;
        pending.staged.replace_trades(trades).await?;
        self.commit(pending).await
    }

    async fn delete_trade(&self, id: &str) -> Result<(), StorageError> {
        let pending = self.begin_write().await?;
        pending.staged.delete_trade(id).await?;
        self.commit(pending).await
    }

    async fn clear_trades(&self) -> Result<(), StorageError> {
        let pending = self.begin_write().await?;
        pending.staged.clear_trades().await?;
        self.commit(pending).await
    }

    async fn save_setting(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let pending = self.begin_write().await?;
        pending.staged.save_setting(key, value).await?;
        self.commit(pending).await
    }

    async fn get_setting(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.store().await?.get_setting(key).await
    }

    async fn get_all_settings(&self) -> Result<BTreeMap<String, Value>, StorageError> {
        self.store().await?.get_all_settings().await
    }

    async fn save_view(&self, view: SavedView) -> Result<(), StorageError> {
        let pending = self.begin_write().await?;
        pending.staged.save_view(view).await?;
        self.commit(pending).await
    }

    async fn get_views(&self, account: Option<&str>) -> Result<Vec<SavedView>, StorageError> {
        self.store().await?.get_views(account).await
    }

    async fn delete_view(&self, id: &str) -> Result<(), StorageError> {
        let pending = self.begin_write().await?;
        pending.staged.delete_view(id).await?;
        self.commit(pending).await
    }

    async fn clear_views(&self) -> Result<(), StorageError> {
        let pending = self.begin_write().await?;
        pending.staged.clear_views().await?;
        self.commit(pending).await
    }
}
