use crate::error::StorageError;
use crate::snapshot::JournalSnapshot;
use crate::store::{SavedView, TradeStore};
use async_trait::async_trait;
use core_types::TradeRecord;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct JournalState {
    trades: BTreeMap<String, TradeRecord>,
    settings: BTreeMap<String, Value>,
    views: BTreeMap<String, SavedView>,
}

impl From<JournalSnapshot> for JournalState {
    fn from(snapshot: JournalSnapshot) -> Self {
        Self {
            trades: snapshot.trades.into_iter().map(|t| (t.id.to_string(), t)).collect(),
            settings: snapshot.settings,
            views: snapshot.views.into_iter().map(|v| (v.id.clone(), v)).collect(),
        }
    }
}

impl From<JournalState> for JournalSnapshot {
    fn from(state: JournalState) -> Self {
        Self {
            trades: state.trades.into_values().collect(),
            settings: state.settings,
            views: state.views.into_values().collect(),
        }
    }
}

/// A journal held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<JournalState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: JournalSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot.into()),
        }
    }

    pub fn into_snapshot(self) -> JournalSnapshot {
        self.state.into_inner().into()
    }

    /// Replaces the whole journal in one step.
    pub async fn restore(&self, snapshot: JournalSnapshot) {
        *self.state.write().await = snapshot.into();
    }

    pub async fn snapshot(&self) -> JournalSnapshot {
        let state = self.state.read().await;
        JournalSnapshot {
            trades: state.trades.values().cloned().collect(),
            settings: state.settings.clone(),
            views: state.views.values().cloned().collect(),
        }
    }
}

#[async_trait]
impl TradeStore for MemoryStore {
    async fn get_all_trades(&self) -> Result<Vec<TradeRecord>, StorageError> {
        Ok(self.state.read().await.trades.values().cloned().collect())
    }

    async fn get_trades_by_account(&self, account: &str) -> Result<Vec<TradeRecord>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .trades
            .values()
            .filter(|t| t.account.as_deref() == Some(account))
            .cloned()
            .collect())
    }

    async fn save_trade(&self, trade: TradeRecord) -> Result<(), StorageError> {
        self.state.write().await.trades.insert(trade.id.to_string(), trade);
        Ok(())
    }

    async fn save_trades_bulk(&self, trades: Vec<TradeRecord>) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        for trade in trades {
            state.trades.insert(trade.id.to_string(), trade);
        }
        Ok(())
    }

    async fn replace_trades(&self, trades: Vec<TradeRecord>) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        state.trades = trades.into_iter().map(|t| (t.id.to_string(), t)).collect();
        Ok(())
    }

    async fn delete_trade(&self, id: &str) -> Result<(), StorageError> {
        self.state.write().await.trades.remove(id);
        Ok(())
    }

    async fn clear_trades(&self) -> Result<(), StorageError> {
        self.state.write().await.trades.clear();
        Ok(())
    }

    async fn save_setting(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.state.write().await.settings.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.state.read().await.settings.get(key).cloned())
    }

    async fn get_all_settings(&self) -> Result<BTreeMap<String, Value>, StorageError> {
        Ok(self.state.read().await.settings.clone())
    }

    async fn save_view(&self, view: SavedView) -> Result<(), StorageError> {
        self.state.write().await.views.insert(view.id.clone(), view);
        Ok(())
    }

    async fn get_views(&self, account: Option<&str>) -> Result<Vec<SavedView>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .views
            .values()
            .filter(|v| account.is_none() || v.account.as_deref() == account)
            .cloned()
            .collect())
    }

    async fn delete_view(&self, id: &str) -> Result<(), StorageError> {
        self.state.write().await.views.remove(id);
        Ok(())
    }

    async fn clear_views(&self) -> Result<(), StorageError> {
        self.state.write().await.views.clear();
        Ok(())
    }
}
