use crate::error::StorageError;
use async_trait::async_trait;
use core_types::TradeRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A named set of report filters, optionally tied to one account.
///
/// Fields beyond the ones modelled here are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedView {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub filters: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SavedView {
    pub fn new(name: impl Into<String>, account: Option<String>, filters: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account,
            name: name.into(),
            filters,
            extra: Map::new(),
        }
    }
}

/// The trade journal's persistence contract.
///
/// Trades and views are keyed by `id` and upserted on save. Deleting something
/// that does not exist is not an error. Listings come back ordered by key.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn get_all_trades(&self) -> Result<Vec<TradeRecord>, StorageError>;
    async fn get_trades_by_account(&self, account: &str) -> Result<Vec<TradeRecord>, StorageError>;
    async fn save_trade(&self, trade: TradeRecord) -> Result<(), StorageError>;
    async fn save_trades_bulk(&self, trades: Vec<TradeRecord>) -> Result<(), StorageError>;
    /// Swaps the whole trade list for `trades` in a single write.
    async fn replace_trades(&self, trades: Vec<TradeRecord>) -> Result<(), StorageError>;
    async fn delete_trade(&self, id: &str) -> Result<(), StorageError>;
    async fn clear_trades(&self) -> Result<(), StorageError>;

    async fn save_setting(&self, key: &str, value: Value) -> Result<(), StorageError>;
    async fn get_setting(&self, key: &str) -> Result<Option<Value>, StorageError>;
    async fn get_all_settings(&self) -> Result<BTreeMap<String, Value>, StorageError>;

    async fn save_view(&self, view: SavedView) -> Result<(), StorageError>;
    /// Views for one account, or every view when `account` is `None`.
    async fn get_views(&self, account: Option<&str>) -> Result<Vec<SavedView>, StorageError>;
    async fn delete_view(&self, id: &str) -> Result<(), StorageError>;
    async fn clear_views(&self) -> Result<(), StorageError>;
}
