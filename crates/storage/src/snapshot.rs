use crate::error::StorageError;
use crate::store::SavedView;
use core_types::TradeRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

/// Everything the journal persists, as written to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalSnapshot {
    pub trades: Vec<TradeRecord>,
    pub settings: BTreeMap<String, Value>,
    pub views: Vec<SavedView>,
}

/// Reads a journal file.
///
/// A missing file is an empty journal. A file holding a bare JSON array is read
/// as a list of trades with no settings or views.
pub async fn read_snapshot(path: &Path) -> Result<JournalSnapshot, StorageError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Journal file not found, starting empty.");
            return Ok(JournalSnapshot::default());
        }
        Err(e) => return Err(StorageError::io(path, e)),
    };

    let value: Value = serde_json::from_slice(&bytes)?;
    let snapshot = if value.is_array() {
        JournalSnapshot {
            trades: serde_json::from_value(value)?,
            ..JournalSnapshot::default()
        }
    } else {
        serde_json::from_value(value)?
    };

    tracing::debug!(
        path = %path.display(),
        trades = snapshot.trades.len(),
        views = snapshot.views.len(),
        "Loaded journal."
    );
    Ok(snapshot)
}

/// Writes a journal file via a temporary sibling and a rename.
pub async fn write_snapshot(path: &Path, snapshot: &JournalSnapshot) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(parent, e))?;
    }

    let bytes = serde_json::to_vec_pretty(snapshot)?;
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    tokio::fs::write(temp_path, &bytes)
        .await
        .map_err(|e| StorageError::io(temp_path, e))?;
    tokio::fs::rename(temp_path, path)
        .await
        .map_err(|e| StorageError::io(path, e))?;
    Ok(())
}
