//! File-system backed asset source.
//!
//! Accepts either a single bundle file:
//! ```text
//! {"flows": [{...}, {...}]}
//! ```
//! or a directory holding one flow definition per `*.json` file.

use std::path::Path;
use std::sync::Arc;

use crate::errors::{AssetError, ReadError};
use crate::flow::{Flow, FlowReader};
use crate::traits::SessionAssets;
use crate::types::FlowUuid;

use super::StaticAssets;

/// Flows loaded from disk once, then served from memory.
#[derive(Debug, Clone)]
pub struct FileAssets {
    inner: StaticAssets,
}

impl FileAssets {
    pub async fn load(path: impl AsRef<Path>, reader: &FlowReader) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let meta = tokio::fs::metadata(path).await.map_err(|e| AssetError::Source {
            message: format!("failed to stat {}: {e}", path.display()),
        })?;

        let inner = if meta.is_dir() {
            load_dir(path, reader).await?
        } else {
            let data = read_to_string(path).await?;
            StaticAssets::from_json(reader, &data)?
        };
        tracing::debug!(path = %path.display(), flows = inner.len(), "loaded flow assets");
        Ok(Self { inner })
    }
}

async fn load_dir(dir: &Path, reader: &FlowReader) -> Result<StaticAssets, AssetError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| AssetError::Source {
        message: format!("failed to read directory {}: {e}", dir.display()),
    })?;

    let mut assets = StaticAssets::default();
    while let Some(entry) = entries.next_entry().await.map_err(|e| AssetError::Source {
        message: format!("failed to read directory entry: {e}"),
    })? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let data = read_to_string(&path).await?;
        let flow: Flow = reader.read_flow_json(&data).map_err(|e| match e {
            ReadError::Json(err) => AssetError::Source {
                message: format!("invalid flow file {}: {err}", path.display()),
            },
            other => AssetError::Read(other),
        })?;
        assets.add(flow);
    }
    Ok(assets)
}

async fn read_to_string(path: &Path) -> Result<String, AssetError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AssetError::Source {
            message: format!("failed to read {}: {e}", path.display()),
        })
}

impl SessionAssets for FileAssets {
    fn flow(&self, uuid: &FlowUuid) -> Result<Arc<Flow>, AssetError> {
        self.inner.flow(uuid)
    }
}
