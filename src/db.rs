use std::path::PathBuf;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::ser::PrettyFormatter;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// Collections created on first start, one JSON document each.
pub const COLLECTIONS: [&str; 6] = [
    "users",
    "restaurants",
    "menu_items",
    "orders",
    "products",
    "audit_logs",
];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed collection document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode collection {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("record {id} not found in {collection}")]
    NotFound { collection: String, id: Uuid },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Flat collection store: every collection is one JSON array on disk,
/// read whole and rewritten whole.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// Read every record of `name`. An absent document is created as `[]`.
    /// A document that does not parse is an error, never an empty collection.
    pub async fn load<R: DeserializeOwned>(&self, name: &str) -> StoreResult<Vec<R>> {
        let path = self.path_for(name);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                self.write_document(name, b"[]").await?;
                return Ok(Vec::new());
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        serde_json::from_slice(&bytes).map_err(|source| {
            tracing::error!(collection = name, error = %source, "malformed collection document");
            StoreError::Malformed { path, source }
        })
    }

    /// Overwrite the whole document for `name` with `records`.
    pub async fn save<R: Serialize>(&self, name: &str, records: &[R]) -> StoreResult<()> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        records
            .serialize(&mut ser)
            .map_err(|source| StoreError::Encode {
                name: name.to_string(),
                source,
            })?;

        self.write_document(name, &buf).await?;
        tracing::debug!(collection = name, records = records.len(), "collection saved");
        Ok(())
    }

    // Written to a sibling file and renamed over the document so readers
    // never observe a half-written array.
    async fn write_document(&self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::Io {
                path: self.root.clone(),
                source,
            })?;

        let path = self.path_for(name);
        let tmp = self.root.join(format!(".{name}.json.{}", Uuid::new_v4().simple()));
        fs::write(&tmp, bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Io { path, source })
    }
}

/// Create the data directory and an empty document for every known
/// collection that does not exist yet.
pub async fn initialize(store: &JsonStore) -> StoreResult<()> {
    for name in COLLECTIONS {
        let path = store.path_for(name);
        let exists = fs::try_exists(&path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        if !exists {
            store.write_document(name, b"[]").await?;
            tracing::info!(collection = name, "initialized empty collection");
        }
    }
    Ok(())
}
