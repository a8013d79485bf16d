use std::fmt;
use std::path::Path;
#[cfg(feature = "sqlite")]
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use satire_core::{ArticleStorage, Error, Result};
use tracing::info;

pub mod backends;

pub use backends::*;

pub const DEFAULT_DB_PATH: &str = "articles.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Memory,
    #[cfg(feature = "sqlite")]
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            #[cfg(feature = "sqlite")]
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::Configuration(format!("Unknown storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            #[cfg(feature = "sqlite")]
            Self::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Opens the requested backend. The caller owns the returned store and is
/// expected to `close()` it on shutdown.
#[cfg_attr(not(feature = "sqlite"), allow(unused_variables))]
pub async fn create_storage(kind: StorageKind, db_path: Option<&Path>) -> Result<Arc<dyn ArticleStorage>> {
    let storage: Arc<dyn ArticleStorage> = match kind {
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => {
            let path = db_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
            Arc::new(SQLiteStorage::open(&path).await?)
        }
    };
    info!("💾 Storage initialized (using {})", kind);
    Ok(storage)
}

pub mod prelude {
    pub use super::{create_storage, StorageKind};
    pub use super::backends::*;
}
