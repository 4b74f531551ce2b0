use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use log::info;

use crate::{DocumentStore, credentials::Credentials, local::LocalStore, memory::MemoryStore};

/// Which document store implementation to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Append-only log under the data directory.
    #[default]
    Local,
    /// Process memory; nothing outlives the run and only document ids are
    /// kept.
    Memory,
}

/// Open a shared store handle for `credentials.project_id`.
pub fn connect(
    backend: StoreBackend,
    credentials: &Credentials,
    data_dir: &Path,
) -> Result<Arc<dyn DocumentStore>> {
    info!(
        "connecting to {:?} store for project {} as {}",
        backend,
        credentials.project_id,
        credentials.client_email().unwrap_or("<unknown account>")
    );

    match backend {
        StoreBackend::Local => {
            let store = LocalStore::open(data_dir, &credentials.project_id).with_context(|| {
                format!(
                    "store setup failed for project {} under {}",
                    credentials.project_id,
                    data_dir.display()
                )
            })?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::ids_only())),
    }
}
