//! Per-connection engine cache.
//!
//! One live [`SqlBackend`] handle per external connection, shared across
//! concurrent requests. Handles are created lazily, probed for liveness
//! before reuse, and disposed on explicit invalidation or detected
//! staleness.
//!
//! Locking: the handle map is behind a plain mutex held only for map
//! operations; creation is serialized *per key* by an entry-level async
//! mutex so two first-users of the same connection cannot both open a
//! handle, while different connections connect in parallel. Creation is
//! rare and reuse frequent, so a plain guarded map beats anything
//! lock-free here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{BackendError, SqlBackend};

/// Creates backend handles for connection ids.
///
/// Owned by the embedding application: it knows credentials and drivers;
/// the pool only knows ids.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    async fn connect(&self, connection_id: &str) -> Result<Arc<dyn SqlBackend>, BackendError>;
}

#[derive(Default)]
struct Entry {
    /// None until first successful creation, or after staleness eviction.
    slot: tokio::sync::Mutex<Option<Arc<dyn SqlBackend>>>,
}

/// Mutex-guarded cache of backend handles, keyed by connection id.
pub struct ConnectionPool {
    factory: Arc<dyn BackendFactory>,
    entries: Mutex<HashMap<String, Arc<Entry>>>,
}

impl ConnectionPool {
    pub fn new(factory: Arc<dyn BackendFactory>) -> Self {
        Self {
            factory,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get the cached handle for a connection, creating it on first use.
    ///
    /// A cached handle is probed with [`SqlBackend::ping`] before reuse;
    /// a stale handle is dropped and a fresh one created in its place.
    pub async fn get(&self, connection_id: &str) -> Result<Arc<dyn SqlBackend>, BackendError> {
        let entry = {
            let mut map = self
                .entries
                .lock()
                .map_err(|_| BackendError::Connection("connection pool lock poisoned".into()))?;
            map.entry(connection_id.to_string())
                .or_insert_with(|| Arc::new(Entry::default()))
                .clone()
        };

        let mut slot = entry.slot.lock().await;

        if let Some(backend) = slot.as_ref() {
            match backend.ping().await {
                Ok(()) => return Ok(backend.clone()),
                Err(err) => {
                    tracing::warn!(%connection_id, error = %err, "cached engine failed liveness probe, reconnecting");
                    *slot = None;
                }
            }
        }

        let backend = self.factory.connect(connection_id).await?;
        *slot = Some(backend.clone());
        tracing::debug!(%connection_id, "created backend handle");
        Ok(backend)
    }

    /// Drop the cached handle for one connection (e.g. on disconnect).
    pub fn invalidate(&self, connection_id: &str) {
        if let Ok(mut map) = self.entries.lock() {
            map.remove(connection_id);
        }
    }

    /// Drop every cached handle.
    pub fn shutdown(&self) {
        if let Ok(mut map) = self.entries.lock() {
            map.clear();
        }
    }
}
