use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Holds at most one snapshot of a dataset. A `put` swaps the whole value, so
/// readers see either the previous snapshot or the new one.
pub struct SnapshotCache<V>
where
    V: Send + Sync + 'static,
{
    name: &'static str,
    inner: RwLock<Option<Arc<V>>>,
}

impl<V> SnapshotCache<V>
where
    V: Send + Sync,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Option<Arc<V>> {
        let snapshot = self.inner.read().await.clone();
        if snapshot.is_some() {
            debug!(cache = self.name, "Cache HIT");
        } else {
            debug!(cache = self.name, "Cache MISS");
        }
        snapshot
    }

    pub async fn put(&self, value: V) -> Arc<V> {
        let value = Arc::new(value);
        *self.inner.write().await = Some(Arc::clone(&value));
        debug!(cache = self.name, "Cache PUT");
        value
    }

    pub async fn invalidate(&self) {
        self.inner.write().await.take();
        debug!(cache = self.name, "Cache INVALIDATE");
    }
}
