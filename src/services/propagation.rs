//! Asynchronous maintenance of category → product backlinks.
//!
//! Product writes enqueue a [`BacklinkEvent`] after the primary write has
//! been acknowledged. A single worker applies events in submission order,
//! at most once. Failures are logged and dropped, so `Category.products` can
//! drift from the products table until reconciled.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::db::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BacklinkEvent {
    Created {
        product_id: String,
        category_id: String,
    },
    Moved {
        product_id: String,
        from: String,
        to: String,
    },
    Deleted {
        product_id: String,
        category_id: String,
    },
}

/// Writes used by the worker. `Store` is the production implementation.
#[async_trait]
pub trait BacklinkStore: Send + Sync {
    async fn push_product(&self, category_id: &str, product_id: &str) -> anyhow::Result<()>;

    async fn pull_product(&self, category_id: &str, product_id: &str) -> anyhow::Result<()>;
}

#[async_trait]
impl BacklinkStore for Store {
    async fn push_product(&self, category_id: &str, product_id: &str) -> anyhow::Result<()> {
        self.push_category_product(category_id, product_id).await?;
        Ok(())
    }

    async fn pull_product(&self, category_id: &str, product_id: &str) -> anyhow::Result<()> {
        self.pull_category_product(category_id, product_id).await?;
        Ok(())
    }
}

enum Message {
    Event(BacklinkEvent),
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct ConsistencyCoordinator {
    tx: mpsc::UnboundedSender<Message>,
}

impl ConsistencyCoordinator {
    /// Spawns the worker on the current runtime.
    #[must_use]
    pub fn start(store: Arc<dyn BacklinkStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    Message::Event(event) => apply(store.as_ref(), &event).await,
                    Message::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("Backlink worker stopped");
        });

        Self { tx }
    }

    /// Enqueues `event`. Never blocks and never fails the caller.
    pub fn submit(&self, event: BacklinkEvent) {
        if self.tx.send(Message::Event(event)).is_err() {
            warn!("Backlink worker is gone; dropping event");
        }
    }

    /// Resolves once every event submitted before this call has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Message::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

async fn apply(store: &dyn BacklinkStore, event: &BacklinkEvent) {
    match event {
        BacklinkEvent::Created {
            product_id,
            category_id,
        } => push(store, category_id, product_id).await,
        BacklinkEvent::Moved {
            product_id,
            from,
            to,
        } => {
            // Independent writes: a failed pull does not prevent the push.
            pull(store, from, product_id).await;
            push(store, to, product_id).await;
        }
        BacklinkEvent::Deleted {
            product_id,
            category_id,
        } => pull(store, category_id, product_id).await,
    }
}

async fn push(store: &dyn BacklinkStore, category_id: &str, product_id: &str) {
    if let Err(e) = store.push_product(category_id, product_id).await {
        metrics::counter!("backlink_failures_total", "op" => "push").increment(1);
        warn!(error = %e, category_id, product_id, "Failed to link product to category");
    }
}

async fn pull(store: &dyn BacklinkStore, category_id: &str, product_id: &str) {
    if let Err(e) = store.pull_product(category_id, product_id).await {
        metrics::counter!("backlink_failures_total", "op" => "pull").increment(1);
        warn!(error = %e, category_id, product_id, "Failed to unlink product from category");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<String>>,
        fail_pulls: bool,
    }

    #[async_trait]
    impl BacklinkStore for RecordingStore {
        async fn push_product(&self, category_id: &str, product_id: &str) -> anyhow::Result<()> {
            self.calls
                .lock()
                .await
                .push(format!("push {category_id} {product_id}"));
            Ok(())
        }

        async fn pull_product(&self, category_id: &str, product_id: &str) -> anyhow::Result<()> {
            self.calls
                .lock()
                .await
                .push(format!("pull {category_id} {product_id}"));
            if self.fail_pulls {
                anyhow::bail!("injected failure");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_events_applied_in_order() {
        let store = Arc::new(RecordingStore::default());
        let coordinator = ConsistencyCoordinator::start(store.clone());

        coordinator.submit(BacklinkEvent::Created {
            product_id: "p1".to_string(),
            category_id: "a".to_string(),
        });
        coordinator.submit(BacklinkEvent::Moved {
            product_id: "p1".to_string(),
            from: "a".to_string(),
            to: "b".to_string(),
        });
        coordinator.submit(BacklinkEvent::Deleted {
            product_id: "p1".to_string(),
            category_id: "b".to_string(),
        });
        coordinator.flush().await;

        let calls = store.calls.lock().await.clone();
        assert_eq!(calls, vec!["push a p1", "pull a p1", "push b p1", "pull b p1"]);
    }

    #[tokio::test]
    async fn test_failed_pull_does_not_block_push() {
        let store = Arc::new(RecordingStore {
            fail_pulls: true,
            ..Default::default()
        });
        let coordinator = ConsistencyCoordinator::start(store.clone());

        coordinator.submit(BacklinkEvent::Moved {
            product_id: "p1".to_string(),
            from: "a".to_string(),
            to: "b".to_string(),
        });
        coordinator.flush().await;

        let calls = store.calls.lock().await.clone();
        assert_eq!(calls, vec!["pull a p1", "push b p1"]);
    }
}
