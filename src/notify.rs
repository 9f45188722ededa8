//! Toast notifications as an injected service. Created once in `main`,
//! cloned into whatever needs to raise or read notifications, and cleared
//! on shutdown.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub created_at: DateTime<Utc>,
}

struct Inner {
    toasts: RwLock<Vec<Toast>>,
    counter: AtomicU64,
    changes: broadcast::Sender<Vec<Toast>>,
    default_ttl: Duration,
}

#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Notifier {
    pub fn new(default_ttl: Duration) -> Self {
        let (changes, _) = broadcast::channel(32);
        Self {
            inner: Arc::new(Inner { toasts: RwLock::new(Vec::new()), counter: AtomicU64::new(0), changes, default_ttl }),
        }
    }

    /// Adds a toast. `ttl` of `None` uses the default, zero keeps it until
    /// dismissed. Expiry needs a tokio runtime; without one toasts stay.
    pub fn show(&self, message: impl Into<String>, kind: ToastKind, ttl: Option<Duration>) -> u64 {
        let id = self.inner.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let toast = Toast { id, message: message.into(), kind, created_at: Utc::now() };
        debug!(id, kind = ?kind, message = %toast.message, "toast shown");
        self.mutate(|toasts| toasts.push(toast));

        let ttl = ttl.unwrap_or(self.inner.default_ttl);
        if !ttl.is_zero() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let notifier = self.clone();
                handle.spawn(async move {
                    tokio::time::sleep(ttl).await;
                    notifier.dismiss(id);
                });
            }
        }
        id
    }

    pub fn dismiss(&self, id: u64) -> bool {
        let mut removed = false;
        self.mutate(|toasts| {
            let before = toasts.len();
            toasts.retain(|t| t.id != id);
            removed = toasts.len() != before;
        });
        removed
    }

    pub fn dismiss_oldest(&self) {
        self.mutate(|toasts| {
            if !toasts.is_empty() {
                toasts.remove(0);
            }
        });
    }

    pub fn clear(&self) {
        self.mutate(Vec::clear);
    }

    pub fn snapshot(&self) -> Vec<Toast> {
        self.inner.toasts.read().clone()
    }

    /// Every change is broadcast as a full snapshot.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<Toast>> {
        self.inner.changes.subscribe()
    }

    pub fn shutdown(&self) {
        self.clear();
        debug!("notifier shut down");
    }

    fn mutate(&self, change: impl FnOnce(&mut Vec<Toast>)) {
        let snapshot = {
            let mut toasts = self.inner.toasts.write();
            change(&mut toasts);
            toasts.clone()
        };
        // No subscribers is fine.
        let _ = self.inner.changes.send(snapshot);
    }
}
