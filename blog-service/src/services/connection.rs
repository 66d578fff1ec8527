//! Lifecycle of the single store session shared by every request.
//!
//! [`ConnectionManager`] is a small state machine:
//!
//! ```text
//! Disconnected --connect()--> Connecting --ok--> Connected
//!      ^                          |                  |
//!      +--------- failure --------+----- close() ----+
//! ```
//!
//! A failed attempt schedules one background retry after the configured
//! delay; a failed retry schedules the next one, so recovery keeps going
//! until it succeeds or [`ConnectionManager::shutdown`] cancels it.
//! Concurrent callers of [`ConnectionManager::connect`] share a single
//! in-flight attempt.

use crate::services::metrics::record_connection_attempt;
use crate::services::store::{BlogStore, StoreConnector};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

type Attempt = Shared<BoxFuture<'static, bool>>;

struct Slot {
    state: ConnectionState,
    store: Option<Arc<dyn BlogStore>>,
}

struct Inner {
    connector: Arc<dyn StoreConnector>,
    retry_delay: Duration,
    slot: RwLock<Slot>,
    /// Bumped by every `close`, under the slot write lock.
    epoch: AtomicU64,
    in_flight: Mutex<Option<Attempt>>,
    retry_pending: AtomicBool,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

/// Owns the store session. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("retry_delay", &self.inner.retry_delay)
            .finish()
    }
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn StoreConnector>, retry_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector,
                retry_delay,
                slot: RwLock::new(Slot {
                    state: ConnectionState::Disconnected,
                    store: None,
                }),
                epoch: AtomicU64::new(0),
                in_flight: Mutex::new(None),
                retry_pending: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                tasks: TaskTracker::new(),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// The live session, or `None` unless connected.
    pub fn get_handle(&self) -> Option<Arc<dyn BlogStore>> {
        let slot = self.inner.slot.read().unwrap_or_else(PoisonError::into_inner);
        match slot.state {
            ConnectionState::Connected => slot.store.clone(),
            _ => None,
        }
    }

    /// Ensures a live session. Returns `true` when connected.
    ///
    /// Joins the attempt already in flight, if any. On failure a background
    /// retry is scheduled and `false` is returned without waiting for it.
    pub async fn connect(&self) -> bool {
        if self.is_connected() {
            return true;
        }
        self.attempt().await
    }

    fn attempt(&self) -> Attempt {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(attempt) = in_flight.as_ref() {
            tracing::debug!("Joining in-flight connection attempt");
            return attempt.clone();
        }
        let this = self.clone();
        let attempt = async move { this.establish().await }.boxed().shared();
        *in_flight = Some(attempt.clone());
        attempt
    }

    async fn establish(&self) -> bool {
        let epoch = {
            let mut slot = self.inner.slot.write().unwrap_or_else(PoisonError::into_inner);
            slot.state = ConnectionState::Connecting;
            self.inner.epoch.load(Ordering::SeqCst)
        };
        tracing::info!("Connecting to document store");

        let outcome = match self.inner.connector.connect().await {
            Ok(store) => match store.ping().await {
                Ok(()) => Ok(store),
                Err(e) => {
                    store.close().await;
                    Err(e)
                }
            },
            Err(e) => Err(e),
        };

        let connected = match outcome {
            Ok(store) => {
                let orphan = {
                    let mut slot =
                        self.inner.slot.write().unwrap_or_else(PoisonError::into_inner);
                    if self.inner.epoch.load(Ordering::SeqCst) == epoch {
                        slot.store = Some(store);
                        slot.state = ConnectionState::Connected;
                        None
                    } else {
                        Some(store)
                    }
                };
                match orphan {
                    None => {
                        tracing::info!("Successfully connected to document store");
                        record_connection_attempt(true);
                        true
                    }
                    Some(store) => {
                        tracing::info!("Closed while connecting, releasing new session");
                        store.close().await;
                        false
                    }
                }
            }
            Err(e) => {
                let closed = {
                    let mut slot =
                        self.inner.slot.write().unwrap_or_else(PoisonError::into_inner);
                    slot.store = None;
                    slot.state = ConnectionState::Disconnected;
                    self.inner.epoch.load(Ordering::SeqCst) != epoch
                };
                tracing::error!(error = %e, "Document store connection failed");
                record_connection_attempt(false);
                if !closed {
                    self.schedule_retry();
                }
                false
            }
        };

        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        connected
    }

    fn schedule_retry(&self) {
        if self.inner.cancel.is_cancelled() {
            tracing::debug!("Shutting down, not scheduling a reconnect");
            return;
        }
        if self.inner.retry_pending.swap(true, Ordering::SeqCst) {
            return;
        }

        let delay = self.inner.retry_delay;
        tracing::info!(delay_secs = delay.as_secs_f64(), "Retrying connection later");

        let this = self.clone();
        let cancel = self.inner.cancel.clone();
        self.inner.tasks.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    this.inner.retry_pending.store(false, Ordering::SeqCst);
                }
                _ = tokio::time::sleep(delay) => {
                    this.inner.retry_pending.store(false, Ordering::SeqCst);
                    if !this.connect().await {
                        tracing::warn!("Background reconnect failed");
                    }
                }
            }
        });
    }

    /// Closes the session if one is open. Idempotent.
    ///
    /// An attempt still in flight is superseded: its session is released
    /// instead of installed, and a failure does not schedule a retry.
    pub async fn close(&self) {
        let store = {
            let mut slot = self.inner.slot.write().unwrap_or_else(PoisonError::into_inner);
            self.inner.epoch.fetch_add(1, Ordering::SeqCst);
            slot.state = ConnectionState::Disconnected;
            slot.store.take()
        };
        if let Some(store) = store {
            store.close().await;
            tracing::info!("Document store connection closed");
        }
    }

    /// Cancels pending reconnects, waits for them to stop, then closes the
    /// session. No retry is scheduled afterwards.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.close().await;
    }
}
