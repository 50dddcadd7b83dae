//! Polling state machine for one title view.
//!
//! ```text
//! idle -> submitted -> polling -> settled
//! ```
//!
//! The poller owns its timer through a [`CancellationToken`] so stopping
//! is a first-class operation -- navigating away from a title can never
//! leak a timer. A tick that fires while the previous status request is
//! still in flight is skipped, never queued.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use atelier_core::generation::DEFAULT_POLL_INTERVAL;
use atelier_core::types::DbId;
use atelier_db::models::generation::{GenerateResponse, PaintingView, StatusResponse};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, ClientError};

/// Lifecycle of one title-view polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Nothing submitted yet.
    Idle,
    /// Placeholders rendered; polling not yet started.
    Submitted,
    /// Timer running.
    Polling,
    /// Every painting terminal, or auth definitively failed.
    Settled,
}

/// Where status responses come from. Abstracted so poller tests run
/// against a scripted stub instead of an HTTP server.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, title_id: DbId) -> Result<StatusResponse, ClientError>;
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch(&self, title_id: DbId) -> Result<StatusResponse, ClientError> {
        self.status(title_id).await
    }
}

/// Receives incremental updates. Implemented by whatever renders the
/// title view; only changed paintings are delivered.
pub trait StatusSink: Send + Sync {
    /// Paintings whose state differs from the previous snapshot, plus
    /// the current reference payload map.
    fn apply(&self, changed: Vec<PaintingView>, references: &BTreeMap<DbId, String>);

    /// Every painting reached a terminal status.
    fn settled(&self) {}

    /// The server rejected our credentials; polling stopped.
    fn auth_failed(&self) {}
}

/// Polling session for one title.
pub struct TitlePoller<S: StatusSource + 'static> {
    source: Arc<S>,
    title_id: DbId,
    interval: Duration,
    state: Mutex<PollState>,
    snapshot: Mutex<HashMap<DbId, PaintingView>>,
    cancel: Mutex<CancellationToken>,
    timer_active: AtomicBool,
}

impl<S: StatusSource + 'static> TitlePoller<S> {
    pub fn new(source: Arc<S>, title_id: DbId) -> Arc<Self> {
        Self::with_interval(source, title_id, DEFAULT_POLL_INTERVAL)
    }

    /// Build with a non-default poll interval.
    pub fn with_interval(source: Arc<S>, title_id: DbId, interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            source,
            title_id,
            interval,
            state: Mutex::new(PollState::Idle),
            snapshot: Mutex::new(HashMap::new()),
            cancel: Mutex::new(CancellationToken::new()),
            timer_active: AtomicBool::new(false),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PollState {
        *self.state.lock().expect("poller state lock poisoned")
    }

    /// Whether a poll timer is currently running.
    pub fn timer_active(&self) -> bool {
        self.timer_active.load(Ordering::SeqCst)
    }

    /// Record a submission: render the placeholders immediately and
    /// start polling.
    pub fn submitted(self: &Arc<Self>, response: &GenerateResponse, sink: Arc<dyn StatusSink>) {
        {
            let mut state = self.state.lock().expect("poller state lock poisoned");
            *state = PollState::Submitted;
        }
        let changed = self.diff(response.paintings.clone());
        if !changed.is_empty() {
            sink.apply(changed, &BTreeMap::new());
        }
        self.spawn_timer(sink);
    }

    /// Liveness safeguard: restart polling after the timer was torn down
    /// (page hidden, throttled, or explicitly stopped) while work is
    /// still outstanding. A no-op when settled, never submitted, or a
    /// timer is already running.
    pub fn resume(self: &Arc<Self>, sink: Arc<dyn StatusSink>) -> bool {
        match self.state() {
            PollState::Submitted | PollState::Polling => {}
            PollState::Idle | PollState::Settled => return false,
        }
        if self.timer_active() {
            return false;
        }
        // The previous token may have been cancelled by `stop`.
        {
            let mut cancel = self.cancel.lock().expect("poller cancel lock poisoned");
            if cancel.is_cancelled() {
                *cancel = CancellationToken::new();
            }
        }
        self.spawn_timer(sink);
        true
    }

    /// Stop the poll timer immediately. Safe to call repeatedly and from
    /// any state; used on navigation, title deletion, and logout.
    pub fn stop(&self) {
        self.cancel
            .lock()
            .expect("poller cancel lock poisoned")
            .cancel();
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn spawn_timer(self: &Arc<Self>, sink: Arc<dyn StatusSink>) {
        if self.timer_active.swap(true, Ordering::SeqCst) {
            // At most one timer per title view.
            return;
        }
        {
            let mut state = self.state.lock().expect("poller state lock poisoned");
            *state = PollState::Polling;
        }

        let this = Arc::clone(self);
        let cancel = this
            .cancel
            .lock()
            .expect("poller cancel lock poisoned")
            .clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.interval);
            // Coalesce: a tick that would fire while a request is in
            // flight is dropped, not queued.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // interval fires immediately; skip the zeroth tick so the
            // first poll happens one interval after submission.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!(title_id = this.title_id, "Polling cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        if this.poll_once(&sink).await {
                            break;
                        }
                    }
                }
            }
            this.timer_active.store(false, Ordering::SeqCst);
        });
    }

    /// One poll cycle. Returns `true` when polling should end.
    async fn poll_once(&self, sink: &Arc<dyn StatusSink>) -> bool {
        let response = match self.source.fetch(self.title_id).await {
            Ok(response) => response,
            Err(ClientError::Auth(status)) => {
                tracing::warn!(
                    title_id = self.title_id,
                    status,
                    "Authentication rejected; polling stopped",
                );
                *self.state.lock().expect("poller state lock poisoned") = PollState::Settled;
                sink.auth_failed();
                return true;
            }
            Err(e) => {
                // Transient; keep the timer running.
                tracing::warn!(title_id = self.title_id, error = %e, "Status poll failed");
                return false;
            }
        };

        let all_terminal = !response.paintings.is_empty()
            && response.paintings.iter().all(|p| p.status.is_terminal());

        let changed = self.diff(response.paintings);
        if !changed.is_empty() {
            sink.apply(changed, &response.reference_data_map);
        }

        if all_terminal {
            *self.state.lock().expect("poller state lock poisoned") = PollState::Settled;
            sink.settled();
            return true;
        }
        false
    }

    /// Merge a response into the snapshot; return only the paintings
    /// that differ from what was last rendered.
    fn diff(&self, paintings: Vec<PaintingView>) -> Vec<PaintingView> {
        let mut snapshot = self.snapshot.lock().expect("poller snapshot lock poisoned");
        let mut changed = Vec::new();
        for view in paintings {
            match snapshot.get(&view.id) {
                Some(previous) if *previous == view => {}
                _ => {
                    snapshot.insert(view.id, view.clone());
                    changed.push(view);
                }
            }
        }
        changed
    }
}
