//! # Feed Store
//! Single owner of the aggregated feed. Every mutation publishes a whole new
//! [`FeedSnapshot`] on a `watch` channel; consumers read or subscribe.
//!
//! Overlapping refreshes are allowed. Each refresh takes a generation number
//! and only the newest generation may commit, so a slow fetch for an old mode
//! can never overwrite a newer result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use metrics::counter;
use tokio::sync::watch;

use crate::aggregate::Aggregator;
use crate::event::{Event, SourceMode};

/// Read-only view of the store at one point in time.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub events: Arc<[Event]>,
    pub loading: bool,
    pub error: Option<String>,
    pub mode: SourceMode,
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self {
            events: Arc::from(Vec::new()),
            loading: true,
            error: None,
            mode: SourceMode::Both,
        }
    }
}

pub struct FeedStore {
    aggregator: Aggregator,
    state: watch::Sender<FeedSnapshot>,
    generation: AtomicU64,
}

impl FeedStore {
    /// Create the store in its initial state (mode `Both`, empty, loading)
    /// without fetching.
    pub fn new(aggregator: Aggregator) -> Arc<Self> {
        let (state, _rx) = watch::channel(FeedSnapshot::default());
        Arc::new(Self {
            aggregator,
            state,
            generation: AtomicU64::new(0),
        })
    }

    /// Create the store and spawn the initial refresh. Requires a Tokio runtime.
    pub fn start(aggregator: Aggregator) -> Arc<Self> {
        let store = Self::new(aggregator);
        let bg = Arc::clone(&store);
        tokio::spawn(async move {
            bg.refresh().await;
        });
        store
    }

    pub fn current_feed(&self) -> FeedSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.state.subscribe()
    }

    /// Switch the source selection and re-fetch.
    pub async fn set_mode(&self, mode: SourceMode) {
        self.state.send_modify(|s| s.mode = mode);
        tracing::info!(mode = ?mode, "source mode changed");
        self.refresh().await;
    }

    /// Re-fetch with the current mode. Failures land in the snapshot's
    /// `error` field; the previous events stay in place.
    pub async fn refresh(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut mode = SourceMode::Both;
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
            mode = s.mode;
        });

        let result = self.aggregator.aggregate(mode).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, mode = ?mode, "discarding stale fetch result");
            counter!("feed_refresh_total", "outcome" => "stale").increment(1);
            return;
        }

        match result {
            Ok(events) => {
                tracing::info!(mode = ?mode, events = events.len(), "feed refreshed");
                counter!("feed_refresh_total", "outcome" => "ok").increment(1);
                let events: Arc<[Event]> = Arc::from(events);
                self.state.send_modify(|s| {
                    s.events = events;
                    s.loading = false;
                });
            }
            Err(e) => {
                tracing::warn!(mode = ?mode, error = %e, "feed refresh failed");
                counter!("feed_refresh_total", "outcome" => "error").increment(1);
                let message = e.to_string();
                self.state.send_modify(|s| {
                    s.error = Some(message);
                    s.loading = false;
                });
            }
        }
    }
}
