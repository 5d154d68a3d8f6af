// tests/feed_store.rs
//
// Feed Store lifecycle: initial refresh, error surfacing from real HTTP
// adapters, and stale-fetch protection for overlapping refreshes.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{http::StatusCode, routing::get, Router};
use common::{event, utc, Counting};
use quake_feed::ingest::providers::{
    observatory::ObservatoryAdapter,
    survey::{SurveyAdapter, SurveyQuery},
};
use quake_feed::ingest::types::SourceAdapter;
use quake_feed::{Aggregator, Event, EventSource, FeedError, FeedStore, SourceMode};
use tokio::sync::Notify;

#[tokio::test]
async fn start_runs_initial_refresh_in_both_mode() {
    let obs = Counting::ok("observatory", vec![event("o", EventSource::Observatory, utc(10, 0, 0), 38.0, 27.0)]);
    let sur = Counting::ok("survey", vec![event("s", EventSource::Survey, utc(11, 0, 0), 40.0, 30.0)]);
    let store = FeedStore::start(Aggregator::new(obs.clone(), sur.clone()));

    let mut rx = store.subscribe();
    let snap = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| !s.loading))
        .await
        .expect("initial refresh finished")
        .expect("store alive")
        .clone();

    assert_eq!(snap.mode, SourceMode::Both);
    assert_eq!(snap.events.len(), 2);
    assert_eq!(snap.events[0].id, "s");
    assert_eq!(obs.calls(), 1);
    assert_eq!(sur.calls(), 1);
}

#[tokio::test]
async fn observatory_429_surfaces_rate_limit_text() {
    let app = Router::new().route(
        "/live",
        get(|| async { (StatusCode::TOO_MANY_REQUESTS, "") }),
    );
    let base = common::serve(app).await;
    let obs = Arc::new(ObservatoryAdapter::new(common::client(), format!("{base}/live"), 3));
    let sur = Counting::ok("survey", vec![]);
    let store = FeedStore::new(Aggregator::new(obs, sur));

    store.set_mode(SourceMode::Observatory).await;

    let snap = store.current_feed();
    assert!(!snap.loading);
    assert_eq!(
        snap.error.as_deref(),
        Some(FeedError::ObservatoryRateLimited.to_string().as_str())
    );
    assert_eq!(
        snap.error.as_deref(),
        Some("Too many requests were sent. Please wait a moment.")
    );
}

#[tokio::test]
async fn survey_network_failure_surfaces_generic_text() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let obs = Counting::ok("observatory", vec![]);
    let sur = Arc::new(SurveyAdapter::new(
        common::client(),
        format!("http://{addr}/query"),
        SurveyQuery::default(),
    ));
    let store = FeedStore::new(Aggregator::new(obs.clone(), sur));

    store.set_mode(SourceMode::Survey).await;

    let snap = store.current_feed();
    assert!(!snap.loading);
    assert_eq!(
        snap.error.as_deref(),
        Some("Survey earthquakes could not be retrieved.")
    );
    assert_eq!(obs.calls(), 0);
}

/// First fetch blocks until released; later fetches answer immediately.
struct Gated {
    calls: AtomicUsize,
    gate: Notify,
}

#[async_trait]
impl SourceAdapter for Gated {
    async fn fetch(&self) -> Result<Vec<Event>, FeedError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            self.gate.notified().await;
            return Ok(vec![event("old", EventSource::Observatory, utc(9, 0, 0), 38.0, 27.0)]);
        }
        Ok(vec![event("new", EventSource::Observatory, utc(10, 0, 0), 38.0, 27.0)])
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

#[tokio::test]
async fn slow_stale_refresh_does_not_overwrite_newer_result() {
    let gated = Arc::new(Gated {
        calls: AtomicUsize::new(0),
        gate: Notify::new(),
    });
    let sur = Counting::ok("survey", vec![]);
    let store = FeedStore::new(Aggregator::new(gated.clone(), sur));

    let bg = store.clone();
    let first = tokio::spawn(async move { bg.refresh().await });
    while gated.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    store.refresh().await;
    assert_eq!(store.current_feed().events[0].id, "new");

    gated.gate.notify_one();
    first.await.expect("first refresh task");

    let snap = store.current_feed();
    assert_eq!(snap.events.len(), 1);
    assert_eq!(snap.events[0].id, "new", "stale result must be discarded");
    assert!(!snap.loading);
}
