// tests/common/mod.rs
//
// Shared helpers: a throwaway upstream server on 127.0.0.1:0 and
// in-memory adapters with call counters.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use quake_feed::ingest::types::SourceAdapter;
use quake_feed::{Event, EventSource, FeedError};

pub const OBSERVATORY_FIXTURE: &str = include_str!("../fixtures/observatory_live.json");
pub const SURVEY_FIXTURE: &str = include_str!("../fixtures/survey_query.geojson");

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test upstream");
    });
    format!("http://{addr}")
}

pub fn client() -> reqwest::Client {
    quake_feed::ingest::providers::build_client(None).expect("client")
}

pub fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 6, h, m, s).unwrap()
}

pub fn event(id: &str, source: EventSource, time: DateTime<Utc>, lat: f64, lon: f64) -> Event {
    Event {
        id: id.to_string(),
        magnitude: 3.0,
        depth: 10.0,
        latitude: lat,
        longitude: lon,
        location: "test".to_string(),
        time,
        source,
    }
}

/// In-memory adapter that counts how often it is asked to fetch.
pub struct Counting {
    name: &'static str,
    calls: AtomicUsize,
    answer: Mutex<Result<Vec<Event>, FeedError>>,
}

impl Counting {
    pub fn ok(name: &'static str, events: Vec<Event>) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: AtomicUsize::new(0),
            answer: Mutex::new(Ok(events)),
        })
    }

    pub fn failing(name: &'static str, err: FeedError) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: AtomicUsize::new(0),
            answer: Mutex::new(Err(err)),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for Counting {
    async fn fetch(&self) -> Result<Vec<Event>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.lock().unwrap().clone()
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
