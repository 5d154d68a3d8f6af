use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::FixedOffset;
use tower_http::cors::CorsLayer;

use crate::event::{Event, SourceMode};
use crate::stats::{self, BucketCount, FeedSummary, SortOrder};
use crate::store::{FeedSnapshot, FeedStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FeedStore>,
    /// Offset used for the hour-of-day distribution.
    pub region_offset: FixedOffset,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/feed", get(get_feed))
        .route("/feed/refresh", post(refresh_feed))
        .route("/feed/mode", put(set_mode))
        .route("/feed/stats", get(feed_stats))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct FeedQuery {
    #[serde(default)]
    sort: SortOrder,
}

#[derive(serde::Deserialize)]
struct ModeReq {
    mode: SourceMode,
}

#[derive(serde::Serialize)]
struct FeedOut {
    events: Vec<Event>,
    loading: bool,
    error: Option<String>,
    mode: SourceMode,
}

impl FeedOut {
    fn from_snapshot(s: FeedSnapshot, order: SortOrder) -> Self {
        // store order is already newest-first
        let events = match order {
            SortOrder::Time => s.events.to_vec(),
            SortOrder::Magnitude => stats::sorted(&s.events, order),
        };
        Self {
            events,
            loading: s.loading,
            error: s.error,
            mode: s.mode,
        }
    }
}

#[derive(serde::Serialize)]
struct StatsOut {
    summary: FeedSummary,
    magnitudes: Vec<BucketCount>,
    hourly: [usize; 24],
    loading: bool,
    mode: SourceMode,
}

async fn get_feed(State(state): State<AppState>, Query(q): Query<FeedQuery>) -> Json<FeedOut> {
    Json(FeedOut::from_snapshot(state.store.current_feed(), q.sort))
}

async fn refresh_feed(State(state): State<AppState>, Query(q): Query<FeedQuery>) -> Json<FeedOut> {
    state.store.refresh().await;
    Json(FeedOut::from_snapshot(state.store.current_feed(), q.sort))
}

async fn set_mode(State(state): State<AppState>, Json(body): Json<ModeReq>) -> Json<FeedOut> {
    state.store.set_mode(body.mode).await;
    Json(FeedOut::from_snapshot(
        state.store.current_feed(),
        SortOrder::Time,
    ))
}

async fn feed_stats(State(state): State<AppState>) -> Json<StatsOut> {
    let s = state.store.current_feed();
    Json(StatsOut {
        summary: stats::summarize(&s.events),
        magnitudes: stats::magnitude_histogram(&s.events),
        hourly: stats::hourly_distribution(&s.events, state.region_offset),
        loading: s.loading,
        mode: s.mode,
    })
}
