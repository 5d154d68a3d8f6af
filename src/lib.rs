// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod ingest;
pub mod metrics;
pub mod stats;
pub mod store;

pub use crate::aggregate::Aggregator;
pub use crate::api::router;
pub use crate::error::FeedError;
pub use crate::event::{Event, EventSource, SourceMode};
pub use crate::store::{FeedSnapshot, FeedStore};

use std::sync::Arc;

use crate::config::FeedConfig;
use crate::ingest::providers::{build_client, observatory::ObservatoryAdapter, survey::SurveyAdapter};

/// Build the production aggregator (real HTTP adapters) from config.
pub fn aggregator_from_config(cfg: &FeedConfig) -> anyhow::Result<Aggregator> {
    let client = build_client(cfg.request_timeout())?;
    let observatory = ObservatoryAdapter::from_config(client.clone(), cfg);
    let survey = SurveyAdapter::from_config(client, cfg);
    Ok(Aggregator::new(Arc::new(observatory), Arc::new(survey)))
}
