// src/ingest/types.rs
use crate::error::Result;
use crate::event::Event;

/// One upstream provider mapped into the canonical schema.
/// A single failed network call fails the whole fetch; no retry, no caching.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Event>>;
    fn name(&self) -> &'static str;
}
