//! # Aggregator
//! Queries the adapters a [`SourceMode`] selects, drops survey events that
//! duplicate observatory reports, and returns one feed sorted newest-first.
//!
//! Duplicate detection is a heuristic: two reports match when they are less
//! than five minutes apart and less than 0.1 degrees apart in planar
//! degree-space. The planar metric is not geodesic; the threshold was tuned
//! against it, so it stays planar.

use std::sync::Arc;

use metrics::counter;

use crate::error::{FeedError, Result};
use crate::event::{Event, SourceMode};
use crate::ingest::types::SourceAdapter;

/// Strict upper bound on the time gap between duplicate reports.
pub const DUPLICATE_WINDOW_MS: i64 = 5 * 60 * 1000;
/// Strict upper bound on the degree-space distance between duplicate reports.
pub const DUPLICATE_DISTANCE_DEG: f64 = 0.1;

/// `true` when `candidate` is probably the same earthquake as `reference`.
pub fn is_likely_duplicate(candidate: &Event, reference: &Event) -> bool {
    let dt = (candidate.time - reference.time).num_milliseconds().abs();
    if dt >= DUPLICATE_WINDOW_MS {
        return false;
    }
    let dlat = candidate.latitude - reference.latitude;
    let dlon = candidate.longitude - reference.longitude;
    (dlat * dlat + dlon * dlon).sqrt() < DUPLICATE_DISTANCE_DEG
}

/// Pure merge step: dedup (only in `Both` mode), concatenate observatory
/// first, then sort descending by time.
pub fn merge(mode: SourceMode, observatory: Vec<Event>, survey: Vec<Event>) -> Vec<Event> {
    let mut combined = observatory;

    let before = survey.len();
    let survivors: Vec<Event> = if mode == SourceMode::Both {
        survey
            .into_iter()
            .filter(|s| !combined.iter().any(|o| is_likely_duplicate(s, o)))
            .collect()
    } else {
        survey
    };

    let deduped = before - survivors.len();
    if deduped > 0 {
        tracing::debug!(deduped, "dropped likely-duplicate survey events");
        counter!("feed_dedup_total").increment(deduped as u64);
    }

    combined.extend(survivors);
    combined.sort_by(|a, b| b.time.cmp(&a.time));
    combined
}

/// Owns one adapter per upstream source.
#[derive(Clone)]
pub struct Aggregator {
    observatory: Arc<dyn SourceAdapter>,
    survey: Arc<dyn SourceAdapter>,
}

impl Aggregator {
    pub fn new(observatory: Arc<dyn SourceAdapter>, survey: Arc<dyn SourceAdapter>) -> Self {
        Self {
            observatory,
            survey,
        }
    }

    /// Fetch, dedup and sort. An observatory failure is returned as soon as
    /// it happens; a survey failure after the observatory succeeded. There
    /// are no partial results.
    pub async fn aggregate(&self, mode: SourceMode) -> Result<Vec<Event>> {
        let (observatory, survey) = match mode {
            SourceMode::Observatory => (self.observatory.fetch().await?, Vec::new()),
            SourceMode::Survey => (Vec::new(), self.survey.fetch().await?),
            SourceMode::Both => {
                // Survey runs alongside; an observatory failure cancels it.
                let survey = Arc::clone(&self.survey);
                let pending = tokio::spawn(async move { survey.fetch().await });
                let observatory = match self.observatory.fetch().await {
                    Ok(events) => events,
                    Err(e) => {
                        pending.abort();
                        return Err(e);
                    }
                };
                let survey = pending.await.map_err(|e| {
                    tracing::warn!(error = %e, "survey fetch task failed");
                    FeedError::SurveyUnavailable
                })??;
                (observatory, survey)
            }
        };

        tracing::debug!(
            mode = ?mode,
            observatory = observatory.len(),
            survey = survey.len(),
            "aggregating"
        );
        Ok(merge(mode, observatory, survey))
    }
}
