// src/ingest/providers/survey.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;
use serde_json::Value;

use crate::config::feed::{BoundingBox, FeedConfig};
use crate::error::{FeedError, Result};
use crate::event::{Event, EventSource};
use crate::ingest::normalize_location;
use crate::ingest::types::SourceAdapter;

const SOURCE: &str = "survey";

/// Result cap sent with every request.
pub const RESULT_LIMIT: u32 = 150;
/// Minimum magnitude sent with every request, already in wire form.
pub const MIN_MAGNITUDE: &str = "1.0";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: String,
    properties: Properties,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Properties {
    mag: Option<f64>,
    place: Option<String>,
    /// Epoch milliseconds.
    time: i64,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    // [longitude, latitude, depth_km]
    coordinates: Vec<f64>,
}

/// Query sent with every survey request. Only the box varies; the result
/// cap and magnitude floor are fixed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyQuery {
    pub bbox: BoundingBox,
}

impl SurveyQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("format", "geojson".to_string()),
            ("limit", RESULT_LIMIT.to_string()),
            ("minlatitude", self.bbox.min_latitude.to_string()),
            ("maxlatitude", self.bbox.max_latitude.to_string()),
            ("minlongitude", self.bbox.min_longitude.to_string()),
            ("maxlongitude", self.bbox.max_longitude.to_string()),
            ("minmagnitude", MIN_MAGNITUDE.to_string()),
            ("orderby", "time".to_string()),
        ]
    }
}

/// Map a GeoJSON `FeatureCollection` into canonical events. Features that
/// cannot be normalized are dropped and logged.
pub fn normalize_payload(body: Value) -> Result<Vec<Event>> {
    let fc: FeatureCollection = serde_json::from_value(body).map_err(|e| {
        tracing::warn!(source = SOURCE, error = %e, "payload is not a feature collection");
        FeedError::SurveyUnavailable
    })?;

    let mut out = Vec::with_capacity(fc.features.len());
    let mut dropped = 0usize;
    for raw in fc.features {
        let feature: Feature = match serde_json::from_value(raw) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(source = SOURCE, error = %e, "dropping malformed feature");
                dropped += 1;
                continue;
            }
        };
        match normalize_feature(feature) {
            Some(ev) => out.push(ev),
            None => dropped += 1,
        }
    }

    counter!("feed_events_total", "source" => SOURCE).increment(out.len() as u64);
    if dropped > 0 {
        counter!("feed_dropped_records_total", "source" => SOURCE).increment(dropped as u64);
    }
    Ok(out)
}

fn normalize_feature(f: Feature) -> Option<Event> {
    let Some(magnitude) = f.properties.mag else {
        tracing::warn!(source = SOURCE, id = %f.id, "dropping feature without magnitude");
        return None;
    };
    let Some(time) = DateTime::<Utc>::from_timestamp_millis(f.properties.time) else {
        tracing::warn!(source = SOURCE, id = %f.id, time = f.properties.time, "dropping feature with out-of-range time");
        return None;
    };
    let &[longitude, latitude, depth, ..] = f.geometry.coordinates.as_slice() else {
        tracing::warn!(source = SOURCE, id = %f.id, "dropping feature with short coordinates");
        return None;
    };

    Some(Event {
        id: format!("{SOURCE}-{}", f.id),
        magnitude,
        depth,
        latitude,
        longitude,
        location: normalize_location(f.properties.place.as_deref()),
        time,
        source: EventSource::Survey,
    })
}

/// Global survey event query API.
pub struct SurveyAdapter {
    client: reqwest::Client,
    url: String,
    query: SurveyQuery,
}

impl SurveyAdapter {
    pub fn new(client: reqwest::Client, url: impl Into<String>, query: SurveyQuery) -> Self {
        Self {
            client,
            url: url.into(),
            query,
        }
    }

    pub fn from_config(client: reqwest::Client, cfg: &FeedConfig) -> Self {
        let query = SurveyQuery {
            bbox: cfg.survey.bbox,
        };
        Self::new(client, cfg.survey.url.clone(), query)
    }

    async fn fetch_body(&self) -> std::result::Result<Value, reqwest::Error> {
        self.client
            .get(&self.url)
            .query(&self.query.params())
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }
}

#[async_trait]
impl SourceAdapter for SurveyAdapter {
    async fn fetch(&self) -> Result<Vec<Event>> {
        crate::ingest::ensure_metrics_described();
        let t0 = std::time::Instant::now();

        // One generic error for every transport failure.
        let result = match self.fetch_body().await {
            Ok(body) => normalize_payload(body),
            Err(e) => {
                tracing::warn!(source = SOURCE, error = %e, "provider http error");
                Err(FeedError::SurveyUnavailable)
            }
        };

        histogram!("feed_fetch_ms", "source" => SOURCE).record(t0.elapsed().as_secs_f64() * 1_000.0);
        match &result {
            Ok(events) => tracing::debug!(source = SOURCE, kept = events.len(), "fetched"),
            Err(_) => counter!("feed_adapter_errors_total", "source" => SOURCE).increment(1),
        }
        result
    }

    fn name(&self) -> &'static str {
        SOURCE
    }
}
