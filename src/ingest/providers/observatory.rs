// src/ingest/providers/observatory.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;
use serde_json::Value;
use time::{macros::format_description, PrimitiveDateTime, UtcOffset};

use crate::config::FeedConfig;
use crate::error::{FeedError, Result};
use crate::event::{Event, EventSource};
use crate::ingest::normalize_location;
use crate::ingest::types::SourceAdapter;

const SOURCE: &str = "observatory";

#[derive(Debug, Deserialize)]
struct Record {
    earthquake_id: ProviderId,
    title: Option<String>,
    date: String,
    mag: f64,
    depth: f64,
    geojson: Geo,
}

#[derive(Debug, Deserialize)]
struct Geo {
    // [longitude, latitude]
    coordinates: Vec<f64>,
}

/// The feed has served both string and numeric identifiers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderId {
    Text(String),
    Number(i64),
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderId::Text(s) => f.write_str(s),
            ProviderId::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Parse the observatory's dotted `YYYY.MM.DD HH:mm:ss` wall-clock time,
/// interpreted at `offset`, into a UTC instant.
pub fn parse_observatory_date(s: &str, offset: UtcOffset) -> Option<DateTime<Utc>> {
    let format = format_description!("[year].[month].[day] [hour]:[minute]:[second]");
    let local = PrimitiveDateTime::parse(s.trim(), format).ok()?;
    let instant = local.assume_offset(offset);
    DateTime::<Utc>::from_timestamp(instant.unix_timestamp(), instant.nanosecond())
}

/// Map an observatory payload into canonical events.
///
/// A missing `result` array fails the whole payload; individual records that
/// do not parse are dropped and logged.
pub fn normalize_payload(body: Value, offset: UtcOffset) -> Result<Vec<Event>> {
    let items = match body {
        Value::Object(mut map) => match map.remove("result") {
            Some(Value::Array(items)) => items,
            _ => return Err(FeedError::ObservatoryUnavailable),
        },
        _ => return Err(FeedError::ObservatoryUnavailable),
    };

    let mut out = Vec::with_capacity(items.len());
    let mut dropped = 0usize;
    for item in items {
        let rec: Record = match serde_json::from_value(item) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(source = SOURCE, error = %e, "dropping malformed record");
                dropped += 1;
                continue;
            }
        };
        match normalize_record(rec, offset) {
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

fn normalize_record(rec: Record, offset: UtcOffset) -> Option<Event> {
    let Some(time) = parse_observatory_date(&rec.date, offset) else {
        tracing::warn!(source = SOURCE, date = %rec.date, "dropping record with unparsable date");
        return None;
    };
    let (longitude, latitude) = match rec.geojson.coordinates.as_slice() {
        [lon, lat, ..] => (*lon, *lat),
        _ => {
            tracing::warn!(source = SOURCE, id = %rec.earthquake_id, "dropping record without coordinates");
            return None;
        }
    };

    Some(Event {
        id: format!("{SOURCE}-{}-{}", time.timestamp_millis(), rec.earthquake_id),
        magnitude: rec.mag,
        depth: rec.depth,
        latitude,
        longitude,
        location: normalize_location(rec.title.as_deref()),
        time,
        source: EventSource::Observatory,
    })
}

fn classify(err: &reqwest::Error) -> FeedError {
    if err.is_timeout() {
        FeedError::ObservatoryTimeout
    } else if err.is_decode() {
        FeedError::ObservatoryUnavailable
    } else {
        FeedError::ObservatoryUnreachable
    }
}

fn classify_status(status: reqwest::StatusCode) -> Option<FeedError> {
    match status.as_u16() {
        429 => Some(FeedError::ObservatoryRateLimited),
        404 => Some(FeedError::ObservatoryUnavailable),
        _ if !status.is_success() => Some(FeedError::ObservatoryUnreachable),
        _ => None,
    }
}

/// Regional observatory live feed: a single GET, no parameters.
pub struct ObservatoryAdapter {
    client: reqwest::Client,
    url: String,
    offset: UtcOffset,
}

impl ObservatoryAdapter {
    pub fn new(client: reqwest::Client, url: impl Into<String>, utc_offset_hours: i32) -> Self {
        let offset = i8::try_from(utc_offset_hours)
            .ok()
            .and_then(|h| UtcOffset::from_hms(h, 0, 0).ok())
            .unwrap_or_else(|| {
                tracing::warn!(
                    source = SOURCE,
                    utc_offset_hours,
                    "region offset out of range, reading observatory dates as UTC"
                );
                UtcOffset::UTC
            });
        Self {
            client,
            url: url.into(),
            offset,
        }
    }

    pub fn from_config(client: reqwest::Client, cfg: &FeedConfig) -> Self {
        Self::new(client, cfg.observatory.url.clone(), cfg.region_utc_offset_hours)
    }

    async fn fetch_body(&self) -> Result<Value> {
        let resp = self.client.get(&self.url).send().await.map_err(|e| {
            tracing::warn!(source = SOURCE, error = %e, "provider http error");
            classify(&e)
        })?;

        if let Some(err) = classify_status(resp.status()) {
            tracing::warn!(source = SOURCE, status = %resp.status(), "provider returned error status");
            return Err(err);
        }

        resp.json::<Value>().await.map_err(|e| {
            tracing::warn!(source = SOURCE, error = %e, "provider body error");
            classify(&e)
        })
    }
}

#[async_trait]
impl SourceAdapter for ObservatoryAdapter {
    async fn fetch(&self) -> Result<Vec<Event>> {
        crate::ingest::ensure_metrics_described();
        let t0 = std::time::Instant::now();

        let result = match self.fetch_body().await {
            Ok(body) => normalize_payload(body, self.offset),
            Err(e) => Err(e),
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
