//! # Feed Views
//! Pure projections over a feed snapshot for list and statistics consumers:
//! alternate sort orders, summary figures, magnitude buckets and the
//! hour-of-day distribution. No I/O.

use chrono::{FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

use crate::event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Time,
    Magnitude,
}

/// New vector in the requested order, largest first either way.
pub fn sorted(events: &[Event], order: SortOrder) -> Vec<Event> {
    let mut out = events.to_vec();
    match order {
        SortOrder::Time => out.sort_by(|a, b| b.time.cmp(&a.time)),
        SortOrder::Magnitude => out.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude)),
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FeedSummary {
    pub total: usize,
    pub average_magnitude: f64,
    pub max_magnitude: f64,
    pub average_depth: f64,
}

/// Zeros for an empty feed.
pub fn summarize(events: &[Event]) -> FeedSummary {
    if events.is_empty() {
        return FeedSummary::default();
    }
    let n = events.len() as f64;
    let (mag_sum, depth_sum, max_mag) = events.iter().fold(
        (0.0f64, 0.0f64, f64::NEG_INFINITY),
        |(m, d, mx), e| (m + e.magnitude, d + e.depth, mx.max(e.magnitude)),
    );
    FeedSummary {
        total: events.len(),
        average_magnitude: mag_sum / n,
        max_magnitude: max_mag,
        average_depth: depth_sum / n,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MagnitudeBucket {
    Below2,
    From2To3,
    From3To4,
    From4To5,
    Above5,
}

impl MagnitudeBucket {
    pub const ALL: [MagnitudeBucket; 5] = [
        MagnitudeBucket::Below2,
        MagnitudeBucket::From2To3,
        MagnitudeBucket::From3To4,
        MagnitudeBucket::From4To5,
        MagnitudeBucket::Above5,
    ];

    pub fn of(magnitude: f64) -> Self {
        if magnitude < 2.0 {
            MagnitudeBucket::Below2
        } else if magnitude < 3.0 {
            MagnitudeBucket::From2To3
        } else if magnitude < 4.0 {
            MagnitudeBucket::From3To4
        } else if magnitude < 5.0 {
            MagnitudeBucket::From4To5
        } else {
            MagnitudeBucket::Above5
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MagnitudeBucket::Below2 => "< 2.0",
            MagnitudeBucket::From2To3 => "2.0-2.9",
            MagnitudeBucket::From3To4 => "3.0-3.9",
            MagnitudeBucket::From4To5 => "4.0-4.9",
            MagnitudeBucket::Above5 => "≥ 5.0",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketCount {
    pub label: &'static str,
    pub count: usize,
}

/// Counts per bucket, always all five buckets in ascending order.
pub fn magnitude_histogram(events: &[Event]) -> Vec<BucketCount> {
    let mut counts = [0usize; 5];
    for e in events {
        let b = MagnitudeBucket::of(e.magnitude);
        if let Some(i) = MagnitudeBucket::ALL.iter().position(|x| *x == b) {
            counts[i] += 1;
        }
    }
    MagnitudeBucket::ALL
        .iter()
        .zip(counts)
        .map(|(b, count)| BucketCount {
            label: b.label(),
            count,
        })
        .collect()
}

/// Events per hour of day (0..24) as seen from `offset`.
pub fn hourly_distribution(events: &[Event], offset: FixedOffset) -> [usize; 24] {
    let mut hours = [0usize; 24];
    for e in events {
        let h = e.time.with_timezone(&offset).hour() as usize;
        hours[h] += 1;
    }
    hours
}
