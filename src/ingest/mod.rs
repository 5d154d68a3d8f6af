// src/ingest/mod.rs
pub mod providers;
pub mod types;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::event::UNKNOWN_LOCATION;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "feed_events_total",
            "Events normalized from provider payloads."
        );
        describe_counter!(
            "feed_dropped_records_total",
            "Provider records dropped because they could not be normalized."
        );
        describe_counter!(
            "feed_adapter_errors_total",
            "Provider fetch failures, by source."
        );
        describe_counter!(
            "feed_dedup_total",
            "Survey events removed as likely duplicates of observatory events."
        );
        describe_counter!("feed_refresh_total", "Feed refreshes, by outcome.");
        describe_histogram!("feed_fetch_ms", "Provider fetch + parse time in milliseconds.");
    });
}

/// Normalize provider location text: decode HTML entities, collapse whitespace, trim.
/// Empty or missing text becomes the placeholder.
pub fn normalize_location(raw: Option<&str>) -> String {
    let Some(s) = raw else {
        return UNKNOWN_LOCATION.to_string();
    };

    let decoded = html_escape::decode_html_entities(s);

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("static regex"));
    let out = re_ws.replace_all(&decoded, " ").trim().to_string();

    if out.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_location_collapses_ws_and_entities() {
        let out = normalize_location(Some("  AKDENIZ&nbsp;&nbsp;  (KIBRIS) \n"));
        assert_eq!(out, "AKDENIZ (KIBRIS)");
    }

    #[test]
    fn missing_or_blank_location_uses_placeholder() {
        assert_eq!(normalize_location(None), UNKNOWN_LOCATION);
        assert_eq!(normalize_location(Some("   ")), UNKNOWN_LOCATION);
    }
}
