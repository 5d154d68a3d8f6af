// src/config/feed.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const ENV_BIND_ADDR: &str = "FEED_BIND_ADDR";

pub const DEFAULT_OBSERVATORY_URL: &str = "https://api.orhanaydogdu.com.tr/deprem/kandilli/live";
pub const DEFAULT_SURVEY_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}
fn default_region_offset() -> i32 {
    3
}
fn default_observatory_url() -> String {
    DEFAULT_OBSERVATORY_URL.to_string()
}
fn default_survey_url() -> String {
    DEFAULT_SURVEY_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Hours east of UTC for the monitored region. The observatory reports
    /// local wall-clock times in this offset; hourly stats bucket by it too.
    #[serde(default = "default_region_offset")]
    pub region_utc_offset_hours: i32,
    /// Unset means the HTTP client's own default (no timeout).
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub observatory: ObservatoryConfig,
    #[serde(default)]
    pub survey: SurveyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservatoryConfig {
    #[serde(default = "default_observatory_url")]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(default = "default_survey_url")]
    pub url: String,
    #[serde(default)]
    pub bbox: BoundingBox,
}

/// Geographic query box, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_latitude: 35.9025,
            max_latitude: 42.1025,
            min_longitude: 25.9,
            max_longitude: 44.9,
        }
    }
}

impl Default for ObservatoryConfig {
    fn default() -> Self {
        Self {
            url: default_observatory_url(),
        }
    }
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            url: default_survey_url(),
            bbox: BoundingBox::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            region_utc_offset_hours: default_region_offset(),
            request_timeout_secs: None,
            observatory: ObservatoryConfig::default(),
            survey: SurveyConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = match ext.as_str() {
            "json" => serde_json::from_str::<FeedConfig>(&content)
                .with_context(|| format!("parsing {}", path.display()))?,
            _ => toml::from_str::<FeedConfig>(&content)
                .with_context(|| format!("parsing {}", path.display()))?,
        };
        cfg.sanitized()
    }

    /// Load using env var + fallbacks:
    /// 1) $FEED_CONFIG_PATH
    /// 2) config/feed.toml
    /// 3) config/feed.json
    /// 4) built-in defaults
    ///
    /// `$FEED_BIND_ADDR` overrides `bind_addr` in every case.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let toml_p = PathBuf::from("config/feed.toml");
            let json_p = PathBuf::from("config/feed.json");
            if toml_p.exists() {
                Self::load_from(&toml_p)?
            } else if json_p.exists() {
                Self::load_from(&json_p)?
            } else {
                Self::default()
            }
        };

        if let Ok(addr) = std::env::var(ENV_BIND_ADDR) {
            if !addr.trim().is_empty() {
                cfg.bind_addr = addr.trim().to_string();
            }
        }
        Ok(cfg)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Region offset as a chrono offset (validated in `sanitized`).
    pub fn region_offset(&self) -> chrono::FixedOffset {
        use chrono::Offset;
        chrono::FixedOffset::east_opt(self.region_utc_offset_hours * 3600)
            .unwrap_or_else(|| chrono::Utc.fix())
    }

    fn sanitized(mut self) -> Result<Self> {
        if !(-12..=14).contains(&self.region_utc_offset_hours) {
            anyhow::bail!(
                "region_utc_offset_hours out of range: {}",
                self.region_utc_offset_hours
            );
        }
        let b = &mut self.survey.bbox;
        if b.min_latitude > b.max_latitude {
            // swap to keep a valid interval
            std::mem::swap(&mut b.min_latitude, &mut b.max_latitude);
        }
        if b.min_longitude > b.max_longitude {
            std::mem::swap(&mut b.min_longitude, &mut b.max_longitude);
        }
        if self.request_timeout_secs == Some(0) {
            self.request_timeout_secs = None;
        }
        Ok(self)
    }
}
