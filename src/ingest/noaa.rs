/// NWS gauge page client
///
/// Reads the current observed stage for each gauge from its National Water
/// Prediction Service gauge page, which embeds the latest observation as
/// `"ObservedPrimary":<number>` in the page source, and turns a river's
/// registry entries into a `GaugeReading` batch.
///
/// Gauge pages: https://water.noaa.gov/gauges/<lid>

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use crate::logging::{self, Component};
use crate::model::{GaugeReading, WapError};
use crate::stations::RiverConfig;

const OBSERVED_MARKER: &str = "\"ObservedPrimary\":";

/// HTTP statuses worth retrying; anything else is returned immediately.
const RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Base delay between attempts, multiplied by the attempt number.
const BACKOFF_STEP_MS: u64 = 100;

// ============================================================================
// Fetch Settings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Per-request timeout
    pub timeout: Duration,
    /// Additional attempts after the first on 5xx or transport errors
    pub max_retries: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }
}

/// Build the blocking client shared by one river worker
pub fn build_client(settings: &FetchSettings) -> Result<reqwest::blocking::Client, WapError> {
    reqwest::blocking::Client::builder()
        .timeout(settings.timeout)
        .build()
        .map_err(|e| WapError::Config(format!("cannot build HTTP client: {}", e)))
}

// ============================================================================
// Page Parsing
// ============================================================================

/// Extract the first `"ObservedPrimary":<number>` value from a gauge page.
///
/// Accepts an optional minus sign and an optional fractional part.
/// Returns `None` if the marker is missing or not followed by a number
/// (pages show `null` while a sensor is offline).
pub fn extract_observed_primary(body: &str) -> Option<f64> {
    let start = body.find(OBSERVED_MARKER)? + OBSERVED_MARKER.len();
    let rest = body[start..].trim_start();

    let end = rest
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());

    rest[..end].parse().ok()
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Fetch the current observed level from a gauge page.
///
/// Retries transport errors and 500/502/503/504 responses up to
/// `max_retries` times with a linear backoff.
pub fn fetch_observed_level(
    client: &reqwest::blocking::Client,
    url: &str,
    max_retries: u32,
) -> Result<f64, WapError> {
    let mut attempt = 0;
    loop {
        match fetch_once(client, url) {
            Err(err) if attempt < max_retries && is_retryable(&err) => {
                attempt += 1;
                logging::debug(
                    Component::Fetch,
                    None,
                    &format!("retry {}/{} for {}: {}", attempt, max_retries, url, err),
                );
                thread::sleep(Duration::from_millis(BACKOFF_STEP_MS * u64::from(attempt)));
            }
            result => return result,
        }
    }
}

fn fetch_once(client: &reqwest::blocking::Client, url: &str) -> Result<f64, WapError> {
    let response = client
        .get(url)
        .header("Accept", "text/html")
        .send()
        .map_err(|e| WapError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(WapError::HttpError(response.status().as_u16()));
    }

    let body = response.text().map_err(|e| WapError::FetchFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    extract_observed_primary(&body).ok_or_else(|| WapError::NoObservedValue(url.to_string()))
}

fn is_retryable(err: &WapError) -> bool {
    match err {
        WapError::HttpError(code) => RETRY_STATUSES.contains(code),
        WapError::FetchFailed { .. } => true,
        _ => false,
    }
}

// ============================================================================
// Batch Building
// ============================================================================

/// Counters for one river's fetch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub gauges: usize,
    pub with_data: usize,
    pub requests: usize,
    pub cache_hits: usize,
    pub missing_urls: usize,
}

/// Build a river's batch using `fetch` to read each gauge page.
///
/// Gauges are visited in registry order. Each distinct URL is fetched at
/// most once per river; gauges sharing a page (the same gauge listed under
/// two reaches) reuse the first result, failures included.
pub fn build_batch<F>(river: &RiverConfig, mut fetch: F) -> (Vec<GaugeReading>, FetchStats)
where
    F: FnMut(&str) -> Result<f64, WapError>,
{
    let mut cache: HashMap<&str, Option<f64>> = HashMap::new();
    let mut stats = FetchStats {
        gauges: river.gauges.len(),
        ..FetchStats::default()
    };
    let mut readings = Vec::with_capacity(river.gauges.len());

    for gauge in &river.gauges {
        let value = match gauge.url.as_deref() {
            None => {
                stats.missing_urls += 1;
                logging::warn(Component::Fetch, Some(&gauge.gauge), "no URL configured; reporting no data");
                None
            }
            Some(url) => {
                if let Some(cached) = cache.get(url) {
                    stats.cache_hits += 1;
                    *cached
                } else {
                    stats.requests += 1;
                    let value = match fetch(url) {
                        Ok(level) => Some(level),
                        Err(err) => {
                            logging::log_fetch_failure(&gauge.gauge, "read observed level", &err);
                            None
                        }
                    };
                    cache.insert(url, value);
                    value
                }
            }
        };

        if value.is_some() {
            stats.with_data += 1;
        }

        readings.push(GaugeReading {
            gauge_id: gauge.gauge.clone(),
            region_id: gauge.region.clone(),
            value,
            thresholds: gauge.thresholds(),
        });
    }

    (readings, stats)
}

/// Fetch every gauge of a river over HTTP and build its batch.
pub fn fetch_river_batch(
    client: &reqwest::blocking::Client,
    river: &RiverConfig,
    settings: &FetchSettings,
) -> Vec<GaugeReading> {
    let (readings, stats) = build_batch(river, |url| {
        fetch_observed_level(client, url, settings.max_retries)
    });

    logging::info(
        Component::Fetch,
        None,
        &format!(
            "{}: {} requests, {} cache hits",
            river.river, stats.requests, stats.cache_hits
        ),
    );
    if stats.missing_urls > 0 {
        logging::warn(
            Component::Fetch,
            None,
            &format!("{}: {} gauges have no URL", river.river, stats.missing_urls),
        );
    }
    logging::log_fetch_summary(
        &river.river.to_string(),
        stats.gauges,
        stats.with_data,
        stats.gauges - stats.with_data,
    );

    readings
}

// ============================================================================
// Tests
// ============================================================================
