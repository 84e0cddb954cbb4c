//! WAP phase classification for a single gauge.
//!
//! Bands are evaluated in the order declared by `alert::schema`; the first
//! band whose comparison holds decides the phase. A gauge with no reading,
//! or whose reading matches no band, is `Phase::Neutral`.
//!
//! Raw registry strings are turned into `Threshold` values once, when a
//! batch is built (`parse_five_band` / `parse_three_band`). Entries that fail
//! to parse are logged and treated as absent, so they can neither raise nor
//! lower a gauge's phase.

use serde::{Deserialize, Serialize};

use crate::alert::schema::{bands_for_schema, Comparator};
use crate::logging::{self, Component};
use crate::model::{
    BandName, FiveBandThresholds, GaugeReading, Phase, ThreeBandThresholds, Threshold,
    ThresholdSet, WapError,
};

/// Result of classifying one reading: the phase and the band that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub phase: Phase,
    /// `None` when the phase is `Neutral`.
    pub band: Option<BandName>,
}

impl Classification {
    pub const NEUTRAL: Classification = Classification { phase: Phase::Neutral, band: None };
}

/// Returns the WAP phase for a reading.
pub fn classify(reading: &GaugeReading) -> Phase {
    classify_detailed(reading).phase
}

/// Returns the WAP phase for a reading together with the matching band.
pub fn classify_detailed(reading: &GaugeReading) -> Classification {
    let Some(value) = reading.value else {
        return Classification::NEUTRAL;
    };

    bands_for_schema(reading.thresholds.schema())
        .iter()
        .find(|spec| band_matches(spec.comparator, reading.thresholds.band(spec.band), value))
        .map(|spec| Classification { phase: spec.phase, band: Some(spec.band) })
        .unwrap_or(Classification::NEUTRAL)
}

/// Checks one band. Absent bands never match.
pub fn band_matches(comparator: Comparator, threshold: Threshold, value: f64) -> bool {
    match (comparator, threshold) {
        (_, Threshold::Absent) => false,
        (Comparator::AtOrBelow, t) => t.upper().is_some_and(|bound| value <= bound),
        (Comparator::AtOrAbove, t) => t.lower().is_some_and(|bound| value >= bound),
        (Comparator::WithinRange, Threshold::Range { low, high }) => low <= value && value <= high,
        (Comparator::WithinRange, Threshold::Scalar { value: exact }) => value == exact,
    }
}

// ---------------------------------------------------------------------------
// Threshold ingestion
// ---------------------------------------------------------------------------

/// Raw five-band registry strings, in registry column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFiveBand {
    #[serde(default)]
    pub low_action: String,
    #[serde(default)]
    pub low_watch: String,
    #[serde(default)]
    pub normal: String,
    #[serde(default)]
    pub high_watch: String,
    #[serde(default)]
    pub high_action: String,
}

/// Raw three-band registry strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawThreeBand {
    #[serde(default)]
    pub normal: String,
    #[serde(default)]
    pub watch: String,
    #[serde(default)]
    pub action: String,
}

/// Parses one band, logging and discarding malformed entries.
pub fn parse_band(gauge_id: &str, band: BandName, raw: &str) -> Threshold {
    match Threshold::parse(raw) {
        Ok(threshold) => threshold,
        Err(reason) => {
            let err = WapError::MalformedThreshold {
                band: band.to_string(),
                raw: raw.to_string(),
            };
            logging::warn(
                Component::Classify,
                Some(gauge_id),
                &format!("{} ({}); band skipped", err, reason),
            );
            Threshold::Absent
        }
    }
}

pub fn parse_five_band(gauge_id: &str, raw: &RawFiveBand) -> ThresholdSet {
    ThresholdSet::FiveBand(FiveBandThresholds {
        low_action: parse_band(gauge_id, BandName::LowAction, &raw.low_action),
        low_watch: parse_band(gauge_id, BandName::LowWatch, &raw.low_watch),
        normal: parse_band(gauge_id, BandName::Normal, &raw.normal),
        high_watch: parse_band(gauge_id, BandName::HighWatch, &raw.high_watch),
        high_action: parse_band(gauge_id, BandName::HighAction, &raw.high_action),
    })
}

pub fn parse_three_band(gauge_id: &str, raw: &RawThreeBand) -> ThresholdSet {
    ThresholdSet::ThreeBand(ThreeBandThresholds {
        normal: parse_band(gauge_id, BandName::Normal, &raw.normal),
        watch: parse_band(gauge_id, BandName::Watch, &raw.watch),
        action: parse_band(gauge_id, BandName::Action, &raw.action),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
