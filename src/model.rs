/// Core data types for the WAP phase report service.
///
/// This module defines the shared domain model imported by all other modules:
/// readings, threshold bands, phases, region summaries and the service error
/// type. It contains no I/O; the only logic is threshold string parsing,
/// which happens once when a batch is ingested.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// River types
// ---------------------------------------------------------------------------

/// The rivers covered by the report, each bound to one threshold schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiverType {
    /// Illinois River (five-band thresholds).
    Ilr,
    /// Missouri River (five-band thresholds).
    Mor,
    /// Upper Mississippi River (three-band thresholds).
    Umr,
}

/// The two threshold table shapes used across the rivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    FiveBand,
    ThreeBand,
}

impl RiverType {
    pub const ALL: [RiverType; 3] = [RiverType::Ilr, RiverType::Umr, RiverType::Mor];

    /// Parses the short river code used in the registry and file names.
    pub fn from_code(code: &str) -> Option<RiverType> {
        match code.trim().to_ascii_lowercase().as_str() {
            "ilr" => Some(RiverType::Ilr),
            "mor" => Some(RiverType::Mor),
            "umr" => Some(RiverType::Umr),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RiverType::Ilr => "ilr",
            RiverType::Mor => "mor",
            RiverType::Umr => "umr",
        }
    }

    pub fn schema(&self) -> SchemaKind {
        match self {
            RiverType::Ilr | RiverType::Mor => SchemaKind::FiveBand,
            RiverType::Umr => SchemaKind::ThreeBand,
        }
    }
}

impl fmt::Display for RiverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code().to_uppercase())
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// WAP severity phase, totally ordered from least to most severe.
///
/// `Neutral` means no classification was possible: the gauge had no
/// reading, or the reading matched none of the configured bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[serde(rename = "none")]
    Neutral,
    Green,
    Yellow,
    Red,
}

impl Phase {
    /// Presentation color for renderers.
    pub fn color(&self) -> &'static str {
        match self {
            Phase::Neutral => "none",
            Phase::Green => "green",
            Phase::Yellow => "yellow",
            Phase::Red => "red",
        }
    }

    /// The WAP phase name printed in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Neutral => "No Data",
            Phase::Green => "Normal",
            Phase::Yellow => "Watch",
            Phase::Red => "Action",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Threshold types
// ---------------------------------------------------------------------------

/// One configured threshold band value.
///
/// Registry entries are either a scalar (`"30"`) or a `"low - high"` range
/// string. Empty entries and entries that fail to parse are `Absent` and are
/// skipped during classification; they are never read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Threshold {
    Scalar { value: f64 },
    Range { low: f64, high: f64 },
    Absent,
}

impl Threshold {
    /// Parses a raw registry string.
    ///
    /// `""` → `Absent`, `"30"` → `Scalar`, `"30 - 40"` → `Range`.
    /// Negative bounds are accepted (`"-2.5 - 3"`). An inverted range
    /// (`low > high`) is rejected.
    pub fn parse(raw: &str) -> Result<Threshold, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Threshold::Absent);
        }

        if let Some((low, high)) = split_range(trimmed) {
            let low = parse_bound(low)
                .ok_or_else(|| format!("range lower bound '{}' is not a number", low.trim()))?;
            let high = parse_bound(high)
                .ok_or_else(|| format!("range upper bound '{}' is not a number", high.trim()))?;
            if low > high {
                return Err(format!("range '{}' has lower bound above upper bound", trimmed));
            }
            return Ok(Threshold::Range { low, high });
        }

        parse_bound(trimmed)
            .map(|value| Threshold::Scalar { value })
            .ok_or_else(|| format!("'{}' is neither a number nor a 'low - high' range", trimmed))
    }

    /// Bound used for `≤` comparisons: the scalar itself or the range's upper bound.
    pub fn upper(&self) -> Option<f64> {
        match self {
            Threshold::Scalar { value } => Some(*value),
            Threshold::Range { high, .. } => Some(*high),
            Threshold::Absent => None,
        }
    }

    /// Bound used for `≥` comparisons: the scalar itself or the range's lower bound.
    pub fn lower(&self) -> Option<f64> {
        match self {
            Threshold::Scalar { value } => Some(*value),
            Threshold::Range { low, .. } => Some(*low),
            Threshold::Absent => None,
        }
    }
}

/// A finite stage value. `inf` and `NaN` are not stages.
fn parse_bound(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Splits `"low - high"` at the separating hyphen.
///
/// The separator is `" - "` in registry files; a bare hyphen between two
/// numbers (`"30-40"`) is also accepted. A leading minus sign belongs to the
/// lower bound, not the separator.
fn split_range(s: &str) -> Option<(&str, &str)> {
    if let Some(parts) = s.split_once(" - ") {
        return Some(parts);
    }
    let search_from = usize::from(s.starts_with('-'));
    s[search_from..]
        .find('-')
        .map(|i| i + search_from)
        .filter(|&i| !s[..i].ends_with(['e', 'E']))
        .map(|i| (&s[..i], &s[i + 1..]))
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Scalar { value } => write!(f, "{}", value),
            Threshold::Range { low, high } => write!(f, "{} - {}", low, high),
            Threshold::Absent => Ok(()),
        }
    }
}

/// Names of the bands across both schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandName {
    LowAction,
    LowWatch,
    Normal,
    HighWatch,
    HighAction,
    Watch,
    Action,
}

impl BandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            BandName::LowAction => "low_action",
            BandName::LowWatch => "low_watch",
            BandName::Normal => "normal",
            BandName::HighWatch => "high_watch",
            BandName::HighAction => "high_action",
            BandName::Watch => "watch",
            BandName::Action => "action",
        }
    }
}

impl fmt::Display for BandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Five-band table used by the Illinois and Missouri rivers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiveBandThresholds {
    pub low_action: Threshold,
    pub low_watch: Threshold,
    pub normal: Threshold,
    pub high_watch: Threshold,
    pub high_action: Threshold,
}

/// Three-band table used by the Upper Mississippi.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreeBandThresholds {
    pub normal: Threshold,
    pub watch: Threshold,
    pub action: Threshold,
}

/// A gauge's threshold table, in the shape its river type prescribes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum ThresholdSet {
    FiveBand(FiveBandThresholds),
    ThreeBand(ThreeBandThresholds),
}

impl ThresholdSet {
    pub fn schema(&self) -> SchemaKind {
        match self {
            ThresholdSet::FiveBand(_) => SchemaKind::FiveBand,
            ThresholdSet::ThreeBand(_) => SchemaKind::ThreeBand,
        }
    }

    /// Looks up a band by name. Bands that do not belong to this shape are `Absent`.
    pub fn band(&self, name: BandName) -> Threshold {
        match (self, name) {
            (ThresholdSet::FiveBand(t), BandName::LowAction) => t.low_action,
            (ThresholdSet::FiveBand(t), BandName::LowWatch) => t.low_watch,
            (ThresholdSet::FiveBand(t), BandName::Normal) => t.normal,
            (ThresholdSet::FiveBand(t), BandName::HighWatch) => t.high_watch,
            (ThresholdSet::FiveBand(t), BandName::HighAction) => t.high_action,
            (ThresholdSet::ThreeBand(t), BandName::Normal) => t.normal,
            (ThresholdSet::ThreeBand(t), BandName::Watch) => t.watch,
            (ThresholdSet::ThreeBand(t), BandName::Action) => t.action,
            _ => Threshold::Absent,
        }
    }
}

// ---------------------------------------------------------------------------
// Reading and summary types
// ---------------------------------------------------------------------------

/// One gauge's snapshot for a polling cycle. Built once per cycle and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeReading {
    pub gauge_id: String,
    /// Reach, pool or zone the gauge belongs to.
    pub region_id: String,
    /// Current water level in feet; `None` means "no data".
    pub value: Option<f64>,
    pub thresholds: ThresholdSet,
}

/// Worst-case phase of one contiguous block of same-region gauges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region_id: String,
    pub worst_phase: Phase,
    pub member_gauge_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by the service plumbing around the classifier.
///
/// The classifier and aggregator themselves never fail; they degrade to
/// `Phase::Neutral` or empty output instead.
#[derive(Debug, PartialEq)]
pub enum WapError {
    /// Non-2xx HTTP response from a gauge page.
    HttpError(u16),
    /// Transport-level failure after all retries.
    FetchFailed { url: String, reason: String },
    /// The page loaded but carried no `ObservedPrimary` value.
    NoObservedValue(String),
    /// A threshold entry could not be parsed.
    MalformedThreshold { band: String, raw: String },
    /// Invalid configuration or registry contents.
    Config(String),
    /// Report file or archive operation failed.
    Io(String),
}

impl fmt::Display for WapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WapError::HttpError(code) => write!(f, "HTTP error: {}", code),
            WapError::FetchFailed { url, reason } => {
                write!(f, "Request to {} failed: {}", url, reason)
            }
            WapError::NoObservedValue(url) => {
                write!(f, "No ObservedPrimary value found at {}", url)
            }
            WapError::MalformedThreshold { band, raw } => {
                write!(f, "Malformed threshold for {}: '{}'", band, raw)
            }
            WapError::Config(msg) => write!(f, "Configuration error: {}", msg),
            WapError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for WapError {}

impl From<std::io::Error> for WapError {
    fn from(e: std::io::Error) -> Self {
        WapError::Io(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_ordering_is_by_severity() {
        assert!(Phase::Neutral < Phase::Green);
        assert!(Phase::Green < Phase::Yellow);
        assert!(Phase::Yellow < Phase::Red);
        assert_eq!(
            [Phase::Yellow, Phase::Neutral, Phase::Red, Phase::Green].iter().max(),
            Some(&Phase::Red)
        );
    }

    #[test]
    fn test_phase_serializes_as_its_color() {
        for phase in [Phase::Neutral, Phase::Green, Phase::Yellow, Phase::Red] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{}\"", phase.color()));
            let back: Phase = serde_json::from_str(&json).unwrap();
            assert_eq!(back, phase);
        }
    }

    #[test]
    fn test_parse_empty_threshold_is_absent() {
        assert_eq!(Threshold::parse(""), Ok(Threshold::Absent));
        assert_eq!(Threshold::parse("   "), Ok(Threshold::Absent));
    }

    #[test]
    fn test_parse_scalar_threshold() {
        assert_eq!(Threshold::parse("30"), Ok(Threshold::Scalar { value: 30.0 }));
        assert_eq!(Threshold::parse(" 12.5 "), Ok(Threshold::Scalar { value: 12.5 }));
        assert_eq!(Threshold::parse("-1.2"), Ok(Threshold::Scalar { value: -1.2 }));
    }

    #[test]
    fn test_parse_range_threshold() {
        assert_eq!(
            Threshold::parse("30 - 40"),
            Ok(Threshold::Range { low: 30.0, high: 40.0 })
        );
        assert_eq!(
            Threshold::parse("30-40"),
            Ok(Threshold::Range { low: 30.0, high: 40.0 }),
            "a bare hyphen between two numbers is still a range"
        );
    }

    #[test]
    fn test_parse_range_with_negative_lower_bound() {
        assert_eq!(
            Threshold::parse("-2.5 - 3"),
            Ok(Threshold::Range { low: -2.5, high: 3.0 })
        );
        assert_eq!(
            Threshold::parse("-4--1"),
            Ok(Threshold::Range { low: -4.0, high: -1.0 })
        );
    }

    #[test]
    fn test_parse_inverted_range_is_rejected() {
        assert!(Threshold::parse("40 - 30").is_err());
    }

    #[test]
    fn test_parse_garbage_is_rejected() {
        assert!(Threshold::parse("n/a").is_err());
        assert!(Threshold::parse("30 - ").is_err());
        assert!(Threshold::parse("ten - 20").is_err());
    }

    #[test]
    fn test_parse_non_finite_values_are_rejected() {
        for raw in ["inf", "-inf", "Infinity", "NaN", "nan", "0 - NaN", "NaN - 5", "-inf - 3", "1 - inf"] {
            assert!(
                Threshold::parse(raw).is_err(),
                "'{}' should not parse as a stage threshold",
                raw
            );
        }
    }

    #[test]
    fn test_threshold_bounds() {
        let range = Threshold::Range { low: 30.0, high: 40.0 };
        assert_eq!(range.upper(), Some(40.0));
        assert_eq!(range.lower(), Some(30.0));
        assert_eq!(Threshold::Scalar { value: 7.0 }.upper(), Some(7.0));
        assert_eq!(Threshold::Absent.upper(), None);
    }

    #[test]
    fn test_threshold_display_matches_registry_encoding() {
        assert_eq!(Threshold::Range { low: 30.0, high: 40.5 }.to_string(), "30 - 40.5");
        assert_eq!(Threshold::Scalar { value: 12.0 }.to_string(), "12");
        assert_eq!(Threshold::Absent.to_string(), "");
    }

    #[test]
    fn test_band_lookup_outside_shape_is_absent() {
        let set = ThresholdSet::ThreeBand(ThreeBandThresholds {
            normal: Threshold::Scalar { value: 50.0 },
            watch: Threshold::Range { low: 60.0, high: 90.0 },
            action: Threshold::Scalar { value: 90.0 },
        });
        assert_eq!(set.band(BandName::LowAction), Threshold::Absent);
        assert_eq!(set.band(BandName::Normal), Threshold::Scalar { value: 50.0 });
    }

    #[test]
    fn test_river_codes_round_trip() {
        for river in RiverType::ALL {
            assert_eq!(RiverType::from_code(river.code()), Some(river));
        }
        assert_eq!(RiverType::from_code("UMR"), Some(RiverType::Umr));
        assert_eq!(RiverType::from_code("ohio"), None);
    }

    #[test]
    fn test_only_upper_mississippi_uses_three_bands() {
        assert_eq!(RiverType::Ilr.schema(), SchemaKind::FiveBand);
        assert_eq!(RiverType::Mor.schema(), SchemaKind::FiveBand);
        assert_eq!(RiverType::Umr.schema(), SchemaKind::ThreeBand);
    }
}
