/// Gauge registry for the WAP report service.
///
/// Loads the list of rivers, their reaches/pools and gauges, the page each
/// gauge's level is read from, and the gauge's WAP threshold table from a
/// TOML file (`rivers.toml` by default). This is the single source of truth
/// for gauges: river order, and gauge order within a river, is the order of
/// the report rows.
///
/// Threshold strings are kept raw here and parsed once per polling cycle
/// when the batch is built (`GaugeConfig::thresholds`).

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::alert::thresholds::{parse_five_band, parse_three_band, RawFiveBand, RawThreeBand};
use crate::model::{RiverType, SchemaKind, ThresholdSet, WapError};

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "river")]
    rivers: Vec<RiverEntry>,
}

#[derive(Debug, Deserialize)]
struct RiverEntry {
    code: String,
    name: String,
    #[serde(default, rename = "gauge")]
    gauges: Vec<GaugeEntry>,
}

/// One gauge row as written in the file. Band keys from both schemas are
/// accepted here and checked against the river's schema during validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GaugeEntry {
    region: String,
    gauge: String,
    #[serde(default)]
    url: Option<String>,
    low_action: Option<String>,
    low_watch: Option<String>,
    normal: Option<String>,
    high_watch: Option<String>,
    high_action: Option<String>,
    watch: Option<String>,
    action: Option<String>,
}

// ---------------------------------------------------------------------------
// Registry types
// ---------------------------------------------------------------------------

/// Raw band strings in the shape of the gauge's river schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawBands {
    FiveBand(RawFiveBand),
    ThreeBand(RawThreeBand),
}

impl RawBands {
    fn has_any(&self) -> bool {
        let fields: Vec<&String> = match self {
            RawBands::FiveBand(b) => vec![&b.low_action, &b.low_watch, &b.normal, &b.high_watch, &b.high_action],
            RawBands::ThreeBand(b) => vec![&b.normal, &b.watch, &b.action],
        };
        fields.iter().any(|f| !f.trim().is_empty())
    }
}

/// Metadata for a single gauge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaugeConfig {
    /// Reach, pool or zone name the gauge is reported under.
    pub region: String,
    /// Gauge name, used as the gauge id in reports.
    pub gauge: String,
    /// Page carrying the gauge's `ObservedPrimary` value. Gauges without a
    /// page are always reported as "no data".
    pub url: Option<String>,
    pub bands: RawBands,
}

impl GaugeConfig {
    /// Parses the gauge's threshold strings. Malformed entries are logged
    /// and become absent bands.
    pub fn thresholds(&self) -> ThresholdSet {
        match &self.bands {
            RawBands::FiveBand(raw) => parse_five_band(&self.gauge, raw),
            RawBands::ThreeBand(raw) => parse_three_band(&self.gauge, raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiverConfig {
    pub river: RiverType,
    pub name: String,
    pub gauges: Vec<GaugeConfig>,
}

impl RiverConfig {
    /// Distinct region names in first-seen order.
    pub fn regions(&self) -> Vec<&str> {
        let mut regions: Vec<&str> = Vec::new();
        for gauge in &self.gauges {
            if !regions.contains(&gauge.region.as_str()) {
                regions.push(&gauge.region);
            }
        }
        regions
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    pub rivers: Vec<RiverConfig>,
}

impl Registry {
    pub fn river(&self, river: RiverType) -> Option<&RiverConfig> {
        self.rivers.iter().find(|r| r.river == river)
    }

    pub fn river_types(&self) -> Vec<RiverType> {
        self.rivers.iter().map(|r| r.river).collect()
    }

    pub fn gauge_count(&self) -> usize {
        self.rivers.iter().map(|r| r.gauges.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Reads and validates a registry file.
pub fn load_registry(path: impl AsRef<Path>) -> Result<Registry, WapError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        WapError::Config(format!("cannot read registry {}: {}", path.display(), e))
    })?;
    parse_registry(&text)
}

/// Parses and validates registry TOML.
pub fn parse_registry(text: &str) -> Result<Registry, WapError> {
    let file: RegistryFile =
        toml::from_str(text).map_err(|e| WapError::Config(format!("invalid registry: {}", e)))?;

    if file.rivers.is_empty() {
        return Err(WapError::Config("registry lists no rivers".to_string()));
    }

    let mut seen = HashSet::new();
    let mut rivers = Vec::with_capacity(file.rivers.len());
    for entry in file.rivers {
        let river = RiverType::from_code(&entry.code).ok_or_else(|| {
            WapError::Config(format!("unknown river code '{}'", entry.code))
        })?;
        if !seen.insert(river) {
            return Err(WapError::Config(format!("river '{}' is listed twice", entry.code)));
        }
        if entry.gauges.is_empty() {
            return Err(WapError::Config(format!("river '{}' has no gauges", entry.code)));
        }

        let gauges = entry
            .gauges
            .into_iter()
            .map(|g| validate_gauge(river, g))
            .collect::<Result<Vec<_>, _>>()?;

        rivers.push(RiverConfig {
            river,
            name: entry.name,
            gauges,
        });
    }

    Ok(Registry { rivers })
}

fn validate_gauge(river: RiverType, entry: GaugeEntry) -> Result<GaugeConfig, WapError> {
    let label = format!("{} gauge '{}'", river, entry.gauge);

    if entry.gauge.trim().is_empty() {
        return Err(WapError::Config(format!("{} gauge with empty name", river)));
    }
    if entry.region.trim().is_empty() {
        return Err(WapError::Config(format!("{} has no region", label)));
    }

    let bands = match river.schema() {
        SchemaKind::FiveBand => {
            if entry.watch.is_some() || entry.action.is_some() {
                return Err(WapError::Config(format!(
                    "{} uses three-band keys (watch/action) on a five-band river",
                    label
                )));
            }
            RawBands::FiveBand(RawFiveBand {
                low_action: entry.low_action.unwrap_or_default(),
                low_watch: entry.low_watch.unwrap_or_default(),
                normal: entry.normal.unwrap_or_default(),
                high_watch: entry.high_watch.unwrap_or_default(),
                high_action: entry.high_action.unwrap_or_default(),
            })
        }
        SchemaKind::ThreeBand => {
            let five_band_keys = [
                &entry.low_action,
                &entry.low_watch,
                &entry.high_watch,
                &entry.high_action,
            ];
            if five_band_keys.iter().any(|k| k.is_some()) {
                return Err(WapError::Config(format!(
                    "{} uses five-band keys (low_*/high_*) on a three-band river",
                    label
                )));
            }
            RawBands::ThreeBand(RawThreeBand {
                normal: entry.normal.unwrap_or_default(),
                watch: entry.watch.unwrap_or_default(),
                action: entry.action.unwrap_or_default(),
            })
        }
    };

    if !bands.has_any() {
        return Err(WapError::Config(format!("{} has no threshold bands", label)));
    }

    let url = entry.url.filter(|u| !u.trim().is_empty());

    Ok(GaugeConfig {
        region: entry.region,
        gauge: entry.gauge,
        url,
        bands,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
