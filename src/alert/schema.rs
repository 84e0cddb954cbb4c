//! Threshold schemas per river type.
//!
//! Declares, for each schema shape, the bands that exist, the phase each
//! band assigns, and how a reading is compared against it. The order of the
//! tables is the evaluation order: the classifier stops at the first band
//! that matches.
//!
//! Five-band tables describe one ascending scale and are walked low to high,
//! so the lowest exceeded boundary wins. Three-band tables may overlap, so
//! the most severe band (`action`) is checked first.

use crate::model::{BandName, Phase, RiverType, SchemaKind};

/// How a reading is compared against a band's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Matches when the reading is at or below the scalar, or the range's upper bound.
    AtOrBelow,
    /// Matches when the reading is at or above the scalar, or the range's lower bound.
    AtOrAbove,
    /// Matches when the reading lies inside the range, bounds included.
    WithinRange,
}

/// One row of a schema table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandSpec {
    pub band: BandName,
    pub phase: Phase,
    pub comparator: Comparator,
}

const fn spec(band: BandName, phase: Phase, comparator: Comparator) -> BandSpec {
    BandSpec { band, phase, comparator }
}

pub static FIVE_BAND_SCHEMA: &[BandSpec] = &[
    spec(BandName::LowAction, Phase::Red, Comparator::AtOrBelow),
    spec(BandName::LowWatch, Phase::Yellow, Comparator::AtOrBelow),
    spec(BandName::Normal, Phase::Green, Comparator::AtOrBelow),
    spec(BandName::HighWatch, Phase::Yellow, Comparator::AtOrBelow),
    spec(BandName::HighAction, Phase::Red, Comparator::AtOrAbove),
];

pub static THREE_BAND_SCHEMA: &[BandSpec] = &[
    spec(BandName::Action, Phase::Red, Comparator::AtOrAbove),
    spec(BandName::Watch, Phase::Yellow, Comparator::WithinRange),
    spec(BandName::Normal, Phase::Green, Comparator::AtOrBelow),
];

/// Bands for a river type, in evaluation order.
pub fn bands_for(river: RiverType) -> &'static [BandSpec] {
    bands_for_schema(river.schema())
}

pub fn bands_for_schema(schema: SchemaKind) -> &'static [BandSpec] {
    match schema {
        SchemaKind::FiveBand => FIVE_BAND_SCHEMA,
        SchemaKind::ThreeBand => THREE_BAND_SCHEMA,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn band_names(specs: &[BandSpec]) -> Vec<BandName> {
        specs.iter().map(|s| s.band).collect()
    }

    #[test]
    fn test_five_band_order_runs_low_to_high() {
        assert_eq!(
            band_names(bands_for(RiverType::Ilr)),
            vec![
                BandName::LowAction,
                BandName::LowWatch,
                BandName::Normal,
                BandName::HighWatch,
                BandName::HighAction,
            ]
        );
        assert_eq!(bands_for(RiverType::Mor), bands_for(RiverType::Ilr));
    }

    #[test]
    fn test_three_band_checks_action_first() {
        assert_eq!(
            band_names(bands_for(RiverType::Umr)),
            vec![BandName::Action, BandName::Watch, BandName::Normal]
        );
    }

    #[test]
    fn test_band_phases_match_wap_colors() {
        for spec in FIVE_BAND_SCHEMA.iter().chain(THREE_BAND_SCHEMA) {
            let expected = match spec.band {
                BandName::LowAction | BandName::HighAction | BandName::Action => Phase::Red,
                BandName::LowWatch | BandName::HighWatch | BandName::Watch => Phase::Yellow,
                BandName::Normal => Phase::Green,
            };
            assert_eq!(spec.phase, expected, "wrong phase for band {}", spec.band);
        }
    }

    #[test]
    fn test_only_action_bands_compare_upwards() {
        for spec in FIVE_BAND_SCHEMA.iter().chain(THREE_BAND_SCHEMA) {
            let upward = spec.comparator == Comparator::AtOrAbove;
            assert_eq!(
                upward,
                matches!(spec.band, BandName::HighAction | BandName::Action),
                "unexpected comparator for band {}",
                spec.band
            );
        }
    }

    #[test]
    fn test_no_schema_assigns_neutral() {
        assert!(FIVE_BAND_SCHEMA.iter().all(|s| s.phase != Phase::Neutral));
        assert!(THREE_BAND_SCHEMA.iter().all(|s| s.phase != Phase::Neutral));
    }
}
