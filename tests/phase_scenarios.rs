/// End-to-end classification scenarios
///
/// These tests drive the public API the way the binary does: raw registry
/// strings → threshold sets → readings → river report. No network, files or
/// database are involved.
///
/// Run with: cargo test --test phase_scenarios

use chrono::{DateTime, TimeZone, Utc};

use wap_report::alert::schema::bands_for;
use wap_report::alert::thresholds::{
    classify, classify_detailed, parse_five_band, parse_three_band, RawFiveBand, RawThreeBand,
};
use wap_report::analysis::accumulator::BatchAccumulator;
use wap_report::analysis::groupings::aggregate_regions;
use wap_report::analysis::report::assemble_at;
use wap_report::model::{BandName, GaugeReading, Phase, RiverType, ThresholdSet};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn five_band(low_action: &str, low_watch: &str, normal: &str, high_watch: &str, high_action: &str) -> ThresholdSet {
    parse_five_band(
        "scenario",
        &RawFiveBand {
            low_action: low_action.to_string(),
            low_watch: low_watch.to_string(),
            normal: normal.to_string(),
            high_watch: high_watch.to_string(),
            high_action: high_action.to_string(),
        },
    )
}

fn three_band(normal: &str, watch: &str, action: &str) -> ThresholdSet {
    parse_three_band(
        "scenario",
        &RawThreeBand {
            normal: normal.to_string(),
            watch: watch.to_string(),
            action: action.to_string(),
        },
    )
}

fn reading(gauge: &str, region: &str, value: Option<f64>, thresholds: ThresholdSet) -> GaugeReading {
    GaugeReading {
        gauge_id: gauge.to_string(),
        region_id: region.to_string(),
        value,
        thresholds,
    }
}

fn run_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 2, 12, 0, 0).unwrap()
}

/// A threshold set whose phase for `value` is known, for building regions.
fn gauge_in_phase(gauge: &str, region: &str, phase: Phase) -> GaugeReading {
    let thresholds = five_band("30", "30 - 40", "40 - 60", "60 - 75", "80");
    let value = match phase {
        Phase::Neutral => None,
        Phase::Green => Some(50.0),
        Phase::Yellow => Some(70.0),
        Phase::Red => Some(90.0),
    };
    reading(gauge, region, value, thresholds)
}

// ---------------------------------------------------------------------------
// Single-gauge classification
// ---------------------------------------------------------------------------

#[test]
fn test_five_band_reading_in_normal_range_is_green() {
    // 42 ≤ 30? no. 42 ≤ 40? no. 42 ≤ 60? yes → normal.
    let r = reading(
        "Henry",
        "Peoria",
        Some(42.0),
        five_band("30", "30 - 40", "40 - 60", "60 - 75", "80"),
    );
    let result = classify_detailed(&r);
    assert_eq!(result.phase, Phase::Green);
    assert_eq!(result.band, Some(BandName::Normal));
}

#[test]
fn test_three_band_action_wins_over_watch() {
    // 95 ≥ 90 → action, before watch [60, 90] or normal 50 are considered.
    let r = reading("Grafton", "Pool 26", Some(95.0), three_band("50", "60 - 90", "90"));
    let result = classify_detailed(&r);
    assert_eq!(result.phase, Phase::Red);
    assert_eq!(result.band, Some(BandName::Action));
}

#[test]
fn test_low_action_takes_precedence_over_normal() {
    let r = reading("Havana", "La Grange", Some(5.0), five_band("10", "", "0 - 20", "", ""));
    assert_eq!(classify(&r), Phase::Red);
}

#[test]
fn test_missing_reading_is_neutral_regardless_of_thresholds() {
    let sets = [
        five_band("30", "30 - 40", "40 - 60", "60 - 75", "80"),
        five_band("", "", "0", "", ""),
        three_band("50", "60 - 90", "90"),
        three_band("", "", "-5"),
    ];
    for thresholds in sets {
        assert_eq!(classify(&reading("g", "r", None, thresholds)), Phase::Neutral);
    }
}

#[test]
fn test_classifying_twice_gives_same_phase() {
    let r = reading("Peoria", "Peoria", Some(447.5), five_band("439.5", "439.5 - 440", "440 - 446", "446 - 449", "449"));
    assert_eq!(classify(&r), classify(&r));
    assert_eq!(classify(&r), Phase::Yellow);
}

#[test]
fn test_schema_lookup_matches_river_shape() {
    assert_eq!(bands_for(RiverType::Ilr).len(), 5);
    assert_eq!(bands_for(RiverType::Mor).len(), 5);
    assert_eq!(bands_for(RiverType::Umr).len(), 3);
    assert_eq!(bands_for(RiverType::Umr)[0].band, BandName::Action);
}

// ---------------------------------------------------------------------------
// Region rollup and reports
// ---------------------------------------------------------------------------

#[test]
fn test_region_phase_is_worst_member_phase() {
    let readings = vec![
        gauge_in_phase("g1", "Marseilles", Phase::Green),
        gauge_in_phase("g2", "Marseilles", Phase::Yellow),
        gauge_in_phase("g3", "Marseilles", Phase::Neutral),
    ];
    let phases: Vec<Phase> = readings.iter().map(classify).collect();
    assert_eq!(phases, vec![Phase::Green, Phase::Yellow, Phase::Neutral]);

    let summaries = aggregate_regions(readings.iter().zip(phases));
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].worst_phase, Phase::Yellow);
}

#[test]
fn test_pool_reappearing_after_another_pool_is_summarized_separately() {
    let readings = vec![
        gauge_in_phase("g1", "PoolA", Phase::Green),
        gauge_in_phase("g2", "PoolA", Phase::Red),
        gauge_in_phase("g3", "PoolA", Phase::Yellow),
        gauge_in_phase("b1", "PoolB", Phase::Yellow),
        gauge_in_phase("g4", "PoolA", Phase::Green),
    ];
    let report = assemble_at(RiverType::Ilr, &readings, run_time());

    let summary: Vec<(&str, Phase)> = report
        .regions
        .iter()
        .map(|r| (r.region_id.as_str(), r.worst_phase))
        .collect();
    assert_eq!(
        summary,
        vec![("PoolA", Phase::Red), ("PoolB", Phase::Yellow), ("PoolA", Phase::Green)]
    );
    assert_eq!(report.regions[0].member_gauge_ids, vec!["g1", "g2", "g3"]);
    assert_eq!(report.regions[2].member_gauge_ids, vec!["g4"]);
}

#[test]
fn test_region_name_shown_once_per_block() {
    let readings = vec![
        gauge_in_phase("g1", "Lower Reach", Phase::Green),
        gauge_in_phase("g2", "Lower Reach", Phase::Red),
        gauge_in_phase("g3", "Kansas City Reach", Phase::Green),
    ];
    let report = assemble_at(RiverType::Mor, &readings, run_time());

    let region_cells: Vec<Option<(&str, Phase)>> = report
        .rows
        .iter()
        .map(|row| {
            row.block_start
                .then(|| (row.region_id.as_str(), report.block_phase(row)))
        })
        .collect();
    assert_eq!(
        region_cells,
        vec![
            Some(("Lower Reach", Phase::Red)),
            None,
            Some(("Kansas City Reach", Phase::Green)),
        ]
    );
}

#[test]
fn test_combined_run_reports_each_river_independently() {
    let mut acc = BatchAccumulator::new(&[RiverType::Ilr, RiverType::Umr]);
    acc.record(
        RiverType::Umr,
        vec![reading("Grafton", "Pool 26", Some(16.2), three_band("15", "15 - 18", "18"))],
    );
    acc.record(RiverType::Ilr, vec![gauge_in_phase("Henry", "Peoria", Phase::Red)]);
    assert!(acc.is_complete());

    let reports = acc.into_reports(run_time());
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].river, RiverType::Ilr);
    assert_eq!(reports[0].worst_phase(), Phase::Red);
    assert_eq!(reports[1].river, RiverType::Umr);
    assert_eq!(reports[1].worst_phase(), Phase::Yellow);
}

#[test]
fn test_empty_batch_yields_no_regions() {
    let report = assemble_at(RiverType::Umr, &[], run_time());
    assert!(report.regions.is_empty());
    assert!(report.rows.is_empty());
}
