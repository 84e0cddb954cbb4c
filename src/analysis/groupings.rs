/// Worst-case rollup of gauge phases into region summaries.
///
/// Grouping is positional: a region is a run of consecutive rows sharing a
/// `region_id`. Registry files list each reach's gauges together, and
/// callers must keep that order. If the same id reappears after another
/// region has interrupted it, it starts a new group with its own summary.

use crate::model::{GaugeReading, Phase, RegionSummary};

/// Folds `(reading, phase)` pairs into one summary per contiguous region block,
/// in first-seen order.
///
/// A block's `worst_phase` starts at `Neutral` and is replaced only by a
/// strictly more severe member phase, so it always equals the maximum over
/// the block's members. An empty input yields no summaries.
pub fn aggregate_regions<'a, I>(classified: I) -> Vec<RegionSummary>
where
    I: IntoIterator<Item = (&'a GaugeReading, Phase)>,
{
    let mut summaries: Vec<RegionSummary> = Vec::new();

    for (reading, phase) in classified {
        let continues_block = summaries
            .last()
            .is_some_and(|open| open.region_id == reading.region_id);

        if !continues_block {
            summaries.push(RegionSummary {
                region_id: reading.region_id.clone(),
                worst_phase: Phase::Neutral,
                member_gauge_ids: Vec::new(),
            });
        }

        if let Some(open) = summaries.last_mut() {
            if phase > open.worst_phase {
                open.worst_phase = phase;
            }
            open.member_gauge_ids.push(reading.gauge_id.clone());
        }
    }

    summaries
}

/// Returns the region ids that appear in more than one block.
///
/// Not an error: used to warn when a registry splits a reach.
pub fn split_regions(summaries: &[RegionSummary]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    let mut repeated: Vec<&str> = Vec::new();
    for summary in summaries {
        let id = summary.region_id.as_str();
        if seen.contains(&id) {
            if !repeated.contains(&id) {
                repeated.push(id);
            }
        } else {
            seen.push(id);
        }
    }
    repeated
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ThreeBandThresholds, Threshold, ThresholdSet};

    fn reading(gauge: &str, region: &str) -> GaugeReading {
        GaugeReading {
            gauge_id: gauge.to_string(),
            region_id: region.to_string(),
            value: None,
            thresholds: ThresholdSet::ThreeBand(ThreeBandThresholds {
                normal: Threshold::Scalar { value: 10.0 },
                watch: Threshold::Absent,
                action: Threshold::Absent,
            }),
        }
    }

    fn rollup(rows: &[(GaugeReading, Phase)]) -> Vec<RegionSummary> {
        aggregate_regions(rows.iter().map(|(r, p)| (r, *p)))
    }

    #[test]
    fn test_empty_batch_yields_no_summaries() {
        assert!(rollup(&[]).is_empty());
    }

    #[test]
    fn test_region_takes_worst_member_phase() {
        let rows = vec![
            (reading("g1", "La Grange"), Phase::Green),
            (reading("g2", "La Grange"), Phase::Yellow),
            (reading("g3", "La Grange"), Phase::Neutral),
        ];
        let summaries = rollup(&rows);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].worst_phase, Phase::Yellow);
        assert_eq!(summaries[0].member_gauge_ids, vec!["g1", "g2", "g3"]);
    }

    #[test]
    fn test_all_neutral_region_stays_neutral() {
        let rows = vec![
            (reading("g1", "Pool 24"), Phase::Neutral),
            (reading("g2", "Pool 24"), Phase::Neutral),
        ];
        assert_eq!(rollup(&rows)[0].worst_phase, Phase::Neutral);
    }

    #[test]
    fn test_regions_keep_first_seen_order() {
        let rows = vec![
            (reading("g1", "Peoria"), Phase::Green),
            (reading("g2", "Starved Rock"), Phase::Red),
            (reading("g3", "Marseilles"), Phase::Yellow),
        ];
        let ids: Vec<_> = rollup(&rows).into_iter().map(|s| s.region_id).collect();
        assert_eq!(ids, vec!["Peoria", "Starved Rock", "Marseilles"]);
    }

    #[test]
    fn test_non_contiguous_region_forms_new_block() {
        let rows = vec![
            (reading("g1", "PoolA"), Phase::Green),
            (reading("g2", "PoolA"), Phase::Red),
            (reading("g3", "PoolA"), Phase::Yellow),
            (reading("g5", "PoolB"), Phase::Green),
            (reading("g4", "PoolA"), Phase::Green),
        ];
        let summaries = rollup(&rows);
        assert_eq!(summaries.len(), 3);

        assert_eq!(summaries[0].region_id, "PoolA");
        assert_eq!(summaries[0].worst_phase, Phase::Red);
        assert_eq!(summaries[0].member_gauge_ids, vec!["g1", "g2", "g3"]);

        assert_eq!(summaries[1].region_id, "PoolB");

        assert_eq!(summaries[2].region_id, "PoolA");
        assert_eq!(summaries[2].worst_phase, Phase::Green);
        assert_eq!(summaries[2].member_gauge_ids, vec!["g4"]);

        assert_eq!(split_regions(&summaries), vec!["PoolA"]);
    }

    #[test]
    fn test_worst_phase_is_never_below_any_member() {
        let phases = [Phase::Yellow, Phase::Neutral, Phase::Red, Phase::Green, Phase::Yellow];
        let rows: Vec<_> = phases
            .iter()
            .enumerate()
            .map(|(i, p)| (reading(&format!("g{}", i), "Dresden"), *p))
            .collect();
        let summary = &rollup(&rows)[0];
        for (_, phase) in &rows {
            assert!(summary.worst_phase >= *phase);
        }
        assert_eq!(summary.worst_phase, Phase::Red);
    }

    #[test]
    fn test_split_regions_empty_when_blocks_are_contiguous() {
        let rows = vec![
            (reading("g1", "A"), Phase::Green),
            (reading("g2", "B"), Phase::Green),
        ];
        assert!(split_regions(&rollup(&rows)).is_empty());
    }
}
