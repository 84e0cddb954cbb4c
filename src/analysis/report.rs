/// Report assembly for one river batch.
///
/// Combines classified rows and region summaries into the structure handed
/// to renderers and persistence. Rows stay in registry order. Each row
/// records which region block it belongs to and whether it opens that block,
/// so a renderer can print the region name once per block, colored by the
/// block's worst phase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::thresholds::{classify_detailed, Classification};
use crate::analysis::groupings::{aggregate_regions, split_regions};
use crate::logging::{self, Component};
use crate::model::{BandName, GaugeReading, Phase, RegionSummary, RiverType, ThresholdSet};

/// One gauge row of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub region_id: String,
    pub gauge_id: String,
    pub value: Option<f64>,
    pub thresholds: ThresholdSet,
    pub phase: Phase,
    /// Band cell a renderer should highlight, if any.
    pub matched_band: Option<BandName>,
    /// Index into `RiverReport::regions`.
    pub block: usize,
    /// True on the first row of a region block.
    pub block_start: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiverReport {
    pub river: RiverType,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
    pub regions: Vec<RegionSummary>,
}

impl RiverReport {
    /// Phase a renderer should use for the region cell of `row`.
    pub fn block_phase(&self, row: &ReportRow) -> Phase {
        self.regions
            .get(row.block)
            .map(|r| r.worst_phase)
            .unwrap_or(Phase::Neutral)
    }

    /// Most severe phase anywhere on the river.
    pub fn worst_phase(&self) -> Phase {
        self.regions
            .iter()
            .map(|r| r.worst_phase)
            .max()
            .unwrap_or(Phase::Neutral)
    }

    pub fn rows_with_data(&self) -> usize {
        self.rows.iter().filter(|r| r.value.is_some()).count()
    }
}

/// Classifies a batch and assembles its report, stamped with the current time.
pub fn assemble(river: RiverType, readings: &[GaugeReading]) -> RiverReport {
    assemble_at(river, readings, Utc::now())
}

/// Same as `assemble` with an explicit timestamp.
pub fn assemble_at(
    river: RiverType,
    readings: &[GaugeReading],
    generated_at: DateTime<Utc>,
) -> RiverReport {
    if readings.is_empty() {
        logging::warn(
            Component::Report,
            None,
            &format!("{}: empty batch, no regions to report", river),
        );
    }

    let classified: Vec<Classification> = readings.iter().map(classify_detailed).collect();

    let regions = aggregate_regions(readings.iter().zip(classified.iter().map(|c| c.phase)));

    for region in split_regions(&regions) {
        logging::warn(
            Component::Report,
            None,
            &format!(
                "{}: region '{}' is listed in more than one block; each block is summarized separately",
                river, region
            ),
        );
    }

    let mut rows = Vec::with_capacity(readings.len());
    let mut block = 0usize;
    for (i, (reading, classification)) in readings.iter().zip(&classified).enumerate() {
        let block_start = i == 0 || readings[i - 1].region_id != reading.region_id;
        if block_start && i > 0 {
            block += 1;
        }
        rows.push(ReportRow {
            region_id: reading.region_id.clone(),
            gauge_id: reading.gauge_id.clone(),
            value: reading.value,
            thresholds: reading.thresholds,
            phase: classification.phase,
            matched_band: classification.band,
            block,
            block_start,
        });
    }

    RiverReport {
        river,
        generated_at,
        rows,
        regions,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
