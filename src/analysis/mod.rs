/// Region rollup and report assembly for the WAP report service.
///
/// This module turns classified gauge readings into region summaries and
/// the per-river report handed to output and persistence.
///
/// Submodules:
/// - `groupings` — worst-case phase per contiguous region block.
/// - `report` — rows, region summaries and merge-block annotations.
/// - `accumulator` — collects per-river batches for a combined run.

pub mod accumulator;
pub mod groupings;
pub mod report;
