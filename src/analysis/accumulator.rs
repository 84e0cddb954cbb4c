/// Collects per-river batches for a combined run.
///
/// Each river's worker hands its finished batch to the caller, which
/// records it here. The caller decides when to stop waiting (all rivers in,
/// or a timeout) and then turns what it has into reports.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::analysis::report::{assemble_at, RiverReport};
use crate::model::{GaugeReading, RiverType};

#[derive(Debug, Default)]
pub struct BatchAccumulator {
    expected: Vec<RiverType>,
    received: HashMap<RiverType, Vec<GaugeReading>>,
}

impl BatchAccumulator {
    /// `expected` fixes which rivers make the set complete and the report order.
    pub fn new(expected: &[RiverType]) -> Self {
        let mut order: Vec<RiverType> = Vec::with_capacity(expected.len());
        for river in expected {
            if !order.contains(river) {
                order.push(*river);
            }
        }
        Self {
            expected: order,
            received: HashMap::new(),
        }
    }

    /// Stores a river's batch, replacing any earlier batch for the same river.
    /// Returns `false` if the river was not expected; the batch is dropped.
    pub fn record(&mut self, river: RiverType, readings: Vec<GaugeReading>) -> bool {
        if !self.expected.contains(&river) {
            return false;
        }
        self.received.insert(river, readings);
        true
    }

    pub fn has_reported(&self, river: RiverType) -> bool {
        self.received.contains_key(&river)
    }

    pub fn is_complete(&self) -> bool {
        self.expected.iter().all(|r| self.received.contains_key(r))
    }

    /// Expected rivers that have not reported yet, in expected order.
    pub fn missing(&self) -> Vec<RiverType> {
        self.expected
            .iter()
            .filter(|r| !self.received.contains_key(*r))
            .copied()
            .collect()
    }

    /// Assembles one report per river that reported, in expected order.
    pub fn into_reports(mut self, generated_at: DateTime<Utc>) -> Vec<RiverReport> {
        let mut reports = Vec::with_capacity(self.received.len());
        for river in &self.expected {
            if let Some(readings) = self.received.remove(river) {
                reports.push(assemble_at(*river, &readings, generated_at));
            }
        }
        reports
    }
}
