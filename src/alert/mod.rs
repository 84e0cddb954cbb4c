//! Threshold schemas and per-gauge phase classification.
//!
//! Submodules:
//! - `schema` — which bands each river type has, in evaluation order.
//! - `thresholds` — maps one reading to one WAP phase.

pub mod schema;
pub mod thresholds;
