//! WAP phase reporting for river gauges.
//!
//! Reads current water levels for the gauges listed in a registry, classifies
//! each gauge into a Water Action Plan phase (Normal / Watch / Action) from
//! its river's threshold table, rolls gauges up into a worst-case phase per
//! reach or pool, and writes one report per river.
//!
//! The classification core (`alert`, `analysis`) is pure; everything that
//! touches the network, the filesystem or a database lives in `ingest`,
//! `output` and `db`.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod output;
pub mod stations;
