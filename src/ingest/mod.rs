/// Gauge data ingestion.
///
/// Submodules:
/// - `noaa` — reads observed levels from NWS gauge pages and builds river batches.

pub mod noaa;
