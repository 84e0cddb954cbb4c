//! `wap_report` — one polling cycle of the WAP phase report.
//!
//! Fetches every river in the registry on its own worker thread, classifies
//! the gauges, writes one JSON report per river, optionally stores the
//! reports in PostgreSQL, and prints a per-region summary.

use std::error::Error;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use chrono::Utc;

use wap_report::analysis::accumulator::BatchAccumulator;
use wap_report::analysis::report::RiverReport;
use wap_report::config::AppConfig;
use wap_report::db;
use wap_report::ingest::noaa;
use wap_report::logging::{self, Component};
use wap_report::model::{GaugeReading, RiverType};
use wap_report::output;
use wap_report::stations::load_registry;

fn main() {
    if let Err(e) = run() {
        eprintln!("wap_report: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    logging::init_logger(config.log_level, config.log_file.as_deref(), true);

    let registry = load_registry(&config.registry_path)?;
    logging::info(
        Component::System,
        None,
        &format!(
            "Loaded {} rivers, {} gauges from {}",
            registry.rivers.len(),
            registry.gauge_count(),
            config.registry_path.display()
        ),
    );

    let mut accumulator = BatchAccumulator::new(&registry.river_types());
    let (tx, rx) = mpsc::channel::<(RiverType, Vec<GaugeReading>)>();

    for river in registry.rivers.iter().cloned() {
        let tx = tx.clone();
        let settings = config.fetch;
        logging::info(
            Component::Fetch,
            None,
            &format!(
                "-------Obtaining {} river data ({} gauges, {} regions)-------",
                river.river,
                river.gauges.len(),
                river.regions().len()
            ),
        );
        thread::spawn(move || {
            let client = match noaa::build_client(&settings) {
                Ok(client) => client,
                Err(e) => {
                    logging::error(Component::Fetch, None, &format!("{}: {}", river.river, e));
                    return;
                }
            };
            let readings = noaa::fetch_river_batch(&client, &river, &settings);
            // The receiver is gone only if the main thread already gave up waiting.
            let _ = tx.send((river.river, readings));
        });
    }
    drop(tx);

    let deadline = Instant::now() + config.thread_timeout;
    while !accumulator.is_complete() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((river, readings)) => {
                if accumulator.has_reported(river) {
                    logging::warn(
                        Component::System,
                        None,
                        &format!("{} reported twice; keeping the later batch", river),
                    );
                }
                accumulator.record(river, readings);
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    for river in accumulator.missing() {
        logging::error(
            Component::System,
            None,
            &format!(
                "{} worker did not report within {}s; river left out of this run",
                river,
                config.thread_timeout.as_secs()
            ),
        );
    }

    let reports = accumulator.into_reports(Utc::now());

    for report in &reports {
        if let Err(e) = output::write_report(&config.report_dir, report) {
            logging::error(
                Component::Report,
                None,
                &format!("Failed to write {} report: {}", report.river, e),
            );
        }
    }

    if let Some(url) = &config.database_url {
        persist(url, &reports);
    } else {
        logging::info(Component::Store, None, "DATABASE_URL not set; skipping persistence");
    }

    print_summary(&reports);
    Ok(())
}

fn persist(url: &str, reports: &[RiverReport]) {
    let mut client = match db::connect(url) {
        Ok(client) => client,
        Err(e) => {
            logging::error(Component::Store, None, &format!("Database connection failed: {}", e));
            return;
        }
    };
    if let Err(e) = db::ensure_schema(&mut client) {
        logging::error(Component::Store, None, &format!("Schema setup failed: {}", e));
        return;
    }
    for report in reports {
        if let Err(e) = db::store_report(&mut client, report) {
            logging::error(
                Component::Store,
                None,
                &format!("Failed to store {} report: {}", report.river, e),
            );
        }
    }
}

fn print_summary(reports: &[RiverReport]) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 WAP PHASE SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    for report in reports {
        println!(
            "\n{}  ({}/{} gauges reporting, river phase: {})",
            report.river,
            report.rows_with_data(),
            report.rows.len(),
            report.worst_phase()
        );
        for region in &report.regions {
            println!(
                "  {:<24} {:<8} ({} gauges)",
                region.region_id,
                region.worst_phase.label(),
                region.member_gauge_ids.len()
            );
        }
    }
    println!("═══════════════════════════════════════════════════════════");
}
