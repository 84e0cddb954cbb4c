/// PostgreSQL persistence for WAP reports.
///
/// Stores each river report as one `wap.report_runs` row with its gauge rows
/// (`wap.gauge_phases`) and region blocks (`wap.region_phases`), written in a
/// single transaction. Persistence is optional: the binary only connects
/// when `DATABASE_URL` is set.

use postgres::{Client, NoTls};

use crate::analysis::report::RiverReport;
use crate::logging::{self, Component};

/// Schema the report tables live in.
pub const WAP_SCHEMA: &str = "wap";

/// DDL applied by `ensure_schema`. Safe to run repeatedly.
pub const SCHEMA_SQL: &str = "
    CREATE SCHEMA IF NOT EXISTS wap;

    CREATE TABLE IF NOT EXISTS wap.report_runs (
        run_id        BIGSERIAL PRIMARY KEY,
        river_code    TEXT        NOT NULL,
        generated_at  TIMESTAMPTZ NOT NULL,
        worst_phase   TEXT        NOT NULL
    );

    CREATE TABLE IF NOT EXISTS wap.gauge_phases (
        run_id        BIGINT  NOT NULL REFERENCES wap.report_runs(run_id) ON DELETE CASCADE,
        row_index     INTEGER NOT NULL,
        region_id     TEXT    NOT NULL,
        gauge_id      TEXT    NOT NULL,
        level_ft      DOUBLE PRECISION,
        phase         TEXT    NOT NULL,
        matched_band  TEXT,
        PRIMARY KEY (run_id, row_index)
    );

    CREATE TABLE IF NOT EXISTS wap.region_phases (
        run_id        BIGINT  NOT NULL REFERENCES wap.report_runs(run_id) ON DELETE CASCADE,
        block_index   INTEGER NOT NULL,
        region_id     TEXT    NOT NULL,
        worst_phase   TEXT    NOT NULL,
        gauge_ids     TEXT[]  NOT NULL,
        PRIMARY KEY (run_id, block_index)
    );
";

/// Connects using `DATABASE_URL` (from the environment or `.env`) and
/// checks that every schema in `schemas` exists.
pub fn connect_and_verify(schemas: &[&str]) -> Result<Client, Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL is not set (add it to the environment or .env)")?;

    let mut client = connect(&url)?;

    for schema in schemas {
        let row = client.query_one(
            "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)",
            &[schema],
        )?;
        let exists: bool = row.get(0);
        if !exists {
            return Err(format!(
                "schema '{}' not found; run ensure_schema or apply the WAP DDL first",
                schema
            )
            .into());
        }
    }

    Ok(client)
}

pub fn connect(url: &str) -> Result<Client, postgres::Error> {
    Client::connect(url, NoTls)
}

pub fn ensure_schema(client: &mut Client) -> Result<(), postgres::Error> {
    client.batch_execute(SCHEMA_SQL)
}

/// Inserts one report and returns its run id.
pub fn store_report(
    client: &mut Client,
    report: &RiverReport,
) -> Result<i64, Box<dyn std::error::Error>> {
    let mut tx = client.transaction()?;

    let row = tx.query_one(
        "INSERT INTO wap.report_runs (river_code, generated_at, worst_phase)
         VALUES ($1, $2, $3)
         RETURNING run_id",
        &[
            &report.river.code(),
            &report.generated_at,
            &report.worst_phase().color(),
        ],
    )?;
    let run_id: i64 = row.get(0);

    let gauge_stmt = tx.prepare(
        "INSERT INTO wap.gauge_phases
            (run_id, row_index, region_id, gauge_id, level_ft, phase, matched_band)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )?;
    for (i, row) in report.rows.iter().enumerate() {
        let row_index = index_column(i)?;
        let band = row.matched_band.map(|b| b.as_str());
        tx.execute(
            &gauge_stmt,
            &[
                &run_id,
                &row_index,
                &row.region_id,
                &row.gauge_id,
                &row.value,
                &row.phase.color(),
                &band,
            ],
        )?;
    }

    let region_stmt = tx.prepare(
        "INSERT INTO wap.region_phases
            (run_id, block_index, region_id, worst_phase, gauge_ids)
         VALUES ($1, $2, $3, $4, $5)",
    )?;
    for (i, region) in report.regions.iter().enumerate() {
        let block_index = index_column(i)?;
        tx.execute(
            &region_stmt,
            &[
                &run_id,
                &block_index,
                &region.region_id,
                &region.worst_phase.color(),
                &region.member_gauge_ids,
            ],
        )?;
    }

    tx.commit()?;

    logging::info(
        Component::Store,
        None,
        &format!(
            "{} report stored as run {} ({} gauges, {} regions)",
            report.river,
            run_id,
            report.rows.len(),
            report.regions.len()
        ),
    );

    Ok(run_id)
}

/// Position of a row or block as stored in an INTEGER column.
fn index_column(i: usize) -> Result<i32, std::num::TryFromIntError> {
    i32::try_from(i)
}
