//! JSON report files and archival.
//!
//! Each run writes `<dir>/<river>_<YYYY-MM-DD_HHhMMmSSs>.json`. Only the
//! newest report per river stays in `<dir>`; older ones are moved into
//! `<dir>/archive/`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::analysis::report::RiverReport;
use crate::logging::{self, Component};
use crate::model::{RiverType, WapError};

pub const ARCHIVE_DIR: &str = "archive";

/// File name for a river's report generated at `at`.
pub fn report_file_name(river: RiverType, at: DateTime<Utc>) -> String {
    format!("{}_{}.json", river.code(), at.format("%Y-%m-%d_%Hh%Mm%Ss"))
}

/// Writes the report as pretty JSON and archives that river's older reports.
/// Returns the path of the new file.
pub fn write_report(dir: &Path, report: &RiverReport) -> Result<PathBuf, WapError> {
    fs::create_dir_all(dir.join(ARCHIVE_DIR))?;

    let path = dir.join(report_file_name(report.river, report.generated_at));
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| WapError::Io(format!("cannot serialize {} report: {}", report.river, e)))?;
    fs::write(&path, json)?;

    logging::info(
        Component::Report,
        None,
        &format!("{} report written to {}", report.river, path.display()),
    );

    archive_older(dir, report.river)?;
    Ok(path)
}

/// Moves every report for `river` except the newest into the archive folder.
///
/// File names embed the generation time in a sortable format, so the newest
/// report is the last name in lexical order. Returns the archived names.
pub fn archive_older(dir: &Path, river: RiverType) -> Result<Vec<String>, WapError> {
    let prefix = format!("{}_", river.code());
    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(&prefix) && name.ends_with(".json") {
            names.push(name);
        }
    }

    names.sort();
    names.pop(); // keep the newest

    let archive = dir.join(ARCHIVE_DIR);
    fs::create_dir_all(&archive)?;
    for name in &names {
        let dest = archive.join(name);
        match fs::rename(dir.join(name), &dest) {
            Ok(()) => logging::info(
                Component::Report,
                None,
                &format!("Archived {} report {}", river, name),
            ),
            Err(e) => logging::error(
                Component::Report,
                None,
                &format!("Failed to archive {} to {}: {}", name, dest.display(), e),
            ),
        }
    }

    Ok(names)
}
