//! Signup loader: builds a [`Schedule`] from a tab-separated signup file.
//!
//! Slotted files have `day`, `time` and `sid` columns (matched by prefix);
//! flat files only need `sid` and every student sits on one date.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};

use examgen_core::dates::find_iso_date;
use examgen_core::session::Schedule;

use crate::error::IoError;

fn column(header: &StringRecord, prefix: &str, name: &'static str, path: &Path) -> Result<usize, IoError> {
    header
        .iter()
        .position(|h| h.trim().to_lowercase().starts_with(prefix))
        .ok_or_else(|| IoError::MissingColumn {
            path: path.to_path_buf(),
            column: name,
        })
}

fn open(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).with_context(|| format!("failed to open signups: {}", path.display()))
}

fn reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader)
}

/// Read a date/time/student signup file, keeping only days up to `up_to`.
pub fn read_slotted_signups(path: &Path, up_to: NaiveDate) -> Result<Schedule> {
    read_slotted_signups_from(open(path)?, path, up_to)
}

/// Same as [`read_slotted_signups`], from any reader.
pub fn read_slotted_signups_from<R: Read>(input: R, source_path: &Path, up_to: NaiveDate) -> Result<Schedule> {
    let mut rdr = reader(input);
    let header = rdr
        .headers()
        .with_context(|| format!("failed to read header: {}", source_path.display()))?
        .clone();
    let day_col = column(&header, "day", "day", source_path)?;
    let time_col = column(&header, "time", "time", source_path)?;
    let sid_col = column(&header, "sid", "sid", source_path)?;

    let mut schedule = Schedule::new();
    for (idx, record) in rdr.records().enumerate() {
        let line = idx + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("skipping {} row {}: {}", source_path.display(), line, e);
                continue;
            }
        };
        let day_text = record.get(day_col).unwrap_or_default();
        let Some(day) = find_iso_date(day_text) else {
            tracing::warn!(
                "skipping {} row {}: day '{}' has no yyyy-mm-dd date",
                source_path.display(),
                line,
                day_text
            );
            continue;
        };
        if day > up_to {
            continue;
        }
        schedule.push(
            day,
            record.get(time_col).unwrap_or_default().trim(),
            record.get(sid_col).unwrap_or_default().trim(),
        );
    }

    tracing::info!(
        path = %source_path.display(),
        bookings = schedule.len(),
        "loaded signups"
    );
    Ok(schedule)
}

/// Read a flat list of student ids; everyone sits on `exam_date`.
pub fn read_student_list(path: &Path, exam_date: NaiveDate) -> Result<Schedule> {
    read_student_list_from(open(path)?, path, exam_date)
}

/// Same as [`read_student_list`], from any reader.
pub fn read_student_list_from<R: Read>(input: R, source_path: &Path, exam_date: NaiveDate) -> Result<Schedule> {
    let mut rdr = reader(input);
    let header = rdr
        .headers()
        .with_context(|| format!("failed to read header: {}", source_path.display()))?
        .clone();
    let sid_col = column(&header, "sid", "sid", source_path)?;

    let mut ids = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        match record {
            Ok(r) => {
                let sid = r.get(sid_col).unwrap_or_default().trim();
                if !sid.is_empty() {
                    ids.push(sid.to_string());
                }
            }
            Err(e) => tracing::warn!("skipping {} row {}: {}", source_path.display(), idx + 2, e),
        }
    }
    Ok(Schedule::single_day(exam_date, ids))
}
