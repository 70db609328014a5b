//! Tabular export of the session log.

use crate::summary::SessionSummary;
use chrono::{DateTime, Utc};
use spanav_core::TrialRecord;
use std::borrow::Cow;
use std::io::{self, Write};

/// `spatial_nav_{participant}_{epoch millis}.csv`
pub fn export_file_name(participant_id: &str, now: DateTime<Utc>) -> String {
    format!("spatial_nav_{}_{}.csv", participant_id, now.timestamp_millis())
}

/// Header plus one row per record, in `TrialRecord::COLUMNS` order.
pub fn write_records_csv<W: Write>(records: &[TrialRecord], mut out: W) -> io::Result<()> {
    write_row(&mut out, TrialRecord::COLUMNS.iter().copied())?;
    for record in records {
        let fields = record.fields();
        write_row(&mut out, fields.iter().map(String::as_str))?;
    }
    out.flush()
}

pub fn write_summary_csv<W: Write>(summary: &SessionSummary, mut out: W) -> io::Result<()> {
    write_row(&mut out, SessionSummary::COLUMNS.iter().copied())?;
    let fields = summary.fields();
    write_row(&mut out, fields.iter().map(String::as_str))?;
    out.flush()
}

/// Pretty-printed `{ "summary": ..., "records": [...] }`.
pub fn write_records_json<W: Write>(
    records: &[TrialRecord],
    summary: Option<&SessionSummary>,
    mut out: W,
) -> io::Result<()> {
    #[derive(serde::Serialize)]
    struct Export<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<&'a SessionSummary>,
        records: &'a [TrialRecord],
    }
    serde_json::to_writer_pretty(&mut out, &Export { summary, records })?;
    writeln!(out)?;
    out.flush()
}

fn write_row<'a, W: Write>(out: &mut W, cells: impl Iterator<Item = &'a str>) -> io::Result<()> {
    let line: Vec<Cow<'a, str>> = cells.map(escape).collect();
    writeln!(out, "{}", line.join(","))
}

fn escape(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
