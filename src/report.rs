//! Tabular output: one CSV row per successfully scored file.

use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilityRecord {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Mean Utility")]
    pub mean_utility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebufferRecord {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Total Buffering Time (seconds)")]
    pub total_buffer_secs: f64,
    #[serde(rename = "Rebuffering Ratio")]
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchingRecord {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Quality Changes")]
    pub quality_changes: u32,
    #[serde(rename = "Switching Rate")]
    pub switching_rate: f64,
}

/// Column names for each record type, written even when there are no rows.
pub trait Columns {
    const COLUMNS: &'static [&'static str];
}

impl Columns for UtilityRecord {
    const COLUMNS: &'static [&'static str] = &["Path", "Mean Utility"];
}

impl Columns for RebufferRecord {
    const COLUMNS: &'static [&'static str] =
        &["Path", "Total Buffering Time (seconds)", "Rebuffering Ratio"];
}

impl Columns for SwitchingRecord {
    const COLUMNS: &'static [&'static str] = &["Path", "Quality Changes", "Switching Rate"];
}

/// Write a header row followed by all records.
pub fn write_records<W, T>(out: W, records: &[T]) -> Result<()>
where
    W: Write,
    T: Serialize + Columns,
{
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    wtr.write_record(T::COLUMNS)?;
    for rec in records {
        wtr.serialize(rec)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv<T>(path: &Path, records: &[T]) -> Result<()>
where
    T: Serialize + Columns,
{
    let file = std::fs::File::create(path)
        .with_context(|| format!("create output file {}", path.display()))?;
    write_records(file, records).with_context(|| format!("write {}", path.display()))
}
