//! Batch drivers: walk the dataset, score each file, collect output rows.
//!
//! A file that cannot be read or scored is reported and left out; nothing
//! here aborts the batch except an unreadable dataset root.

use crate::Result;
use crate::config::MetricParams;
use crate::dataset::{Dataset, LogFile, LogKind};
use crate::diagnostics;
use crate::log::read_records;
use crate::metrics::rebuffer::buffer_time_from_records;
use crate::metrics::utility::{file_bitrates, range_samples};
use crate::metrics::{ClassRanges, compute_switching_rate, mean_utility};
use crate::report::{self, RebufferRecord, SwitchingRecord, UtilityRecord};
use anyhow::bail;
use log::info;
use rayon::prelude::*;
use std::path::Path;

pub const UTILITY_CSV: &str = "mean_utility.csv";
pub const REBUFFERING_CSV: &str = "rebuffering_ratio.csv";
pub const SWITCHING_CSV: &str = "switching_rate.csv";

/// First pass: bitrate range of every class over all its files.
pub fn class_ranges(dataset: &Dataset) -> ClassRanges {
    ClassRanges::compute(dataset.classes().map(|class| {
        let samples: Vec<f64> = dataset
            .class_files(class, LogKind::Bitrate)
            .par_iter()
            .flat_map_iter(|file| match read_records(&file.path) {
                Ok(records) => range_samples(&records),
                Err(e) => {
                    diagnostics::error(&e);
                    Vec::new()
                }
            })
            .collect();
        (class, samples)
    }))
}

/// Mean utility of every bitrate log whose class has a defined range.
pub fn utility(dataset: &Dataset, params: &MetricParams) -> Vec<UtilityRecord> {
    let ranges = class_ranges(dataset);
    info!(
        "Bitrate ranges defined for {} of {} classes",
        ranges.defined(),
        ranges.len()
    );

    // (range, file) pairs in output order; the range map is read-only now.
    let mut jobs = Vec::new();
    for class in dataset.classes() {
        match ranges.get(class) {
            Ok(range) => jobs.extend(
                dataset
                    .class_files(class, LogKind::Bitrate)
                    .into_iter()
                    .map(|file| (range, file)),
            ),
            Err(e) => {
                let files = dataset.class_files(class, LogKind::Bitrate);
                if !files.is_empty() {
                    diagnostics::warn(format!("{}; skipping {} file(s)", e, files.len()));
                }
            }
        }
    }

    jobs.par_iter()
        .filter_map(|(range, file)| {
            let records = read_records(&file.path)
                .map_err(|e| diagnostics::error(&e))
                .ok()?;
            let samples = match file_bitrates(&records) {
                Ok(s) => s,
                Err(e) => {
                    diagnostics::warn(format!("Skipping file {}: {}", file.display(), e));
                    return None;
                }
            };
            if samples.is_empty() {
                return None;
            }
            let mean_utility = mean_utility(&samples, range, params.total_segments)?;
            Some(UtilityRecord {
                path: file.display(),
                mean_utility,
            })
        })
        .collect()
}

/// Rebuffering of every `*.qoe.log` under the dataset root.
pub fn rebuffering(dataset: &Dataset, session_secs: f64) -> Result<Vec<RebufferRecord>> {
    if session_secs.is_nan() || session_secs <= 0.0 {
        bail!("session duration must be positive, got {}", session_secs);
    }

    let files = dataset.walk_logs()?;
    let count = |kind: Option<LogKind>| files.iter().filter(|f| f.kind == kind).count();
    info!(
        "Found {} log file(s) under {}: {} event, {} bitrate, {} unnamed",
        files.len(),
        dataset.root().display(),
        count(Some(LogKind::Events)),
        count(Some(LogKind::Bitrate)),
        count(None)
    );
    Ok(files
        .par_iter()
        .filter_map(|file: &LogFile| {
            info!("Processing file: {}", file.display());
            let records = read_records(&file.path)
                .map_err(|e| diagnostics::error(&e))
                .ok()?;
            let bt = buffer_time_from_records(&records, session_secs, &file.display())?;
            Some(RebufferRecord {
                path: file.file_name(),
                total_buffer_secs: bt.total_secs,
                ratio: bt.ratio,
            })
        })
        .collect())
}

/// Switching rate of every event log in the class/trace/sample grid.
pub fn switching(dataset: &Dataset, params: &MetricParams) -> Vec<SwitchingRecord> {
    let mut out = Vec::new();
    for class in dataset.classes() {
        info!("Processing folder: {}", class);
        let rows: Vec<SwitchingRecord> = dataset
            .class_files(class, LogKind::Events)
            .par_iter()
            .filter_map(|file| {
                let records = read_records(&file.path)
                    .map_err(|e| diagnostics::error(&e))
                    .ok()?;
                let sr =
                    compute_switching_rate(&records, params.window_ms, params.switch_divisor)?;
                Some(SwitchingRecord {
                    path: file.display(),
                    quality_changes: sr.quality_changes,
                    switching_rate: sr.rate,
                })
            })
            .collect();
        out.extend(rows);
    }
    out
}

/// Run all three metrics and write one CSV per metric into `out_dir`.
pub fn all(
    dataset: &Dataset,
    params: &MetricParams,
    session_secs: f64,
    out_dir: &Path,
) -> Result<()> {
    let rebuffer_rows = rebuffering(dataset, session_secs)?;
    std::fs::create_dir_all(out_dir)?;

    write(&out_dir.join(UTILITY_CSV), &utility(dataset, params))?;
    write(&out_dir.join(REBUFFERING_CSV), &rebuffer_rows)?;
    write(&out_dir.join(SWITCHING_CSV), &switching(dataset, params))?;
    Ok(())
}

/// Write rows and report where they went.
pub fn write<T>(path: &Path, rows: &[T]) -> Result<()>
where
    T: serde::Serialize + report::Columns,
{
    report::write_csv(path, rows)?;
    info!("Results saved to {} ({} rows)", path.display(), rows.len());
    Ok(())
}
