//! Mean perceptual utility.
//!
//! Utility of a segment bitrate `b` against its class range `(min, max)`:
//!
//!   u(b) = ln(b / min) / ln(max / min)
//!
//! so `u(min) = 0` and `u(max) = 1`. A file's score is the sum of segment
//! utilities divided by the session's segment count, not by the number of
//! samples actually present.

use crate::error::{QoeError, QoeResult};
use crate::log::{RawRecord, split_header};
use crate::metrics::round_to;
use std::collections::BTreeMap;

/// Observed bitrate range of one class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassRange {
    pub min: f64,
    pub max: f64,
}

impl ClassRange {
    /// Range over all samples; `None` when there are none.
    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Option<Self> {
        samples.into_iter().fold(None, |acc, b| match acc {
            None => Some(ClassRange { min: b, max: b }),
            Some(r) => Some(ClassRange {
                min: r.min.min(b),
                max: r.max.max(b),
            }),
        })
    }

    /// A range is usable when `0 < min < max`.
    pub fn is_usable(&self) -> bool {
        self.min > 0.0 && self.max > self.min
    }
}

/// Per-class ranges, built once by the range pass and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassRanges {
    ranges: BTreeMap<u32, Option<ClassRange>>,
}

impl ClassRanges {
    /// Build the map from every class's bitrate samples.
    pub fn compute<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: IntoIterator<Item = f64>,
    {
        let ranges = classes
            .into_iter()
            .map(|(class, samples)| (class, ClassRange::from_samples(samples)))
            .collect();
        Self { ranges }
    }

    /// The class's range, or `UndefinedRange` if it had no valid samples.
    pub fn get(&self, class: u32) -> QoeResult<ClassRange> {
        self.ranges
            .get(&class)
            .copied()
            .flatten()
            .ok_or(QoeError::UndefinedRange { class })
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn defined(&self) -> usize {
        self.ranges.values().filter(|r| r.is_some()).count()
    }
}

/// Bitrates contributing to a class range.
///
/// Rows with fewer than two fields or a non-numeric bitrate are skipped.
pub fn range_samples(records: &[RawRecord]) -> Vec<f64> {
    let (_, body) = split_header(records);
    body.iter()
        .filter(|r| r.fields.len() >= 2)
        .filter_map(RawRecord::value)
        .collect()
}

/// Bitrates of a single file for scoring.
///
/// Any row with fewer than two fields invalidates the whole file; rows with
/// a non-numeric bitrate are skipped.
pub fn file_bitrates(records: &[RawRecord]) -> QoeResult<Vec<f64>> {
    let (_, body) = split_header(records);
    let mut out = Vec::with_capacity(body.len());
    for rec in body {
        if rec.fields.len() < 2 {
            return Err(QoeError::malformed(
                rec.line,
                format!("bitrate row needs 2 fields, got {:?}", rec.fields),
            ));
        }
        if let Some(b) = rec.value() {
            out.push(b);
        }
    }
    Ok(out)
}

/// Utility of one segment; 0 for non-positive bitrates or an unusable range.
pub fn utility(bitrate: f64, range: &ClassRange) -> f64 {
    if bitrate <= 0.0 || !range.is_usable() {
        return 0.0;
    }
    (bitrate / range.min).ln() / (range.max / range.min).ln()
}

/// Mean utility of a file, rounded to 4 decimals.
///
/// `None` when `total_segments` is not positive.
pub fn mean_utility(samples: &[f64], range: &ClassRange, total_segments: i64) -> Option<f64> {
    if total_segments <= 0 {
        return None;
    }
    let sum: f64 = samples.iter().map(|&b| utility(b, range)).sum();
    Some(round_to(sum / total_segments as f64, 4))
}
