//! Rebuffering ratio: time spent stalled over session duration.

use crate::diagnostics;
use crate::log::record::{BUFFER_LOADED, BUFFER_STALLED};
use crate::log::{LogRow, RawRecord, split_header};
use crate::metrics::round_to;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StallState {
    Idle,
    /// Waiting for `bufferLoaded`; holds the stall start.
    Stalled(f64),
}

/// Sums closed stall intervals over an ordered event stream.
///
/// A second `bufferStalled` before `bufferLoaded` replaces the pending start.
/// A stall still open at the end of the stream is dropped.
#[derive(Debug, Clone)]
pub struct StallTracker {
    state: StallState,
    total: f64,
}

impl Default for StallTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StallTracker {
    pub fn new() -> Self {
        Self {
            state: StallState::Idle,
            total: 0.0,
        }
    }

    pub fn observe(&mut self, row: &LogRow) {
        match (row.event.as_str(), self.state) {
            (BUFFER_STALLED, _) => self.state = StallState::Stalled(row.timestamp),
            (BUFFER_LOADED, StallState::Stalled(start)) => {
                self.total += row.timestamp - start;
                self.state = StallState::Idle;
            }
            _ => {}
        }
    }

    pub fn state(&self) -> StallState {
        self.state
    }

    /// Total of closed intervals so far.
    pub fn total(&self) -> f64 {
        self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferTime {
    pub total_secs: f64,
    /// `total_secs / session_duration`, rounded to 3 decimals.
    pub ratio: f64,
}

/// Stall time and rebuffering ratio of one session.
///
/// `session_duration` must be positive; callers validate it.
pub fn compute_buffer_time<'a>(
    rows: impl IntoIterator<Item = &'a LogRow>,
    session_duration: f64,
) -> BufferTime {
    let mut tracker = StallTracker::new();
    for row in rows {
        tracker.observe(row);
    }
    if let StallState::Stalled(start) = tracker.state() {
        log::debug!("open stall from {} dropped at end of log", start);
    }
    let total_secs = tracker.total();
    BufferTime {
        total_secs,
        ratio: round_to(total_secs / session_duration, 3),
    }
}

/// Rebuffering for a whole file's records.
///
/// Malformed rows are reported and skipped. A header row with fewer than two
/// fields means the file is not an event log: it is reported and yields
/// `None`.
pub fn buffer_time_from_records(
    records: &[RawRecord],
    session_duration: f64,
    source: &str,
) -> Option<BufferTime> {
    let (header, body) = split_header(records);
    if let Some(h) = header {
        if h.fields.len() < 2 {
            diagnostics::warn(format!(
                "Skipping file {} due to malformed header.",
                source
            ));
            return None;
        }
    }

    let rows: Vec<LogRow> = body
        .iter()
        .filter_map(|rec| match LogRow::from_record(rec) {
            Ok(row) => Some(row),
            Err(e) => {
                diagnostics::warn(format!("Skipping row in {}: {}", source, e));
                None
            }
        })
        .collect();

    Some(compute_buffer_time(&rows, session_duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rows(events: &[(f64, &str)]) -> Vec<LogRow> {
        events.iter().map(|&(t, e)| LogRow::new(t, e)).collect()
    }

    fn rec(line: usize, fields: &[&str]) -> RawRecord {
        RawRecord::new(line, fields.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn sums_closed_intervals() {
        let log = rows(&[
            (0.0, BUFFER_STALLED),
            (5.0, BUFFER_LOADED),
            (10.0, BUFFER_STALLED),
            (50.0, BUFFER_LOADED),
        ]);
        assert_eq!(
            compute_buffer_time(&log, 100.0),
            BufferTime {
                total_secs: 45.0,
                ratio: 0.45,
            }
        );
    }

    #[test]
    fn tied_ratio_rounds_to_even() {
        let log = rows(&[(0.0, BUFFER_STALLED), (3.75, BUFFER_LOADED)]);
        assert_eq!(compute_buffer_time(&log, 60.0).ratio, 0.062);

        let log = rows(&[(10.0, BUFFER_STALLED), (16.25, BUFFER_LOADED)]);
        assert_eq!(compute_buffer_time(&log, 100.0).ratio, 0.062);
    }

    #[test]
    fn no_stalls_means_zero() {
        let log = rows(&[(0.0, "playing"), (3.0, BUFFER_LOADED), (9.0, "ended")]);
        let bt = compute_buffer_time(&log, 60.0);
        assert_eq!(bt.total_secs, 0.0);
        assert_eq!(bt.ratio, 0.0);
    }

    #[test]
    fn trailing_open_stall_adds_nothing() {
        let closed = rows(&[(0.0, BUFFER_STALLED), (4.0, BUFFER_LOADED)]);
        let mut open = closed.clone();
        open.push(LogRow::new(20.0, BUFFER_STALLED));

        assert_eq!(
            compute_buffer_time(&open, 60.0),
            compute_buffer_time(&closed, 60.0)
        );

        let mut tracker = StallTracker::new();
        for row in &open {
            tracker.observe(row);
        }
        assert_eq!(tracker.state(), StallState::Stalled(20.0));
    }

    #[test]
    fn repeated_stall_keeps_latest_start() {
        let log = rows(&[
            (0.0, BUFFER_STALLED),
            (6.0, BUFFER_STALLED),
            (10.0, BUFFER_LOADED),
        ]);
        assert_eq!(compute_buffer_time(&log, 60.0).total_secs, 4.0);
    }

    #[test]
    fn total_never_decreases_as_pairs_are_added() {
        let mut log = Vec::new();
        let mut last = 0.0;
        for i in 0..5 {
            let t = i as f64 * 10.0;
            log.push(LogRow::new(t, BUFFER_STALLED));
            log.push(LogRow::new(t + 2.5, BUFFER_LOADED));
            let total = compute_buffer_time(&log, 60.0).total_secs;
            assert!(total >= last);
            last = total;
        }
        assert_eq!(last, 12.5);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let recs = vec![
            rec(1, &["timestamp", "event"]),
            rec(2, &["1", BUFFER_STALLED]),
            rec(3, &["oops", BUFFER_LOADED]),
            rec(4, &["2"]),
            rec(5, &["4", BUFFER_LOADED]),
        ];
        let bt = buffer_time_from_records(&recs, 10.0, "t.qoe.log").unwrap();
        assert_eq!(bt.total_secs, 3.0);
        assert_eq!(bt.ratio, 0.3);
    }

    #[test]
    fn blank_line_is_a_skipped_row() {
        let recs = vec![
            rec(1, &["0", BUFFER_STALLED]),
            rec(2, &[]),
            rec(3, &["2", BUFFER_LOADED]),
        ];
        let bt = buffer_time_from_records(&recs, 10.0, "t.qoe.log").unwrap();
        assert_eq!(bt.total_secs, 2.0);
    }

    #[test]
    fn single_column_header_skips_file() {
        let recs = vec![rec(1, &["events"]), rec(2, &["1", BUFFER_STALLED])];
        assert_eq!(buffer_time_from_records(&recs, 10.0, "t.qoe.log"), None);
    }
}
