//! Switching rate: completed quality changes in the trailing window.
//!
//! Only rows within `window_ms` of the last timestamp in the file count.
//! Every `qualityChangeRendered` is matched to the oldest outstanding
//! `qualityChangeRequested`; renders with nothing to match are ignored.

use crate::log::record::{QUALITY_CHANGE_RENDERED, QUALITY_CHANGE_REQUESTED};
use crate::log::{LogRow, RawRecord};
use crate::metrics::round_to;
use std::collections::VecDeque;

/// FIFO of pending requests inside a window ending at `end_time`.
#[derive(Debug, Clone)]
pub struct SwitchWindow {
    end_time: f64,
    window_ms: f64,
    pending: VecDeque<f64>,
    changes: u32,
}

impl SwitchWindow {
    pub fn new(end_time: f64, window_ms: f64) -> Self {
        Self {
            end_time,
            window_ms,
            pending: VecDeque::new(),
            changes: 0,
        }
    }

    fn in_window(&self, t: f64) -> bool {
        self.end_time - t <= self.window_ms
    }

    /// Feed one row. Rows older than the window are ignored.
    pub fn observe(&mut self, row: &LogRow) {
        if !self.in_window(row.timestamp) {
            return;
        }
        match row.event.as_str() {
            QUALITY_CHANGE_REQUESTED => self.pending.push_back(row.timestamp),
            QUALITY_CHANGE_RENDERED => {
                let (end, window) = (self.end_time, self.window_ms);
                self.pending.retain(|&t| end - t <= window);
                if self.pending.pop_front().is_some() {
                    self.changes += 1;
                }
            }
            _ => {}
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn changes(&self) -> u32 {
        self.changes
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchingRate {
    pub quality_changes: u32,
    /// `quality_changes / divisor`, rounded to 4 decimals.
    pub rate: f64,
}

/// Timestamp of the last record with two fields and a numeric timestamp.
pub fn end_time(records: &[RawRecord]) -> Option<f64> {
    records
        .iter()
        .rev()
        .filter(|r| r.fields.len() >= 2)
        .find_map(RawRecord::timestamp)
}

/// Switching rate of one file; `None` when it has no usable end time.
///
/// Rows that cannot be typed (headers included) are skipped.
pub fn compute_switching_rate(
    records: &[RawRecord],
    window_ms: f64,
    divisor: u32,
) -> Option<SwitchingRate> {
    let end = end_time(records)?;
    let mut window = SwitchWindow::new(end, window_ms);
    for row in records.iter().filter_map(|r| LogRow::from_record(r).ok()) {
        window.observe(&row);
    }
    if window.pending() > 0 {
        log::debug!("{} quality change request(s) never rendered", window.pending());
    }

    let quality_changes = window.changes();
    Some(SwitchingRate {
        quality_changes,
        rate: round_to(quality_changes as f64 / divisor as f64, 4),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SWITCH_DIVISOR, WINDOW_MS};
    use pretty_assertions::assert_eq;

    fn recs(events: &[(&str, &str)]) -> Vec<RawRecord> {
        events
            .iter()
            .enumerate()
            .map(|(i, (t, e))| RawRecord::new(i + 1, vec![t.to_string(), e.to_string()]))
            .collect()
    }

    #[test]
    fn renders_match_oldest_requests() {
        let log = recs(&[
            ("0", QUALITY_CHANGE_REQUESTED),
            ("10", QUALITY_CHANGE_REQUESTED),
            ("15", QUALITY_CHANGE_RENDERED),
            ("20", QUALITY_CHANGE_REQUESTED),
            ("25", QUALITY_CHANGE_RENDERED),
            ("35", QUALITY_CHANGE_RENDERED),
        ]);
        assert_eq!(
            compute_switching_rate(&log, WINDOW_MS, SWITCH_DIVISOR),
            Some(SwitchingRate {
                quality_changes: 3,
                rate: 0.1034,
            })
        );
    }

    #[test]
    fn window_holds_outstanding_requests_in_order() {
        let mut w = SwitchWindow::new(100.0, WINDOW_MS);
        w.observe(&LogRow::new(0.0, QUALITY_CHANGE_REQUESTED));
        w.observe(&LogRow::new(10.0, QUALITY_CHANGE_REQUESTED));
        w.observe(&LogRow::new(15.0, QUALITY_CHANGE_RENDERED));
        assert_eq!(w.changes(), 1);
        assert_eq!(w.pending(), 1);
    }

    #[test]
    fn unmatched_render_is_ignored() {
        let log = recs(&[
            ("0", QUALITY_CHANGE_RENDERED),
            ("5", QUALITY_CHANGE_REQUESTED),
            ("9", QUALITY_CHANGE_RENDERED),
            ("12", QUALITY_CHANGE_RENDERED),
        ]);
        let sr = compute_switching_rate(&log, WINDOW_MS, SWITCH_DIVISOR).unwrap();
        assert_eq!(sr.quality_changes, 1);
    }

    #[test]
    fn events_before_the_window_are_ignored() {
        // end time 100000: anything before 40000 is outside the window
        let log = recs(&[
            ("1000", QUALITY_CHANGE_REQUESTED),
            ("39999", QUALITY_CHANGE_RENDERED),
            ("40000", QUALITY_CHANGE_REQUESTED),
            ("50000", QUALITY_CHANGE_RENDERED),
            ("60000", QUALITY_CHANGE_RENDERED),
            ("100000", "playbackEnded"),
        ]);
        let sr = compute_switching_rate(&log, WINDOW_MS, SWITCH_DIVISOR).unwrap();
        assert_eq!(sr.quality_changes, 1);
    }

    #[test]
    fn out_of_window_rows_do_not_stop_the_scan() {
        let log = recs(&[
            ("70000", QUALITY_CHANGE_REQUESTED),
            ("0", QUALITY_CHANGE_REQUESTED),
            ("80000", QUALITY_CHANGE_RENDERED),
            ("90000", "tick"),
        ]);
        let sr = compute_switching_rate(&log, WINDOW_MS, SWITCH_DIVISOR).unwrap();
        assert_eq!(sr.quality_changes, 1);
    }

    #[test]
    fn end_time_skips_trailing_garbage() {
        let mut log = recs(&[
            ("timestamp", "event"),
            ("10", QUALITY_CHANGE_REQUESTED),
            ("20", QUALITY_CHANGE_RENDERED),
        ]);
        log.push(RawRecord::new(4, vec!["30".to_string()]));
        log.push(RawRecord::new(5, vec!["end".to_string(), "x".to_string()]));
        assert_eq!(end_time(&log), Some(20.0));

        let sr = compute_switching_rate(&log, WINDOW_MS, SWITCH_DIVISOR).unwrap();
        assert_eq!(sr.quality_changes, 1);
        assert_eq!(sr.rate, 0.0345);
    }

    #[test]
    fn files_without_end_time_are_skipped() {
        assert_eq!(compute_switching_rate(&[], WINDOW_MS, SWITCH_DIVISOR), None);

        let log = recs(&[("timestamp", "event"), ("n/a", QUALITY_CHANGE_RENDERED)]);
        assert_eq!(compute_switching_rate(&log, WINDOW_MS, SWITCH_DIVISOR), None);
    }
}
