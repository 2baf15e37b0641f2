//! Fixed domain constants and the tunable parameters built from them.
//!
//! Sessions are assumed to be 30 segments long. The normalizers below are
//! not derived from the logs; a short log is scored against the full
//! session length.

use anyhow::bail;

/// Segments per session, divisor of the mean utility.
pub const TOTAL_SEGMENTS: i64 = 30;

/// Segment boundaries per session (30 - 1), divisor of the switching rate.
pub const SWITCH_DIVISOR: u32 = 29;

/// Trailing window for switching events, in milliseconds.
pub const WINDOW_MS: f64 = 60_000.0;

/// Session duration used by the rebuffering ratio when none is given.
pub const DEFAULT_SESSION_SECS: f64 = 60.0;

pub const CLASS_COUNT: u32 = 100;
pub const TRACES_PER_CLASS: u32 = 10;
pub const SAMPLES_PER_TRACE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricParams {
    pub total_segments: i64,
    pub switch_divisor: u32,
    pub window_ms: f64,
}

impl Default for MetricParams {
    fn default() -> Self {
        Self {
            total_segments: TOTAL_SEGMENTS,
            switch_divisor: SWITCH_DIVISOR,
            window_ms: WINDOW_MS,
        }
    }
}

impl MetricParams {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.window_ms.is_nan() || self.window_ms < 0.0 {
            bail!("window must be a non-negative number of ms, got {}", self.window_ms);
        }
        if self.switch_divisor == 0 {
            bail!("switch divisor must be at least 1");
        }
        Ok(())
    }
}

/// Shape of the class/trace/sample grid on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetLayout {
    pub classes: u32,
    pub traces: u32,
    pub samples: u32,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            classes: CLASS_COUNT,
            traces: TRACES_PER_CLASS,
            samples: SAMPLES_PER_TRACE,
        }
    }
}
