use crate::error::{QoeError, QoeResult};

pub const BUFFER_STALLED: &str = "bufferStalled";
pub const BUFFER_LOADED: &str = "bufferLoaded";
pub const QUALITY_CHANGE_REQUESTED: &str = "qualityChangeRequested";
pub const QUALITY_CHANGE_RENDERED: &str = "qualityChangeRendered";

/// Player event labels the metrics react to.
pub const EVENT_LABELS: [&str; 4] = [
    BUFFER_STALLED,
    BUFFER_LOADED,
    QUALITY_CHANGE_REQUESTED,
    QUALITY_CHANGE_RENDERED,
];

/// One comma-separated line of a log file, untyped.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 1-based line number in the source file.
    pub line: usize,
    pub fields: Vec<String>,
}

impl RawRecord {
    pub fn new(line: usize, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    /// Column 0 as a number, if present and numeric.
    pub fn timestamp(&self) -> Option<f64> {
        self.fields.first().and_then(|f| parse_number(f))
    }

    /// True when column 1 is one of the known player events.
    pub fn has_event_label(&self) -> bool {
        self.fields
            .get(1)
            .is_some_and(|f| EVENT_LABELS.contains(&f.trim()))
    }

    /// Column 1 as a number, if present and numeric.
    pub fn value(&self) -> Option<f64> {
        self.fields.get(1).and_then(|f| parse_number(f))
    }
}

/// A typed event row: `timestamp, event[, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub timestamp: f64,
    pub event: String,
    /// Column 1 read as a number (bitrate logs).
    pub value: Option<f64>,
}

impl LogRow {
    pub fn new(timestamp: f64, event: impl Into<String>) -> Self {
        let event = event.into();
        let value = parse_number(&event);
        Self {
            timestamp,
            event,
            value,
        }
    }

    /// Type a raw record. Needs at least two fields and a numeric timestamp.
    pub fn from_record(rec: &RawRecord) -> QoeResult<Self> {
        if rec.fields.len() < 2 {
            return Err(QoeError::malformed(
                rec.line,
                format!("expected at least 2 fields, got {:?}", rec.fields),
            ));
        }
        let timestamp = rec.timestamp().ok_or_else(|| {
            QoeError::malformed(
                rec.line,
                format!("non-numeric timestamp {:?}", rec.fields[0]),
            )
        })?;
        Ok(Self::new(timestamp, rec.fields[1].trim()))
    }
}

/// Lenient float parsing: surrounding whitespace is ignored, NaN and
/// infinities count as non-numeric.
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
