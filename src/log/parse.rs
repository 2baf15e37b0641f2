use crate::diagnostics;
use crate::error::{QoeError, QoeResult};
use crate::log::record::RawRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read a comma-separated QoE log into raw records.
///
/// Rows may have any number of fields; typing and tolerance are left to
/// each metric. Example:
/// 1699999999.25,bufferStalled
pub fn read_records(path: &Path) -> QoeResult<Vec<RawRecord>> {
    let file = File::open(path).map_err(|source| QoeError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(file, path)
}

/// Parse records from any reader; `path` is only used in error values.
///
/// Blank lines come back as records with no fields, so callers can treat
/// them like any other short row.
pub fn parse_records<R: Read>(mut input: R, path: &Path) -> QoeResult<Vec<RawRecord>> {
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|source| QoeError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
    let total_lines = line_count(&bytes);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let mut out = Vec::new();
    // The reader skips empty lines; fill the gaps back in.
    let mut next_line = 1;
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| match e.into_kind() {
            csv::ErrorKind::Io(source) => QoeError::FileAccess {
                path: path.to_path_buf(),
                source,
            },
            other => QoeError::Processing {
                path: path.to_path_buf(),
                reason: format!("{:?}", other),
            },
        })?;

        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);
        push_blank_lines(&mut out, next_line, line);

        let fields: Vec<String> = record.iter().map(str::to_string).collect();
        // quoted fields may span several lines
        let spanned: usize = fields.iter().map(|f| f.matches('\n').count()).sum();
        next_line = line + 1 + spanned;
        out.push(RawRecord::new(line, fields));
    }
    push_blank_lines(&mut out, next_line, total_lines + 1);

    Ok(out)
}

fn push_blank_lines(out: &mut Vec<RawRecord>, from: usize, to: usize) {
    out.extend((from..to).map(|line| RawRecord::new(line, Vec::new())));
}

/// Number of lines, a trailing newline not starting a new one.
fn line_count(bytes: &[u8]) -> usize {
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
    match bytes.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}

/// Split off the first record if it is a header.
///
/// A header is a first row whose first field is not numeric. A header that
/// carries a player event label is most likely a data row with a broken
/// timestamp; it is still dropped, with a warning.
pub fn split_header(records: &[RawRecord]) -> (Option<&RawRecord>, &[RawRecord]) {
    match records.split_first() {
        Some((first, rest)) if first.timestamp().is_none() => {
            if first.has_event_label() {
                diagnostics::warn(format!(
                    "Dropping line {} as header, but it looks like an event row: {:?}",
                    first.line, first.fields
                ));
            }
            (Some(first), rest)
        }
        _ => (None, records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Vec<RawRecord> {
        parse_records(text.as_bytes(), Path::new("test.qoe.log")).unwrap()
    }

    #[test]
    fn keeps_ragged_rows_and_line_numbers() {
        let recs = parse("time,event\n0,bufferStalled\n5\n10,bufferLoaded,extra\n");
        assert_eq!(recs.len(), 4);
        assert_eq!(recs[2], RawRecord::new(3, vec!["5".to_string()]));
        assert_eq!(recs[3].fields.len(), 3);
        assert_eq!(recs[3].line, 4);
    }

    #[test]
    fn blank_lines_become_empty_records() {
        let recs = parse("time,bitrate\n0,500\n\n1,5000\n\n");
        let lines: Vec<(usize, usize)> = recs.iter().map(|r| (r.line, r.fields.len())).collect();
        assert_eq!(lines, vec![(1, 2), (2, 2), (3, 0), (4, 2), (5, 0)]);

        assert!(parse("").is_empty());
        assert_eq!(parse("0,500").len(), 1);
    }

    #[test]
    fn quoted_newlines_are_not_blank_lines() {
        let recs = parse("0,\"buffer\nStalled\"\n5,bufferLoaded\n");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].line, 3);
    }

    #[test]
    fn header_is_detected_by_non_numeric_first_field() {
        let recs = parse("time,event\n0,bufferStalled\n");
        let (header, body) = split_header(&recs);
        assert_eq!(header.map(|h| h.fields[0].as_str()), Some("time"));
        assert_eq!(body.len(), 1);

        let recs = parse("0,bufferStalled\n5,bufferLoaded\n");
        let (header, body) = split_header(&recs);
        assert!(header.is_none());
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn event_row_with_broken_timestamp_is_flagged() {
        let recs = parse("oops,bufferStalled\n5,bufferLoaded\n");
        assert!(recs[0].has_event_label());
        let (header, body) = split_header(&recs);
        assert_eq!(header.map(|h| h.line), Some(1));
        assert_eq!(body.len(), 1);

        let recs = parse("timestamp,event\n0,bufferStalled\n");
        assert!(!recs[0].has_event_label());
    }

    #[test]
    fn missing_file_is_a_file_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_records(&dir.path().join("absent.qoe.log")).unwrap_err();
        assert!(matches!(err, QoeError::FileAccess { .. }));
    }

    #[test]
    fn invalid_utf8_is_a_processing_error() {
        let bytes: &[u8] = b"0,buffer\xffStalled\n";
        let err = parse_records(bytes, Path::new("bad.qoe.log")).unwrap_err();
        assert!(matches!(err, QoeError::Processing { .. }));
    }
}
