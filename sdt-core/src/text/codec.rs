//! Text mirror reader and writer
//!
//! Lines end in CR LF and the file ends with a `0x1A` sentinel. Reading
//! stops at the sentinel, at the physical end of the stream, or after
//! [`MAX_SD_ITEMS`] lines, whichever comes first.

use embedded_io::{Read, Write};
use heapless::Vec;

use super::fields::{self, entries, render_line, Field, ParseError, LINE_CAPACITY};
use crate::config::record::ConfigRecord;
use crate::config::MAX_SD_ITEMS;

/// End-of-file sentinel
pub const EOF_MARKER: u8 = 0x1A;

/// Outcome of an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImportReport {
    /// Lines consumed from the stream
    pub lines_read: usize,
    /// Lines whose value was stored in the record
    pub lines_applied: usize,
    /// Lines that could not be parsed; their fields are unchanged
    pub lines_skipped: usize,
    /// Lines beyond the end of the field table
    pub lines_ignored: usize,
}

impl ImportReport {
    /// Whether the stream ended before every field was covered
    pub fn truncated(&self) -> bool {
        self.lines_read < fields::line_count()
    }
}

/// Write `record` as text, returning the number of lines written
pub fn export<W: Write>(record: &ConfigRecord, out: &mut W) -> Result<usize, W::Error> {
    let mut lines = 0;
    for (field, index) in entries() {
        let line = render_line(record, field, index);
        out.write_all(line.as_bytes())?;
        out.write_all(b"\r\n")?;
        lines += 1;
    }
    out.write_all(&[EOF_MARKER])?;
    out.flush()?;

    debug!("Exported {} lines", lines);
    Ok(lines)
}

/// Overlay text from `input` onto `record`, line by line
///
/// Fields past the end of a short file keep their current values. A line
/// that fails to parse leaves its field unchanged and is counted as
/// skipped. I/O errors abort the import with `record` partially updated;
/// callers wanting all-or-nothing import into a copy.
pub fn import<R: Read>(record: &mut ConfigRecord, input: &mut R) -> Result<ImportReport, R::Error> {
    let mut report = ImportReport::default();
    let mut targets = entries();
    let mut line: Vec<u8, LINE_CAPACITY> = Vec::new();
    let mut chunk = [0u8; 64];

    'read: loop {
        let n = input.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        for &byte in &chunk[..n] {
            if report.lines_read >= MAX_SD_ITEMS {
                break 'read;
            }
            match byte {
                EOF_MARKER => {
                    line.clear();
                    break 'read;
                }
                b'\n' => {
                    apply_line(record, &line, targets.next(), &mut report);
                    line.clear();
                }
                // Overlong lines are cut, not split
                _ => {
                    let _ = line.push(byte);
                }
            }
        }
    }

    // Final line without a terminator
    if !line.is_empty() && report.lines_read < MAX_SD_ITEMS {
        apply_line(record, &line, targets.next(), &mut report);
    }

    debug!(
        "Imported {} lines: {} applied, {} skipped, {} ignored",
        report.lines_read, report.lines_applied, report.lines_skipped, report.lines_ignored
    );
    Ok(report)
}

fn apply_line(
    record: &mut ConfigRecord,
    raw: &[u8],
    target: Option<(&'static Field, usize)>,
    report: &mut ImportReport,
) {
    report.lines_read += 1;
    let number = report.lines_read;

    let Some((field, index)) = target else {
        report.lines_ignored += 1;
        return;
    };

    match parse_line(raw).and_then(|(label, value)| {
        check_label(field, index, label, number);
        field.apply(record, index, value)
    }) {
        Ok(()) => report.lines_applied += 1,
        Err(_e) => {
            warn!("Line {}: {}[{}] not applied: {}", number, field.name, index, _e);
            report.lines_skipped += 1;
        }
    }
}

/// Split a raw line into label and value
fn parse_line(raw: &[u8]) -> Result<(&str, &str), ParseError> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let text = core::str::from_utf8(raw).map_err(|_| ParseError::InvalidText)?;
    text.split_once(" = ").ok_or(ParseError::MissingSeparator)
}

fn check_label(field: &Field, index: usize, label: &str, _number: usize) {
    use core::fmt::Write as _;

    let mut expected = heapless::String::<LINE_CAPACITY>::new();
    let _ = write!(expected, "{}", field.label(index));
    if expected.as_str() != label {
        warn!(
            "Line {}: label '{}' where '{}' expected, applying by position",
            _number,
            label,
            expected.as_str()
        );
    }
}
