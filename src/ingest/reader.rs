//! Byte decoding, delimiter sniffing and header selection.

use super::header::{detect_header_row, finalize_columns, needs_fallback, HEADER_SCAN_ROWS};
use super::IngestError;
use crate::domain::{IngestReport, RawTable};
use sha2::{Digest, Sha256};
use tracing::debug;

const CANDIDATE_DELIMITERS: [char; 3] = [',', '\t', ';'];

/// Read an export of unknown layout into a [`RawTable`].
///
/// Fails only for empty input or bytes the CSV reader cannot split into
/// records; header problems degrade to synthetic `col_N` names.
pub fn ingest(bytes: &[u8]) -> Result<RawTable, IngestError> {
    let digest = content_digest(bytes);
    let text = decode_text(bytes);
    if text.trim().is_empty() {
        return Err(IngestError::Empty);
    }

    let delimiter = sniff_delimiter(&text);
    let records = read_records(&text, delimiter)?;
    if records.is_empty() {
        return Err(IngestError::Empty);
    }

    let (mut header_row, header_score) = detect_header_row(&records).unwrap_or((0, 0));
    let mut header_fallback = false;
    if needs_fallback(&records[header_row]) && header_row + 1 < records.len() {
        header_row += 1;
        header_fallback = true;
    }

    let width = records[header_row..]
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0);
    let mut header = records[header_row].clone();
    header.resize(width, String::new());
    let columns = finalize_columns(&header);
    let rows = records[header_row + 1..].to_vec();

    debug!(
        header_row,
        header_score,
        header_fallback,
        delimiter = ?delimiter,
        columns = ?columns,
        rows = rows.len(),
        "Ingested table"
    );

    Ok(RawTable::new(
        columns,
        rows,
        IngestReport {
            header_row,
            header_score,
            header_fallback,
            delimiter,
            digest,
        },
    ))
}

/// Hex SHA-256 of the raw input.
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Decode UTF-8 (BOM optional) or BOM-marked UTF-16; invalid sequences
/// become U+FFFD so they surface as garbled names instead of errors.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(b"\xFF\xFE") {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(b"\xFE\xFF") {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    String::from_utf8_lossy(bytes).into_owned()
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Pick the candidate delimiter that occurs most often in the leading lines.
/// Ties resolve in `, \t ;` order.
pub fn sniff_delimiter(text: &str) -> char {
    let sample: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(HEADER_SCAN_ROWS)
        .collect();

    let mut best = (',', 0usize);
    for d in CANDIDATE_DELIMITERS {
        let count: usize = sample.iter().map(|l| l.matches(d).count()).sum();
        if count > best.1 {
            best = (d, count);
        }
    }
    best.0
}

fn read_records(text: &str, delimiter: char) -> Result<Vec<Vec<String>>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::Csv(e.to_string()))?;
        let cells: Vec<String> = record
            .iter()
            .map(|c| c.trim_matches(|ch: char| ch.is_whitespace() || ch == '\u{FEFF}'))
            .map(str::to_string)
            .collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        records.push(cells);
    }
    Ok(records)
}
