//! Rectangular table produced by ingestion.

use serde::Serialize;

/// How the header of an ingested table was chosen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    /// Zero-based index, among non-blank records, of the row used as header.
    pub header_row: usize,
    pub header_score: u32,
    /// True when the scored header was garbled and the next row was promoted.
    pub header_fallback: bool,
    pub delimiter: char,
    /// Hex SHA-256 of the input bytes.
    pub digest: String,
}

/// Ordered column names plus ordered rows of cell text.
///
/// Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    report: IngestReport,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>, report: IngestReport) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, String::new());
                r
            })
            .collect();
        Self {
            columns,
            rows,
            report,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn report(&self) -> &IngestReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(move |cells| RowView {
            columns: &self.columns,
            cells,
        })
    }
}

/// Borrowed view of one row as an ordered column → cell mapping.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    columns: &'a [String],
    cells: &'a [String],
}

impl<'a> RowView<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.cells[i].as_str())
    }

    pub fn cell(&self, index: usize) -> Option<&'a str> {
        self.cells.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> IngestReport {
        IngestReport {
            header_row: 0,
            header_score: 0,
            header_fallback: false,
            delimiter: ',',
            digest: String::new(),
        }
    }

    #[test]
    fn short_rows_are_padded() {
        let table = RawTable::new(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into()]],
            report(),
        );
        let row = table.rows().next().unwrap();
        assert_eq!(row.get("a"), Some("1"));
        assert_eq!(row.get("b"), Some(""));
        assert_eq!(row.get("c"), None);
    }

    #[test]
    fn row_iter_preserves_column_order() {
        let table = RawTable::new(
            vec!["x".into(), "y".into()],
            vec![vec!["1".into(), "2".into()]],
            report(),
        );
        let pairs: Vec<_> = table.rows().next().unwrap().iter().collect();
        assert_eq!(pairs, vec![("x", "1"), ("y", "2")]);
    }
}
