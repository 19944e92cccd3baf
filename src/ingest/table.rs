use anyhow::{Context, Result};
use std::io::Read;

/// A header row plus data rows, all cells as trimmed strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Read a CSV document. Rows shorter than the header are padded with
    /// empty cells; fully blank rows are dropped.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .context("Failed to read CSV header row")?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV row {}", line + 2))?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            if row.iter().all(|cell| cell.is_empty()) {
                continue;
            }
            row.resize(headers.len().max(row.len()), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::from_csv_reader(text.as_bytes())
    }

    /// Cell at (`row`, `col`), `None` if blank or out of range.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_csv_str() {
        let table = Table::from_csv_str("Marks,Shift\n 55.5 , S1\n40,S2\n").unwrap();
        assert_eq!(table.headers, vec!["Marks", "Shift"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, 0), Some("55.5"));
        assert_eq!(table.cell(0, 1), Some("S1"));
    }

    #[test]
    fn test_short_rows_are_padded_and_blank_rows_dropped() {
        let table = Table::from_csv_str("a,b,c\n1,2\n,,\n4,5,6\n").unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.cell(0, 2), None);
        assert_eq!(table.cell(1, 2), Some("6"));
    }

    #[test]
    fn test_quoted_fields() {
        let table = Table::from_csv_str("name,marks\n\"Rao, K\",12\n").unwrap();
        assert_eq!(table.cell(0, 0), Some("Rao, K"));
    }

    #[test]
    fn test_bom_stripped_from_first_header() {
        let table = Table::from_csv_str("\u{feff}Roll,Marks\n1,2\n").unwrap();
        assert_eq!(table.headers[0], "Roll");
    }

    #[test]
    fn test_cell_out_of_range() {
        let table = Table::from_csv_str("a\n1\n").unwrap();
        assert_eq!(table.cell(5, 0), None);
        assert_eq!(table.cell(0, 5), None);
    }
}
