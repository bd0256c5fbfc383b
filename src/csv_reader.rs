use crate::data::{DataError, Row, RowSet, Value};
use std::io::{self, Read};

/// Read CSV rows (with header) from any reader.
/// Empty cells become null, numeric cells become numbers, everything else text.
pub fn read_rows<R: Read>(reader: R) -> Result<RowSet, DataError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        let mut row = Row::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            row.insert(header.clone(), parse_cell(cell));
        }
        rows.push(row);
    }

    Ok(RowSet::new(rows))
}

pub fn read_rows_from_stdin() -> Result<RowSet, DataError> {
    read_rows(io::stdin().lock())
}

fn parse_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    // "inf" and "NaN" parse as f64 but are not counts
    match cell.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::Text(cell.to_string()),
    }
}
