//! CSV log tables: recorded runs in, generated signals and Bode tables out.
//!
//! Logs carry an integer-microsecond `timestamp` column followed by any
//! number of named value columns.

use std::io::Read;
use std::path::Path;

use lp_core::units;
use lp_signal::{LogTable, SignalError};
use serde::Serialize;
use tracing::debug;

use crate::error::{AppError, AppResult};

pub const TIMESTAMP_COLUMN: &str = "timestamp";

pub fn read_log(path: &Path) -> AppResult<LogTable> {
    let file = std::fs::File::open(path).map_err(|e| AppError::read(path, e))?;
    parse_log(file, path)
}

/// Parse a log from any reader. `origin` is only used in error messages.
pub fn parse_log<R: Read>(reader: R, origin: &Path) -> AppResult<LogTable> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers().map_err(|e| AppError::csv(origin, e))?.clone();
    let ts_index = headers
        .iter()
        .position(|h| h == TIMESTAMP_COLUMN)
        .ok_or_else(|| SignalError::MissingColumn {
            name: TIMESTAMP_COLUMN.to_string(),
        })?;

    let mut stamps = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| AppError::csv(origin, e))?;
        for (col, field) in record.iter().enumerate() {
            if col == ts_index {
                stamps.push(parse_timestamp(field).ok_or_else(|| {
                    AppError::Config(format!(
                        "{}: row {}: bad timestamp '{field}'",
                        origin.display(),
                        row + 1
                    ))
                })?);
            } else if let Some(column) = columns.get_mut(col) {
                column.push(field.parse().map_err(|_| {
                    let what = if field.is_empty() {
                        "empty cell".to_string()
                    } else {
                        format!("'{field}' is not a number")
                    };
                    AppError::Config(format!(
                        "{}: row {}, column '{}': {what}",
                        origin.display(),
                        row + 1,
                        &headers[col]
                    ))
                })?);
            }
        }
    }

    let mut table = LogTable::new(stamps);
    for (col, (name, values)) in headers.iter().zip(columns).enumerate() {
        if col != ts_index {
            table.insert_column(name, values)?;
        }
    }
    debug!(path = %origin.display(), rows = table.len(), "log loaded");
    Ok(table)
}

/// Integer microseconds, tolerating a float rendering such as `1.5e6`.
fn parse_timestamp(field: &str) -> Option<i64> {
    field.parse::<i64>().ok().or_else(|| {
        let v: f64 = field.parse().ok()?;
        v.is_finite().then(|| v.round() as i64)
    })
}

/// Write `timestamp,value` rows for samples taken every `interval` seconds.
pub fn write_signal(path: &Path, interval: f64, values: &[f64]) -> AppResult<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| AppError::csv(path, e))?;
    wtr.write_record([TIMESTAMP_COLUMN, "value"])
        .map_err(|e| AppError::csv(path, e))?;
    for (i, v) in values.iter().enumerate() {
        let stamp = units::seconds_to_micros(i as f64 * interval).round() as i64;
        wtr.write_record([stamp.to_string(), v.to_string()])
            .map_err(|e| AppError::csv(path, e))?;
    }
    wtr.flush().map_err(|e| AppError::write(path, e))?;
    debug!(path = %path.display(), samples = values.len(), "signal written");
    Ok(())
}

/// Write serializable rows with a header taken from their field names.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> AppResult<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| AppError::csv(path, e))?;
    for row in rows {
        wtr.serialize(row).map_err(|e| AppError::csv(path, e))?;
    }
    wtr.flush().map_err(|e| AppError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> AppResult<LogTable> {
        parse_log(text.as_bytes(), Path::new("inline.csv"))
    }

    #[test]
    fn columns_by_name() {
        let table = parse("timestamp,X,Y\n0,1.0,2.0\n10000,1.5,2.5\n20000,2.0,3.5\n").unwrap();
        assert_eq!(table.timestamps_us(), &[0, 10_000, 20_000]);
        assert_eq!(table.column("X").unwrap(), &[1.0, 1.5, 2.0]);
        assert_eq!(table.column("Y").unwrap(), &[2.0, 2.5, 3.5]);
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["X", "Y"]);
    }

    #[test]
    fn float_timestamps_are_rounded() {
        let table = parse("value,timestamp\n3,1.5e6\n4,2000000.4\n").unwrap();
        assert_eq!(table.timestamps_us(), &[1_500_000, 2_000_000]);
        assert_eq!(table.column("value").unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn missing_timestamp_column() {
        let err = parse("time,X\n0,1\n").unwrap_err();
        assert!(matches!(
            err,
            AppError::Signal(SignalError::MissingColumn { .. })
        ));
    }

    #[test]
    fn bad_cell_names_row_and_column() {
        let err = parse("timestamp,X\n0,1\n1,abc\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("row 2"), "{msg}");
        assert!(msg.contains("'X'"), "{msg}");
    }

    #[test]
    fn empty_cell_is_rejected_with_its_row() {
        let err = parse("timestamp,X,Y\n0,1.0,2.0\n10000,1.5,\n20000,2.0,3.0\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        let msg = err.to_string();
        assert!(msg.contains("row 2"), "{msg}");
        assert!(msg.contains("'Y'"), "{msg}");
        assert!(msg.contains("empty cell"), "{msg}");
    }
}
