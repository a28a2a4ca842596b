//! CSV series reader: `date,value` rows with a header line.
//!
//! Blank values and `.` (the FRED missing-value marker) are skipped rather
//! than rejected; a malformed date or number is an error.

use chrono::NaiveDate;
use std::io::Read;
use std::path::Path;

use super::transforms::{normalize, SeriesPoint};
use super::SeriesError;

/// Read a series from a CSV file.
pub fn read_series_file(path: &Path) -> Result<Vec<SeriesPoint>, SeriesError> {
    let file = std::fs::File::open(path)?;
    read_series(file).map_err(|e| match e {
        SeriesError::Parse { line, message } => SeriesError::Parse {
            line,
            message: format!("{}: {message}", path.display()),
        },
        other => other,
    })
}

/// Read a series from any CSV source. Output is sorted by date.
pub fn read_series<R: Read>(source: R) -> Result<Vec<SeriesPoint>, SeriesError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(::csv::Trim::All)
        .from_reader(source);

    let mut points = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let line = i + 2;
        let date_field = record.get(0).unwrap_or("");
        let value_field = record.get(1).unwrap_or("");

        if value_field.is_empty() || value_field == "." {
            continue;
        }

        let date = NaiveDate::parse_from_str(date_field, "%Y-%m-%d").map_err(|e| {
            SeriesError::Parse {
                line,
                message: format!("bad date '{date_field}': {e}"),
            }
        })?;
        let value: f64 = value_field.parse().map_err(|e| SeriesError::Parse {
            line,
            message: format!("bad value '{value_field}': {e}"),
        })?;
        points.push(SeriesPoint::new(date, value));
    }

    normalize(&mut points);
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_sorts() {
        let data = "date,value\n2024-01-03,3.5\n2024-01-01,1.25\n";
        let pts = read_series(data.as_bytes()).unwrap();
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[0].value, 1.25);
        assert_eq!(pts[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[test]
    fn skips_fred_missing_marker() {
        let data = "DATE,RRPONTSYD\n2024-01-01,.\n2024-01-02,\n2024-01-03,450.1\n";
        let pts = read_series(data.as_bytes()).unwrap();
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].value, 450.1);
    }

    #[test]
    fn bad_date_reports_line() {
        let data = "date,value\n2024-01-01,1\nnot-a-date,2\n";
        match read_series(data.as_bytes()) {
            Err(SeriesError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn bad_value_is_rejected() {
        let data = "date,value\n2024-01-01,abc\n";
        assert!(read_series(data.as_bytes()).is_err());
    }
}
