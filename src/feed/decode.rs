//! Decoding of headered CSV feed bodies into typed record sets.

use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AcquisitionError;
use crate::record::{RecordSet, Value};

lazy_static! {
    static ref DATE_RE: Regex = Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("Invalid date pattern");
    static ref DATETIME_RE: Regex =
        Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}T\d{2}:\d{2}:\d{2}\.\d{1,6}Z$").expect("Invalid datetime pattern");
}

const MISSING_TOKENS: &[&str] = &["", "null", "NULL", "NA", "NaN", "nan"];

/// Column the feed uses to report a failed search.
pub const ERROR_COLUMN: &str = "error";

/// Decode one response body.
///
/// Columns are typed as a whole: all integers become `Int`, all numbers
/// `Float`, anything else stays text unless its first value looks like a
/// percentage or a date. Dots in column names become underscores. A body
/// carrying an `error` column fails with [`AcquisitionError::Feed`].
pub fn decode(key: &str, body: &str) -> Result<RecordSet, AcquisitionError> {
    let body = body.strip_prefix('\u{feff}').unwrap_or(body);
    if body.trim().is_empty() {
        return Ok(RecordSet::default());
    }

    let decode_err = |e: csv::Error| AcquisitionError::Decode {
        key: key.to_string(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());
    let raw_headers: Vec<String> = reader
        .headers()
        .map_err(decode_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); raw_headers.len()];
    for record in reader.records() {
        let record = record.map_err(decode_err)?;
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(if MISSING_TOKENS.contains(&field) {
                None
            } else {
                Some(field.to_string())
            });
        }
    }

    if let Some(idx) = raw_headers.iter().position(|h| h == ERROR_COLUMN) {
        let message = cells[idx]
            .iter()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| "unspecified feed error".to_string());
        return Err(AcquisitionError::Feed {
            key: key.to_string(),
            message,
        });
    }

    let row_count = cells.first().map(Vec::len).unwrap_or(0);
    let mut columns = Vec::with_capacity(raw_headers.len());
    for (header, raw) in raw_headers.iter().zip(cells) {
        columns.push(type_column(key, header, raw)?);
    }

    let names = raw_headers.iter().map(|h| h.replace('.', "_")).collect();
    let mut rows: Vec<Vec<Value>> = (0..row_count)
        .map(|_| Vec::with_capacity(columns.len()))
        .collect();
    for column in columns {
        for (row, value) in rows.iter_mut().zip(column) {
            row.push(value);
        }
    }

    RecordSet::from_rows(names, rows).map_err(|e| AcquisitionError::Decode {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn type_column(
    key: &str,
    header: &str,
    raw: Vec<Option<String>>,
) -> Result<Vec<Value>, AcquisitionError> {
    let present = || raw.iter().flatten();

    if present().all(|v| v.parse::<i64>().is_ok()) {
        return Ok(raw
            .iter()
            .map(|v| v.as_deref().and_then(|s| s.parse::<i64>().ok()).into())
            .collect());
    }
    if present().all(|v| v.parse::<f64>().is_ok()) {
        return Ok(raw
            .iter()
            .map(|v| v.as_deref().and_then(|s| s.parse::<f64>().ok()).into())
            .collect());
    }

    let Some(first) = present().next().cloned() else {
        return Ok(vec![Value::Null; raw.len()]);
    };

    if first.ends_with('%') || header.ends_with('%') {
        return raw
            .into_iter()
            .map(|v| match v {
                None => Ok(Value::Null),
                Some(s) => s
                    .replace('%', "")
                    .trim()
                    .parse::<f64>()
                    .map(|x| Value::Float(x / 100.0))
                    .map_err(|_| AcquisitionError::Decode {
                        key: key.to_string(),
                        message: format!("column {} holds non-percentage '{}'", header, s),
                    }),
            })
            .collect();
    }

    if DATE_RE.is_match(&first) {
        return Ok(raw
            .into_iter()
            .map(|v| match v {
                None => Value::Null,
                Some(s) => match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                    Ok(date) => Value::Date(date),
                    Err(_) => Value::Str(s),
                },
            })
            .collect());
    }

    if DATETIME_RE.is_match(&first) {
        return Ok(raw
            .into_iter()
            .map(|v| match v {
                None => Value::Null,
                Some(s) => match NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.fZ") {
                    Ok(dt) => Value::DateTime(dt),
                    Err(_) => Value::Str(s),
                },
            })
            .collect());
    }

    Ok(raw.into_iter().map(Value::from).collect())
}
