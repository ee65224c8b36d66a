//! Scalar coercion and result shaping
//!
//! SQL*Plus only ever hands back text. Values are coerced opportunistically
//! (integer, then float, then trimmed text) and then shaped into the
//! structure the caller asked for: a single record, a list of rows, or a
//! mapping keyed by one column.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A single coerced value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Coerce text to an integer, else a finite float, else trimmed text.
    pub fn coerce(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Scalar::Text(String::new());
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Scalar::Integer(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Scalar::Float(f),
            _ => Scalar::Text(trimmed.to_string()),
        }
    }

    /// Text used when this value becomes a mapping key.
    pub fn key_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A flat record: column name to value, in column order
pub type Record = IndexMap<String, Scalar>;

/// Shaped result handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultSet {
    /// Unmodified engine output
    Raw(String),
    /// Whole output coerced as one value
    Scalar(Scalar),
    /// One row zipped against the column list
    Record(Record),
    /// One list of values per row
    Rows(Vec<Vec<Scalar>>),
    /// All values of all rows in a single list
    Flat(Vec<Scalar>),
    /// Rows keyed by one column's value
    Keyed(IndexMap<String, Record>),
}

impl ResultSet {
    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        match self {
            ResultSet::Raw(s) => usize::from(!s.is_empty()),
            ResultSet::Scalar(_) => 1,
            ResultSet::Record(r) => r.len(),
            ResultSet::Rows(rows) => rows.len(),
            ResultSet::Flat(values) => values.len(),
            ResultSet::Keyed(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split row text into fields.
///
/// Rows are CSV records: plain `a,b,c` lines and quoted `"a","b,c"` lines
/// both parse. Unquoted blank lines are skipped; a quoted `""` is a NULL
/// value and stays. Every row must carry exactly `width` fields.
pub fn parse_rows(text: &str, width: usize) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() == 1 && record[0].trim().is_empty() && !starts_quoted(text, &record) {
            continue;
        }
        if record.len() != width {
            return Err(Error::RowShape {
                expected: width,
                found: record.len(),
                line: record.iter().collect::<Vec<_>>().join(","),
            });
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Whether `record` opened with a quote. Its position may include the
/// empty lines the reader skipped before it.
fn starts_quoted(text: &str, record: &csv::StringRecord) -> bool {
    record
        .position()
        .and_then(|pos| usize::try_from(pos.byte()).ok())
        .and_then(|start| text.as_bytes().get(start..))
        .and_then(|rest| rest.iter().find(|&&b| !matches!(b, b'\r' | b'\n')))
        == Some(&b'"')
}

/// Coerce every field of every row.
pub fn coerce_rows(rows: &[Vec<String>]) -> Vec<Vec<Scalar>> {
    rows.iter()
        .map(|row| row.iter().map(|field| Scalar::coerce(field)).collect())
        .collect()
}

/// Zip one row against the column list.
pub fn shape_record(columns: &[String], row: &[Scalar]) -> Record {
    columns.iter().cloned().zip(row.iter().cloned()).collect()
}

/// Rows as nested lists, or as one flat list when `flatten` is set.
pub fn shape_rows(rows: Vec<Vec<Scalar>>, flatten: bool) -> ResultSet {
    if flatten {
        ResultSet::Flat(rows.into_iter().flatten().collect())
    } else {
        ResultSet::Rows(rows)
    }
}

/// Key rows by `key_column`, each mapped to its full record.
///
/// The key column is matched case-insensitively. Uniqueness is not checked:
/// when several rows share a key, the last one wins.
pub fn shape_keyed(
    columns: &[String],
    rows: &[Vec<Scalar>],
    key_column: &str,
) -> Option<IndexMap<String, Record>> {
    let key_index = columns
        .iter()
        .position(|c| c.eq_ignore_ascii_case(key_column))?;

    let mut keyed = IndexMap::new();
    for row in rows {
        if let Some(key) = row.get(key_index) {
            keyed.insert(key.key_string(), shape_record(columns, row));
        }
    }
    Some(keyed)
}
