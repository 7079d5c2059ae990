//! Typed, ordered record sets with column-like field access.
//!
//! A [`RecordSet`] is treated as an immutable value: filtering, sorting and
//! ranking all return a new set and leave the input untouched.

pub mod expr;
mod transform;
mod value;

pub use expr::Predicate;
pub use transform::{RankParams, SortParams};
pub use value::Value;

use std::collections::HashMap;
use std::io::Write;

use crate::error::ValidationError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    /// Build a record set, checking every row has one value per column.
    pub fn from_rows(
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, ValidationError> {
        let mut set = Self::new(columns);
        for row in rows {
            set.push_row(row)?;
        }
        Ok(set)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), ValidationError> {
        if row.len() != self.columns.len() {
            return Err(ValidationError::RowWidth {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        self.rows.get(row).map(|values| Record { set: self, values })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.rows.iter().map(move |values| Record { set: self, values })
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub(crate) fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Return a copy with `name` set to `values`, replacing the column if it
    /// already exists and appending it otherwise.
    pub fn with_column(
        &self,
        name: &str,
        values: Vec<Value>,
    ) -> Result<RecordSet, ValidationError> {
        if values.len() != self.rows.len() {
            return Err(ValidationError::RowWidth {
                expected: self.rows.len(),
                actual: values.len(),
            });
        }
        let mut out = self.clone();
        match out.column_index(name) {
            Some(idx) => {
                for (row, value) in out.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                out.index.insert(name.to_string(), out.columns.len());
                out.columns.push(name.to_string());
                for (row, value) in out.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(out)
    }

    /// Apply [`with_column`](Self::with_column) for several columns at once.
    pub fn with_columns(
        &self,
        columns: Vec<(String, Vec<Value>)>,
    ) -> Result<RecordSet, ValidationError> {
        columns
            .into_iter()
            .try_fold(self.clone(), |set, (name, values)| {
                set.with_column(&name, values)
            })
    }

    /// New set with the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> RecordSet {
        RecordSet {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// New set with `name` moved to the first position.
    pub fn with_column_first(&self, name: &str) -> RecordSet {
        let Some(idx) = self.column_index(name) else {
            return self.clone();
        };
        let mut columns = self.columns.clone();
        let col = columns.remove(idx);
        columns.insert(0, col);
        let mut out = RecordSet::new(columns);
        out.rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                let value = row.remove(idx);
                row.insert(0, value);
                row
            })
            .collect();
        out
    }

    /// Outer concatenation: the result has the union of all columns in order
    /// of first appearance, with nulls where a part lacks a column.
    pub fn concat(parts: Vec<RecordSet>) -> RecordSet {
        let mut columns: Vec<String> = Vec::new();
        for part in &parts {
            for column in &part.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        let mut out = RecordSet::new(columns);
        for part in parts {
            let mapping: Vec<Option<usize>> = out
                .columns
                .iter()
                .map(|c| part.column_index(c))
                .collect();
            for row in part.rows {
                out.rows.push(
                    mapping
                        .iter()
                        .map(|m| m.map(|i| row[i].clone()).unwrap_or(Value::Null))
                        .collect(),
                );
            }
        }
        out
    }

    /// Write the set as headered CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    set: &'a RecordSet,
    values: &'a [Value],
}

impl<'a> Record<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.set.column_index(name).map(|i| &self.values[i])
    }

    /// Numeric field, `None` when missing, null or non-numeric.
    pub fn f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn str(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}
