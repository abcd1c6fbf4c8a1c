//! # Tables
//!
//! In-memory records keyed by column name, as loaded from a CSV file or built
//! by hand. A table keeps its header order; cells are numeric, text or
//! missing. Analysis code selects numeric columns, drops incomplete records
//! and extracts a dense `ndarray` matrix.

use std::collections::HashMap;

use ndarray::Array2;
use serde::Serialize;

use crate::utils::DataError;

mod reader;

/// Cell text that is read as a missing value.
const MISSING_MARKERS: [&str; 4] = ["", "NA", "NaN", "nan"];

static MISSING: Value = Value::Missing;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Classifies a raw cell: missing markers, then finite numbers, then text.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if MISSING_MARKERS.contains(&raw) {
            return Value::Missing;
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Value::Number(v),
            _ => Value::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Value::Number(v)
        } else {
            Value::Missing
        }
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Value::Missing, Value::from)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

pub type Record = HashMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    pub fn new<C: AsRef<str>>(columns: &[C]) -> Self {
        Table {
            columns: crate::utils::column_names(columns),
            records: Vec::new(),
        }
    }

    /// Appends a record. Keys not yet in the header are added to it in
    /// sorted order; header columns absent from the record read as missing.
    pub fn push(&mut self, record: Record) {
        let mut unseen: Vec<&String> = record
            .keys()
            .filter(|k| !self.columns.contains(*k))
            .collect();
        unseen.sort();
        let unseen: Vec<String> = unseen.into_iter().cloned().collect();
        self.columns.extend(unseen);
        self.records.push(record);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Cell at `row`; an absent key reads as `Value::Missing`.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.records
            .get(row)
            .map(|r| r.get(column).unwrap_or(&MISSING))
    }

    fn check_columns<C: AsRef<str>>(&self, columns: &[C]) -> Result<(), DataError> {
        if columns.is_empty() {
            return Err(DataError::EmptySelection);
        }
        match columns.iter().find(|c| !self.has_column(c.as_ref())) {
            Some(c) => Err(DataError::UnknownColumn(c.as_ref().to_string())),
            None => Ok(()),
        }
    }

    /// Removes every record with a missing value in any of `columns`.
    ///
    /// Returns the cleaned table and, for each kept record, its index in
    /// `self`.
    pub fn drop_missing<C: AsRef<str>>(
        &self,
        columns: &[C],
    ) -> Result<(Table, Vec<usize>), DataError> {
        self.check_columns(columns)?;

        let mut cleaned = Table {
            columns: self.columns.clone(),
            records: Vec::with_capacity(self.records.len()),
        };
        let mut retained = Vec::with_capacity(self.records.len());

        for (i, record) in self.records.iter().enumerate() {
            let complete = columns.iter().all(|c| {
                record
                    .get(c.as_ref())
                    .is_some_and(|v| !v.is_missing())
            });
            if complete {
                cleaned.records.push(record.clone());
                retained.push(i);
            }
        }

        log::debug!(
            "dropped {} of {} records with missing values",
            self.records.len() - cleaned.records.len(),
            self.records.len()
        );

        Ok((cleaned, retained))
    }

    /// Dense records × columns matrix of the selected numeric columns.
    pub fn to_matrix<C: AsRef<str>>(&self, columns: &[C]) -> Result<Array2<f64>, DataError> {
        self.check_columns(columns)?;

        let mut matrix = Array2::zeros((self.records.len(), columns.len()));
        for (i, record) in self.records.iter().enumerate() {
            for (j, column) in columns.iter().enumerate() {
                let column = column.as_ref();
                matrix[[i, j]] = match record.get(column).unwrap_or(&MISSING) {
                    Value::Number(v) => *v,
                    Value::Missing => {
                        return Err(DataError::MissingValue {
                            column: column.to_string(),
                            row: i,
                        })
                    }
                    Value::Text(_) => {
                        return Err(DataError::NonNumeric {
                            column: column.to_string(),
                            row: i,
                        })
                    }
                };
            }
        }
        Ok(matrix)
    }

    /// Text rendering of a categorical column, one entry per record.
    /// Missing cells become empty strings.
    pub fn labels(&self, column: &str) -> Result<Vec<String>, DataError> {
        self.check_columns(&[column])?;

        Ok(self
            .records
            .iter()
            .map(|record| match record.get(column) {
                Some(Value::Text(s)) => s.clone(),
                Some(Value::Number(v)) => v.to_string(),
                Some(Value::Missing) | None => String::new(),
            })
            .collect())
    }
}
