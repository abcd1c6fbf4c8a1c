//! # Descriptive statistics
//!
//! Column summaries for a [`Table`] and covariance / correlation matrices for
//! a records × variables matrix. Order statistics come from `statrs`, which
//! uses the median-unbiased (R type 8) quantile estimator.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::Serialize;
use statrs::statistics::{Data, Max, Min, OrderStatistics};

use crate::dense::ColumnScaling;
use crate::table::{Table, Value};
use crate::utils::DataError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    /// Numeric cells.
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; needs at least two values.
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    fn from_values(column: &str, values: Vec<f64>, missing: usize) -> Self {
        let count = values.len();
        if count == 0 {
            return ColumnSummary {
                column: column.to_string(),
                count,
                missing,
                mean: None,
                std_dev: None,
                min: None,
                q1: None,
                median: None,
                q3: None,
                max: None,
            };
        }

        let array = Array1::from(values.clone());
        let mean = array.mean();
        let std_dev = if count > 1 { Some(array.std(1.0)) } else { None };

        let mut data = Data::new(values);
        ColumnSummary {
            column: column.to_string(),
            count,
            missing,
            mean,
            std_dev,
            min: Some(Min::min(&data)),
            q1: Some(data.quantile(0.25)),
            median: Some(data.quantile(0.5)),
            q3: Some(data.quantile(0.75)),
            max: Some(Max::max(&data)),
        }
    }
}

/// Summaries of `columns`. Text cells are neither counted nor missing.
pub fn summarize<C: AsRef<str>>(table: &Table, columns: &[C]) -> Result<Vec<ColumnSummary>, DataError> {
    if columns.is_empty() {
        return Err(DataError::EmptySelection);
    }

    columns
        .iter()
        .map(|column| {
            let column = column.as_ref();
            if !table.has_column(column) {
                return Err(DataError::UnknownColumn(column.to_string()));
            }

            let mut values = Vec::with_capacity(table.len());
            let mut missing = 0;
            for row in 0..table.len() {
                match table.get(row, column) {
                    Some(Value::Number(v)) => values.push(*v),
                    Some(Value::Missing) | None => missing += 1,
                    Some(Value::Text(_)) => {}
                }
            }
            Ok(ColumnSummary::from_values(column, values, missing))
        })
        .collect()
}

/// Sample covariance (divisor `n - 1`) of the columns of `x`.
pub fn covariance_matrix(x: ArrayView2<f64>) -> Result<Array2<f64>, DataError> {
    let n_samples = x.nrows();
    if n_samples < 2 {
        return Err(DataError::InsufficientRows {
            rows: n_samples,
            required: 2,
        });
    }

    let mean = x.mean_axis(Axis(0)).ok_or(DataError::InsufficientRows {
        rows: n_samples,
        required: 2,
    })?;
    let centered = &x - &mean;
    Ok(centered.t().dot(&centered) / (n_samples as f64 - 1.0))
}

/// Pearson correlation of the columns of `x`. A constant column has no
/// defined correlation and is rejected.
pub fn correlation_matrix(x: ArrayView2<f64>, columns: &[String]) -> Result<Array2<f64>, DataError> {
    let scaling = ColumnScaling::fit(x, columns, true, true)?;
    let z = scaling.transform(x)?;

    let mut corr = z.t().dot(&z) / (x.nrows() as f64 - 1.0);
    for i in 0..corr.nrows() {
        corr[[i, i]] = 1.0;
    }
    corr.mapv_inplace(|r| r.clamp(-1.0, 1.0));
    Ok(corr)
}

/// Correlation of `columns` over the records of `table` complete in them.
pub fn correlation_table<C: AsRef<str>>(table: &Table, columns: &[C]) -> Result<Array2<f64>, DataError> {
    let (cleaned, _) = table.drop_missing(columns)?;
    let x = cleaned.to_matrix(columns)?;
    correlation_matrix(x.view(), &crate::utils::column_names(columns))
}
