use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::Serialize;

use crate::utils::DataError;

/// Standard deviations at or below this fraction of the column's largest
/// absolute value are treated as zero.
const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Per-column centering and scaling fitted on a records × variables matrix.
///
/// Means and sample standard deviations (divisor `n - 1`) are always
/// computed; `center` and `scale` decide which of them `transform` applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnScaling {
    mean: Array1<f64>,
    std_dev: Array1<f64>,
    center: bool,
    scale: bool,
}

impl ColumnScaling {
    pub fn fit(
        x: ArrayView2<f64>,
        columns: &[String],
        center: bool,
        scale: bool,
    ) -> Result<Self, DataError> {
        let (n_samples, n_features) = x.dim();
        if columns.len() != n_features {
            return Err(DataError::ShapeMismatch {
                expected: columns.len(),
                found: n_features,
            });
        }
        if n_samples < 2 {
            return Err(DataError::InsufficientRows {
                rows: n_samples,
                required: 2,
            });
        }

        if let Some(((row, j), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(DataError::MissingValue {
                column: columns[j].clone(),
                row,
            });
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or(DataError::InsufficientRows {
                rows: n_samples,
                required: 2,
            })?;
        let std_dev = x.std_axis(Axis(0), 1.0);

        for (j, (&sd, column)) in std_dev.iter().zip(x.columns()).enumerate() {
            let magnitude = column.fold(0.0_f64, |acc, v| acc.max(v.abs()));
            if sd == 0.0 || sd <= ZERO_VARIANCE_TOLERANCE * magnitude {
                return Err(DataError::ZeroVariance {
                    column: columns[j].clone(),
                });
            }
        }

        Ok(ColumnScaling {
            mean,
            std_dev,
            center,
            scale,
        })
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn std_dev(&self) -> &Array1<f64> {
        &self.std_dev
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, DataError> {
        self.check_width(x.ncols())?;
        let mut x_preprocessed = x.to_owned();

        if self.center {
            for mut row in x_preprocessed.axis_iter_mut(Axis(0)) {
                row -= &self.mean;
            }
        }

        if self.scale {
            for mut row in x_preprocessed.axis_iter_mut(Axis(0)) {
                row /= &self.std_dev;
            }
        }

        Ok(x_preprocessed)
    }

    /// Undoes `transform`: multiply by the standard deviation, then add the mean.
    pub fn inverse_transform(&self, z: ArrayView2<f64>) -> Result<Array2<f64>, DataError> {
        self.check_width(z.ncols())?;
        let mut restored = z.to_owned();

        if self.scale {
            for mut row in restored.axis_iter_mut(Axis(0)) {
                row *= &self.std_dev;
            }
        }

        if self.center {
            for mut row in restored.axis_iter_mut(Axis(0)) {
                row += &self.mean;
            }
        }

        Ok(restored)
    }

    fn check_width(&self, ncols: usize) -> Result<(), DataError> {
        if ncols != self.n_features() {
            return Err(DataError::ShapeMismatch {
                expected: self.n_features(),
                found: ncols,
            });
        }
        Ok(())
    }
}
