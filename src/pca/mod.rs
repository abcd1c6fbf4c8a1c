//! # Principal Component Analysis
//!
//! Centered and scaled PCA over the numeric columns of a [`Table`]. Records
//! with a missing value in a selected column are dropped, each column is
//! standardized with its mean and sample standard deviation, and the
//! standardized matrix is decomposed by an [`SVDImplementation`].
//!
//! Components come out ordered by descending variance. The sort is stable,
//! so exact ties keep the backend's order. Each loading vector is flipped so
//! its largest-magnitude entry is positive, which makes results independent
//! of backend sign choices.

use std::cmp::Ordering;
use std::sync::Arc;

use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView2};
use serde::Serialize;

use crate::dense::ColumnScaling;
use crate::svd::{NalgebraSVD, SVDImplementation};
use crate::table::Table;
use crate::utils::{column_names, DataError};

mod views;
pub use views::{Biplot, BiplotArrow, ScreePoint};

/// Components whose variance is below this fraction of the total are
/// reported as numerically zero.
const DEGENERATE_COMPONENT_RATIO: f64 = 1e-10;

pub struct PCABuilder<S: SVDImplementation> {
    center: bool,
    scale: bool,
    svd_implementation: Arc<S>,
}

impl<S: SVDImplementation> PCABuilder<S> {
    pub fn new(svd_implementation: S) -> Self {
        PCABuilder {
            center: true,
            scale: true,
            svd_implementation: Arc::new(svd_implementation),
        }
    }

    pub fn center(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    pub fn scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    pub fn build(self) -> Pca<S> {
        Pca {
            center: self.center,
            scale: self.scale,
            svd_implementation: self.svd_implementation,
        }
    }
}

impl Default for PCABuilder<NalgebraSVD> {
    fn default() -> Self {
        PCABuilder::new(NalgebraSVD)
    }
}

pub struct Pca<S: SVDImplementation> {
    center: bool,
    scale: bool,
    svd_implementation: Arc<S>,
}

impl<S: SVDImplementation> Pca<S> {
    /// Fits the selected columns of `table`, skipping incomplete records.
    pub fn fit<C: AsRef<str>>(&self, table: &Table, columns: &[C]) -> Result<PcaResult, DataError> {
        let (cleaned, retained_rows) = table.drop_missing(columns)?;
        let x = cleaned.to_matrix(columns)?;

        let mut result = self.fit_matrix(x.view(), &column_names(columns))?;
        result.retained_rows = retained_rows;
        Ok(result)
    }

    /// Fits an already complete records × variables matrix.
    ///
    /// `retained_rows` of the result are `0..n_records`.
    pub fn fit_matrix(&self, x: ArrayView2<f64>, columns: &[String]) -> Result<PcaResult, DataError> {
        let (n_samples, n_features) = x.dim();
        if n_features == 0 || columns.is_empty() {
            return Err(DataError::EmptySelection);
        }
        if columns.len() != n_features {
            return Err(DataError::ShapeMismatch {
                expected: columns.len(),
                found: n_features,
            });
        }
        let required = n_features.max(2);
        if n_samples < required {
            return Err(DataError::InsufficientRows {
                rows: n_samples,
                required,
            });
        }

        let scaling = ColumnScaling::fit(x, columns, self.center, self.scale)?;
        let x_preprocessed = scaling.transform(x)?;

        let (s, vt) = self.svd_implementation.compute(x_preprocessed.view())?;
        if s.len() != n_features || vt.dim() != (n_features, n_features) {
            return Err(DataError::Decomposition(format!(
                "expected {} components, backend returned {} singular values and a {:?} basis",
                n_features,
                s.len(),
                vt.dim()
            )));
        }
        if s.iter().chain(vt.iter()).any(|v| !v.is_finite()) {
            return Err(DataError::Decomposition("backend returned non-finite values".into()));
        }

        // Stable: equal singular values keep the backend's order.
        let mut order: Vec<usize> = (0..n_features).collect();
        order.sort_by(|&a, &b| s[b].partial_cmp(&s[a]).unwrap_or(Ordering::Equal));

        let n_minus_1 = (n_samples - 1) as f64;
        let mut variances = Array1::zeros(n_features);
        let mut loadings = Array2::zeros((n_features, n_features));
        for (k, &idx) in order.iter().enumerate() {
            variances[k] = s[idx] * s[idx] / n_minus_1;

            let mut v = vt.row(idx).to_owned();
            let pivot = v
                .iter()
                .fold(0.0_f64, |acc, &x| if x.abs() > acc.abs() { x } else { acc });
            if pivot < 0.0 {
                v.mapv_inplace(|x| -x);
            }
            loadings.column_mut(k).assign(&v);
        }

        let scores = x_preprocessed.dot(&loadings);

        let total_variance = variances.sum();
        for (k, &var) in variances.iter().enumerate() {
            if var <= DEGENERATE_COMPONENT_RATIO * total_variance {
                warn!(
                    "component PC{} has numerically zero variance ({:e}); selected columns may be collinear",
                    k + 1,
                    var
                );
            }
        }
        debug!(
            "PCA on {} records x {} columns: variances {:?}",
            n_samples,
            n_features,
            variances.to_vec()
        );

        Ok(PcaResult {
            columns: columns.to_vec(),
            scaling,
            variances,
            loadings,
            scores,
            retained_rows: (0..n_samples).collect(),
        })
    }
}

/// Centered and scaled PCA of `columns` with the default `nalgebra` backend.
pub fn compute_pca<C: AsRef<str>>(table: &Table, columns: &[C]) -> Result<PcaResult, DataError> {
    PCABuilder::new(NalgebraSVD).build().fit(table, columns)
}

/// Outcome of a PCA fit.
///
/// Component `k` is column `k` of both `loadings` (variables × components)
/// and `scores` (records × components), and entry `k` of `variances`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcaResult {
    columns: Vec<String>,
    scaling: ColumnScaling,
    variances: Array1<f64>,
    loadings: Array2<f64>,
    scores: Array2<f64>,
    retained_rows: Vec<usize>,
}

impl PcaResult {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn scaling(&self) -> &ColumnScaling {
        &self.scaling
    }

    pub fn center(&self) -> &Array1<f64> {
        self.scaling.mean()
    }

    pub fn scale(&self) -> &Array1<f64> {
        self.scaling.std_dev()
    }

    pub fn variances(&self) -> &Array1<f64> {
        &self.variances
    }

    pub fn loadings(&self) -> &Array2<f64> {
        &self.loadings
    }

    pub fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    /// Indices, in the fitted table, of the records that were scored.
    pub fn retained_rows(&self) -> &[usize] {
        &self.retained_rows
    }

    pub fn n_components(&self) -> usize {
        self.variances.len()
    }

    pub fn n_records(&self) -> usize {
        self.scores.nrows()
    }

    /// Standard deviation of each component.
    pub fn std_devs(&self) -> Array1<f64> {
        self.variances.mapv(f64::sqrt)
    }

    pub fn total_variance(&self) -> f64 {
        self.variances.sum()
    }

    pub fn explained_variance_ratio(&self) -> Array1<f64> {
        let total = self.total_variance();
        self.variances.mapv(|v| v / total)
    }

    pub fn cumulative_variance_ratio(&self) -> Array1<f64> {
        let mut acc = 0.0;
        self.explained_variance_ratio().mapv(|r| {
            acc += r;
            acc
        })
    }

    /// Projects new records (columns in the fitted order) onto the components.
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, DataError> {
        let x_preprocessed = self.scaling.transform(x)?;
        Ok(x_preprocessed.dot(&self.loadings))
    }

    /// Maps component scores back to the original units.
    pub fn reconstruct(&self, scores: ArrayView2<f64>) -> Result<Array2<f64>, DataError> {
        if scores.ncols() != self.n_components() {
            return Err(DataError::ShapeMismatch {
                expected: self.n_components(),
                found: scores.ncols(),
            });
        }
        let standardized = scores.dot(&self.loadings.t());
        self.scaling.inverse_transform(standardized.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svd::CovarianceEigen;
    use crate::table::{Record, Value};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::{array, Axis};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::{Distribution, Normal};

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("x{}", i)).collect()
    }

    fn random_matrix(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut x = Array2::zeros((rows, cols));
        for i in 0..rows {
            let shared = normal.sample(&mut rng);
            for j in 0..cols {
                x[[i, j]] = (j as f64 + 1.0) * shared + normal.sample(&mut rng) + 10.0 * j as f64;
            }
        }
        x
    }

    fn sample_covariance(a: ArrayView2<f64>) -> Array2<f64> {
        let n = a.nrows() as f64;
        let mean = a.mean_axis(Axis(0)).unwrap();
        let centered = &a - &mean;
        centered.t().dot(&centered) / (n - 1.0)
    }

    #[test]
    fn test_variances_sum_to_column_count() {
        let x = random_matrix(60, 5, 1);
        let pca = PCABuilder::new(NalgebraSVD).build();
        let result = pca.fit_matrix(x.view(), &names(5)).unwrap();

        assert_eq!(result.n_components(), 5);
        assert_relative_eq!(result.total_variance(), 5.0, max_relative = 1e-6);
        assert_relative_eq!(
            result.explained_variance_ratio().sum(),
            1.0,
            max_relative = 1e-12
        );
        let cumulative = result.cumulative_variance_ratio();
        assert_relative_eq!(cumulative[4], 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_variances_descending() {
        let x = random_matrix(40, 4, 2);
        let result = PCABuilder::new(NalgebraSVD)
            .build()
            .fit_matrix(x.view(), &names(4))
            .unwrap();

        let v = result.variances();
        for k in 1..v.len() {
            assert!(v[k - 1] >= v[k]);
            assert!(v[k] >= 0.0);
        }
    }

    #[test]
    fn test_scores_uncorrelated() {
        let x = random_matrix(80, 4, 3);
        let result = PCABuilder::new(NalgebraSVD)
            .build()
            .fit_matrix(x.view(), &names(4))
            .unwrap();
        let cov = sample_covariance(result.scores().view());

        for i in 0..4 {
            assert_relative_eq!(cov[[i, i]], result.variances()[i], max_relative = 1e-8);
            for j in 0..4 {
                if i != j {
                    assert_abs_diff_eq!(cov[[i, j]], 0.0, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_loadings_orthonormal_and_sign_normalized() {
        let x = random_matrix(30, 3, 4);
        let result = PCABuilder::new(NalgebraSVD)
            .build()
            .fit_matrix(x.view(), &names(3))
            .unwrap();
        let l = result.loadings();
        let gram = l.t().dot(l);

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(gram[[i, j]], expected, epsilon = 1e-10);
            }
            let column = l.column(i);
            let pivot = column
                .iter()
                .fold(0.0_f64, |acc, &x| if x.abs() > acc.abs() { x } else { acc });
            assert!(pivot > 0.0);
        }
    }

    #[test]
    fn test_backends_agree() {
        let x = random_matrix(50, 4, 5);
        let svd = PCABuilder::new(NalgebraSVD)
            .build()
            .fit_matrix(x.view(), &names(4))
            .unwrap();
        let eigen = PCABuilder::new(CovarianceEigen)
            .build()
            .fit_matrix(x.view(), &names(4))
            .unwrap();

        for (a, b) in svd.variances().iter().zip(eigen.variances().iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-8);
        }
        for (a, b) in svd.scores().iter().zip(eigen.scores().iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_two_correlated_columns() {
        // Standardized pair with correlation r has variances 1 + r and 1 - r.
        let x = array![[1.0, 2.0], [2.0, 1.0], [3.0, 4.0], [4.0, 3.0]];
        let result = PCABuilder::new(NalgebraSVD)
            .build()
            .fit_matrix(x.view(), &names(2))
            .unwrap();

        assert_relative_eq!(result.variances()[0], 1.6, max_relative = 1e-10);
        assert_relative_eq!(result.variances()[1], 0.4, max_relative = 1e-10);
        let inv_sqrt2 = 1.0 / 2.0_f64.sqrt();
        assert_abs_diff_eq!(result.loadings()[[0, 0]].abs(), inv_sqrt2, epsilon = 1e-10);
        assert_abs_diff_eq!(result.loadings()[[1, 0]].abs(), inv_sqrt2, epsilon = 1e-10);
    }

    #[test]
    fn test_transform_and_reconstruct() {
        let x = random_matrix(25, 3, 6);
        let result = PCABuilder::new(NalgebraSVD)
            .build()
            .fit_matrix(x.view(), &names(3))
            .unwrap();

        let projected = result.transform(x.view()).unwrap();
        for (a, b) in projected.iter().zip(result.scores().iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-10);
        }

        let restored = result.reconstruct(result.scores().view()).unwrap();
        for (a, b) in restored.iter().zip(x.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-8);
        }

        assert!(result.reconstruct(x.slice(ndarray::s![.., ..2])).is_err());
    }

    #[test]
    fn test_unscaled_total_variance() {
        let x = array![[1.0, 10.0], [2.0, 30.0], [3.0, 20.0], [4.0, 50.0]];
        let result = PCABuilder::new(NalgebraSVD)
            .scale(false)
            .build()
            .fit_matrix(x.view(), &names(2))
            .unwrap();

        let expected: f64 = x.var_axis(Axis(0), 1.0).sum();
        assert_relative_eq!(result.total_variance(), expected, max_relative = 1e-10);
    }

    #[test]
    fn test_constant_column() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let err = PCABuilder::new(NalgebraSVD)
            .build()
            .fit_matrix(x.view(), &names(2))
            .unwrap_err();
        assert_eq!(
            err,
            DataError::ZeroVariance {
                column: "x1".to_string()
            }
        );
    }

    #[test]
    fn test_small_units_column() {
        let tiny = array![[1e-13, 1.0], [2e-13, 3.0], [3e-13, 2.0], [4e-13, 5.0]];
        let unit = array![[1.0, 1.0], [2.0, 3.0], [3.0, 2.0], [4.0, 5.0]];
        let pca = PCABuilder::new(NalgebraSVD).build();

        let small = pca.fit_matrix(tiny.view(), &names(2)).unwrap();
        let reference = pca.fit_matrix(unit.view(), &names(2)).unwrap();

        assert_relative_eq!(small.total_variance(), 2.0, max_relative = 1e-9);
        for (a, b) in small.variances().iter().zip(reference.variances().iter()) {
            assert_relative_eq!(a, b, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_non_finite_cell() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, f64::INFINITY], [4.0, 1.0]];
        let err = PCABuilder::new(NalgebraSVD)
            .build()
            .fit_matrix(x.view(), &names(2))
            .unwrap_err();
        assert_eq!(
            err,
            DataError::MissingValue {
                column: "x1".to_string(),
                row: 2
            }
        );
    }

    #[test]
    fn test_insufficient_rows() {
        let x = array![[1.0, 2.0, 3.0], [4.0, 5.0, 7.0]];
        let err = PCABuilder::new(NalgebraSVD)
            .build()
            .fit_matrix(x.view(), &names(3))
            .unwrap_err();
        assert_eq!(err, DataError::InsufficientRows { rows: 2, required: 3 });

        let x = array![[1.0]];
        let err = PCABuilder::new(NalgebraSVD)
            .build()
            .fit_matrix(x.view(), &names(1))
            .unwrap_err();
        assert_eq!(err, DataError::InsufficientRows { rows: 1, required: 2 });
    }

    #[test]
    fn test_fit_table_drops_missing() {
        let rows = [
            (Some(1.0), Some(2.0)),
            (None, Some(3.0)),
            (Some(2.0), Some(1.5)),
            (Some(4.0), None),
            (Some(3.0), Some(5.0)),
            (Some(5.0), Some(4.0)),
        ];
        let mut table = Table::new(&["a", "b", "label"]);
        for (i, (a, b)) in rows.iter().enumerate() {
            let mut r = Record::new();
            r.insert("a".to_string(), Value::from(*a));
            r.insert("b".to_string(), Value::from(*b));
            r.insert("label".to_string(), Value::Text(format!("r{}", i)));
            table.push(r);
        }

        let result = compute_pca(&table, &["a", "b"]).unwrap();
        assert_eq!(result.retained_rows(), &[0, 2, 4, 5]);
        assert_eq!(result.scores().nrows(), 4);
        assert_eq!(result.columns(), &["a", "b"]);
        assert_relative_eq!(result.total_variance(), 2.0, max_relative = 1e-10);
    }

    #[test]
    fn test_fit_table_too_few_clean_rows() {
        let mut table = Table::new(&["a", "b", "c"]);
        for (a, b, c) in [(1.0, 2.0, 3.0), (2.0, 1.0, f64::NAN), (4.0, 3.0, 1.0)] {
            let mut r = Record::new();
            r.insert("a".to_string(), Value::from(a));
            r.insert("b".to_string(), Value::from(b));
            r.insert("c".to_string(), Value::from(c));
            table.push(r);
        }

        let err = compute_pca(&table, &["a", "b", "c"]).unwrap_err();
        assert_eq!(err, DataError::InsufficientRows { rows: 2, required: 3 });
    }
}
