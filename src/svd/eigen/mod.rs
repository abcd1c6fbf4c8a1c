use ndarray::{Array1, Array2, ArrayView2};
use nshare::{IntoNalgebra, IntoNdarray2};

use super::SVDImplementation;
use crate::utils::DataError;

/// Singular values and right singular vectors obtained from the symmetric
/// eigen-decomposition of `XᵀX`.
///
/// Equivalent to an SVD for the tall, well-conditioned matrices PCA sees;
/// eigenvalues that round below zero are clamped before the square root.
pub struct CovarianceEigen;

impl SVDImplementation for CovarianceEigen {
    fn compute(&self, matrix: ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>), DataError> {
        let gram = matrix.t().dot(&matrix);
        let eigen = nalgebra::SymmetricEigen::new(gram.into_nalgebra());

        if eigen.eigenvalues.iter().any(|l| !l.is_finite()) {
            return Err(DataError::Decomposition(
                "eigenvalues of the cross-product matrix are not finite".into(),
            ));
        }

        let s = Array1::from_iter(eigen.eigenvalues.iter().map(|&l| l.max(0.0).sqrt()));
        let vt = eigen.eigenvectors.transpose().into_ndarray2().into_owned();
        Ok((s, vt))
    }
}
