//! # Singular value decomposition backends
//!
//! The PCA engine only needs the singular values and right singular vectors
//! of the standardized matrix. Each backend returns them in its own order and
//! with its own sign choices; ordering and sign normalization happen in
//! [`crate::pca`].
//!
//! - [`NalgebraSVD`]: thin SVD from `nalgebra` (default).
//! - [`CovarianceEigen`]: symmetric eigen-decomposition of `XᵀX`.
//! - `FaerSVD`: SVD from `faer`, behind the `faer` feature.

use ndarray::{Array1, Array2, ArrayView2};

use crate::utils::DataError;

pub mod eigen;
pub mod full;

#[cfg(feature = "faer")]
pub mod faer;

pub use eigen::CovarianceEigen;
pub use full::NalgebraSVD;

#[cfg(feature = "faer")]
pub use self::faer::FaerSVD;

pub trait SVDImplementation: Send + Sync {
    /// Returns the singular values of `matrix` and `Vᵀ`, whose rows are the
    /// matching right singular vectors.
    fn compute(&self, matrix: ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>), DataError>;
}
