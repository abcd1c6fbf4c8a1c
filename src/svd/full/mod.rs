use ndarray::{Array1, Array2, ArrayView2};
use nshare::{IntoNalgebra, IntoNdarray2};

use super::SVDImplementation;
use crate::utils::DataError;

pub struct SVD {
    s: Array1<f64>,
    vt: Array2<f64>,
}

impl SVD {
    pub fn new(x: ArrayView2<f64>) -> Result<Self, DataError> {
        let matrix = x.to_owned().into_nalgebra();

        let svd = nalgebra::SVD::new(matrix, false, true);
        let vt = svd
            .v_t
            .ok_or_else(|| DataError::Decomposition("right singular vectors were not computed".into()))?;

        Ok(SVD {
            s: Array1::from(svd.singular_values.as_slice().to_vec()),
            vt: vt.into_ndarray2().into_owned(),
        })
    }

    pub fn s(&self) -> &Array1<f64> {
        &self.s
    }

    pub fn vt(&self) -> &Array2<f64> {
        &self.vt
    }
}

pub struct NalgebraSVD;

impl SVDImplementation for NalgebraSVD {
    fn compute(&self, matrix: ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>), DataError> {
        let svd = SVD::new(matrix)?;
        Ok((svd.s, svd.vt))
    }
}
