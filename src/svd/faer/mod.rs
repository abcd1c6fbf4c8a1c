use faer_ext::*;
use ndarray::{Array1, Array2, ArrayView2};

use super::SVDImplementation;
use crate::utils::DataError;

pub struct SVD {
    s: Array1<f64>,
    vt: Array2<f64>,
}

impl SVD {
    pub fn new(array: &ArrayView2<f64>) -> Self {
        let faer_mat = array.into_faer();
        let svd = faer_mat.thin_svd();
        let s: Array1<f64> = Array1::from_iter(svd.s_diagonal().iter().cloned());
        let vt = svd.v().transpose().into_ndarray().to_owned();

        SVD { s, vt }
    }

    pub fn s(&self) -> &Array1<f64> {
        &self.s
    }

    pub fn vt(&self) -> &Array2<f64> {
        &self.vt
    }
}

pub struct FaerSVD;

impl SVDImplementation for FaerSVD {
    fn compute(&self, matrix: ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>), DataError> {
        let svd = SVD::new(&matrix);
        if svd.s.iter().any(|v| !v.is_finite()) {
            return Err(DataError::Decomposition("faer returned non-finite singular values".into()));
        }
        Ok((svd.s, svd.vt))
    }
}
