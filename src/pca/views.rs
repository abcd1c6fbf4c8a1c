use serde::Serialize;

use super::PcaResult;
use crate::utils::DataError;

/// One bar of a scree plot. `component` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreePoint {
    pub component: usize,
    pub variance: f64,
    pub ratio: f64,
    pub cumulative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiplotArrow {
    pub variable: String,
    pub x: f64,
    pub y: f64,
}

/// Scaled scores and loading arrows for two components.
///
/// Scores are divided by `sdev * sqrt(n)` and loadings multiplied by it,
/// the `scale = 1` convention of R's `biplot.prcomp`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Biplot {
    pub components: (usize, usize),
    pub points: Vec<(f64, f64)>,
    pub arrows: Vec<BiplotArrow>,
}

impl PcaResult {
    pub fn scree(&self) -> Vec<ScreePoint> {
        let ratio = self.explained_variance_ratio();
        let cumulative = self.cumulative_variance_ratio();

        self.variances
            .iter()
            .enumerate()
            .map(|(k, &variance)| ScreePoint {
                component: k + 1,
                variance,
                ratio: ratio[k],
                cumulative: cumulative[k],
            })
            .collect()
    }

    /// Biplot data for 1-based components `pc_x` and `pc_y`.
    pub fn biplot(&self, pc_x: usize, pc_y: usize) -> Result<Biplot, DataError> {
        let available = self.n_components();
        for index in [pc_x, pc_y] {
            if index == 0 || index > available {
                return Err(DataError::ComponentOutOfRange { index, available });
            }
        }
        let (i, j) = (pc_x - 1, pc_y - 1);

        let sqrt_n = (self.n_records() as f64).sqrt();
        let lam_x = self.variances[i].sqrt() * sqrt_n;
        let lam_y = self.variances[j].sqrt() * sqrt_n;
        // A zero-variance component has all-zero scores; leave them unscaled.
        let safe = |lam: f64| if lam > 0.0 { lam } else { 1.0 };

        let points = self
            .scores
            .rows()
            .into_iter()
            .map(|row| (row[i] / safe(lam_x), row[j] / safe(lam_y)))
            .collect();

        let arrows = self
            .columns
            .iter()
            .enumerate()
            .map(|(v, name)| BiplotArrow {
                variable: name.clone(),
                x: self.loadings[[v, i]] * lam_x,
                y: self.loadings[[v, j]] * lam_y,
            })
            .collect();

        Ok(Biplot {
            components: (pc_x, pc_y),
            points,
            arrows,
        })
    }
}
