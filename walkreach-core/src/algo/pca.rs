//! Principal component analysis over a small feature matrix

use ndarray::prelude::*;

const MAX_SWEEPS: usize = 100;
const OFF_DIAGONAL_EPS: f64 = 1e-18;
const VARIANCE_EPS: f64 = 1e-12;

/// Principal components of a standardized feature matrix
#[derive(Debug, Clone)]
pub struct Pca {
    /// Descending
    eigenvalues: Array1<f64>,
    /// One eigenvector per column, in eigenvalue order
    components: Array2<f64>,
    /// Row scores on every component
    scores: Array2<f64>,
}

impl Pca {
    /// Standardizes `data` (rows are observations) and decomposes its
    /// covariance matrix
    pub fn fit(data: &ArrayView2<f64>) -> Self {
        let standardized = standardize(data);
        let rows = standardized.nrows();
        let covariance = if rows > 0 {
            standardized.t().dot(&standardized) / rows as f64
        } else {
            Array2::zeros((data.ncols(), data.ncols()))
        };

        let (eigenvalues, components) = symmetric_eigen(&covariance);
        let scores = standardized.dot(&components);
        Self {
            eigenvalues,
            components,
            scores,
        }
    }

    pub fn eigenvalues(&self) -> ArrayView1<'_, f64> {
        self.eigenvalues.view()
    }

    pub fn components(&self) -> ArrayView2<'_, f64> {
        self.components.view()
    }

    pub fn scores(&self) -> ArrayView2<'_, f64> {
        self.scores.view()
    }

    /// Share of total variance per component. All zero when the data has no
    /// variance.
    pub fn explained_variance_ratio(&self) -> Array1<f64> {
        let clamped = self.eigenvalues.mapv(|value| value.max(0.0));
        let total = clamped.sum();
        if total > 0.0 {
            clamped / total
        } else {
            Array1::zeros(clamped.len())
        }
    }

    /// Fewest leading components whose cumulative explained variance reaches
    /// `threshold`
    pub fn components_for_variance(&self, threshold: f64) -> usize {
        let ratios = self.explained_variance_ratio();
        let mut cumulative = 0.0;
        for (i, ratio) in ratios.iter().enumerate() {
            if *ratio == 0.0 {
                return i;
            }
            cumulative += ratio;
            if cumulative + VARIANCE_EPS >= threshold {
                return i + 1;
            }
        }
        ratios.len()
    }

    /// Per-row sum of the scores on the first `count` components
    pub fn summed_scores(&self, count: usize) -> Array1<f64> {
        let count = count.min(self.scores.ncols());
        self.scores.slice(s![.., ..count]).sum_axis(Axis(1))
    }
}

/// Zero mean and unit population variance per column; constant columns
/// become 0
pub fn standardize(data: &ArrayView2<f64>) -> Array2<f64> {
    let mut standardized = data.to_owned();
    if data.nrows() == 0 {
        return standardized;
    }

    for mut column in standardized.columns_mut() {
        let mean = column.mean().unwrap_or(0.0);
        let std = column.std(0.0);
        if std > VARIANCE_EPS {
            column.mapv_inplace(|value| (value - mean) / std);
        } else {
            column.fill(0.0);
        }
    }
    standardized
}

/// Cyclic Jacobi eigen decomposition of a symmetric matrix.
///
/// Returns eigenvalues in descending order with matching eigenvector
/// columns. Each eigenvector is signed so its largest-magnitude entry is
/// positive.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = matrix.nrows();
    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    for _ in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| (0..n).filter(move |&q| q != p).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum();
        if off < OFF_DIAGONAL_EPS {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (akp, akq) = (a[[k, p]], a[[k, q]]);
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[[p, k]], a[[q, k]]);
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

    let eigenvalues = order.iter().map(|&i| a[[i, i]]).collect::<Array1<f64>>();
    let mut components = Array2::zeros((n, n));
    for (target, &source) in order.iter().enumerate() {
        let column = v.column(source);
        let pivot = column
            .iter()
            .copied()
            .fold(0.0_f64, |best, value| if value.abs() > best.abs() { value } else { best });
        let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
        components
            .column_mut(target)
            .assign(&column.mapv(|value| value * sign));
    }

    (eigenvalues, components)
}
