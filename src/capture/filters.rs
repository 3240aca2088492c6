//! Smoothing and simple point-wise operations on calibrated traces.
use crate::capture::units::round_to_decimals;
/// Savitzky-Golay smoother: a least-squares polynomial of degree `order`
/// fitted over a sliding window of `window` samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SavitzkyGolay {
    window: usize,
    order: usize,
}
impl Default for SavitzkyGolay {
    fn default() -> Self {
        Self {
            window: 11,
            order: 2,
        }
    }
}
impl SavitzkyGolay {
    /// An even window is widened by one; the order is capped below the window.
    pub fn new(window: usize, order: usize) -> Self {
        let window = if window % 2 == 0 { window + 1 } else { window };
        Self {
            window,
            order: order.min(window - 1),
        }
    }
    pub fn window(&self) -> usize {
        self.window
    }
    pub fn order(&self) -> usize {
        self.order
    }
    /// Convolution weights for the centre sample, `window` entries long.
    pub fn weights(&self) -> Vec<f64> {
        let half = (self.window / 2) as i64;
        let terms = self.order + 1;
        // Normal equations (A^T A) x = e0 with A[i][j] = i^j. Row 0 of
        // (A^T A)^-1 A^T is then x . A^T.
        let mut normal = vec![vec![0.0; terms]; terms];
        for i in -half..=half {
            for (r, row) in normal.iter_mut().enumerate() {
                for (c, cell) in row.iter_mut().enumerate() {
                    *cell += (i as f64).powi((r + c) as i32);
                }
            }
        }
        let mut rhs = vec![0.0; terms];
        rhs[0] = 1.0;
        let x = solve(normal, rhs);
        (-half..=half)
            .map(|i| {
                x.iter()
                    .enumerate()
                    .map(|(j, xj)| xj * (i as f64).powi(j as i32))
                    .sum()
            })
            .collect()
    }
    /// Smoothed copy of `samples`. The first and last `window / 2` samples are
    /// copied unchanged.
    pub fn smooth(&self, samples: &[f64]) -> Vec<f64> {
        let half = self.window / 2;
        if samples.len() < self.window {
            return samples.to_vec();
        }
        let weights = self.weights();
        let mut out = samples.to_vec();
        for i in half..samples.len() - half {
            out[i] = samples[i - half..=i + half]
                .iter()
                .zip(&weights)
                .map(|(s, w)| s * w)
                .sum();
        }
        out
    }
}
/// Gauss-Jordan elimination with partial pivoting on a small dense system.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&p, &q| a[p][col].abs().total_cmp(&a[q][col].abs()))
            .unwrap_or(col);
        a.swap(col, pivot);
        b.swap(col, pivot);
        let p = a[col][col];
        if p == 0.0 {
            continue;
        }
        for j in 0..n {
            a[col][j] /= p;
        }
        b[col] /= p;
        for row in 0..n {
            if row != col {
                let f = a[row][col];
                for j in 0..n {
                    a[row][j] -= f * a[col][j];
                }
                b[row] -= f * b[col];
            }
        }
    }
    b
}
/// Central difference `(x[i+1] - x[i-1]) / 2`, zero at both ends, rounded to
/// `decimals` places.
pub fn central_derivative(samples: &[f64], decimals: usize) -> Vec<f64> {
    let n = samples.len();
    (0..n)
        .map(|i| {
            if i == 0 || i + 1 >= n {
                0.0
            } else {
                round_to_decimals((samples[i + 1] - samples[i - 1]) / 2.0, decimals)
            }
        })
        .collect()
}
/// Coefficient of determination of `fitted` against `original`.
/// `None` for empty or mismatched inputs and for a constant original.
pub fn r_squared(original: &[f64], fitted: &[f64]) -> Option<f64> {
    if original.is_empty() || original.len() != fitted.len() {
        return None;
    }
    let mean = original.iter().sum::<f64>() / original.len() as f64;
    let ss_res: f64 = original
        .iter()
        .zip(fitted)
        .map(|(o, f)| (o - f).powi(2))
        .sum();
    let ss_tot: f64 = original.iter().map(|o| (o - mean).powi(2)).sum();
    (ss_tot > 0.0).then(|| 1.0 - ss_res / ss_tot)
}
pub fn invert(samples: &[f64]) -> Vec<f64> {
    samples.iter().map(|v| -v).collect()
}
/// Shift the trace so that `baseline` lands on zero.
pub fn align_baseline(samples: &[f64], baseline: f64) -> Vec<f64> {
    samples.iter().map(|v| v - baseline).collect()
}
