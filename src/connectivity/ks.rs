//! Two-sample Kolmogorov-Smirnov connectivity.

use crate::connectivity::PairScore;
use crate::error::{ConnectivityError, Result};

/// Two-sample Kolmogorov-Smirnov D statistic: the largest gap between the
/// empirical CDFs of `a` and `b`. Inputs must not contain NaN.
pub fn ks_statistic(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.is_empty() || b.is_empty() {
        return Err(ConnectivityError::EmptyDistribution(format!(
            "KS test needs two non-empty samples, got {} and {} values",
            a.len(),
            b.len()
        )));
    }

    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let (n, m) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut d: f64 = 0.0;

    // Step both CDFs past every value equal to the current minimum so ties
    // are counted on both sides before comparing.
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n - j as f64 / m).abs());
    }
    Ok(d)
}

/// KS connectivity of a foreground against a background.
///
/// The unsigned score is D. The signed score is D times the
/// [`direction`](crate::connectivity::direction) of the pair, so it is 0 when
/// `mean(foreground)` equals `median(background)` exactly.
pub fn ks_test(foreground: &[f64], background: &[f64]) -> Result<PairScore> {
    let statistic = ks_statistic(foreground, background)?;
    Ok(PairScore::directed(statistic, foreground, background))
}
