//! Percentile-rank connectivity.

use crate::connectivity::PairScore;
use crate::error::{ConnectivityError, Result};
use statrs::statistics::Statistics;

/// Percentile rank of `score` within `background`, in [0, 100].
///
/// The rank is interpolated linearly between neighbouring sorted background
/// values, which inverts the linearly interpolated quantile: the background
/// median maps to exactly 50. A score equal to a run of tied values takes the
/// midpoint of the run. Scores outside the background range clamp to 0 or 100.
pub fn percentile_of_score(background: &[f64], score: f64) -> Result<f64> {
    if background.is_empty() {
        return Err(ConnectivityError::EmptyDistribution(
            "Percentile rank needs a non-empty background".to_string(),
        ));
    }
    let mut sorted = background.to_vec();
    sorted.sort_by(f64::total_cmp);
    let last = sorted.len() - 1;

    if score < sorted[0] {
        return Ok(0.0);
    }
    if score > sorted[last] {
        return Ok(100.0);
    }
    if last == 0 {
        return Ok(50.0);
    }

    let first_tied = sorted.partition_point(|&v| v < score);
    let past_tied = sorted.partition_point(|&v| v <= score);
    let position = if first_tied < past_tied {
        (first_tied + past_tied - 1) as f64 / 2.0
    } else {
        // sorted[first_tied - 1] < score < sorted[first_tied]
        let (lo, hi) = (sorted[first_tied - 1], sorted[first_tied]);
        (first_tied - 1) as f64 + (score - lo) / (hi - lo)
    };
    Ok(100.0 * position / last as f64)
}

/// Percentile connectivity of a foreground against a background.
///
/// The unsigned score is the distance of the foreground mean's percentile
/// rank from the background midpoint, stretched to [0, 100]. The signed score
/// carries the [`direction`](crate::connectivity::direction) of the pair.
pub fn percentile_score(foreground: &[f64], background: &[f64]) -> Result<PairScore> {
    if foreground.is_empty() {
        return Err(ConnectivityError::EmptyDistribution(
            "Percentile score needs a non-empty foreground".to_string(),
        ));
    }
    let percentile = percentile_of_score(background, foreground.iter().mean())?;
    Ok(PairScore::directed(
        (2.0 * percentile - 100.0).abs(),
        foreground,
        background,
    ))
}
