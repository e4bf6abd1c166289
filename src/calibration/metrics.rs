//! Error statistics between simulated and metered series.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

/// Score assigned to a trial whose simulation or comparison failed.
pub const FAILED_TRIAL_PENALTY: f64 = 1e10;

/// Goodness-of-fit statistics for one simulated series against actual data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMetrics {
    /// Root-mean-square error.
    pub rmse: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Mean absolute percentage error over pairs with non-zero actual values;
    /// 0 when every actual value is zero.
    pub mape: f64,
    /// Coefficient of determination; 0 when the actual series is constant.
    pub r_squared: f64,
    /// Largest absolute error.
    pub max_error: f64,
    /// 1-based position of the largest error within the compared pairs.
    pub max_error_month: usize,
}

impl ComparisonMetrics {
    /// Metrics standing in for a failed trial so it ranks last.
    pub fn penalty() -> Self {
        Self {
            rmse: FAILED_TRIAL_PENALTY,
            mae: FAILED_TRIAL_PENALTY,
            mape: FAILED_TRIAL_PENALTY,
            r_squared: 0.0,
            max_error: FAILED_TRIAL_PENALTY,
            max_error_month: 0,
        }
    }
}

/// Computes comparison metrics over paired values.
///
/// Pairs where either value is NaN are dropped before any statistic is
/// computed.
///
/// # Errors
///
/// Returns [`MetricsError::LengthMismatch`] if the slices differ in length and
/// [`MetricsError::InsufficientData`] if no valid pairs remain.
pub fn compute_metrics(simulated: &[f64], actual: &[f64]) -> Result<ComparisonMetrics, MetricsError> {
    if simulated.len() != actual.len() {
        return Err(MetricsError::LengthMismatch {
            simulated: simulated.len(),
            actual: actual.len(),
        });
    }

    let pairs: Vec<(f64, f64)> = simulated
        .iter()
        .zip(actual)
        .filter(|(s, a)| !s.is_nan() && !a.is_nan())
        .map(|(&s, &a)| (s, a))
        .collect();
    if pairs.is_empty() {
        return Err(MetricsError::InsufficientData);
    }

    let n = pairs.len() as f64;
    let actual_mean = pairs.iter().map(|&(_, a)| a).sum::<f64>() / n;

    let mut sq_sum = 0.0;
    let mut abs_sum = 0.0;
    let mut pct_sum = 0.0;
    let mut pct_count = 0_usize;
    let mut ss_tot = 0.0;
    let mut max_error = 0.0;
    let mut max_index = 0;

    for (i, &(s, a)) in pairs.iter().enumerate() {
        let err = s - a;
        sq_sum += err * err;
        abs_sum += err.abs();
        if a != 0.0 {
            pct_sum += (err / a).abs() * 100.0;
            pct_count += 1;
        }
        ss_tot += (a - actual_mean) * (a - actual_mean);
        if err.abs() > max_error {
            max_error = err.abs();
            max_index = i;
        }
    }

    let mape = if pct_count > 0 {
        pct_sum / pct_count as f64
    } else {
        0.0
    };
    let r_squared = if ss_tot != 0.0 { 1.0 - sq_sum / ss_tot } else { 0.0 };

    Ok(ComparisonMetrics {
        rmse: (sq_sum / n).sqrt(),
        mae: abs_sum / n,
        mape,
        r_squared,
        max_error,
        max_error_month: max_index + 1,
    })
}

impl fmt::Display for ComparisonMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RMSE={:.2}  MAE={:.2}  MAPE={:.2}%  R²={:.4}  max={:.2} (month {})",
            self.rmse, self.mae, self.mape, self.r_squared, self.max_error, self.max_error_month
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identical_series_are_perfect() {
        let x = [10.0, 12.0, 15.0, 11.0];
        let m = compute_metrics(&x, &x);
        assert_eq!(
            m,
            Ok(ComparisonMetrics {
                rmse: 0.0,
                mae: 0.0,
                mape: 0.0,
                r_squared: 1.0,
                max_error: 0.0,
                max_error_month: 1,
            })
        );
    }

    #[test]
    fn rmse_mae_and_max_error() {
        // errors: [1, -1, 2, -2] -> sq mean 2.5
        let sim = [11.0, 9.0, 12.0, 8.0];
        let act = [10.0, 10.0, 10.0, 10.0];
        let Ok(m) = compute_metrics(&sim, &act) else {
            panic!("metrics should compute");
        };
        assert_abs_diff_eq!(m.rmse, 2.5_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(m.mae, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(m.mape, 15.0, epsilon = 1e-12);
        assert_eq!(m.max_error, 2.0);
        assert_eq!(m.max_error_month, 3);
        // constant actual series
        assert_eq!(m.r_squared, 0.0);
    }

    #[test]
    fn r_squared_for_imperfect_fit() {
        let act = [1.0, 2.0, 3.0];
        let sim = [1.0, 2.0, 4.0];
        let m = compute_metrics(&sim, &act).map(|m| m.r_squared);
        // SS_res = 1, SS_tot = 2
        assert_eq!(m, Ok(0.5));
    }

    #[test]
    fn nan_pairs_are_dropped() {
        let sim = [1.0, f64::NAN, 3.0, 5.0];
        let act = [1.0, 2.0, f64::NAN, 7.0];
        let Ok(m) = compute_metrics(&sim, &act) else {
            panic!("metrics should compute");
        };
        assert_abs_diff_eq!(m.mae, 1.0, epsilon = 1e-12);
        // position within the filtered pairs
        assert_eq!(m.max_error_month, 2);
    }

    #[test]
    fn mape_skips_zero_actuals() {
        let m = compute_metrics(&[1.0, 12.0], &[0.0, 10.0]).map(|m| m.mape);
        assert_eq!(m, Ok(20.0));
    }

    #[test]
    fn mape_is_zero_when_all_actuals_are_zero() {
        let m = compute_metrics(&[1.0, 2.0], &[0.0, 0.0]).map(|m| m.mape);
        assert_eq!(m, Ok(0.0));
    }

    #[test]
    fn no_valid_pairs_is_an_error() {
        assert_eq!(compute_metrics(&[], &[]), Err(MetricsError::InsufficientData));
        assert_eq!(
            compute_metrics(&[f64::NAN], &[1.0]),
            Err(MetricsError::InsufficientData)
        );
    }

    #[test]
    fn length_mismatch_is_an_error() {
        assert_eq!(
            compute_metrics(&[1.0, 2.0], &[1.0]),
            Err(MetricsError::LengthMismatch {
                simulated: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn penalty_ranks_below_real_scores() {
        assert!(ComparisonMetrics::penalty().rmse > 1e9);
    }
}
