//! Floating point helpers shared by the AHP and budget computations.

/// Tolerance used when checking that a weight vector sums to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Returns true if `a` and `b` differ by at most `tolerance`.
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Returns true if every value is finite and non-negative.
pub fn all_non_negative(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite() && *v >= 0.0)
}

/// Divides every value by the total. Returns `None` if the total is not positive.
pub fn normalize(values: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = values.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    Some(values.iter().map(|v| v / total).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_sums_to_one() {
        let normalized = normalize(&[1.0, 3.0]).unwrap();
        assert_eq!(normalized, vec![0.25, 0.75]);
    }

    #[test]
    fn normalize_rejects_zero_total() {
        assert!(normalize(&[0.0, 0.0]).is_none());
        assert!(normalize(&[]).is_none());
    }

    #[test]
    fn all_non_negative_rejects_nan() {
        assert!(all_non_negative(&[0.0, 1.0]));
        assert!(!all_non_negative(&[0.5, f64::NAN]));
        assert!(!all_non_negative(&[-0.1]));
    }
}
