//! Bin lookup in ascending x scales.

/// Index `i` with `x[i] <= t < x[i + 1]`.
///
/// Returns `None` when `t` lies below the first value (or is NaN, or `x` is
/// empty), and `x.len() - 1` when `t` is at or above the last value.
#[must_use]
pub fn bin_index(t: f64, x: &[f64]) -> Option<usize> {
    let first = *x.first()?;
    if t.is_nan() || t < first {
        return None;
    }
    Some(x.partition_point(|&v| v <= t) - 1)
}

/// Fractional index of `t` between the bracketing values of `x`.
///
/// `None` outside `[x[0], x[last])`.
#[must_use]
pub fn fractional_index(t: f64, x: &[f64]) -> Option<f64> {
    let i = bin_index(t, x)?;
    let (lo, hi) = (x[i], *x.get(i + 1)?);
    #[allow(clippy::cast_precision_loss)]
    let base = i as f64;
    Some(base + (t - lo) / (hi - lo))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDGES: [f64; 5] = [0.0, 10.0, 20.0, 30.0, 40.0];

    #[test]
    fn test_bin_index() {
        assert_eq!(bin_index(-1.0, &EDGES), None);
        assert_eq!(bin_index(0.0, &EDGES), Some(0));
        assert_eq!(bin_index(9.99, &EDGES), Some(0));
        assert_eq!(bin_index(10.0, &EDGES), Some(1));
        assert_eq!(bin_index(39.0, &EDGES), Some(3));
        assert_eq!(bin_index(40.0, &EDGES), Some(4));
        assert_eq!(bin_index(1e9, &EDGES), Some(4));
        assert_eq!(bin_index(f64::NAN, &EDGES), None);
        assert_eq!(bin_index(1.0, &[]), None);
    }

    #[test]
    fn test_fractional_index() {
        assert_eq!(fractional_index(25.0, &EDGES), Some(2.5));
        assert_eq!(fractional_index(0.0, &EDGES), Some(0.0));
        assert_eq!(fractional_index(40.0, &EDGES), None);
        assert_eq!(fractional_index(-0.5, &EDGES), None);
    }
}
