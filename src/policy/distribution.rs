//! Temperature softmax and inverse-CDF sampling shared by every policy.

/// Convert `values` into a probability vector at `temperature`.
///
/// ```text
/// softmax(v, t)_i = exp(v_i/t − m) / Σ_j exp(v_j/t − m),  m = max(v/t)
/// ```
///
/// Subtracting the maximum keeps every exponent ≤ 0, so inputs that differ by
/// orders of magnitude cannot overflow.
///
/// Entries are finite, in [0, 1], and sum to 1. Entries only reach exactly 0
/// when their exponent underflows (a value hundreds of units below the
/// maximum after scaling). A degenerate sum (non-finite input) falls back to
/// the uniform distribution.
pub fn softmax(values: &[f64], temperature: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let max = values
        .iter()
        .map(|v| v / temperature)
        .fold(f64::NEG_INFINITY, f64::max);
    let mut out: Vec<f64> = values
        .iter()
        .map(|v| (v / temperature - max).exp())
        .collect();
    let sum: f64 = out.iter().sum();
    if !(sum > 0.0 && sum.is_finite()) {
        let uniform = 1.0 / values.len() as f64;
        return vec![uniform; values.len()];
    }
    for p in &mut out {
        *p /= sum;
    }
    out
}

/// Inverse-CDF draw: the first index whose cumulative probability exceeds
/// `draw`. The last index absorbs any shortfall from rounding.
pub fn sample_index(probabilities: &[f64], draw: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, p) in probabilities.iter().enumerate() {
        cumulative += p;
        if cumulative > draw {
            return i;
        }
    }
    probabilities.len().saturating_sub(1)
}

/// Scale `values` in place so they sum to 1. Leaves them untouched when the
/// sum is zero or not finite.
pub fn normalise(values: &mut [f64]) {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_distribution(p: &[f64]) {
        assert!(p.iter().all(|x| x.is_finite() && *x >= 0.0 && *x <= 1.0), "{:?}", p);
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum={}", sum);
    }

    #[test]
    fn test_softmax_is_distribution() {
        let p = softmax(&[0.1, 0.5, 0.2, 0.9, 0.0], 0.4);
        assert_distribution(&p);
        assert!(p.iter().all(|x| *x > 0.0 && *x < 1.0));
        // Larger values get more mass.
        assert!(p[3] > p[1] && p[1] > p[2]);
    }

    #[test]
    fn test_softmax_survives_dominant_value() {
        for values in [
            vec![1e6, 1.0, 1e-6],
            vec![-1e9, 3.0, 2.0],
            vec![700.0, 710.0, 720.0],
            vec![1e300, 1e-300, 0.0],
        ] {
            let p = softmax(&values, 1.0);
            assert_distribution(&p);
        }
    }

    #[test]
    fn test_softmax_temperature_sharpens() {
        let values = [0.2, 0.8];
        let soft = softmax(&values, 1.0);
        let sharp = softmax(&values, 0.1);
        assert!(sharp[1] > soft[1]);
    }

    #[test]
    fn test_softmax_empty_and_single() {
        assert!(softmax(&[], 1.0).is_empty());
        assert_eq!(softmax(&[42.0], 0.4), vec![1.0]);
    }

    #[test]
    fn test_sample_index_walks_cdf() {
        let p = [0.25, 0.25, 0.5];
        assert_eq!(sample_index(&p, 0.0), 0);
        assert_eq!(sample_index(&p, 0.3), 1);
        assert_eq!(sample_index(&p, 0.5), 2);
        assert_eq!(sample_index(&p, 0.99), 2);
    }

    #[test]
    fn test_sample_index_falls_back_to_last() {
        // Cumulative sum falls short of the draw.
        assert_eq!(sample_index(&[0.3, 0.3, 0.3], 0.95), 2);
        assert_eq!(sample_index(&[], 0.5), 0);
    }

    #[test]
    fn test_normalise() {
        let mut v = [1.0, 3.0];
        normalise(&mut v);
        assert_eq!(v, [0.25, 0.75]);
        let mut zeros = [0.0, 0.0];
        normalise(&mut zeros);
        assert_eq!(zeros, [0.0, 0.0]);
    }
}
