//! Aggregation primitives shared by the engine and reporting.
//!
//! Percentiles use nearest-rank on the sorted sample:
//! `index = floor(p * (n - 1))`, zero-indexed. Not interpolated.

/// Arithmetic mean. `None` for an empty sample.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Nearest-rank percentile for `p` in `[0, 1]`. `None` for an empty sample.
pub fn percentile_nearest_rank(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = (p * (sorted.len() - 1) as f64).floor() as usize;
    Some(sorted[idx])
}

/// 95th percentile, nearest-rank.
pub fn p95(values: &[f64]) -> Option<f64> {
    percentile_nearest_rank(values, 0.95)
}

/// Fraction of `true` outcomes. `None` for an empty sample.
pub fn pass_rate(outcomes: &[bool]) -> Option<f64> {
    if outcomes.is_empty() {
        return None;
    }
    let passed = outcomes.iter().filter(|v| **v).count();
    Some(passed as f64 / outcomes.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean_basic() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }

    #[test]
    fn test_p95_five_values() {
        // n = 5, idx = floor(0.95 * 4) = 3 -> sorted[3] = 4
        assert_eq!(p95(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some(4.0));
    }

    #[test]
    fn test_p95_ten_values() {
        // n = 10, idx = floor(0.95 * 9) = 8 -> sorted[8] = 9
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        assert_eq!(p95(&values), Some(9.0));
    }

    #[test]
    fn test_p95_unsorted_input() {
        assert_eq!(p95(&[5.0, 1.0, 4.0, 2.0, 3.0]), Some(4.0));
    }

    #[test]
    fn test_p95_single_value() {
        assert_eq!(p95(&[42.0]), Some(42.0));
    }

    #[test]
    fn test_p95_empty() {
        assert_eq!(p95(&[]), None);
    }

    #[test]
    fn test_p50_nearest_rank() {
        // n = 4, idx = floor(0.5 * 3) = 1 -> sorted[1] = 2
        assert_eq!(
            percentile_nearest_rank(&[1.0, 2.0, 3.0, 4.0], 0.5),
            Some(2.0)
        );
    }

    #[test]
    fn test_pass_rate() {
        assert_eq!(pass_rate(&[]), None);
        assert_eq!(pass_rate(&[true, true, false, false]), Some(0.5));
        assert_eq!(pass_rate(&[true]), Some(1.0));
    }
}
