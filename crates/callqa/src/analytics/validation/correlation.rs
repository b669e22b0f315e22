use serde::Serialize;

/// Pearson product-moment correlation between paired samples.
///
/// Returns 0 when fewer than two pairs are supplied or when either series has
/// zero variance. The result is clamped to `[-1, 1]` so floating-point drift
/// never leaks past the mathematical bounds.
pub fn pearson(pairs: &[(f64, f64)]) -> f64 {
    let n = pairs.len();
    if n < 2 {
        return 0.0;
    }

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2, mut sum_y2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
        sum_y2 += y * y;
    }

    let n = n as f64;
    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    let r = numerator / denominator;
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    pub fn from_coefficient(r: f64) -> Self {
        if r > 0.7 {
            Self::Strong
        } else if r > 0.3 {
            Self::Moderate
        } else {
            Self::Weak
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_linear_relationship() {
        let pairs = [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)];
        assert!((pearson(&pairs) - 1.0).abs() < 1e-12);

        let inverse = [(1.0, 6.0), (2.0, 4.0), (3.0, 2.0)];
        assert!((pearson(&inverse) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_yield_zero() {
        assert_eq!(pearson(&[]), 0.0);
        assert_eq!(pearson(&[(80.0, 50.0)]), 0.0);
        assert_eq!(pearson(&[(70.0, 10.0), (70.0, 90.0), (70.0, 40.0)]), 0.0);
    }

    #[test]
    fn swapping_axes_leaves_coefficient_unchanged() {
        let pairs = [(62.0, 40.0), (71.5, 55.0), (88.0, 61.0), (45.0, 20.0), (90.0, 33.0)];
        let swapped: Vec<(f64, f64)> = pairs.iter().map(|&(x, y)| (y, x)).collect();
        let r = pearson(&pairs);
        assert_eq!(r, pearson(&swapped));
        assert!((-1.0..=1.0).contains(&r));
    }

    #[test]
    fn strength_thresholds_are_exclusive() {
        assert_eq!(CorrelationStrength::from_coefficient(0.71), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::from_coefficient(0.7), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_coefficient(0.3), CorrelationStrength::Weak);
    }
}
