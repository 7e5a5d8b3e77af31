use crate::grading::domain::RoundingRule;

/// Configurations above this precision are clamped.
pub(crate) const MAX_PRECISION: u8 = 4;

/// Round `value` at `precision` decimal digits under the configured rule.
///
/// Half-down deliberately shares the half-up formula: the upstream grading
/// policy defines both with the same arithmetic for the non-negative scores
/// produced here.
pub(crate) fn round_score(value: f64, rule: RoundingRule, precision: u8) -> f64 {
    let factor = 10f64.powi(precision.min(MAX_PRECISION) as i32);
    match rule {
        RoundingRule::Bankers => (value * factor).round_ties_even() / factor,
        RoundingRule::RoundHalfUp | RoundingRule::RoundHalfDown => {
            (value * factor + 0.5).floor() / factor
        }
        RoundingRule::Standard => (value * factor).round() / factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bankers_rounds_ties_to_even() {
        // 87.125 is exactly representable, so the tie is a true tie.
        assert_eq!(round_score(87.125, RoundingRule::Bankers, 2), 87.12);
        assert_eq!(round_score(87.135, RoundingRule::Bankers, 2), 87.14);
        assert_eq!(round_score(86.5, RoundingRule::Bankers, 0), 86.0);
        assert_eq!(round_score(87.5, RoundingRule::Bankers, 0), 88.0);
    }

    #[test]
    fn half_up_rounds_ties_upward() {
        assert_eq!(round_score(87.125, RoundingRule::RoundHalfUp, 2), 87.13);
        assert_eq!(round_score(86.5, RoundingRule::RoundHalfUp, 0), 87.0);
        assert_eq!(round_score(86.4, RoundingRule::RoundHalfUp, 0), 86.0);
    }

    #[test]
    fn half_down_matches_half_up_for_nonnegative_scores() {
        for value in [0.0, 59.995, 86.4, 86.5, 87.125, 99.9999, 100.0] {
            for precision in 0..=MAX_PRECISION {
                assert_eq!(
                    round_score(value, RoundingRule::RoundHalfDown, precision),
                    round_score(value, RoundingRule::RoundHalfUp, precision),
                    "value {value} precision {precision}"
                );
            }
        }
    }

    #[test]
    fn standard_rule_uses_plain_rounding() {
        assert_eq!(round_score(86.5, RoundingRule::Standard, 0), 87.0);
        assert_eq!(round_score(86.44, RoundingRule::Standard, 1), 86.4);
    }

    #[test]
    fn precision_is_clamped() {
        assert_eq!(
            round_score(86.123456789, RoundingRule::Standard, 9),
            round_score(86.123456789, RoundingRule::Standard, MAX_PRECISION),
        );
    }

    #[test]
    fn zero_precision_rounds_to_integers() {
        assert_eq!(round_score(86.0, RoundingRule::RoundHalfUp, 0), 86.0);
        assert_eq!(round_score(0.0, RoundingRule::Bankers, 0), 0.0);
    }
}
