//! Fiat to USDT conversion.

/// Round `value` to two decimal places, with halves rounded away from zero.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert `fiat_amount` into USDT at `rate` fiat units per USDT.
///
/// The result is rounded to two decimal places. Returns `None` when the rate
/// is not positive or either input is not a finite number.
pub fn convert(fiat_amount: f64, rate: f64) -> Option<f64> {
    if !fiat_amount.is_finite() || !rate.is_finite() || rate <= 0.0 {
        return None;
    }

    Some(round_to_cents(fiat_amount / rate))
}

#[cfg(test)]
mod tests {
    use super::{convert, round_to_cents};

    #[test]
    fn divides_and_rounds() {
        assert_eq!(convert(80120.0, 4006.0), Some(20.0));
        assert_eq!(convert(1000.0, 180.0), Some(5.56));
        assert_eq!(convert(-1000.0, 180.0), Some(-5.56));
    }

    #[test]
    fn zero_or_negative_rate_is_rejected() {
        assert_eq!(convert(100.0, 0.0), None);
        assert_eq!(convert(100.0, -1.0), None);
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        assert_eq!(convert(f64::NAN, 180.0), None);
        assert_eq!(convert(100.0, f64::NAN), None);
        assert_eq!(convert(f64::INFINITY, 180.0), None);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to_cents(0.125), 0.13);
        assert_eq!(round_to_cents(-0.125), -0.13);
        assert_eq!(round_to_cents(4006.004), 4006.0);
    }
}
