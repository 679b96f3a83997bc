//! Payload rendering for published readings.

/// Round half away from zero to `dp` decimal places.
///
/// Values too large to scale are already integral and come back unchanged.
pub fn round_dp(value: f64, dp: i32) -> f64 {
    let scale = 10f64.powi(dp);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / scale
}

/// Render a reading as plain text.
///
/// Integral values keep one decimal (`12.0`), everything else uses the
/// shortest representation that round-trips. Negative zero renders as `0.0`.
pub fn format_reading(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_dp(0.25, 1), 0.3);
        assert_eq!(round_dp(-0.25, 1), -0.3);
        assert_eq!(round_dp(3.456, 2), 3.46);
    }

    #[test]
    fn huge_values_do_not_overflow_to_infinity() {
        assert_eq!(round_dp(1e308, 1), 1e308);
        assert_eq!(round_dp(-f64::MAX, 2), -f64::MAX);
        let text = format_reading(round_dp(-1e308, 1));
        assert!(!text.contains("inf"), "{text}");
    }

    #[test]
    fn renders_like_the_consumer_expects() {
        assert_eq!(format_reading(-2.3), "-2.3");
        assert_eq!(format_reading(12.0), "12.0");
        assert_eq!(format_reading(-0.0), "0.0");
        assert_eq!(format_reading(3.46), "3.46");
        assert_eq!(format_reading(0.1 + 0.2), "0.30000000000000004");
    }
}
