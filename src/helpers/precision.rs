//! Quantity rounding used when sizing and formatting orders.

/// Decimals used for fractional (< 1.0) order amounts
pub const FRACTIONAL_PRECISION: u8 = 8;

#[inline]
fn scale(precision: u8) -> f64 {
    (10f64).powi(precision as i32)
}

/// Round half-up to `precision` decimals, e.g. 0.123456789 @ 4 -> 0.1235
#[inline]
pub fn round_half_up(value: f64, precision: u8) -> f64 {
    let r = scale(precision);
    (value * r).round() / r
}

/// Round towards zero to `precision` decimals. Never returns more than `value`.
///
/// The nearest grid point is taken when it does not exceed `value`, which absorbs
/// representation noise such as 0.29 * 100 = 28.999999999999996.
#[inline]
pub fn round_down(value: f64, precision: u8) -> f64 {
    let nearest = round_half_up(value, precision);
    if nearest <= value {
        return nearest;
    }
    let r = scale(precision);
    let floored = (value * r).floor();
    // value * r itself may have rounded up onto the next integer
    if floored / r <= value { floored / r } else { (floored - 1.0) / r }
}

/// Amount to submit for an order that spends `balance`, and the decimals it was floored to.
///
/// Never exceeds the balance. Fractional balances keep `FRACTIONAL_PRECISION`
/// decimals so that a balance like 0.5 at precision 0 is not sized to zero; the
/// returned precision is the one the amount must be sent with.
pub fn order_quantity(balance: f64, precision: u8) -> (f64, u8) {
    if !balance.is_finite() || balance <= 0.0 {
        return (0.0, precision);
    }
    let precision = if balance < 1.0 { FRACTIONAL_PRECISION.max(precision) } else { precision };
    (round_down(balance, precision), precision)
}

/// Decimal string sent to the exchange, floored so it never exceeds `value`
pub fn format_quantity(value: f64, precision: u8) -> String {
    format!("{:.*}", precision as usize, round_down(value, precision))
}

/// Number of significant decimals in a step size string ("0.00100000" -> 3)
pub fn precision_from_step(step: &str) -> u8 {
    match step.trim().split_once('.') {
        Some((_, fraction)) => fraction.trim_end_matches('0').len() as u8,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_up_rounding_keeps_declared_decimals() {
        let rounded = round_half_up(0.123456789, 4);
        assert_eq!(rounded, 0.1235);
        assert_eq!(round_half_up(2.5, 0), 3.0);
    }

    #[test]
    fn round_down_absorbs_float_noise() {
        assert_eq!(round_down(0.29, 2), 0.29);
        assert_eq!(round_down(1.23999, 2), 1.23);
        assert_eq!(round_down(5.0, 0), 5.0);
    }

    #[test]
    fn round_down_never_exceeds_the_value() {
        assert_eq!(round_down(5.9999999999, 0), 5.0);
        assert_eq!(round_down(0.99999999999, 8), 0.99999999);
        for (value, precision) in [(0.12346, 4), (0.9999, 2), (1e15 - 0.5, 0), (123.456789, 5), (0.1 + 0.2, 1)] {
            assert!(round_down(value, precision) <= value, "{} @ {}", value, precision);
        }
    }

    #[test]
    fn formatted_quantity_is_floored() {
        assert_eq!(format_quantity(0.123456789, 4), "0.1234");
        assert_eq!(format_quantity(0.9999, 2), "0.99");
        assert_eq!(format_quantity(100.0, 2), "100.00");
    }

    #[test]
    fn fractional_balances_use_high_precision() {
        assert_eq!(order_quantity(0.5, 0), (0.5, 8));
        assert_eq!(order_quantity(0.123456789, 2), (0.12345678, 8));
        assert_eq!(order_quantity(12.3456, 2), (12.34, 2));
        assert_eq!(order_quantity(0.0, 4).0, 0.0);
        assert_eq!(order_quantity(-3.0, 4).0, 0.0);

        // Sent string is the sized amount itself, never above the balance
        for (balance, precision) in [(0.5, 0), (0.12346, 4), (0.9999, 2), (0.4, 0)] {
            let (qty, decimals) = order_quantity(balance, precision);
            let sent: f64 = format_quantity(qty, decimals).parse().unwrap();
            assert_eq!(sent, qty);
            assert!(sent > 0.0 && sent <= balance, "{} @ {} sent {}", balance, precision, sent);
        }
    }

    #[test]
    fn step_size_precision() {
        assert_eq!(precision_from_step("0.00100000"), 3);
        assert_eq!(precision_from_step("1.00000000"), 0);
        assert_eq!(precision_from_step("0.00000001"), 8);
        assert_eq!(precision_from_step("10"), 0);
    }
}
