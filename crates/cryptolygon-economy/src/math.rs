//! Cost curves and the ascension award.
//!
//! All amounts are `u128`. Cost curves saturate at `u128::MAX`, which no
//! balance can cover, so an overflowing purchase is simply unaffordable.
//! Logarithms are evaluated in Q32.32 fixed point.

use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Cost of raising a tier from `level` by `amount`:
/// `base_cost × 2^level × (2^amount − 1)`.
///
/// This is the sum of `base_cost × 2^k` for `k` in `level..level + amount`.
pub fn geometric_cost(base_cost: u128, level: u32, amount: u32) -> u128 {
    if base_cost == 0 || amount == 0 {
        return 0;
    }
    let series = if amount >= u128::BITS {
        u128::MAX
    } else {
        (1u128 << amount) - 1
    };
    1u128
        .checked_shl(level)
        .and_then(|scale| base_cost.checked_mul(scale))
        .and_then(|cost| cost.checked_mul(series))
        .unwrap_or(u128::MAX)
}

/// Circle cost of raising a perk from `level` by `amount`:
/// `weight^weight × amount × (level + (amount + 1) / 2) × scale_factor`.
///
/// Evaluated as `weight^weight × amount × (2·level + amount + 1) / 2`; the
/// product before halving is always even, so the division is exact.
pub fn perk_cost(weight: u32, level: u32, amount: u32, scale_factor: u128) -> u128 {
    if amount == 0 {
        return 0;
    }
    let unit = match u128::from(weight).checked_pow(weight) {
        Some(unit) => unit,
        None => return u128::MAX,
    };
    let span = 2 * u128::from(level) + u128::from(amount) + 1;
    let levels = u128::from(amount) * span / 2;
    unit.checked_mul(levels)
        .and_then(|cost| cost.checked_mul(scale_factor))
        .unwrap_or(u128::MAX)
}

/// `log2(x)` in Q32.32, truncated. `None` for zero.
///
/// The integer part is the position of the highest set bit; the 32
/// fractional bits come from repeatedly squaring the normalized mantissa.
pub fn log2(x: u128) -> Option<Fixed64> {
    if x == 0 {
        return None;
    }
    let int = x.ilog2();
    // Mantissa in [1, 2) with 63 fractional bits.
    let one: u128 = 1 << 63;
    let mut mantissa: u128 = if int >= 63 {
        x >> (int - 63)
    } else {
        x << (63 - int)
    };

    let mut frac: u64 = 0;
    for bit in (0..32).rev() {
        mantissa = (mantissa * mantissa) >> 63;
        if mantissa >= 2 * one {
            frac |= 1 << bit;
            mantissa >>= 1;
        }
    }
    let bits = (i64::from(int) << 32) | frac as i64;
    Some(Fixed64::from_bits(bits))
}

fn log2_above(x: u128, threshold: Fixed64) -> Fixed64 {
    log2(x)
        .map(|l| (l - threshold).max(Fixed64::ZERO))
        .unwrap_or(Fixed64::ZERO)
}

/// Award points: `floor(max(0, log2(T) − k))` on the first ascension,
/// `floor(max(0, log2(P + T) − k) − max(0, log2(P) − k))` afterwards, and
/// zero whenever `T < 2^k`.
///
/// `run_lines` is `T`, `lifetime_lines` the total of earlier runs `P`.
pub fn ascension_points(run_lines: u128, lifetime_lines: u128, threshold_log2: u32) -> u128 {
    if threshold_log2 >= u128::BITS || run_lines < (1u128 << threshold_log2) {
        return 0;
    }
    let threshold = Fixed64::from_num(threshold_log2);
    let points = if lifetime_lines == 0 {
        log2_above(run_lines, threshold)
    } else {
        let total = lifetime_lines.saturating_add(run_lines);
        (log2_above(total, threshold) - log2_above(lifetime_lines, threshold)).max(Fixed64::ZERO)
    };
    let whole: i64 = points.to_num();
    whole.max(0) as u128
}

/// Circles awarded for ascending: the points times `scale_factor`.
pub fn ascension_award(
    run_lines: u128,
    lifetime_lines: u128,
    threshold_log2: u32,
    scale_factor: u128,
) -> u128 {
    ascension_points(run_lines, lifetime_lines, threshold_log2).saturating_mul(scale_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // -----------------------------------------------------------------------
    // Geometric cost
    // -----------------------------------------------------------------------

    #[test]
    fn geometric_cost_closed_form() {
        // 1 × 2^1 × (2^2 − 1)
        assert_eq!(geometric_cost(1, 1, 2), 6);
        assert_eq!(geometric_cost(20, 0, 1), 20);
        assert_eq!(geometric_cost(400, 3, 3), 400 * 8 * 7);
        assert_eq!(geometric_cost(0, 10, 10), 0);
        assert_eq!(geometric_cost(5, 10, 0), 0);
    }

    #[test]
    fn geometric_cost_saturates() {
        assert_eq!(geometric_cost(1, 128, 1), u128::MAX);
        assert_eq!(geometric_cost(1, 0, 200), u128::MAX);
        assert_eq!(geometric_cost(u128::MAX / 2, 1, 2), u128::MAX);
    }

    proptest! {
        #[test]
        fn geometric_cost_is_sum_of_levels(base in 1u128..1_000_000, level in 0u32..40, amount in 1u32..20) {
            let summed: u128 = (level..level + amount).map(|k| base << k).sum();
            prop_assert_eq!(geometric_cost(base, level, amount), summed);
        }

        #[test]
        fn perk_cost_is_arithmetic_series(weight in 1u32..8, level in 0u32..50, amount in 1u32..50) {
            let unit = u128::from(weight).pow(weight);
            let summed: u128 = (level + 1..=level + amount).map(|l| unit * u128::from(l)).sum();
            prop_assert_eq!(perk_cost(weight, level, amount, 1), summed);
        }

        #[test]
        fn log2_brackets_true_value(x in 1u128..u128::MAX) {
            let l = log2(x).unwrap();
            prop_assert_eq!(l.to_num::<i64>() as u32, x.ilog2());
            let f = x as f64;
            prop_assert!((l.to_num::<f64>() - f.log2()).abs() < 1e-6);
        }
    }

    // -----------------------------------------------------------------------
    // Perk cost
    // -----------------------------------------------------------------------

    #[test]
    fn perk_cost_uses_weight_power_and_scale() {
        // 10^10 × (1 + 2) × scale
        assert_eq!(perk_cost(10, 0, 2, 3), 10_000_000_000 * 3 * 3);
        assert_eq!(perk_cost(1, 4, 1, 1_000), 5 * 1_000);
        assert_eq!(perk_cost(1, 0, 0, 1_000), 0);
        assert_eq!(perk_cost(u32::MAX, 0, 1, 1), u128::MAX);
    }

    // -----------------------------------------------------------------------
    // Logarithm
    // -----------------------------------------------------------------------

    #[test]
    fn log2_of_powers_is_exact() {
        assert_eq!(log2(0), None);
        assert_eq!(log2(1), Some(Fixed64::ZERO));
        assert_eq!(log2(1 << 35), Some(Fixed64::from_num(35)));
        assert_eq!(log2(1 << 127), Some(Fixed64::from_num(127)));
    }

    #[test]
    fn log2_fraction_is_close() {
        let l = log2(3).unwrap().to_num::<f64>();
        assert!((l - 3f64.log2()).abs() < 1e-8, "got {l}");
    }

    // -----------------------------------------------------------------------
    // Ascension award
    // -----------------------------------------------------------------------

    #[test]
    fn below_threshold_awards_nothing() {
        assert_eq!(ascension_points((1 << 35) - 1, 0, 35), 0);
        assert_eq!(ascension_points((1 << 35) - 1, 1 << 40, 35), 0);
    }

    #[test]
    fn first_ascension_uses_run_lines_only() {
        assert_eq!(ascension_points(1 << 35, 0, 35), 0);
        assert_eq!(ascension_points(1 << 36, 0, 35), 1);
        assert_eq!(ascension_points((1 << 38) + 5, 0, 35), 3);
        assert_eq!(ascension_award(1 << 40, 0, 35, 10), 50);
    }

    #[test]
    fn later_ascensions_award_the_log_difference() {
        // log2(2^40 + 2^40) − 35 − (40 − 35) = 1
        assert_eq!(ascension_points(1 << 40, 1 << 40, 35), 1);
        // Earlier runs below threshold contribute max(0, ..) = 0.
        assert_eq!(ascension_points(1 << 37, 1, 35), 2);
    }

    #[test]
    fn award_saturates() {
        assert_eq!(ascension_award(u128::MAX, 0, 35, u128::MAX), u128::MAX);
    }
}
