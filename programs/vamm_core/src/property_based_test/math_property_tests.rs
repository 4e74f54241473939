//! Property-based tests for the math module
//!
//! These suites verify that the fixed-point primitives, tick conversions and
//! swap-step arithmetic satisfy their invariants across randomly generated
//! inputs, rather than just the hand-picked values in the unit tests.

use crate::constants::*;
use crate::math::*;
use crate::state::compute_swap_step;
use proptest::prelude::*;

/// Strategies for generating valid inputs
mod strategies {
    use super::*;

    pub fn tick_index() -> impl Strategy<Value = i32> {
        MIN_TICK..=MAX_TICK
    }

    /// Sqrt rates drawn from the representable curve domain.
    pub fn sqrt_price() -> impl Strategy<Value = u128> {
        tick_index().prop_map(|t| tick_to_sqrt_price(t).expect("tick in domain"))
    }

    pub fn liquidity() -> impl Strategy<Value = u128> {
        1u128..(1 << 100)
    }

    pub fn amount() -> impl Strategy<Value = u128> {
        1u128..(1 << 96)
    }
}

proptest! {
    // Tick conversion invariants

    #[test]
    fn test_tick_round_trip_is_exact(tick in strategies::tick_index()) {
        let sqrt_price = tick_to_sqrt_price(tick).unwrap();
        prop_assert_eq!(sqrt_price_to_tick(sqrt_price).unwrap(), tick);
    }

    #[test]
    fn test_tick_curve_is_strictly_monotone(tick in MIN_TICK..MAX_TICK) {
        let here = tick_to_sqrt_price(tick).unwrap();
        let next = tick_to_sqrt_price(tick + 1).unwrap();
        prop_assert!(here < next);
    }

    #[test]
    fn test_floor_tick_brackets_price(tick in MIN_TICK..MAX_TICK, offset in 0u128..u128::MAX) {
        let here = tick_to_sqrt_price(tick).unwrap();
        let next = tick_to_sqrt_price(tick + 1).unwrap();
        // Any price strictly inside the bracket floors to the lower tick
        let price = here + offset % (next - here);
        prop_assert_eq!(sqrt_price_to_tick(price).unwrap(), tick);
    }

    // Fixed-point primitive invariants

    #[test]
    fn test_mul_div_ceil_dominates_floor(a in any::<u128>(), b in any::<u128>(), d in 1u128..u128::MAX) {
        if let (Ok(floor), Ok(ceil)) = (mul_div_floor(a, b, d), mul_div_ceil(a, b, d)) {
            prop_assert!(ceil >= floor);
            prop_assert!(ceil - floor <= 1);
        }
    }

    #[test]
    fn test_invert_fixed_is_involutive_within_error(sqrt_price in strategies::sqrt_price()) {
        let inverted = invert_fixed(sqrt_price);
        let back = invert_fixed(inverted);
        // Double inversion loses at most a few ulps of truncation
        let diff = sqrt_price.abs_diff(back);
        prop_assert!(diff <= sqrt_price / (1 << 40) + 2);
    }

    // Liquidity arithmetic

    #[test]
    fn test_add_liquidity_delta_inverts(liquidity in strategies::liquidity(), delta in 0i128..(1 << 100)) {
        let added = add_liquidity_delta(liquidity, delta).unwrap();
        let removed = add_liquidity_delta(added, -delta).unwrap();
        prop_assert_eq!(removed, liquidity);
    }

    // Amount deltas and next-price solvers

    #[test]
    fn test_amount_deltas_round_in_pools_favor(
        a in strategies::sqrt_price(),
        b in strategies::sqrt_price(),
        liquidity in strategies::liquidity()
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let base_floor = base_amount_delta(lo, hi, liquidity, false).unwrap();
        let base_ceil = base_amount_delta(lo, hi, liquidity, true).unwrap();
        prop_assert!(base_ceil >= base_floor && base_ceil - base_floor <= 1);

        if let (Ok(quote_floor), Ok(quote_ceil)) = (
            quote_amount_delta(lo, hi, liquidity, false),
            quote_amount_delta(lo, hi, liquidity, true),
        ) {
            prop_assert!(quote_ceil >= quote_floor && quote_ceil - quote_floor <= 1);
        }
    }

    #[test]
    fn test_base_input_never_overshoots_payment(
        sqrt_price in strategies::sqrt_price(),
        liquidity in strategies::liquidity(),
        amount in strategies::amount()
    ) {
        let next = next_sqrt_price_from_base_input(sqrt_price, liquidity, amount).unwrap();
        prop_assert!(next >= sqrt_price);
        // The base consumed by the actual move never exceeds the payment
        let consumed = base_amount_delta(sqrt_price, next, liquidity, false).unwrap();
        prop_assert!(consumed <= amount);
    }

    #[test]
    fn test_quote_input_moves_down_boundedly(
        sqrt_price in strategies::sqrt_price(),
        liquidity in strategies::liquidity(),
        amount in strategies::amount()
    ) {
        let next = next_sqrt_price_from_quote_input(sqrt_price, liquidity, amount).unwrap();
        prop_assert!(next <= sqrt_price);
        prop_assert!(next > 0);
    }

    // Fixed-leg valuation

    #[test]
    fn test_fixed_leg_sign_opposes_base(
        base in 1i128..(1 << 90),
        a in strategies::sqrt_price(),
        b in strategies::sqrt_price(),
        seconds in 1u64..SECONDS_PER_YEAR
    ) {
        let time_factor = annualized_time_factor(seconds).unwrap();
        let paying = fixed_leg_delta(-base, a, b, time_factor, Q64).unwrap();
        let receiving = fixed_leg_delta(base, a, b, time_factor, Q64).unwrap();
        prop_assert!(paying >= 0);
        prop_assert!(receiving <= 0);
        prop_assert_eq!(paying, -receiving);
    }

    // Swap step solver

    #[test]
    fn test_swap_step_price_stays_in_segment(
        current_tick in strategies::tick_index(),
        target_tick in strategies::tick_index(),
        liquidity in strategies::liquidity(),
        amount in 1i128..(1 << 90)
    ) {
        prop_assume!(current_tick != target_tick);
        let current = tick_to_sqrt_price(current_tick).unwrap();
        let target = tick_to_sqrt_price(target_tick).unwrap();

        let step = compute_swap_step(current, target, liquidity, amount).unwrap();
        let (lo, hi) = if current <= target { (current, target) } else { (target, current) };
        prop_assert!(step.sqrt_price_next >= lo && step.sqrt_price_next <= hi);
    }

    #[test]
    fn test_swap_step_exact_input_never_exceeds_remainder(
        current_tick in strategies::tick_index(),
        target_tick in strategies::tick_index(),
        liquidity in strategies::liquidity(),
        amount in 1i128..(1 << 90)
    ) {
        prop_assume!(current_tick != target_tick);
        let current = tick_to_sqrt_price(current_tick).unwrap();
        let target = tick_to_sqrt_price(target_tick).unwrap();

        let step = compute_swap_step(current, target, liquidity, amount).unwrap();
        let input_side = if target > current { step.base_amount } else { step.quote_amount };
        prop_assert!(input_side <= amount as u128);
    }

    #[test]
    fn test_swap_step_exact_output_is_capped(
        current_tick in strategies::tick_index(),
        target_tick in strategies::tick_index(),
        liquidity in strategies::liquidity(),
        amount in 1i128..(1 << 90)
    ) {
        prop_assume!(current_tick != target_tick);
        let current = tick_to_sqrt_price(current_tick).unwrap();
        let target = tick_to_sqrt_price(target_tick).unwrap();

        let step = compute_swap_step(current, target, liquidity, -amount).unwrap();
        let output_side = if target > current { step.quote_amount } else { step.base_amount };
        prop_assert!(output_side <= amount as u128);
    }
}
