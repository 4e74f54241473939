use crate::constants::*;
use crate::errors::VammError;
use crate::math::*;

/// Comprehensive tests for math.rs functionalities
mod math_tests {
    use super::*;

    mod fixed_point_tests {
        use super::*;

        #[test]
        fn test_mul_fixed_identity() {
            // Multiplying by 1.0 returns the other operand unchanged
            assert_eq!(mul_fixed(Q64, Q64), Q64);
            assert_eq!(mul_fixed(Q64, 12345 << 64), 12345 << 64);
            assert_eq!(mul_fixed(MAX_SQRT_PRICE, Q64), MAX_SQRT_PRICE);
        }

        #[test]
        fn test_mul_fixed_halves() {
            // 0.5 * 0.5 = 0.25
            let half = Q64 / 2;
            assert_eq!(mul_fixed(half, half), Q64 / 4);
            // 2.0 * 1.5 = 3.0
            assert_eq!(mul_fixed(2 * Q64, 3 * Q64 / 2), 3 * Q64);
        }

        #[test]
        fn test_div_fixed_basic() {
            assert_eq!(div_fixed(6 * Q64, 3 * Q64), 2 * Q64);
            assert_eq!(div_fixed(Q64, 2 * Q64), Q64 / 2);
            assert_eq!(div_fixed(0, Q64), 0);
        }

        #[test]
        fn test_invert_fixed() {
            assert_eq!(invert_fixed(Q64), Q64);
            assert_eq!(invert_fixed(2 * Q64), Q64 / 2);
            assert_eq!(invert_fixed(Q64 / 4), 4 * Q64);
        }

        #[test]
        fn test_mul_div_floor_and_ceil() {
            assert_eq!(mul_div_floor(10, 10, 3).unwrap(), 33);
            assert_eq!(mul_div_ceil(10, 10, 3).unwrap(), 34);
            // Exact division: floor and ceil agree
            assert_eq!(mul_div_floor(10, 10, 4).unwrap(), 25);
            assert_eq!(mul_div_ceil(10, 10, 4).unwrap(), 25);
        }

        #[test]
        fn test_mul_div_zero_denominator() {
            assert_eq!(mul_div_floor(1, 1, 0), Err(VammError::MathOverflow));
            assert_eq!(mul_div_ceil(1, 1, 0), Err(VammError::MathOverflow));
        }

        #[test]
        fn test_mul_div_overflow() {
            // u128::MAX * u128::MAX / 1 does not fit back into u128
            assert_eq!(
                mul_div_floor(u128::MAX, u128::MAX, 1),
                Err(VammError::MathOverflow)
            );
        }
    }

    mod tick_conversion_tests {
        use super::*;

        #[test]
        fn test_tick_zero_is_unity() {
            assert_eq!(tick_to_sqrt_price(0).unwrap(), Q64);
            assert_eq!(sqrt_price_to_tick(Q64).unwrap(), 0);
        }

        #[test]
        fn test_tick_one_matches_table() {
            assert_eq!(tick_to_sqrt_price(1).unwrap(), POWERS[0]);
        }

        #[test]
        fn test_domain_boundaries() {
            assert_eq!(tick_to_sqrt_price(MIN_TICK).unwrap(), MIN_SQRT_PRICE);
            assert_eq!(tick_to_sqrt_price(MAX_TICK).unwrap(), MAX_SQRT_PRICE);
            assert_eq!(sqrt_price_to_tick(MIN_SQRT_PRICE).unwrap(), MIN_TICK);
            assert_eq!(sqrt_price_to_tick(MAX_SQRT_PRICE).unwrap(), MAX_TICK);
        }

        #[test]
        fn test_out_of_domain_rejected() {
            assert_eq!(
                tick_to_sqrt_price(MAX_TICK + 1),
                Err(VammError::OutOfBounds { tick: MAX_TICK + 1 })
            );
            assert_eq!(
                tick_to_sqrt_price(MIN_TICK - 1),
                Err(VammError::OutOfBounds { tick: MIN_TICK - 1 })
            );
            assert_eq!(
                sqrt_price_to_tick(MIN_SQRT_PRICE - 1),
                Err(VammError::PriceOutOfRange {
                    sqrt_price: MIN_SQRT_PRICE - 1
                })
            );
            assert_eq!(
                sqrt_price_to_tick(MAX_SQRT_PRICE + 1),
                Err(VammError::PriceOutOfRange {
                    sqrt_price: MAX_SQRT_PRICE + 1
                })
            );
        }

        #[test]
        fn test_round_trip_sample_ticks() {
            // The floor inverse is exact for every valid tick by
            // construction; spot-check a spread of the domain
            for tick in [
                MIN_TICK, -50_000, -8_192, -1_000, -3, -1, 0, 1, 2, 777, 8_192, 42_000, MAX_TICK,
            ] {
                let sqrt_price = tick_to_sqrt_price(tick).unwrap();
                assert_eq!(
                    sqrt_price_to_tick(sqrt_price).unwrap(),
                    tick,
                    "round trip failed for tick {tick}"
                );
            }
        }

        #[test]
        fn test_floor_semantics_between_ticks() {
            // A price strictly between tick 100 and tick 101 floors to 100
            let p100 = tick_to_sqrt_price(100).unwrap();
            let p101 = tick_to_sqrt_price(101).unwrap();
            assert!(p100 < p101);
            assert_eq!(sqrt_price_to_tick(p100 + 1).unwrap(), 100);
            assert_eq!(sqrt_price_to_tick(p101 - 1).unwrap(), 100);
        }

        #[test]
        fn test_negative_tick_is_reciprocal() {
            let pos = tick_to_sqrt_price(500).unwrap();
            let neg = tick_to_sqrt_price(-500).unwrap();
            // pos * neg == 1.0 up to the truncation of the inversion
            let product = mul_fixed(pos, neg);
            assert!(product <= Q64);
            assert!(Q64 - product < 1 << 10, "reciprocal error too large");
        }
    }

    mod liquidity_tests {
        use super::*;

        #[test]
        fn test_add_liquidity_delta() {
            assert_eq!(add_liquidity_delta(100, 50).unwrap(), 150);
            assert_eq!(add_liquidity_delta(100, -50).unwrap(), 50);
            assert_eq!(add_liquidity_delta(100, -100).unwrap(), 0);
        }

        #[test]
        fn test_add_liquidity_delta_underflow() {
            assert_eq!(
                add_liquidity_delta(100, -101),
                Err(VammError::InsufficientLiquidity {
                    requested: 101,
                    available: 100
                })
            );
        }

        #[test]
        fn test_add_liquidity_delta_overflow() {
            assert_eq!(
                add_liquidity_delta(u128::MAX, 1),
                Err(VammError::MathOverflow)
            );
        }
    }

    mod amount_delta_tests {
        use super::*;

        #[test]
        fn test_base_amount_exact() {
            // L = 1000 over a sqrt move of 0.5 is exactly 500 base units
            let amount = base_amount_delta(Q64, Q64 + Q64 / 2, 1000, false).unwrap();
            assert_eq!(amount, 500);
            let amount_up = base_amount_delta(Q64, Q64 + Q64 / 2, 1000, true).unwrap();
            assert_eq!(amount_up, 500);
        }

        #[test]
        fn test_base_amount_rounding() {
            // L = 3 over a 0.5 sqrt move: 1.5 units, floor 1 / ceil 2
            assert_eq!(base_amount_delta(Q64, Q64 + Q64 / 2, 3, false).unwrap(), 1);
            assert_eq!(base_amount_delta(Q64, Q64 + Q64 / 2, 3, true).unwrap(), 2);
        }

        #[test]
        fn test_base_amount_degenerate() {
            assert_eq!(base_amount_delta(Q64, Q64, 1000, true).unwrap(), 0);
            assert_eq!(base_amount_delta(Q64, 2 * Q64, 0, true).unwrap(), 0);
            assert!(base_amount_delta(2 * Q64, Q64, 1000, true).is_err());
        }

        #[test]
        fn test_quote_amount_exact() {
            // L = 1000 from 1.0 to 2.0: 1000 * (1/1 - 1/2) = 500
            let amount = quote_amount_delta(Q64, 2 * Q64, 1000, false).unwrap();
            assert_eq!(amount, 500);
        }

        #[test]
        fn test_quote_amount_rounding_direction() {
            let floor = quote_amount_delta(Q64, 3 * Q64, 1000, false).unwrap();
            let ceil = quote_amount_delta(Q64, 3 * Q64, 1000, true).unwrap();
            // 1000 * (1 - 1/3) = 666.66..
            assert_eq!(floor, 666);
            assert_eq!(ceil, 667);
        }
    }

    mod next_price_tests {
        use super::*;

        #[test]
        fn test_base_input_moves_up_exactly() {
            // 500 base units against L = 1000 raise sqrt by exactly 0.5
            let next = next_sqrt_price_from_base_input(Q64, 1000, 500).unwrap();
            assert_eq!(next, Q64 + Q64 / 2);
        }

        #[test]
        fn test_base_output_moves_down() {
            let next = next_sqrt_price_from_base_output(2 * Q64, 1000, 500).unwrap();
            assert_eq!(next, 2 * Q64 - Q64 / 2);
        }

        #[test]
        fn test_quote_input_moves_down() {
            // next = L*s / (L + a*s) with s = 2.0, L = 1000, a = 250:
            // 2000 / (1000 + 500) = 1.3333.., rounded up
            let next = next_sqrt_price_from_quote_input(2 * Q64, 1000, 250).unwrap();
            let expected_floor = 4 * Q64 / 3;
            assert!(next == expected_floor || next == expected_floor + 1);
            assert!(next < 2 * Q64);
        }

        #[test]
        fn test_quote_output_moves_up() {
            // next = L*s / (L - a*s) with s = 1.0, L = 1000, a = 250:
            // 1000 / 750 = 1.3333.., rounded up
            let next = next_sqrt_price_from_quote_output(Q64, 1000, 250).unwrap();
            assert!(next > Q64);
            assert!(next >= 4 * Q64 / 3);
        }

        #[test]
        fn test_quote_output_exceeding_liquidity() {
            // Requesting more quote than the curve can ever produce fails
            let result = next_sqrt_price_from_quote_output(Q64, 1000, 1000);
            assert_eq!(
                result,
                Err(VammError::InsufficientLiquidity {
                    requested: 1000,
                    available: 1000
                })
            );
        }

        #[test]
        fn test_zero_liquidity_rejected() {
            assert!(next_sqrt_price_from_base_input(Q64, 0, 1).is_err());
            assert!(next_sqrt_price_from_quote_input(Q64, 0, 1).is_err());
        }

        #[test]
        fn test_zero_amount_is_identity() {
            assert_eq!(next_sqrt_price_from_base_input(Q64, 1000, 0).unwrap(), Q64);
            assert_eq!(next_sqrt_price_from_quote_output(Q64, 1000, 0).unwrap(), Q64);
        }
    }

    mod fixed_leg_tests {
        use super::*;

        #[test]
        fn test_segment_average_rate() {
            // Average over [1.0, 2.0] in sqrt space is the product, 2.0
            assert_eq!(segment_average_rate(Q64, 2 * Q64), 2 * Q64);
            // Order of arguments does not matter
            assert_eq!(
                segment_average_rate(2 * Q64, Q64),
                segment_average_rate(Q64, 2 * Q64)
            );
        }

        #[test]
        fn test_annualized_time_factor() {
            assert_eq!(annualized_time_factor(SECONDS_PER_YEAR).unwrap(), Q64);
            assert_eq!(
                annualized_time_factor(SECONDS_PER_YEAR / 2).unwrap(),
                Q64 / 2
            );
            assert_eq!(annualized_time_factor(0).unwrap(), 0);
        }

        #[test]
        fn test_fixed_leg_sign_opposes_base() {
            // Rate 1.0 (both sqrt bounds at 1.0), half a year, unit index:
            // value = -sign(base) * |base| * 1.0 * 0.5 * 1.0
            let half_year = Q64 / 2;
            assert_eq!(
                fixed_leg_delta(1000, Q64, Q64, half_year, Q64).unwrap(),
                -500
            );
            assert_eq!(
                fixed_leg_delta(-1000, Q64, Q64, half_year, Q64).unwrap(),
                500
            );
            assert_eq!(fixed_leg_delta(0, Q64, Q64, half_year, Q64).unwrap(), 0);
        }

        #[test]
        fn test_fixed_leg_scales_with_index() {
            let base = fixed_leg_delta(-1000, Q64, Q64, Q64, Q64).unwrap();
            let doubled = fixed_leg_delta(-1000, Q64, Q64, Q64, 2 * Q64).unwrap();
            assert_eq!(doubled, 2 * base);
        }

        #[test]
        fn test_fixed_leg_uses_segment_average() {
            // Over [1.0, 1.5] the average rate is 1.5, so 500 base at one
            // year and unit index values to 750
            let value = fixed_leg_delta(-500, Q64, Q64 + Q64 / 2, Q64, Q64).unwrap();
            assert_eq!(value, 750);
        }
    }

    mod growth_tests {
        use super::*;

        #[test]
        fn test_amount_growth_round_trip() {
            // 500 units against L = 1000 scale to exactly half a unit per
            // liquidity and back
            let growth = amount_to_growth(500, 1000).unwrap();
            assert_eq!(growth, Q64 / 2);
            assert_eq!(growth_to_amount(growth as i128, 1000).unwrap(), 500);
        }

        #[test]
        fn test_growth_to_amount_signs() {
            let growth = amount_to_growth(100, 400).unwrap() as i128;
            assert_eq!(growth_to_amount(growth, 400).unwrap(), 100);
            assert_eq!(growth_to_amount(-growth, 400).unwrap(), -100);
            assert_eq!(growth_to_amount(0, 400).unwrap(), 0);
            assert_eq!(growth_to_amount(growth, 0).unwrap(), 0);
        }
    }
}
