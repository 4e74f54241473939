/// Core Math Library
///
/// This module implements the mathematical operations required by the
/// rate-swap pricing engine. It provides conversions between tick indices and
/// sqrt rates, leg-amount calculations from liquidity over a sqrt-rate range,
/// next-price solvers for swap stepping, and the per-segment fixed-leg
/// valuation.
///
/// All fixed-point arithmetic is Q64.64: values are scaled by 2^64 to keep
/// precision through intermediate calculations, with `U256` widening wherever
/// a product can exceed 128 bits.
use crate::constants::*;
use crate::errors::{Result, VammError};
use primitive_types::U256;

/// Multiplies two Q64.64 fixed-point numbers.
///
/// The product is computed limb-wise so the Q64.64 window of the 256-bit
/// product is extracted without allocating a wide integer.
///
/// # Arguments
/// * `a` - The first Q64.64 fixed-point number
/// * `b` - The second Q64.64 fixed-point number
///
/// # Returns
/// * `u128` - The product as a Q64.64 fixed-point number (truncated)
#[inline(always)]
pub(crate) fn mul_fixed(a: u128, b: u128) -> u128 {
    let a_lo = a as u64 as u128;
    let a_hi = (a >> 64) as u64 as u128;
    let b_lo = b as u64 as u128;
    let b_hi = (b >> 64) as u64 as u128;

    let lo_lo = a_lo * b_lo;
    let hi_lo = a_hi * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_hi = a_hi * b_hi;

    let carry = lo_lo >> 64;
    let mid = hi_lo + lo_hi + carry;
    let high = hi_hi + (mid >> 64);

    (high << 64) | (mid as u64 as u128)
}

/// Divides two Q64.64 fixed-point numbers, truncating toward zero.
///
/// # Arguments
/// * `a` - The dividend (Q64.64)
/// * `b` - The divisor (Q64.64), must be non-zero
#[inline(always)]
pub(crate) fn div_fixed(a: u128, b: u128) -> u128 {
    debug_assert!(b != 0, "div_fixed: divisor is zero");

    let a_u256 = U256::from(a) << 64;
    (a_u256 / U256::from(b)).as_u128()
}

/// Calculates the reciprocal (1/x) of a Q64.64 fixed-point number.
#[inline(always)]
pub(crate) fn invert_fixed(x: u128) -> u128 {
    div_fixed(Q64, x)
}

/// Binary exponentiation over the precomputed `POWERS` table.
///
/// Computes sqrt(1.0001)^exp in Q64.64 by multiplying together the table
/// factors selected by the set bits of `exp`. Callers validate the tick
/// domain first, so `exp < 2^17` and the table index never exceeds 16.
#[inline(always)]
pub(crate) fn binary_pow(table: &[u128], mut exp: u32) -> u128 {
    let mut result = Q64;
    let mut i = 0;

    while exp > 0 && i < table.len() {
        if exp & 1 == 1 {
            result = mul_fixed(result, table[i]);
        }
        exp >>= 1;
        i += 1;
    }
    result
}

/// Converts a U256 back to u128, failing on overflow instead of panicking.
#[inline(always)]
fn to_u128(x: U256) -> Result<u128> {
    if x > U256::from(u128::MAX) {
        return Err(VammError::MathOverflow);
    }
    Ok(x.as_u128())
}

/// Computes `a * b / denominator` with full 256-bit intermediates, flooring.
///
/// # Arguments
/// * `a` - Multiplicand
/// * `b` - Multiplier
/// * `denominator` - Divisor, must be non-zero
pub(crate) fn mul_div_floor(a: u128, b: u128, denominator: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(VammError::MathOverflow);
    }
    let product = U256::from(a) * U256::from(b);
    to_u128(product / U256::from(denominator))
}

/// Computes `a * b / denominator` with full 256-bit intermediates, ceiling.
pub(crate) fn mul_div_ceil(a: u128, b: u128, denominator: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(VammError::MathOverflow);
    }
    let product = U256::from(a) * U256::from(b);
    let den = U256::from(denominator);
    let (quotient, remainder) = product.div_mod(den);
    let result = if remainder.is_zero() {
        quotient
    } else {
        quotient + U256::one()
    };
    to_u128(result)
}

/// Computes `(numerator << 64) / denominator` exactly, without overflowing
/// the 256-bit intermediate.
///
/// The shift is applied after splitting the division into quotient and
/// remainder, so numerators up to 2^192 are handled exactly. Used wherever a
/// Q64.64 result is derived from a ratio of wide products.
fn shl64_div(numerator: U256, denominator: U256, round_up: bool) -> Result<u128> {
    if denominator.is_zero() {
        return Err(VammError::MathOverflow);
    }
    let (q, r) = numerator.div_mod(denominator);
    // (n << 64) / d == (q << 64) + (r << 64) / d, and r < d keeps the
    // second term inside 256 bits.
    let (frac_q, frac_r) = (r << 64).div_mod(denominator);
    let mut result = (q << 64)
        .checked_add(frac_q)
        .ok_or(VammError::MathOverflow)?;
    if round_up && !frac_r.is_zero() {
        result = result.checked_add(U256::one()).ok_or(VammError::MathOverflow)?;
    }
    to_u128(result)
}

/// Converts a tick index to its corresponding sqrt rate in Q64.64.
///
/// The engine prices the fixed leg on an exponential grid,
/// rate = 1.0001^tick, so sqrt(rate) = sqrt(1.0001)^tick. Negative ticks are
/// handled by inverting the positive-tick result.
///
/// # Arguments
/// * `tick` - The tick index to convert
///
/// # Returns
/// * `Result<u128>` - The sqrt rate in Q64.64, or `OutOfBounds` if the tick
///   lies outside [MIN_TICK, MAX_TICK]
pub fn tick_to_sqrt_price(tick: i32) -> Result<u128> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(VammError::OutOfBounds { tick });
    }

    let sqrt_price_abs = binary_pow(&POWERS, tick.unsigned_abs());

    if tick < 0 {
        Ok(invert_fixed(sqrt_price_abs))
    } else {
        Ok(sqrt_price_abs)
    }
}

/// Converts a sqrt rate in Q64.64 to the greatest tick whose sqrt rate does
/// not exceed it (the floor tick).
///
/// Implemented as a binary search over `tick_to_sqrt_price`, which makes the
/// pair exact inverses by construction:
/// `sqrt_price_to_tick(tick_to_sqrt_price(t)) == t` for every valid `t`.
///
/// # Arguments
/// * `sqrt_price` - The sqrt rate in Q64.64 to convert
///
/// # Returns
/// * `Result<i32>` - The floor tick, or `PriceOutOfRange` if the input lies
///   outside [MIN_SQRT_PRICE, MAX_SQRT_PRICE]
pub fn sqrt_price_to_tick(sqrt_price: u128) -> Result<i32> {
    if !(MIN_SQRT_PRICE..=MAX_SQRT_PRICE).contains(&sqrt_price) {
        return Err(VammError::PriceOutOfRange { sqrt_price });
    }

    let mut low = MIN_TICK;
    let mut high = MAX_TICK;
    let mut floor = MIN_TICK;

    while low <= high {
        let mid = low + (high - low) / 2;
        let mid_sqrt_price = tick_to_sqrt_price(mid)?;

        if mid_sqrt_price <= sqrt_price {
            floor = mid;
            low = mid + 1;
        } else {
            high = mid - 1;
        }
    }

    Ok(floor)
}

/// Applies a signed liquidity delta to an unsigned liquidity magnitude.
///
/// # Arguments
/// * `liquidity` - The current liquidity magnitude
/// * `delta` - The signed change to apply
///
/// # Returns
/// * `Result<u128>` - The new magnitude; `InsufficientLiquidity` when the
///   delta would take it below zero, `MathOverflow` when it would exceed
///   u128::MAX
pub fn add_liquidity_delta(liquidity: u128, delta: i128) -> Result<u128> {
    if delta >= 0 {
        liquidity
            .checked_add(delta as u128)
            .ok_or(VammError::MathOverflow)
    } else {
        let abs = delta.unsigned_abs();
        liquidity
            .checked_sub(abs)
            .ok_or(VammError::InsufficientLiquidity {
                requested: abs,
                available: liquidity,
            })
    }
}

/// Calculates the base-leg amount held between two sqrt rates for a given
/// liquidity.
///
/// The base leg is the linear one on the sqrt-rate curve:
/// amount = L * (sqrt_upper - sqrt_lower).
///
/// # Arguments
/// * `sqrt_price_lower` - The lower sqrt rate (Q64.64)
/// * `sqrt_price_upper` - The upper sqrt rate (Q64.64)
/// * `liquidity` - The liquidity magnitude
/// * `round_up` - Round up (amounts owed to the pool) or down (amounts paid
///   out by the pool)
pub fn base_amount_delta(
    sqrt_price_lower: u128,
    sqrt_price_upper: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u128> {
    if sqrt_price_lower > sqrt_price_upper {
        return Err(VammError::PriceOutOfRange {
            sqrt_price: sqrt_price_lower,
        });
    }
    if sqrt_price_lower == sqrt_price_upper || liquidity == 0 {
        return Ok(0);
    }

    let diff = sqrt_price_upper - sqrt_price_lower;
    if round_up {
        mul_div_ceil(liquidity, diff, Q64)
    } else {
        mul_div_floor(liquidity, diff, Q64)
    }
}

/// Calculates the quote-leg curve amount held between two sqrt rates for a
/// given liquidity.
///
/// amount = L * (1/sqrt_lower - 1/sqrt_upper), computed in one exact pass as
/// L * (sqrt_upper - sqrt_lower) * 2^64 / (sqrt_lower * sqrt_upper) rather
/// than via two truncated reciprocals.
pub fn quote_amount_delta(
    sqrt_price_lower: u128,
    sqrt_price_upper: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u128> {
    if sqrt_price_lower > sqrt_price_upper {
        return Err(VammError::PriceOutOfRange {
            sqrt_price: sqrt_price_lower,
        });
    }
    if sqrt_price_lower == 0 {
        return Err(VammError::ZeroInitialPrice);
    }
    if sqrt_price_lower == sqrt_price_upper || liquidity == 0 {
        return Ok(0);
    }

    let numerator = U256::from(liquidity) * U256::from(sqrt_price_upper - sqrt_price_lower);
    let denominator = U256::from(sqrt_price_lower) * U256::from(sqrt_price_upper);
    shl64_div(numerator, denominator, round_up)
}

/// Next sqrt rate after the pool receives `amount` of the base leg.
///
/// Base in moves the rate up: next = sqrt_price + amount / L, truncated so
/// the rate moves no further than the payment justifies.
pub fn next_sqrt_price_from_base_input(
    sqrt_price: u128,
    liquidity: u128,
    amount: u128,
) -> Result<u128> {
    if liquidity == 0 {
        return Err(VammError::InsufficientLiquidity {
            requested: amount,
            available: 0,
        });
    }
    if amount == 0 {
        return Ok(sqrt_price);
    }

    let delta = mul_div_floor(amount, Q64, liquidity)?;
    sqrt_price.checked_add(delta).ok_or(VammError::MathOverflow)
}

/// Next sqrt rate after the pool pays out `amount` of the base leg.
///
/// Base out moves the rate down: next = sqrt_price - amount / L, with the
/// quotient rounded up so the pool never pays more than the move covers.
pub fn next_sqrt_price_from_base_output(
    sqrt_price: u128,
    liquidity: u128,
    amount: u128,
) -> Result<u128> {
    if liquidity == 0 {
        return Err(VammError::InsufficientLiquidity {
            requested: amount,
            available: 0,
        });
    }
    if amount == 0 {
        return Ok(sqrt_price);
    }

    let delta = mul_div_ceil(amount, Q64, liquidity)?;
    sqrt_price.checked_sub(delta).ok_or(VammError::MathOverflow)
}

/// Next sqrt rate after the pool receives `amount` of the quote leg.
///
/// Quote in moves the rate down:
/// next = L * sqrt_price / (L + amount * sqrt_price), rounded up so the rate
/// moves no further than the payment justifies.
pub fn next_sqrt_price_from_quote_input(
    sqrt_price: u128,
    liquidity: u128,
    amount: u128,
) -> Result<u128> {
    if liquidity == 0 {
        return Err(VammError::InsufficientLiquidity {
            requested: amount,
            available: 0,
        });
    }
    if amount == 0 {
        return Ok(sqrt_price);
    }

    let numerator = U256::from(liquidity) * U256::from(sqrt_price);
    let denominator = (U256::from(liquidity) << 64)
        .checked_add(U256::from(amount) * U256::from(sqrt_price))
        .ok_or(VammError::MathOverflow)?;
    shl64_div(numerator, denominator, true)
}

/// Next sqrt rate after the pool pays out `amount` of the quote leg.
///
/// Quote out moves the rate up:
/// next = L * sqrt_price / (L - amount * sqrt_price). Fails when the
/// requested output cannot be produced by the available liquidity.
pub fn next_sqrt_price_from_quote_output(
    sqrt_price: u128,
    liquidity: u128,
    amount: u128,
) -> Result<u128> {
    if liquidity == 0 {
        return Err(VammError::InsufficientLiquidity {
            requested: amount,
            available: 0,
        });
    }
    if amount == 0 {
        return Ok(sqrt_price);
    }

    let numerator = U256::from(liquidity) * U256::from(sqrt_price);
    let product = U256::from(amount) * U256::from(sqrt_price);
    let scaled_liquidity = U256::from(liquidity) << 64;
    if product >= scaled_liquidity {
        return Err(VammError::InsufficientLiquidity {
            requested: amount,
            available: liquidity,
        });
    }
    shl64_div(numerator, scaled_liquidity - product, true)
}

/// Converts a liquidity amount over a tick range into base-leg notional:
/// notional = L * (sqrt_upper - sqrt_lower).
///
/// Downstream margin accounting consumes this after every maker-order
/// liquidity change.
pub fn liquidity_to_notional(
    liquidity: u128,
    sqrt_price_lower: u128,
    sqrt_price_upper: u128,
) -> Result<u128> {
    base_amount_delta(sqrt_price_lower, sqrt_price_upper, liquidity, false)
}

/// The exact average fixed rate of a uniform-liquidity segment, in Q64.64.
///
/// Over one segment the ratio of base to quote moved is
/// sqrt_lower * sqrt_upper, the closed-form geometric average of
/// 1.0001^tick across the segment, not a midpoint approximation. Valid only
/// while liquidity is uniform, i.e. within a single swap step.
pub fn segment_average_rate(sqrt_price_a: u128, sqrt_price_b: u128) -> u128 {
    let (lo, hi) = if sqrt_price_a <= sqrt_price_b {
        (sqrt_price_a, sqrt_price_b)
    } else {
        (sqrt_price_b, sqrt_price_a)
    };
    mul_fixed(lo, hi)
}

/// Annualizes a time-to-maturity in seconds into a Q64.64 year fraction.
pub fn annualized_time_factor(seconds_to_maturity: u64) -> Result<u128> {
    mul_div_floor(seconds_to_maturity as u128, Q64, SECONDS_PER_YEAR as u128)
}

/// Values the fixed leg of a base-notional move across one uniform segment.
///
/// value = -sign(base) * |base| * avg_rate * year_fraction * rate_index,
/// all Q64.64 multiply-divide. The sign is opposite the base amount: paying
/// base notional into the pool earns fixed-leg value and vice versa. Valid
/// only per segment; callers must never apply it across a multi-segment
/// swap.
///
/// # Arguments
/// * `base_delta` - Signed base-leg notional moved within the segment
/// * `sqrt_price_a` / `sqrt_price_b` - The segment's sqrt-rate endpoints
/// * `time_factor` - Annualized time to maturity (Q64.64)
/// * `rate_index` - The floating-rate index scalar (Q64.64)
pub fn fixed_leg_delta(
    base_delta: i128,
    sqrt_price_a: u128,
    sqrt_price_b: u128,
    time_factor: u128,
    rate_index: u128,
) -> Result<i128> {
    if base_delta == 0 {
        return Ok(0);
    }

    let avg_rate = segment_average_rate(sqrt_price_a, sqrt_price_b);
    let scaled = mul_div_floor(base_delta.unsigned_abs(), avg_rate, Q64)?;
    let annualized = mul_div_floor(scaled, time_factor, Q64)?;
    let magnitude = mul_div_floor(annualized, rate_index, Q64)?;

    if magnitude > i128::MAX as u128 {
        return Err(VammError::MathOverflow);
    }
    let magnitude = magnitude as i128;
    Ok(if base_delta > 0 { -magnitude } else { magnitude })
}

/// Scales an amount into a per-liquidity-unit growth increment (Q64.64).
pub(crate) fn amount_to_growth(amount: u128, liquidity: u128) -> Result<u128> {
    mul_div_floor(amount, Q64, liquidity)
}

/// Applies a pre-scaled growth delta to a position's liquidity, producing
/// the owed amount: amount = growth_delta * L / 2^64. No further division,
/// since growth values are already per-unit.
pub(crate) fn growth_to_amount(growth_delta: i128, liquidity: u128) -> Result<i128> {
    if growth_delta == 0 || liquidity == 0 {
        return Ok(0);
    }
    let magnitude = mul_div_floor(growth_delta.unsigned_abs(), liquidity, Q64)?;
    if magnitude > i128::MAX as u128 {
        return Err(VammError::MathOverflow);
    }
    Ok(if growth_delta >= 0 {
        magnitude as i128
    } else {
        -(magnitude as i128)
    })
}
