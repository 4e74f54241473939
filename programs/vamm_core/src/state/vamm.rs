/// VAMM Aggregate
///
/// This module defines the central state machine of the engine: one `Vamm`
/// per (market, maturity) pair, owning the current sqrt rate, active
/// liquidity, growth accumulators, tick ledger, bitmap index, oracle and
/// position map. Swaps and liquidity changes enter here, under a scoped
/// mutation lock, and either commit completely or leave no trace.
///
/// The swap orchestrator walks the tick grid one bitmap word at a time,
/// solving a single-segment step against each boundary and crossing
/// initialized ticks as it lands on them. Within a segment liquidity is
/// uniform, which is what makes the closed-form fixed-leg valuation exact.
use crate::constants::*;
use crate::errors::{Result, VammError};
use crate::math;
use crate::oracle::Oracle;
use crate::position::{AccountId, Position, PositionKey};
use crate::tick::{self, TickLedger};
use crate::tick_bitmap::TickBitmap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, trace};

/// Immutable parameters fixed at vamm creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VammConfig {
    /// The market this vamm prices.
    pub market_id: u64,
    /// Maturity timestamp; the vamm stops trading shortly before it.
    pub maturity: i64,
    /// Granularity of usable ticks.
    pub tick_spacing: u16,
    /// Starting sqrt rate, Q64.64.
    pub initial_sqrt_price: u128,
}

/// Which way a swap pushes the fixed rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    /// Trader pays base notional, receives the fixed leg; rate moves up.
    Up,
    /// Trader pays the fixed leg, receives base notional; rate moves down.
    Down,
}

/// Parameters of one swap.
///
/// `amount_specified` is denominated in the input-side curve amount when
/// non-negative (exact input) and in the output-side curve amount when
/// negative (exact output, capped at its magnitude).
#[derive(Debug, Clone, Copy)]
pub struct SwapParams {
    pub direction: SwapDirection,
    pub amount_specified: i128,
    /// The sqrt rate at which the swap stops regardless of remainder.
    pub sqrt_price_limit: u128,
}

/// Outcome of one swap, from the trader's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapResult {
    /// Signed base notional delta (negative: trader paid base).
    pub base_delta: i128,
    /// Signed fixed-leg value delta.
    pub quote_delta: i128,
    pub sqrt_price_after: u128,
    pub tick_after: i32,
}

/// Outcome of one liquidity modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifyPositionResult {
    /// Base notional settled to the position in this call.
    pub base_settled: i128,
    /// Quote notional settled to the position in this call.
    pub quote_settled: i128,
    /// Signed base-notional footprint of the liquidity delta, for the
    /// caller's margin accounting.
    pub notional_delta: i128,
}

/// One solved segment of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStep {
    /// Where the rate lands after this segment.
    pub sqrt_price_next: u128,
    /// Base-leg curve amount moved over the segment.
    pub base_amount: u128,
    /// Quote-leg curve amount moved over the segment.
    pub quote_amount: u128,
}

/// Solves a single swap segment against uniform liquidity.
///
/// Direction is inferred from `sqrt_price_target` relative to
/// `sqrt_price_current`. A non-negative `amount_remaining` is exact-input in
/// the input-side amount (base when the rate moves up, quote when it moves
/// down); negative is exact-output, with the output capped at the
/// remainder's magnitude. When the remainder cannot reach the target the
/// price stops short and the remainder is consumed whole; otherwise the
/// price caps at the target and the fill is recomputed from the exact price
/// delta. Input amounts round up and output amounts round down, always in
/// the pool's favor.
pub fn compute_swap_step(
    sqrt_price_current: u128,
    sqrt_price_target: u128,
    liquidity: u128,
    amount_remaining: i128,
) -> Result<SwapStep> {
    let up = sqrt_price_target > sqrt_price_current;
    let exact_in = amount_remaining >= 0;

    // Zero liquidity: the segment is a free jump to the target.
    if liquidity == 0 {
        return Ok(SwapStep {
            sqrt_price_next: sqrt_price_target,
            base_amount: 0,
            quote_amount: 0,
        });
    }

    let (lo_bound, hi_bound) = if up {
        (sqrt_price_current, sqrt_price_target)
    } else {
        (sqrt_price_target, sqrt_price_current)
    };

    let remainder = amount_remaining.unsigned_abs();
    let (sqrt_price_next, reached_target) = if exact_in {
        let in_to_target = if up {
            math::base_amount_delta(lo_bound, hi_bound, liquidity, true)?
        } else {
            math::quote_amount_delta(lo_bound, hi_bound, liquidity, true)?
        };
        if remainder >= in_to_target {
            (sqrt_price_target, true)
        } else {
            let next = if up {
                math::next_sqrt_price_from_base_input(sqrt_price_current, liquidity, remainder)?
                    .min(sqrt_price_target)
            } else {
                math::next_sqrt_price_from_quote_input(sqrt_price_current, liquidity, remainder)?
                    .max(sqrt_price_target)
            };
            (next, false)
        }
    } else {
        let out_to_target = if up {
            math::quote_amount_delta(lo_bound, hi_bound, liquidity, false)?
        } else {
            math::base_amount_delta(lo_bound, hi_bound, liquidity, false)?
        };
        if remainder >= out_to_target {
            (sqrt_price_target, true)
        } else {
            let next = if up {
                math::next_sqrt_price_from_quote_output(sqrt_price_current, liquidity, remainder)?
                    .min(sqrt_price_target)
            } else {
                math::next_sqrt_price_from_base_output(sqrt_price_current, liquidity, remainder)?
                    .max(sqrt_price_target)
            };
            (next, false)
        }
    };

    let (lo, hi) = if up {
        (sqrt_price_current, sqrt_price_next)
    } else {
        (sqrt_price_next, sqrt_price_current)
    };
    // Input side rounds up, output side rounds down. Base is input on
    // up-moves; quote is input on down-moves.
    let mut base_amount = math::base_amount_delta(lo, hi, liquidity, up)?;
    let mut quote_amount = math::quote_amount_delta(lo, hi, liquidity, !up)?;

    if exact_in {
        if !reached_target {
            // Stopped short: the whole remainder is consumed, dust included.
            if up {
                base_amount = remainder;
            } else {
                quote_amount = remainder;
            }
        }
    } else if up {
        quote_amount = quote_amount.min(remainder);
    } else {
        base_amount = base_amount.min(remainder);
    }

    Ok(SwapStep {
        sqrt_price_next,
        base_amount,
        quote_amount,
    })
}

/// Mutable swap-loop state, committed to the vamm only on success.
struct SwapState {
    amount_remaining: i128,
    sqrt_price: u128,
    tick: i32,
    liquidity: u128,
    growth_global_base: i128,
    growth_global_quote: i128,
    base_delta: i128,
    quote_delta: i128,
}

/// The pricing state machine for one (market, maturity) pair.
#[derive(Debug)]
pub struct Vamm {
    config: VammConfig,
    sqrt_price: u128,
    tick: i32,
    liquidity: u128,
    growth_global_base: i128,
    growth_global_quote: i128,
    ticks: TickLedger,
    bitmap: TickBitmap,
    oracle: Oracle,
    positions: HashMap<PositionKey, Position>,
    max_liquidity_per_tick: u128,
    locked: bool,
}

impl Vamm {
    /// Creates a vamm from its immutable configuration.
    ///
    /// # Arguments
    /// * `config` - Market id, maturity, tick spacing and starting price
    /// * `now` - Current timestamp; maturity must lie strictly beyond it
    pub fn new(config: VammConfig, now: i64) -> Result<Self> {
        if config.tick_spacing == 0 {
            return Err(VammError::InvalidTickSpacing);
        }
        if config.initial_sqrt_price == 0 {
            return Err(VammError::ZeroInitialPrice);
        }
        if config.maturity <= now {
            return Err(VammError::MaturityNotInFuture);
        }

        let tick = math::sqrt_price_to_tick(config.initial_sqrt_price)?;
        info!(
            market_id = config.market_id,
            maturity = config.maturity,
            tick_spacing = config.tick_spacing,
            initial_tick = tick,
            "vamm created"
        );

        Ok(Self {
            config,
            sqrt_price: config.initial_sqrt_price,
            tick,
            liquidity: 0,
            growth_global_base: 0,
            growth_global_quote: 0,
            ticks: TickLedger::new(),
            bitmap: TickBitmap::new(),
            oracle: Oracle::new(now),
            positions: HashMap::new(),
            max_liquidity_per_tick: tick::max_liquidity_per_tick(config.tick_spacing),
            locked: false,
        })
    }

    pub fn config(&self) -> &VammConfig {
        &self.config
    }

    pub fn sqrt_price(&self) -> u128 {
        self.sqrt_price
    }

    pub fn tick(&self) -> i32 {
        self.tick
    }

    pub fn liquidity(&self) -> u128 {
        self.liquidity
    }

    pub fn growth_global_base(&self) -> i128 {
        self.growth_global_base
    }

    pub fn growth_global_quote(&self) -> i128 {
        self.growth_global_quote
    }

    pub fn max_liquidity_per_tick(&self) -> u128 {
        self.max_liquidity_per_tick
    }

    pub fn tick_ledger(&self) -> &TickLedger {
        &self.ticks
    }

    pub fn bitmap(&self) -> &TickBitmap {
        &self.bitmap
    }

    pub fn oracle(&self) -> &Oracle {
        &self.oracle
    }

    /// Looks up a position by owner and range.
    pub fn position(&self, owner: AccountId, tick_lower: i32, tick_upper: i32) -> Result<&Position> {
        self.positions
            .get(&PositionKey {
                owner,
                tick_lower,
                tick_upper,
            })
            .ok_or(VammError::PositionNotFound)
    }

    /// Seconds remaining until maturity, saturating at zero.
    pub fn seconds_to_maturity(&self, now: i64) -> u64 {
        (self.config.maturity - now).max(0) as u64
    }

    fn check_outside_blackout(&self, now: i64) -> Result<()> {
        if now >= self.config.maturity - MATURITY_BLACKOUT_SECONDS {
            return Err(VammError::TooCloseToMaturity);
        }
        Ok(())
    }

    fn acquire_lock(&mut self) -> Result<()> {
        if self.locked {
            return Err(VammError::LockViolation);
        }
        self.locked = true;
        Ok(())
    }

    /// Executes a swap against the current liquidity distribution.
    ///
    /// Walks boundary to boundary, solving one uniform-liquidity step per
    /// segment, crossing every initialized tick landed on, and accumulating
    /// both global growth (liquidity side) and the trader's deltas with
    /// opposite signs. State is written back only when the whole walk
    /// succeeds.
    ///
    /// # Arguments
    /// * `params` - Direction, amount and price limit
    /// * `now` - Current timestamp
    /// * `rate_index` - Floating-rate index scalar, Q64.64
    pub fn swap(&mut self, params: SwapParams, now: i64, rate_index: u128) -> Result<SwapResult> {
        self.acquire_lock()?;
        let result = self.swap_inner(params, now, rate_index);
        self.locked = false;
        result
    }

    fn swap_inner(
        &mut self,
        params: SwapParams,
        now: i64,
        rate_index: u128,
    ) -> Result<SwapResult> {
        if params.amount_specified == 0 {
            return Err(VammError::ZeroSwapAmount);
        }
        self.check_outside_blackout(now)?;

        let up = params.direction == SwapDirection::Up;
        let limit = params.sqrt_price_limit;
        let limit_valid = if up {
            limit > self.sqrt_price && limit <= MAX_SQRT_PRICE
        } else {
            limit < self.sqrt_price && limit >= MIN_SQRT_PRICE
        };
        if !limit_valid {
            return Err(VammError::InvalidPriceLimit { limit });
        }

        let time_factor = math::annualized_time_factor(self.seconds_to_maturity(now))?;
        let pre_swap_tick = self.tick;

        let mut state = SwapState {
            amount_remaining: params.amount_specified,
            sqrt_price: self.sqrt_price,
            tick: self.tick,
            liquidity: self.liquidity,
            growth_global_base: self.growth_global_base,
            growth_global_quote: self.growth_global_quote,
            base_delta: 0,
            quote_delta: 0,
        };

        let spacing = self.config.tick_spacing as i32;
        while state.amount_remaining != 0 && state.sqrt_price != limit {
            // The working tick is price-derived and rarely on the grid; the
            // bitmap only accepts aligned origins.
            let aligned_tick = state.tick.div_euclid(spacing) * spacing;
            let (boundary, initialized) = self.bitmap.next_initialized_tick_within_one_word(
                aligned_tick,
                self.config.tick_spacing,
                !up,
            )?;
            let boundary = boundary.clamp(MIN_TICK, MAX_TICK);
            let boundary_price = math::tick_to_sqrt_price(boundary)?;
            let target = if up {
                boundary_price.min(limit)
            } else {
                boundary_price.max(limit)
            };

            let step = compute_swap_step(
                state.sqrt_price,
                target,
                state.liquidity,
                state.amount_remaining,
            )?;
            trace!(
                sqrt_price = state.sqrt_price,
                sqrt_price_next = step.sqrt_price_next,
                base = step.base_amount,
                quote = step.quote_amount,
                "swap step"
            );

            // Reduce the remainder by the specified side of this fill.
            let (amount_in, amount_out) = if up {
                (step.base_amount, step.quote_amount)
            } else {
                (step.quote_amount, step.base_amount)
            };
            if state.amount_remaining > 0 {
                let consumed = amount_in.min(state.amount_remaining.unsigned_abs());
                state.amount_remaining -= consumed as i128;
            } else {
                let produced = amount_out.min(state.amount_remaining.unsigned_abs());
                state.amount_remaining += produced as i128;
            }

            // Trader deltas for this segment; the fixed leg is valued over
            // the segment's own sqrt bounds, where liquidity was uniform.
            if step.base_amount > i128::MAX as u128 {
                return Err(VammError::MathOverflow);
            }
            let trader_base = if up {
                -(step.base_amount as i128)
            } else {
                step.base_amount as i128
            };
            let (seg_lo, seg_hi) = if up {
                (state.sqrt_price, step.sqrt_price_next)
            } else {
                (step.sqrt_price_next, state.sqrt_price)
            };
            let trader_quote =
                math::fixed_leg_delta(trader_base, seg_lo, seg_hi, time_factor, rate_index)?;
            state.base_delta = state
                .base_delta
                .checked_add(trader_base)
                .ok_or(VammError::MathOverflow)?;
            state.quote_delta = state
                .quote_delta
                .checked_add(trader_quote)
                .ok_or(VammError::MathOverflow)?;

            // Liquidity side takes the mirror image, scaled per unit.
            if state.liquidity > 0 {
                let growth_base =
                    signed_per_unit(trader_base.checked_neg().ok_or(VammError::MathOverflow)?, state.liquidity)?;
                let growth_quote =
                    signed_per_unit(trader_quote.checked_neg().ok_or(VammError::MathOverflow)?, state.liquidity)?;
                state.growth_global_base = state.growth_global_base.wrapping_add(growth_base);
                state.growth_global_quote = state.growth_global_quote.wrapping_add(growth_quote);
            }

            state.sqrt_price = step.sqrt_price_next;

            if state.sqrt_price == boundary_price {
                if initialized {
                    let net = self.ticks.cross(
                        boundary,
                        state.growth_global_base,
                        state.growth_global_quote,
                    )?;
                    let applied = if up {
                        net
                    } else {
                        net.checked_neg().ok_or(VammError::MathOverflow)?
                    };
                    state.liquidity = math::add_liquidity_delta(state.liquidity, applied)?;
                    trace!(tick = boundary, liquidity_net = net, "tick crossed");
                }
                // Moving left, the boundary itself now lies above the price.
                state.tick = if up {
                    boundary
                } else {
                    (boundary - 1).max(MIN_TICK)
                };
            } else if state.sqrt_price != self.sqrt_price {
                state.tick = math::sqrt_price_to_tick(state.sqrt_price)?;
            }
        }

        self.sqrt_price = state.sqrt_price;
        self.tick = state.tick;
        self.liquidity = state.liquidity;
        self.growth_global_base = state.growth_global_base;
        self.growth_global_quote = state.growth_global_quote;

        // One oracle sample per swap that moved the tick, recorded with the
        // rate that prevailed before the swap.
        if self.tick != pre_swap_tick {
            self.oracle.write(now, pre_swap_tick);
        }

        debug!(
            market_id = self.config.market_id,
            base_delta = state.base_delta,
            quote_delta = state.quote_delta,
            tick_after = self.tick,
            "swap complete"
        );

        Ok(SwapResult {
            base_delta: state.base_delta,
            quote_delta: state.quote_delta,
            sqrt_price_after: self.sqrt_price,
            tick_after: self.tick,
        })
    }

    /// Adds or removes liquidity over a tick range, settling the position's
    /// accrued growth on both legs in the same call.
    ///
    /// A zero delta is a pure settlement (poke). All validation happens
    /// before the first mutation, so a failed call leaves every structure
    /// untouched.
    ///
    /// # Arguments
    /// * `owner` - The position's account
    /// * `tick_lower` / `tick_upper` - Range boundaries, spacing-aligned
    /// * `liquidity_delta` - Signed liquidity change
    /// * `now` - Current timestamp; increases are blocked inside the
    ///   pre-maturity blackout window, removals never are
    pub fn modify_position(
        &mut self,
        owner: AccountId,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
        now: i64,
    ) -> Result<ModifyPositionResult> {
        self.acquire_lock()?;
        let result = self.modify_position_inner(owner, tick_lower, tick_upper, liquidity_delta, now);
        self.locked = false;
        result
    }

    fn modify_position_inner(
        &mut self,
        owner: AccountId,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
        now: i64,
    ) -> Result<ModifyPositionResult> {
        if tick_lower >= tick_upper
            || !(MIN_TICK..=MAX_TICK).contains(&tick_lower)
            || !(MIN_TICK..=MAX_TICK).contains(&tick_upper)
        {
            return Err(VammError::InvalidTickRange {
                lower: tick_lower,
                upper: tick_upper,
            });
        }
        let spacing = self.config.tick_spacing;
        if tick_lower % spacing as i32 != 0 {
            return Err(VammError::MisalignedTick {
                tick: tick_lower,
                spacing,
            });
        }
        if tick_upper % spacing as i32 != 0 {
            return Err(VammError::MisalignedTick {
                tick: tick_upper,
                spacing,
            });
        }
        if liquidity_delta > 0 {
            self.check_outside_blackout(now)?;
        }

        let key = PositionKey {
            owner,
            tick_lower,
            tick_upper,
        };

        // Validation pass: nothing below may fail after the first mutation.
        if liquidity_delta <= 0 {
            let pos = self.positions.get(&key).ok_or(VammError::PositionNotFound)?;
            let abs = liquidity_delta.unsigned_abs();
            if pos.liquidity < abs {
                return Err(VammError::InsufficientLiquidity {
                    requested: abs,
                    available: pos.liquidity,
                });
            }
        } else {
            self.ticks
                .check_capacity(tick_lower, liquidity_delta, self.max_liquidity_per_tick)?;
            self.ticks
                .check_capacity(tick_upper, liquidity_delta, self.max_liquidity_per_tick)?;
            if tick_lower <= self.tick && self.tick < tick_upper {
                self.liquidity
                    .checked_add(liquidity_delta.unsigned_abs())
                    .ok_or(VammError::MathOverflow)?;
            }
        }

        let flipped_lower = self.ticks.update(
            tick_lower,
            self.tick,
            liquidity_delta,
            false,
            self.growth_global_base,
            self.growth_global_quote,
            self.max_liquidity_per_tick,
        )?;
        let flipped_upper = self.ticks.update(
            tick_upper,
            self.tick,
            liquidity_delta,
            true,
            self.growth_global_base,
            self.growth_global_quote,
            self.max_liquidity_per_tick,
        )?;
        if flipped_lower {
            self.bitmap.flip_tick(tick_lower, spacing)?;
        }
        if flipped_upper {
            self.bitmap.flip_tick(tick_upper, spacing)?;
        }

        let (growth_inside_base, growth_inside_quote) = self.ticks.growth_inside(
            tick_lower,
            tick_upper,
            self.tick,
            self.growth_global_base,
            self.growth_global_quote,
        );
        let position = self.positions.entry(key).or_default();
        let (base_settled, quote_settled) =
            position.update(liquidity_delta, growth_inside_base, growth_inside_quote)?;

        if tick_lower <= self.tick && self.tick < tick_upper {
            self.liquidity = math::add_liquidity_delta(self.liquidity, liquidity_delta)?;
        }

        // Burns that emptied a boundary tick reclaim its ledger entry.
        if liquidity_delta < 0 {
            if flipped_lower {
                self.ticks.clear(tick_lower)?;
            }
            if flipped_upper {
                self.ticks.clear(tick_upper)?;
            }
        }

        let sqrt_lower = math::tick_to_sqrt_price(tick_lower)?;
        let sqrt_upper = math::tick_to_sqrt_price(tick_upper)?;
        let notional_abs = math::liquidity_to_notional(
            liquidity_delta.unsigned_abs(),
            sqrt_lower,
            sqrt_upper,
        )?;
        if notional_abs > i128::MAX as u128 {
            return Err(VammError::MathOverflow);
        }
        let notional_delta = if liquidity_delta >= 0 {
            notional_abs as i128
        } else {
            -(notional_abs as i128)
        };

        debug!(
            market_id = self.config.market_id,
            owner,
            tick_lower,
            tick_upper,
            liquidity_delta,
            notional_delta,
            "position modified"
        );

        Ok(ModifyPositionResult {
            base_settled,
            quote_settled,
            notional_delta,
        })
    }

    /// Raises the oracle's target cardinality.
    pub fn grow_oracle(&mut self, cardinality_next: usize) -> Result<usize> {
        self.oracle.grow(cardinality_next)
    }

    /// Tick-cumulative readings as of each `seconds_agos` entry.
    pub fn observe(&self, now: i64, seconds_agos: &[u64]) -> Result<Vec<i64>> {
        self.oracle.observe(now, self.tick, seconds_agos)
    }

    /// Time-weighted mean tick over the trailing window.
    pub fn time_weighted_mean_tick(&self, now: i64, window: u64) -> Result<i32> {
        self.oracle.time_weighted_mean_tick(now, self.tick, window)
    }

    /// Read-only view of a position's balances as if it were settled now.
    ///
    /// # Returns
    /// * `Result<(i128, i128)>` - The (base, quote) balances the position
    ///   would hold after a poke
    pub fn quote_position(
        &self,
        owner: AccountId,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<(i128, i128)> {
        let position = self.position(owner, tick_lower, tick_upper)?;
        let (growth_inside_base, growth_inside_quote) = self.ticks.growth_inside(
            tick_lower,
            tick_upper,
            self.tick,
            self.growth_global_base,
            self.growth_global_quote,
        );
        let pending_base = math::growth_to_amount(
            growth_inside_base.wrapping_sub(position.growth_inside_last_base),
            position.liquidity,
        )?;
        let pending_quote = math::growth_to_amount(
            growth_inside_quote.wrapping_sub(position.growth_inside_last_quote),
            position.liquidity,
        )?;
        Ok((
            position
                .base_balance
                .checked_add(pending_base)
                .ok_or(VammError::MathOverflow)?,
            position
                .quote_balance
                .checked_add(pending_quote)
                .ok_or(VammError::MathOverflow)?,
        ))
    }
}

/// Scales a signed amount into a per-unit-liquidity growth increment.
fn signed_per_unit(amount: i128, liquidity: u128) -> Result<i128> {
    let scaled = math::amount_to_growth(amount.unsigned_abs(), liquidity)?;
    if scaled > i128::MAX as u128 {
        return Err(VammError::MathOverflow);
    }
    Ok(if amount >= 0 {
        scaled as i128
    } else {
        -(scaled as i128)
    })
}
