/// Tick Ledger Module
///
/// The fixed-rate grid is divided into discrete ticks, and liquidity
/// positions reference a lower and an upper tick. This module stores the
/// per-tick state for every tick that currently has liquidity referencing it
/// and maintains the growth-outside accumulators that make per-range
/// settlement an O(1) computation.
///
/// Growth accumulators track notional per unit of liquidity in Q64.64 and
/// use wrapping arithmetic throughout: only differences between snapshots
/// are meaningful, so wrap-around cancels out. There is one accumulator per
/// leg, base (the linear leg) and quote (the fixed leg).
use crate::constants::{MAX_TICK, MIN_TICK};
use crate::errors::{Result, VammError};
use std::collections::HashMap;

/// State of a single initialized tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// Total liquidity referencing this tick from either side.
    pub liquidity_gross: u128,
    /// Net liquidity added when the tick is crossed left to right.
    pub liquidity_net: i128,
    /// Base-leg growth per unit liquidity accumulated on the far side of
    /// this tick relative to the current tick, Q64.64, wrapping.
    pub growth_outside_base: i128,
    /// Quote-leg (fixed-leg) growth on the far side, Q64.64, wrapping.
    pub growth_outside_quote: i128,
    /// Set while liquidity_gross > 0.
    pub initialized: bool,
}

impl TickInfo {
    /// Updates the tick's liquidity when a position referencing it changes.
    ///
    /// # Arguments
    ///
    /// * `liquidity_delta` - The change in liquidity. Positive if adding,
    ///   negative if removing.
    /// * `is_upper` - True if this tick is the upper boundary of the
    ///   position, false if it is the lower boundary.
    /// * `max_liquidity` - Per-tick cap on gross liquidity.
    ///
    /// # Returns
    /// * `Result<bool>` - Whether the tick flipped between initialized and
    ///   uninitialized.
    pub fn apply_liquidity_delta(
        &mut self,
        tick: i32,
        liquidity_delta: i128,
        is_upper: bool,
        max_liquidity: u128,
    ) -> Result<bool> {
        let abs_delta = liquidity_delta.unsigned_abs();
        let gross_before = self.liquidity_gross;

        let gross_after = if liquidity_delta >= 0 {
            let next = gross_before
                .checked_add(abs_delta)
                .ok_or(VammError::MathOverflow)?;
            if next > max_liquidity {
                return Err(VammError::LiquidityOverflow {
                    tick,
                    gross: next,
                    cap: max_liquidity,
                });
            }
            next
        } else {
            gross_before
                .checked_sub(abs_delta)
                .ok_or(VammError::InsufficientLiquidity {
                    requested: abs_delta,
                    available: gross_before,
                })?
        };

        self.liquidity_gross = gross_after;
        self.liquidity_net = if is_upper {
            self.liquidity_net.checked_sub(liquidity_delta)
        } else {
            self.liquidity_net.checked_add(liquidity_delta)
        }
        .ok_or(VammError::MathOverflow)?;

        self.initialized = gross_after > 0;
        Ok((gross_before == 0) != (gross_after == 0))
    }
}

/// Sparse ledger of initialized ticks for one vamm.
#[derive(Debug, Default)]
pub struct TickLedger {
    ticks: HashMap<i32, TickInfo>,
}

impl TickLedger {
    pub fn new() -> Self {
        Self {
            ticks: HashMap::new(),
        }
    }

    /// Returns the stored state for a tick, if present.
    pub fn get(&self, tick: i32) -> Option<&TickInfo> {
        self.ticks.get(&tick)
    }

    /// Number of ticks currently held in the ledger.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Applies a liquidity change to a tick, creating its entry on first
    /// touch.
    ///
    /// A tick created at or below the current tick starts with its
    /// growth-outside accumulators seeded to the current global values, so
    /// that growth accrued before the tick existed is attributed entirely to
    /// the side it actually happened on. Ticks above the current tick start
    /// at zero.
    ///
    /// # Arguments
    ///
    /// * `tick` - The tick being updated
    /// * `current_tick` - The vamm's current tick
    /// * `liquidity_delta` - Signed liquidity change
    /// * `is_upper` - Whether `tick` is the position's upper boundary
    /// * `global_growth_base` / `global_growth_quote` - The vamm's global
    ///   growth accumulators
    /// * `max_liquidity` - Per-tick gross liquidity cap
    ///
    /// # Returns
    /// * `Result<bool>` - Whether the tick flipped initialization state
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        tick: i32,
        current_tick: i32,
        liquidity_delta: i128,
        is_upper: bool,
        global_growth_base: i128,
        global_growth_quote: i128,
        max_liquidity: u128,
    ) -> Result<bool> {
        if !(MIN_TICK..=MAX_TICK).contains(&tick) {
            return Err(VammError::OutOfBounds { tick });
        }

        let is_new = !self.ticks.contains_key(&tick);
        let info = self.ticks.entry(tick).or_default();
        if is_new && tick <= current_tick {
            info.growth_outside_base = global_growth_base;
            info.growth_outside_quote = global_growth_quote;
        }

        info.apply_liquidity_delta(tick, liquidity_delta, is_upper, max_liquidity)
    }

    /// Validates, without mutating, that a positive liquidity delta would
    /// not push the tick over its gross cap.
    pub fn check_capacity(
        &self,
        tick: i32,
        liquidity_delta: i128,
        max_liquidity: u128,
    ) -> Result<()> {
        if liquidity_delta <= 0 {
            return Ok(());
        }
        let gross = self.ticks.get(&tick).map_or(0, |t| t.liquidity_gross);
        let next = gross
            .checked_add(liquidity_delta.unsigned_abs())
            .ok_or(VammError::MathOverflow)?;
        if next > max_liquidity {
            return Err(VammError::LiquidityOverflow {
                tick,
                gross: next,
                cap: max_liquidity,
            });
        }
        Ok(())
    }

    /// Crosses a tick during a swap, flipping its growth-outside
    /// accumulators to the other side of the current tick.
    ///
    /// # Returns
    /// * `Result<i128>` - The tick's liquidity_net, to be added to (left to
    ///   right) or subtracted from (right to left) active liquidity by the
    ///   caller.
    pub fn cross(
        &mut self,
        tick: i32,
        global_growth_base: i128,
        global_growth_quote: i128,
    ) -> Result<i128> {
        let info = self
            .ticks
            .get_mut(&tick)
            .ok_or(VammError::TickNotFound { tick })?;
        info.growth_outside_base = global_growth_base.wrapping_sub(info.growth_outside_base);
        info.growth_outside_quote = global_growth_quote.wrapping_sub(info.growth_outside_quote);
        Ok(info.liquidity_net)
    }

    /// Removes a tick's entry once no liquidity references it.
    pub fn clear(&mut self, tick: i32) -> Result<()> {
        let info = self
            .ticks
            .get(&tick)
            .ok_or(VammError::TickNotFound { tick })?;
        if info.liquidity_gross != 0 {
            return Err(VammError::TickNotClearable { tick });
        }
        self.ticks.remove(&tick);
        Ok(())
    }

    /// Computes the growth accumulated strictly inside a tick range, per
    /// leg (base, quote).
    ///
    /// Splits each global accumulator into below-lower, above-upper and
    /// inside parts using the stored growth-outside values. Boundary ticks
    /// missing from the ledger contribute zero outside-growth, which is the
    /// correct reading for a never-initialized tick above the current tick
    /// and the seeded reading for one below it.
    pub fn growth_inside(
        &self,
        tick_lower: i32,
        tick_upper: i32,
        current_tick: i32,
        global_growth_base: i128,
        global_growth_quote: i128,
    ) -> (i128, i128) {
        let zero = TickInfo::default();
        let lower = self.ticks.get(&tick_lower).unwrap_or(&zero);
        let upper = self.ticks.get(&tick_upper).unwrap_or(&zero);

        let split = |global: i128, lower_outside: i128, upper_outside: i128| {
            let below = if current_tick >= tick_lower {
                lower_outside
            } else {
                global.wrapping_sub(lower_outside)
            };
            let above = if current_tick < tick_upper {
                upper_outside
            } else {
                global.wrapping_sub(upper_outside)
            };
            global.wrapping_sub(below).wrapping_sub(above)
        };

        (
            split(
                global_growth_base,
                lower.growth_outside_base,
                upper.growth_outside_base,
            ),
            split(
                global_growth_quote,
                lower.growth_outside_quote,
                upper.growth_outside_quote,
            ),
        )
    }
}

/// The maximum gross liquidity one tick may carry, derived so the sum over
/// every spacing-aligned tick in the domain cannot overflow u128.
pub fn max_liquidity_per_tick(tick_spacing: u16) -> u128 {
    let spacing = tick_spacing as i32;
    let min_aligned = (MIN_TICK / spacing) * spacing;
    let max_aligned = (MAX_TICK / spacing) * spacing;
    let num_ticks = ((max_aligned - min_aligned) / spacing) as u128 + 1;
    u128::MAX / num_ticks
}
