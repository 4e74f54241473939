/// Maker Position Module
///
/// A position is one account's liquidity over one tick range. Each position
/// checkpoints the range's growth-inside accumulators at its last touch;
/// settlement of the base and quote notional accrued since then happens
/// lazily, whenever the position is next modified. Positions are created on
/// first provision and never deleted: liquidity may return to zero while
/// the balances remain queryable.
use crate::errors::{Result, VammError};
use crate::math;

/// Identifier for an account interacting with the engine.
pub type AccountId = u64;

/// Unique key of a position: one account may hold many ranges, but at most
/// one position per range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pub owner: AccountId,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

/// State of a single liquidity position.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// The amount of liquidity this position provides.
    pub liquidity: u128,
    /// Base-leg growth-inside checkpoint taken at the last modification,
    /// Q64.64 per unit liquidity, wrapping.
    pub growth_inside_last_base: i128,
    /// Quote-leg checkpoint, same encoding.
    pub growth_inside_last_quote: i128,
    /// Signed base notional settled to this position.
    pub base_balance: i128,
    /// Signed quote (fixed-leg) notional settled to this position.
    pub quote_balance: i128,
}

impl Position {
    /// Settles accrued growth on both legs and applies a liquidity delta.
    ///
    /// Settlement always uses the liquidity held *before* the delta: growth
    /// since the last checkpoint was earned by the old liquidity amount.
    ///
    /// # Arguments
    /// * `liquidity_delta` - Signed change in liquidity; zero is a pure
    ///   settlement (poke)
    /// * `growth_inside_base` / `growth_inside_quote` - The range's current
    ///   growth-inside accumulators
    ///
    /// # Returns
    /// * `Result<(i128, i128)>` - The (base, quote) notional settled in this
    ///   update
    pub fn update(
        &mut self,
        liquidity_delta: i128,
        growth_inside_base: i128,
        growth_inside_quote: i128,
    ) -> Result<(i128, i128)> {
        let settled_base = math::growth_to_amount(
            growth_inside_base.wrapping_sub(self.growth_inside_last_base),
            self.liquidity,
        )?;
        let settled_quote = math::growth_to_amount(
            growth_inside_quote.wrapping_sub(self.growth_inside_last_quote),
            self.liquidity,
        )?;

        self.liquidity = math::add_liquidity_delta(self.liquidity, liquidity_delta)?;
        self.growth_inside_last_base = growth_inside_base;
        self.growth_inside_last_quote = growth_inside_quote;
        self.base_balance = self
            .base_balance
            .checked_add(settled_base)
            .ok_or(VammError::MathOverflow)?;
        self.quote_balance = self
            .quote_balance
            .checked_add(settled_quote)
            .ok_or(VammError::MathOverflow)?;

        Ok((settled_base, settled_quote))
    }
}
