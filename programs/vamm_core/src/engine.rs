/// Engine Module
///
/// The outermost layer of the crate: a registry of vamms keyed by
/// (market, maturity), plus the seams to the host system. The host supplies
/// an access gate, consulted before every mutating entry, and a rate-index
/// provider whose Q64.64 scalar feeds fixed-leg pricing read-only. A gate
/// denial leaves zero state touched.
use crate::errors::{Result, VammError};
use crate::position::AccountId;
use crate::state::{ModifyPositionResult, SwapParams, SwapResult, Vamm, VammConfig};
use std::collections::HashMap;
use tracing::warn;

/// Identifier of a market (an underlying rate).
pub type MarketId = u64;

/// The mutating entries the gate can individually allow or deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedOp {
    CreateVamm,
    Swap,
    ModifyPosition,
    GrowOracle,
}

/// Host-supplied access control.
pub trait AccessGate {
    /// Returns `Ok(())` to admit the operation, `OperationPaused` or
    /// `Unauthorized` to refuse it.
    fn check(&self, op: GatedOp) -> Result<()>;
}

/// Gate that admits everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl AccessGate for AllowAll {
    fn check(&self, _op: GatedOp) -> Result<()> {
        Ok(())
    }
}

/// Host-supplied floating-rate index.
///
/// The index is a monotone non-decreasing Q64.64 scalar (1.0 at market
/// inception) tracking the compounded floating rate. The engine only ever
/// reads it.
pub trait RateIndexProvider {
    fn rate_index(&self) -> u128;
}

/// Provider returning a constant index, for hosts that settle externally
/// and for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateIndex(pub u128);

impl RateIndexProvider for FixedRateIndex {
    fn rate_index(&self) -> u128 {
        self.0
    }
}

/// Storage of every live vamm, one per (market, maturity) pair.
///
/// Vamms are created explicitly and never removed; a matured vamm stays
/// queryable for settlement.
#[derive(Debug, Default)]
pub struct VammRegistry {
    vamms: HashMap<(MarketId, i64), Vamm>,
}

impl VammRegistry {
    pub fn new() -> Self {
        Self {
            vamms: HashMap::new(),
        }
    }

    /// Registers a new vamm built from `config`.
    pub fn create(&mut self, config: VammConfig, now: i64) -> Result<()> {
        let key = (config.market_id, config.maturity);
        if self.vamms.contains_key(&key) {
            return Err(VammError::VammAlreadyExists {
                market_id: config.market_id,
                maturity: config.maturity,
            });
        }
        let vamm = Vamm::new(config, now)?;
        self.vamms.insert(key, vamm);
        Ok(())
    }

    pub fn get(&self, market_id: MarketId, maturity: i64) -> Result<&Vamm> {
        self.vamms
            .get(&(market_id, maturity))
            .ok_or(VammError::VammNotFound {
                market_id,
                maturity,
            })
    }

    pub fn get_mut(&mut self, market_id: MarketId, maturity: i64) -> Result<&mut Vamm> {
        self.vamms
            .get_mut(&(market_id, maturity))
            .ok_or(VammError::VammNotFound {
                market_id,
                maturity,
            })
    }

    pub fn len(&self) -> usize {
        self.vamms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vamms.is_empty()
    }
}

/// Bundles the registry with the host collaborators and exposes the
/// engine's entry points.
#[derive(Debug)]
pub struct Engine<G: AccessGate, R: RateIndexProvider> {
    registry: VammRegistry,
    gate: G,
    rate_index: R,
}

impl<G: AccessGate, R: RateIndexProvider> Engine<G, R> {
    pub fn new(gate: G, rate_index: R) -> Self {
        Self {
            registry: VammRegistry::new(),
            gate,
            rate_index,
        }
    }

    pub fn registry(&self) -> &VammRegistry {
        &self.registry
    }

    /// Creates a vamm for a (market, maturity) pair.
    pub fn create_vamm(&mut self, config: VammConfig, now: i64) -> Result<()> {
        self.gate.check(GatedOp::CreateVamm).inspect_err(|e| {
            warn!(market_id = config.market_id, error = %e, "create denied")
        })?;
        self.registry.create(config, now)
    }

    /// Executes a swap on the addressed vamm.
    pub fn swap(
        &mut self,
        market_id: MarketId,
        maturity: i64,
        params: SwapParams,
        now: i64,
    ) -> Result<SwapResult> {
        self.gate.check(GatedOp::Swap)?;
        let rate_index = self.rate_index.rate_index();
        self.registry
            .get_mut(market_id, maturity)?
            .swap(params, now, rate_index)
    }

    /// Adds or removes liquidity on the addressed vamm.
    #[allow(clippy::too_many_arguments)]
    pub fn modify_position(
        &mut self,
        market_id: MarketId,
        maturity: i64,
        owner: AccountId,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
        now: i64,
    ) -> Result<ModifyPositionResult> {
        self.gate.check(GatedOp::ModifyPosition)?;
        self.registry.get_mut(market_id, maturity)?.modify_position(
            owner,
            tick_lower,
            tick_upper,
            liquidity_delta,
            now,
        )
    }

    /// Raises the oracle cardinality of the addressed vamm.
    pub fn grow_oracle(
        &mut self,
        market_id: MarketId,
        maturity: i64,
        cardinality_next: usize,
    ) -> Result<usize> {
        self.gate.check(GatedOp::GrowOracle)?;
        self.registry
            .get_mut(market_id, maturity)?
            .grow_oracle(cardinality_next)
    }

    /// Read-only access to a vamm.
    pub fn vamm(&self, market_id: MarketId, maturity: i64) -> Result<&Vamm> {
        self.registry.get(market_id, maturity)
    }

    /// Time-weighted mean tick of the addressed vamm.
    pub fn time_weighted_mean_tick(
        &self,
        market_id: MarketId,
        maturity: i64,
        now: i64,
        window: u64,
    ) -> Result<i32> {
        self.registry
            .get(market_id, maturity)?
            .time_weighted_mean_tick(now, window)
    }

    /// Settled-if-poked balances of a position on the addressed vamm.
    pub fn quote_position(
        &self,
        market_id: MarketId,
        maturity: i64,
        owner: AccountId,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<(i128, i128)> {
        self.registry
            .get(market_id, maturity)?
            .quote_position(owner, tick_lower, tick_upper)
    }
}
