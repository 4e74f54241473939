//! Concentrated-liquidity pricing engine for fixed-maturity rate swaps.
//!
//! The engine prices the fixed leg of an interest-rate swap on a virtual
//! AMM: makers provide liquidity over tick ranges of an exponential
//! fixed-rate grid (rate = 1.0001^tick), takers swap base notional against
//! fixed-leg value along the curve, and a ring-buffer oracle records the
//! tick path for time-weighted rate reads. Everything is an in-memory state
//! machine; custody, margining and settlement live in the host.
//!
//! All prices, growth accumulators and rate indices are Q64.64 fixed-point.
//! Every mutating operation is all-or-nothing and guarded by a per-vamm
//! reentrancy lock.

pub mod constants;
pub mod engine;
pub mod errors;
pub mod math;
pub mod oracle;
pub mod position;
pub mod state;
pub mod tick;
pub mod tick_bitmap;

pub use engine::{
    AccessGate, AllowAll, Engine, FixedRateIndex, GatedOp, MarketId, RateIndexProvider,
    VammRegistry,
};
pub use errors::{Result, VammError};
pub use position::{AccountId, Position, PositionKey};
pub use state::{ModifyPositionResult, SwapDirection, SwapParams, SwapResult, Vamm, VammConfig};

#[cfg(test)]
mod unit_test;

#[cfg(test)]
mod property_based_test;
