/// Engine Error Codes
///
/// Every fallible operation in the engine returns one of these variants.
/// Failures are all-or-nothing: an error means no state was mutated. The
/// taxonomy mirrors the categories callers care about: precondition
/// violations they can correct and retry, capacity limits, temporal
/// violations, reentrancy or lifecycle misuse, and lookups that found
/// nothing.
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, VammError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VammError {
    // --- Precondition failures: caller corrects and retries ---
    /// A swap was requested with amount_specified == 0.
    #[error("swap amount must be non-zero")]
    ZeroSwapAmount,

    /// Tick bounds are inverted, equal, or outside [MIN_TICK, MAX_TICK].
    #[error("invalid tick range [{lower}, {upper})")]
    InvalidTickRange { lower: i32, upper: i32 },

    /// A tick index is not a multiple of the vamm's tick spacing.
    #[error("tick {tick} is not aligned to spacing {spacing}")]
    MisalignedTick { tick: i32, spacing: u16 },

    /// A vamm was created with a zero initial sqrt price.
    #[error("initial sqrt price must be non-zero")]
    ZeroInitialPrice,

    /// Tick spacing must be non-zero.
    #[error("tick spacing must be non-zero")]
    InvalidTickSpacing,

    /// The swap price limit is on the wrong side of the current price, equal
    /// to it, or outside the global sqrt-price bounds.
    #[error("invalid sqrt price limit {limit}")]
    InvalidPriceLimit { limit: u128 },

    /// A sqrt price fell outside [MIN_SQRT_PRICE, MAX_SQRT_PRICE].
    #[error("sqrt price {sqrt_price} out of range")]
    PriceOutOfRange { sqrt_price: u128 },

    /// A tick index fell outside [MIN_TICK, MAX_TICK].
    #[error("tick {tick} out of bounds")]
    OutOfBounds { tick: i32 },

    // --- Capacity failures ---
    /// Adding liquidity would push a tick's gross liquidity over the
    /// per-tick cap.
    #[error("tick {tick} gross liquidity {gross} would exceed cap {cap}")]
    LiquidityOverflow { tick: i32, gross: u128, cap: u128 },

    /// An attempt to remove more liquidity than is present.
    #[error("insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: u128, available: u128 },

    // --- Temporal failures ---
    /// The operation was attempted inside the pre-maturity blackout window
    /// (or after maturity).
    #[error("too close to maturity")]
    TooCloseToMaturity,

    /// A vamm was created with a maturity not strictly in the future.
    #[error("maturity must be in the future")]
    MaturityNotInFuture,

    // --- Reentrancy / lifecycle misuse: fatal integration errors ---
    /// A mutating entry was re-entered while the vamm lock was held.
    #[error("vamm is locked")]
    LockViolation,

    /// A vamm already exists for this (market, maturity) pair.
    #[error("vamm already exists for market {market_id} maturity {maturity}")]
    VammAlreadyExists { market_id: u64, maturity: i64 },

    // --- Not-found: distinct from validation failures ---
    /// No vamm registered under this (market, maturity) pair.
    #[error("no vamm for market {market_id} maturity {maturity}")]
    VammNotFound { market_id: u64, maturity: i64 },

    /// No position recorded for this (account, range) key.
    #[error("position not found")]
    PositionNotFound,

    /// The tick ledger holds no entry for this tick.
    #[error("tick {tick} not found")]
    TickNotFound { tick: i32 },

    /// `clear` was requested on a tick that still carries gross liquidity.
    #[error("tick {tick} still has gross liquidity and cannot be cleared")]
    TickNotClearable { tick: i32 },

    // --- External gate denials (no state touched) ---
    /// The access gate reports the market as paused.
    #[error("operation paused")]
    OperationPaused,

    /// The access gate denied the caller.
    #[error("unauthorized")]
    Unauthorized,

    // --- Numeric / oracle ---
    /// Checked arithmetic overflowed.
    #[error("math overflow")]
    MathOverflow,

    /// Requested oracle cardinality is zero or exceeds MAX_OBSERVATIONS.
    #[error("invalid observation cardinality {requested}")]
    InvalidObservationCardinality { requested: usize },

    /// The requested window reaches past the oldest stored observation.
    #[error("oracle has no observation old enough for the requested window")]
    OracleInsufficientData,
}
