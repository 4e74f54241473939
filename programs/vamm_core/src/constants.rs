/// Protocol Constants
///
/// This module defines the fundamental parameters and boundaries that govern
/// the rate-swap pricing engine: the tick domain of the fixed-rate grid, the
/// Q64.64 fixed-point scale, the precomputed power table used by tick math,
/// and the temporal limits around maturity.

/// The minimum tick index supported by the engine.
///
/// Ticks index an exponential grid of fixed rates, rate = 1.0001^tick.
/// At this tick the fixed rate is approximately 0.001% (0.1 basis point),
/// the lowest rate the market can quote.
pub const MIN_TICK: i32 = -69_100;

/// The maximum tick index supported by the engine.
///
/// At this tick the fixed rate is approximately 1000%, the highest rate the
/// market can quote. The symmetric bound keeps every sqrt-rate comfortably
/// representable in Q64.64.
pub const MAX_TICK: i32 = 69_100;

/// 1.0 in Q64.64 fixed-point representation.
pub const Q64: u128 = 1 << 64;

/// The sqrt rate corresponding to MIN_TICK, in Q64.64.
///
/// Equals `tick_to_sqrt_price(MIN_TICK)` exactly; swap price limits below
/// this value are rejected.
pub const MIN_SQRT_PRICE: u128 = 582_783_579_893_165_541;

/// The sqrt rate corresponding to MAX_TICK, in Q64.64.
///
/// Equals `tick_to_sqrt_price(MAX_TICK)` exactly; swap price limits above
/// this value are rejected.
pub const MAX_SQRT_PRICE: u128 = 583_891_479_892_618_445_878;

/// Precomputed table of sqrt(1.0001)^(2^i) in Q64.64, for i in 0..=16.
///
/// `binary_pow` combines these factors to evaluate sqrt(1.0001)^tick for any
/// |tick| <= MAX_TICK (MAX_TICK < 2^17, so index 16 is the largest ever
/// touched). Values are rounded to nearest from an 80-digit computation; the
/// resulting curve is strictly monotone over the whole tick domain and
/// inverts exactly under the binary-search floor inverse.
pub const POWERS: [u128; 17] = [
    0x0000_0000_0000_0001_0003_46D6_FF11_672B, // sqrt(1.0001)^1
    0x0000_0000_0000_0001_0006_8DB8_BAC7_10CB, // sqrt(1.0001)^2
    0x0000_0000_0000_0001_000D_1B9C_68AB_E5F7, // sqrt(1.0001)^4
    0x0000_0000_0000_0001_001A_37E4_A234_CB08, // sqrt(1.0001)^8
    0x0000_0000_0000_0001_0034_7278_AB0E_92AE, // sqrt(1.0001)^16
    0x0000_0000_0000_0001_0068_EFB0_0A52_5481, // sqrt(1.0001)^32
    0x0000_0000_0000_0001_00D2_0A63_B417_383A, // sqrt(1.0001)^64
    0x0000_0000_0000_0001_01A4_C11C_742D_D773, // sqrt(1.0001)^128
    0x0000_0000_0000_0001_034C_35C3_1F64_CFA7, // sqrt(1.0001)^256
    0x0000_0000_0000_0001_06A3_4B78_C8AA_FFC0, // sqrt(1.0001)^512
    0x0000_0000_0000_0001_0D72_A6A4_6CCD_8BCF, // sqrt(1.0001)^1024
    0x0000_0000_0000_0001_1B9A_258E_6392_8597, // sqrt(1.0001)^2048
    0x0000_0000_0000_0001_3A2E_2BDA_04F8_379F, // sqrt(1.0001)^4096
    0x0000_0000_0000_0001_8195_4BE6_9E0D_A8FE, // sqrt(1.0001)^8192
    0x0000_0000_0000_0002_44C2_655D_185A_0291, // sqrt(1.0001)^16384
    0x0000_0000_0000_0005_2581_6EEB_9F93_5B1C, // sqrt(1.0001)^32768
    0x0000_0000_0000_001A_7C8D_00B5_5168_4FF5, // sqrt(1.0001)^65536
];

/// Seconds in a (non-leap) year, used to annualize time-to-maturity for the
/// fixed-leg valuation.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Length of the pre-maturity blackout window in seconds.
///
/// Swaps and liquidity increases are rejected once the current time is within
/// this many seconds of maturity; burns remain allowed so providers can
/// always exit.
pub const MATURITY_BLACKOUT_SECONDS: i64 = 3_600;

/// Upper bound on oracle ring-buffer capacity.
///
/// `grow` may raise a vamm's observation cardinality up to this limit but
/// never beyond it.
pub const MAX_OBSERVATIONS: usize = 1_024;

/// Number of spacing-aligned slots tracked per bitmap word.
pub const BITMAP_WORD_SIZE: i32 = 256;
