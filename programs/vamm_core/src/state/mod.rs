pub mod vamm;

pub use vamm::{
    compute_swap_step, ModifyPositionResult, SwapDirection, SwapParams, SwapResult, SwapStep,
    Vamm, VammConfig,
};
