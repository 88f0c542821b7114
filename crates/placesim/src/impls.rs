//! Batteries-included implementations of the core's pluggable seams.

/// Traffic predictor implementations.
pub mod predictor {
    pub use predictor_impls::*;
}
