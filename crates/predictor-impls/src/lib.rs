//! Implementations of the core's [`TrafficPredictor`] seam.

pub mod ewma;

pub use ewma::EwmaPredictor;

use placesim_core::TrafficPredictor;

/// Default predictor over `n` containers.
pub fn default_predictor(n: usize) -> Box<dyn TrafficPredictor> {
    Box::new(EwmaPredictor::new(n))
}
