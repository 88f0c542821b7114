use crate::traffic::{matrix::TrafficMatrix, TrafficGenerator};

/// Per-container predicted incoming volumes and their uncertainties. Both
/// vectors are indexed by container ID and have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub volumes: Vec<f64>,
    pub uncertainties: Vec<f64>,
}

/// An optional collaborator that enriches observations with predicted
/// per-container traffic. The core treats it purely as a pluggable function;
/// its internal modeling is out of scope here.
pub trait TrafficPredictor: std::fmt::Debug {
    /// Fits the predictor against a traffic source. Opaque to the core.
    fn train(&mut self, generator: &TrafficGenerator);

    /// Predicts per-container incoming volume from the current matrix,
    /// folding the observation into the predictor's state.
    fn predict(&mut self, matrix: &TrafficMatrix) -> Prediction;

    /// Discards fitted state.
    fn reset(&mut self);
}
