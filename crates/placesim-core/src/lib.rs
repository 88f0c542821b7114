#![warn(unreachable_pub, missing_debug_implementations)]

//! The core `placesim` library. This crate simulates a tiered data-center
//! fabric hosting movable containers under time-varying traffic, and scores
//! any placement by the network cost it induces plus an energy penalty for
//! active servers. The main entry point is [`PlacementEnv`], a deterministic,
//! steppable environment an external placement policy drives through
//! [`PlacementEnv::reset`] and [`PlacementEnv::step`].

#[macro_use]
mod ident;

pub mod constants;
pub mod env;
pub mod network;
pub mod predictor;
pub mod traffic;

#[cfg(test)]
pub(crate) mod testing;

pub use env::{
    Action, ActionError, EnvConfig, EnvError, EnvState, Observation, PlacementEnv, ResetInfo,
    StepInfo, StepOutcome,
};
pub use network::{
    types::{ContainerId, Link, Node, NodeId, NodeKind},
    Fabric, FabricState, TopologyError,
};
pub use predictor::{Prediction, TrafficPredictor};
pub use traffic::{
    chain::{ChainSpec, ChainSpecError, HopTraffic, ServiceChain},
    matrix::TrafficMatrix,
    TrafficConfig, TrafficConfigError, TrafficGenerator,
};
