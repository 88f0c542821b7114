//! Core placesim data structures and routines. The most common entry point
//! is [`PlacementEnv`], the environment an external placement policy drives
//! through `reset` and `step`.

pub use placesim_core::*;
