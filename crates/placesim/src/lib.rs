//! `placesim` simulates a tiered data-center network hosting movable
//! workload containers under time-varying traffic, and scores any placement
//! of those containers by the network cost it induces plus an energy penalty
//! for active servers. It is a deterministic, steppable cost model against
//! which an external placement policy (human, heuristic, or learned) can be
//! evaluated step by step.

#![warn(unreachable_pub, missing_docs)]

pub mod core;

pub mod impls;
