//! Simulation constants. These are set to match the reference cost model's
//! default behavior.

/// Edge weight between the core switch and an aggregation switch.
pub const CORE_AGG_WEIGHT: u64 = 10;

/// Edge weight between an aggregation switch and a server.
pub const AGG_SERVER_WEIGHT: u64 = 1;

/// Server capacity attribute. Carried on every server node but unused by the
/// cost model; reserved for future placement constraints.
pub const SERVER_CAPACITY: u32 = 10;

/// Per-pair inclusion probability for background noise traffic.
pub const DEFAULT_NOISE_PROB: f64 = 0.1;

/// Relative standard deviation of background noise volumes.
pub const DEFAULT_NOISE_REL_STDDEV: f64 = 0.2;

/// Per-step probability that an inactive service chain is triggered.
pub const DEFAULT_CHAIN_TRIGGER_PROB: f64 = 0.05;

/// Relative standard deviation applied to chain hop volumes.
pub const DEFAULT_CHAIN_REL_STDDEV: f64 = 0.2;

/// Per-step probability of an ad-hoc micro-burst between a random pair.
pub const DEFAULT_MICROBURST_PROB: f64 = 0.25;

/// Mean volume of a micro-burst.
pub const DEFAULT_MICROBURST_MEAN: f64 = 2000.0;

/// Relative standard deviation of micro-burst volumes.
pub const DEFAULT_MICROBURST_REL_STDDEV: f64 = 0.5;

/// Mean background volume at step 0.
pub const DEFAULT_BASE_LOAD: f64 = 50.0;

/// Linear growth of the background mean volume per step.
pub const DEFAULT_DRIFT_RATE: f64 = 0.5;

/// Energy penalty per server hosting at least one container.
pub const DEFAULT_ENERGY_PER_SERVER: f64 = 25_000.0;

/// Weight applied to summed predictor uncertainty in the reward.
pub const DEFAULT_RISK_WEIGHT: f64 = 0.1;

/// Volume of the manually triggered demonstration burst.
pub const DEMO_BURST_VOLUME: f64 = 5000.0;
