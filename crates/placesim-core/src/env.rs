//! The step/reset orchestration layer. [`PlacementEnv`] owns the fabric and
//! the traffic generator, turns an external policy's action into a new
//! placement, and scores the result as `reward = -(network cost + energy
//! cost + risk penalty)`.

use rand::prelude::*;

use crate::constants::{DEFAULT_ENERGY_PER_SERVER, DEFAULT_RISK_WEIGHT, DEMO_BURST_VOLUME};
use crate::network::{
    types::{ContainerId, NodeId},
    Fabric, FabricState, TopologyError,
};
use crate::predictor::{Prediction, TrafficPredictor};
use crate::traffic::{chain::ChainSpec, TrafficConfig, TrafficConfigError, TrafficGenerator};

/// Environment construction parameters.
#[derive(Debug, Clone, typed_builder::TypedBuilder)]
pub struct EnvConfig {
    #[builder(default = 4)]
    pub num_pods: usize,
    #[builder(default = 4)]
    pub servers_per_pod: usize,
    #[builder(default = 20)]
    pub num_containers: usize,
    /// Scripted service chains owned by the traffic generator.
    #[builder(default)]
    pub chains: Vec<ChainSpec>,
    #[builder(default)]
    pub traffic: TrafficConfig,
    #[builder(default = DEFAULT_ENERGY_PER_SERVER)]
    pub energy_per_server: f64,
    #[builder(default = DEFAULT_RISK_WEIGHT)]
    pub risk_weight: f64,
    /// Seed for the single rng stream behind every stochastic draw. Entropy
    /// when unset.
    #[builder(default)]
    pub seed: Option<u64>,
}

impl EnvConfig {
    /// The stock scripted pipelines: a request/auth/storage chain and a
    /// batch ETL chain, when the container count permits.
    pub fn default_chains(num_containers: usize) -> Vec<ChainSpec> {
        let mut chains = Vec::new();
        if num_containers >= 3 {
            // Container counts are checked above, so these specs are valid.
            let spec = ChainSpec::new(
                "request_auth_storage",
                vec![ContainerId::new(0), ContainerId::new(1), ContainerId::new(2)],
                vec![0, 2],
                vec![5000, 4000],
            )
            .expect("stock chain spec is valid");
            chains.push(spec);
        }
        if num_containers >= 6 {
            let spec = ChainSpec::new(
                "batch_etl_pipeline",
                vec![ContainerId::new(3), ContainerId::new(4), ContainerId::new(5)],
                vec![1, 1],
                vec![3000, 3500],
            )
            .expect("stock chain spec is valid");
            chains.push(spec);
        }
        chains
    }
}

/// A placement action: move container `container` (by index) onto the
/// `server`-th server in enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Action {
    pub container: usize,
    pub server: usize,
}

/// Environment construction error.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("invalid topology")]
    Topology(#[from] TopologyError),

    #[error("invalid traffic configuration")]
    Traffic(#[from] TrafficConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("container index {index} out of range (environment has {num_containers} containers)")]
    ContainerOutOfRange { index: usize, num_containers: usize },

    #[error("server index {index} out of range (environment has {num_servers} servers)")]
    ServerOutOfRange { index: usize, num_servers: usize },
}

/// A fixed-length real observation vector: one server index per container,
/// then one incoming-volume entry per container (predicted when a predictor
/// is attached, else actual), then one uncertainty entry per container when a
/// predictor is attached.
pub type Observation = Vec<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ResetInfo {
    pub step: u64,
}

/// Cost breakdown attached to every step.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct StepInfo {
    pub step: u64,
    pub network_cost: f64,
    pub energy_cost: f64,
    pub risk_penalty: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    /// Always false; episode boundaries are the caller's concern.
    pub terminated: bool,
    /// Always false, as above.
    pub truncated: bool,
    pub info: StepInfo,
}

/// Serializable snapshot for the presentation layer. Plain data, no
/// behavior.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EnvState {
    #[serde(flatten)]
    pub fabric: FabricState,
    pub step: u64,
    pub active_chains: Vec<String>,
    pub active_servers: Vec<NodeId>,
}

/// The simulation environment. Single-threaded and fully synchronous; a
/// caller sharing one instance across threads must serialize `step`/`reset`.
#[derive(Debug)]
pub struct PlacementEnv {
    fabric: Fabric,
    generator: TrafficGenerator,
    predictor: Option<Box<dyn TrafficPredictor>>,
    rng: StdRng,
    step: u64,
    num_containers: usize,
    energy_per_server: f64,
    risk_weight: f64,
}

impl PlacementEnv {
    /// Builds the environment and brings it to a valid initial state
    /// (containers placed, step-0 traffic generated).
    pub fn new(config: EnvConfig) -> Result<Self, EnvError> {
        let fabric = Fabric::new(config.num_pods, config.servers_per_pod)?;
        let generator =
            TrafficGenerator::new(config.num_containers, config.traffic, config.chains)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut env = Self {
            fabric,
            generator,
            predictor: None,
            rng,
            step: 0,
            num_containers: config.num_containers,
            energy_per_server: config.energy_per_server,
            risk_weight: config.risk_weight,
        };
        env.reset(None);
        Ok(env)
    }

    /// Attaches the optional traffic predictor. Attach before driving the
    /// environment: the observation length grows from 2N to 3N and must stay
    /// fixed while a policy is stepping.
    pub fn attach_predictor(&mut self, predictor: Box<dyn TrafficPredictor>) {
        self.predictor = Some(predictor);
    }

    /// Re-initializes the episode: zeroes the step counter, re-places all
    /// containers, resets the generator (and predictor, when attached), and
    /// generates step-0 traffic. Reseeds the rng stream when `seed` is given;
    /// otherwise the current stream continues.
    pub fn reset(&mut self, seed: Option<u64>) -> (Observation, ResetInfo) {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.step = 0;
        self.fabric.place_containers(self.num_containers, &mut self.rng);
        self.generator.reset();
        if let Some(predictor) = &mut self.predictor {
            predictor.reset();
        }
        self.generator.generate(0, &mut self.rng);
        (self.build_observation(), ResetInfo { step: 0 })
    }

    /// Applies one placement action and advances the simulation a step.
    /// Validation happens before any mutation: a rejected action leaves the
    /// environment exactly as it was.
    pub fn step(&mut self, action: Action) -> Result<StepOutcome, ActionError> {
        if action.container >= self.num_containers {
            return Err(ActionError::ContainerOutOfRange {
                index: action.container,
                num_containers: self.num_containers,
            });
        }
        let num_servers = self.fabric.servers().len();
        if action.server >= num_servers {
            return Err(ActionError::ServerOutOfRange {
                index: action.server,
                num_servers,
            });
        }
        self.step += 1;
        let container = ContainerId::new(action.container);
        let server = self.fabric.servers()[action.server];
        let moved = self.fabric.move_container(container, server);
        debug_assert!(moved, "validated action failed to move {container}");
        self.generator.generate(self.step, &mut self.rng);

        let network_cost = self.network_cost();
        let energy_cost = self.fabric.active_servers().len() as f64 * self.energy_per_server;
        let prediction = match &mut self.predictor {
            Some(predictor) => Some(predictor.predict(self.generator.matrix())),
            None => None,
        };
        let risk_penalty = prediction
            .as_ref()
            .map(|p| p.uncertainties.iter().sum::<f64>() * self.risk_weight)
            .unwrap_or(0.0);
        let total_cost = network_cost + energy_cost + risk_penalty;
        let observation = self.observation_from(prediction.as_ref());
        Ok(StepOutcome {
            observation,
            reward: -total_cost,
            terminated: false,
            truncated: false,
            info: StepInfo {
                step: self.step,
                network_cost,
                energy_cost,
                risk_penalty,
                total_cost,
            },
        })
    }

    /// Sum over all matrix entries of `volume * distance(host(src),
    /// host(dst))`, skipping entries whose endpoints are not currently
    /// placed.
    pub fn network_cost(&self) -> f64 {
        self.generator
            .matrix()
            .iter()
            .filter(|&(_, volume)| volume > 0.0)
            .filter_map(|((src, dst), volume)| {
                let a = self.fabric.host_of(src)?;
                let b = self.fabric.host_of(dst)?;
                Some(volume * self.fabric.distance(a, b) as f64)
            })
            .sum()
    }

    /// Injects the demonstration burst between the first two containers and
    /// returns the recomputed network cost.
    pub fn trigger_burst(&mut self) -> f64 {
        if self.num_containers >= 2 {
            self.generator
                .manual_burst(ContainerId::ZERO, ContainerId::ONE, DEMO_BURST_VOLUME);
        }
        self.network_cost()
    }

    /// The declared action space: container index range and server index
    /// range, fixed for the environment's lifetime.
    pub fn action_space(&self) -> (usize, usize) {
        (self.num_containers, self.fabric.servers().len())
    }

    /// Observation vector length: 2N without a predictor, 3N with one.
    pub fn observation_len(&self) -> usize {
        let blocks = if self.predictor.is_some() { 3 } else { 2 };
        self.num_containers * blocks
    }

    /// Read-only snapshot of the whole simulation for external presentation.
    pub fn get_current_state(&self) -> EnvState {
        EnvState {
            fabric: self.fabric.snapshot(),
            step: self.step,
            active_chains: self.generator.active_chain_names(),
            active_servers: self.fabric.active_servers(),
        }
    }

    pub fn fabric(&self) -> &Fabric {
        &self.fabric
    }

    pub fn traffic(&self) -> &TrafficGenerator {
        &self.generator
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    fn build_observation(&mut self) -> Observation {
        let prediction = match &mut self.predictor {
            Some(predictor) => Some(predictor.predict(self.generator.matrix())),
            None => None,
        };
        self.observation_from(prediction.as_ref())
    }

    fn observation_from(&self, prediction: Option<&Prediction>) -> Observation {
        let mut obs = Vec::with_capacity(self.observation_len());
        for i in 0..self.num_containers {
            let container = ContainerId::new(i);
            // Containers 0..n are always placed between reset and step.
            let host = self
                .fabric
                .host_of(container)
                .expect("container missing from placement");
            let server_index = self
                .fabric
                .servers()
                .iter()
                .position(|&s| s == host)
                .expect("host missing from server list");
            obs.push(server_index as f64);
        }
        match prediction {
            Some(prediction) => {
                obs.extend_from_slice(&prediction.volumes);
                obs.extend_from_slice(&prediction.uncertainties);
            }
            None => {
                for i in 0..self.num_containers {
                    obs.push(self.generator.matrix().incoming_volume(ContainerId::new(i)));
                }
            }
        }
        obs
    }
}
