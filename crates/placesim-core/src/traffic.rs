pub mod chain;
pub mod matrix;

use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::constants::{
    DEFAULT_BASE_LOAD, DEFAULT_CHAIN_REL_STDDEV, DEFAULT_CHAIN_TRIGGER_PROB, DEFAULT_DRIFT_RATE,
    DEFAULT_MICROBURST_MEAN, DEFAULT_MICROBURST_PROB, DEFAULT_MICROBURST_REL_STDDEV,
    DEFAULT_NOISE_PROB, DEFAULT_NOISE_REL_STDDEV,
};
use crate::network::types::ContainerId;

use self::chain::{ChainSpec, HopTraffic, ServiceChain};
use self::matrix::TrafficMatrix;

/// Tunables for the per-step traffic composition.
#[derive(Debug, Clone, PartialEq, typed_builder::TypedBuilder, serde::Serialize, serde::Deserialize)]
pub struct TrafficConfig {
    /// Mean background volume at step 0.
    #[builder(default = DEFAULT_BASE_LOAD)]
    pub base_load: f64,
    /// Linear growth of the background mean per step.
    #[builder(default = DEFAULT_DRIFT_RATE)]
    pub drift_rate: f64,
    /// Per ordered pair, probability of a background noise entry.
    #[builder(default = DEFAULT_NOISE_PROB)]
    pub noise_prob: f64,
    #[builder(default = DEFAULT_NOISE_REL_STDDEV)]
    pub noise_rel_stddev: f64,
    /// Per step, probability that an inactive chain is triggered.
    #[builder(default = DEFAULT_CHAIN_TRIGGER_PROB)]
    pub chain_trigger_prob: f64,
    #[builder(default = DEFAULT_CHAIN_REL_STDDEV)]
    pub chain_rel_stddev: f64,
    /// Per step, probability of one ad-hoc micro-burst.
    #[builder(default = DEFAULT_MICROBURST_PROB)]
    pub microburst_prob: f64,
    #[builder(default = DEFAULT_MICROBURST_MEAN)]
    pub microburst_mean: f64,
    #[builder(default = DEFAULT_MICROBURST_REL_STDDEV)]
    pub microburst_rel_stddev: f64,
    /// Optional upper clamp on every generated volume. `None` leaves the
    /// zero-floored Gaussian draws unbounded above.
    #[builder(default)]
    pub volume_cap: Option<f64>,
}

impl TrafficConfig {
    /// Checks that every probability field lies in `[0, 1]`; `gen_bool`
    /// panics on anything else, so violations are rejected up front.
    pub fn validate(&self) -> Result<(), TrafficConfigError> {
        let probabilities = [
            ("noise_prob", self.noise_prob),
            ("chain_trigger_prob", self.chain_trigger_prob),
            ("microburst_prob", self.microburst_prob),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(TrafficConfigError::InvalidProbability { field, value });
            }
        }
        Ok(())
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrafficConfigError {
    #[error("{field} must be a probability in [0, 1] (got {value})")]
    InvalidProbability { field: &'static str, value: f64 },
}

/// Produces the full container-to-container traffic matrix for each step by
/// composing background noise, chain-driven bursts, and ad-hoc micro-bursts.
/// Only the chain state machines persist across steps; the matrix is fully
/// replaced on every [`TrafficGenerator::generate`] call.
#[derive(Debug, Clone)]
pub struct TrafficGenerator {
    num_containers: usize,
    config: TrafficConfig,
    chains: Vec<ServiceChain>,
    matrix: TrafficMatrix,
}

impl TrafficGenerator {
    /// Creates a generator over `num_containers` containers, validating the
    /// configuration's probability fields. Chain hops must reference
    /// containers below `num_containers`; a spec violating that is a
    /// configuration defect.
    pub fn new(
        num_containers: usize,
        config: TrafficConfig,
        chains: Vec<ChainSpec>,
    ) -> Result<Self, TrafficConfigError> {
        config.validate()?;
        debug_assert!(chains
            .iter()
            .flat_map(|spec| spec.hops())
            .all(|hop| hop.inner() < num_containers));
        Ok(Self {
            num_containers,
            config,
            chains: chains.into_iter().map(ServiceChain::new).collect(),
            matrix: TrafficMatrix::new(),
        })
    }

    /// Clears the matrix and forces every chain back to `Inactive`.
    pub fn reset(&mut self) {
        self.matrix.clear();
        for chain in &mut self.chains {
            chain.reset();
        }
    }

    /// Recomputes the traffic matrix for `step`, advancing chain state.
    /// Entries from prior calls are discarded.
    pub fn generate<R: Rng>(&mut self, step: u64, rng: &mut R) {
        self.matrix = compose(
            self.num_containers,
            &self.config,
            &mut self.chains,
            step,
            rng,
        );
    }

    /// Computes the traffic a future `step` would produce without advancing
    /// chain state or touching the stored matrix. The composition runs over a
    /// clone of the chain FSMs. Note the rng stream is still consumed; a
    /// caller that needs the subsequent `generate` sequence unperturbed
    /// should pass a forked or reseeded rng.
    pub fn preview<R: Rng>(&self, step: u64, rng: &mut R) -> TrafficMatrix {
        let mut chains = self.chains.clone();
        compose(self.num_containers, &self.config, &mut chains, step, rng)
    }

    /// Sets both directions between `src` and `dst` to exactly `volume`, with
    /// no added noise. For externally-triggered demonstration scenarios.
    pub fn manual_burst(&mut self, src: ContainerId, dst: ContainerId, volume: f64) {
        self.matrix.set_symmetric(src, dst, volume);
    }

    /// Names of all currently active chains.
    pub fn active_chain_names(&self) -> Vec<String> {
        self.chains
            .iter()
            .filter(|chain| chain.is_active())
            .map(|chain| chain.name().to_owned())
            .collect()
    }

    pub fn matrix(&self) -> &TrafficMatrix {
        &self.matrix
    }

    pub fn num_containers(&self) -> usize {
        self.num_containers
    }

    delegate::delegate! {
        to self.chains {
            #[call(len)]
            pub fn nr_chains(&self) -> usize;
        }
    }
}

/// The four-phase composition for one step: background noise, chain
/// triggers, chain ticks, then at most one micro-burst. Phase order is part
/// of the deterministic contract; reordering changes how the rng stream is
/// consumed.
fn compose<R: Rng>(
    num_containers: usize,
    config: &TrafficConfig,
    chains: &mut [ServiceChain],
    step: u64,
    rng: &mut R,
) -> TrafficMatrix {
    let mut matrix = TrafficMatrix::new();
    let background_mean = config.base_load + config.drift_rate * step as f64;
    for i in 0..num_containers {
        for j in 0..num_containers {
            if i == j {
                continue;
            }
            if rng.gen_bool(config.noise_prob) {
                let volume =
                    sample_volume(background_mean, config.noise_rel_stddev, config.volume_cap, rng);
                matrix.set(ContainerId::new(i), ContainerId::new(j), volume);
            }
        }
    }
    for chain in chains.iter_mut() {
        if !chain.is_active() && rng.gen_bool(config.chain_trigger_prob) {
            chain.start();
        }
    }
    for chain in chains.iter_mut() {
        if let Some(HopTraffic {
            src,
            dst,
            mean_volume,
        }) = chain.tick()
        {
            let volume = sample_volume(mean_volume, config.chain_rel_stddev, config.volume_cap, rng);
            matrix.add_symmetric(src, dst, volume);
        }
    }
    if num_containers >= 2 && rng.gen_bool(config.microburst_prob) {
        let src = rng.gen_range(0..num_containers);
        // Offset draw keeps the pair distinct with a single sample.
        let dst = (src + rng.gen_range(1..num_containers)) % num_containers;
        let volume = sample_volume(
            config.microburst_mean,
            config.microburst_rel_stddev,
            config.volume_cap,
            rng,
        );
        matrix.add_symmetric(ContainerId::new(src), ContainerId::new(dst), volume);
    }
    matrix
}

/// A Gaussian draw with `stddev = rel_stddev * mean`, floored at zero and
/// clamped to `cap` when one is set.
fn sample_volume<R: Rng>(mean: f64, rel_stddev: f64, cap: Option<f64>, rng: &mut R) -> f64 {
    let noise: f64 = rng.sample(StandardNormal);
    let volume = (mean + mean * rel_stddev * noise).max(0.0);
    match cap {
        Some(cap) => volume.min(cap),
        None => volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn c(i: usize) -> ContainerId {
        ContainerId::new(i)
    }

    fn quiet_config() -> TrafficConfig {
        TrafficConfig::builder()
            .noise_prob(0.0)
            .chain_trigger_prob(0.0)
            .microburst_prob(0.0)
            .build()
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let config = TrafficConfig::builder().noise_prob(1.5).build();
        assert!(matches!(
            TrafficGenerator::new(4, config, Vec::new()),
            Err(TrafficConfigError::InvalidProbability {
                field: "noise_prob",
                ..
            })
        ));
        let config = TrafficConfig::builder().microburst_prob(-0.1).build();
        assert!(matches!(
            TrafficGenerator::new(4, config, Vec::new()),
            Err(TrafficConfigError::InvalidProbability {
                field: "microburst_prob",
                ..
            })
        ));
        let config = TrafficConfig::builder().chain_trigger_prob(f64::NAN).build();
        assert!(matches!(
            TrafficGenerator::new(4, config, Vec::new()),
            Err(TrafficConfigError::InvalidProbability {
                field: "chain_trigger_prob",
                ..
            })
        ));
    }

    #[test]
    fn manual_burst_is_exact_and_symmetric() -> anyhow::Result<()> {
        let mut gen = TrafficGenerator::new(4, quiet_config(), Vec::new())?;
        gen.manual_burst(c(0), c(1), 5000.0);
        assert_eq!(gen.matrix().get(c(0), c(1)), 5000.0);
        assert_eq!(gen.matrix().get(c(1), c(0)), 5000.0);
        Ok(())
    }

    #[test]
    fn generate_replaces_prior_entries() -> anyhow::Result<()> {
        let mut gen = TrafficGenerator::new(4, quiet_config(), Vec::new())?;
        let mut rng = testing::rng();
        gen.manual_burst(c(0), c(1), 5000.0);
        gen.generate(1, &mut rng);
        assert!(gen.matrix().is_empty());
        Ok(())
    }

    #[test]
    fn reset_clears_matrix_and_chains() -> anyhow::Result<()> {
        let mut gen = TrafficGenerator::new(
            4,
            TrafficConfig::builder().chain_trigger_prob(1.0).build(),
            vec![testing::abc_chain_spec()],
        )?;
        let mut rng = testing::rng();
        gen.generate(0, &mut rng);
        gen.reset();
        assert!(gen.matrix().is_empty());
        assert!(gen.active_chain_names().is_empty());
        Ok(())
    }

    #[test]
    fn volumes_are_non_negative() -> anyhow::Result<()> {
        let mut gen = TrafficGenerator::new(
            6,
            TrafficConfig::builder()
                .noise_prob(1.0)
                .microburst_prob(1.0)
                .noise_rel_stddev(5.0)
                .build(),
            Vec::new(),
        )?;
        let mut rng = testing::rng();
        for step in 0..50 {
            gen.generate(step, &mut rng);
            assert!(gen.matrix().iter().all(|(_, v)| v >= 0.0));
        }
        Ok(())
    }

    #[test]
    fn volume_cap_bounds_every_entry() -> anyhow::Result<()> {
        let mut gen = TrafficGenerator::new(
            6,
            TrafficConfig::builder()
                .noise_prob(1.0)
                .microburst_prob(1.0)
                .volume_cap(Some(100.0))
                .build(),
            Vec::new(),
        )?;
        let mut rng = testing::rng();
        for step in 0..50 {
            gen.generate(step, &mut rng);
            assert!(gen.matrix().iter().all(|(_, v)| v <= 100.0));
        }
        Ok(())
    }

    #[test]
    fn triggered_chain_adds_symmetric_burst() -> anyhow::Result<()> {
        let mut gen = TrafficGenerator::new(
            4,
            TrafficConfig::builder()
                .noise_prob(0.0)
                .microburst_prob(0.0)
                .chain_trigger_prob(1.0)
                .chain_rel_stddev(0.0)
                .build(),
            vec![testing::abc_chain_spec()],
        )?;
        let mut rng = testing::rng();
        // Trigger fires, then the first hop emits immediately.
        gen.generate(0, &mut rng);
        assert_eq!(gen.active_chain_names(), vec!["request_auth_storage"]);
        assert_eq!(gen.matrix().get(c(0), c(1)), 5000.0);
        assert_eq!(gen.matrix().get(c(1), c(0)), 5000.0);
        Ok(())
    }

    #[test]
    fn same_seed_reproduces_matrix() -> anyhow::Result<()> {
        let config = TrafficConfig::builder().microburst_prob(1.0).build();
        let mut a = TrafficGenerator::new(8, config.clone(), vec![testing::abc_chain_spec()])?;
        let mut b = TrafficGenerator::new(8, config, vec![testing::abc_chain_spec()])?;
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        for step in 0..20 {
            a.generate(step, &mut rng_a);
            b.generate(step, &mut rng_b);
            assert_eq!(a.matrix(), b.matrix());
        }
        Ok(())
    }

    #[test]
    fn preview_leaves_generator_state_untouched() -> anyhow::Result<()> {
        let mut gen = TrafficGenerator::new(
            4,
            TrafficConfig::builder().chain_trigger_prob(1.0).build(),
            vec![testing::abc_chain_spec()],
        )?;
        let mut rng = testing::rng();
        let previewed = gen.preview(3, &mut rng);
        assert!(!previewed.is_empty());
        // Chains stay inactive and the stored matrix stays empty.
        assert!(gen.active_chain_names().is_empty());
        assert!(gen.matrix().is_empty());
        Ok(())
    }
}
