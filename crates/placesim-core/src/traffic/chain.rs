use crate::network::types::ContainerId;

/// Static description of one scripted multi-hop pipeline, e.g.
/// request -> auth -> storage. Transfer `i` moves traffic from `hops[i]` to
/// `hops[i + 1]` with mean volume `volumes[i]`, after waiting `delays[i]`
/// ticks (the first transfer always fires immediately).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChainSpec {
    name: String,
    hops: Vec<ContainerId>,
    delays: Vec<u32>,
    volumes: Vec<u64>,
}

impl ChainSpec {
    /// Validates hop/delay/volume arities: a chain needs at least two hops,
    /// and one delay and one volume per transfer.
    pub fn new(
        name: impl Into<String>,
        hops: Vec<ContainerId>,
        delays: Vec<u32>,
        volumes: Vec<u64>,
    ) -> Result<Self, ChainSpecError> {
        let name = name.into();
        if hops.len() < 2 {
            return Err(ChainSpecError::TooFewHops {
                name,
                n: hops.len(),
            });
        }
        let transfers = hops.len() - 1;
        if delays.len() != transfers {
            return Err(ChainSpecError::ArityMismatch {
                name,
                field: "delays",
                expected: transfers,
                got: delays.len(),
            });
        }
        if volumes.len() != transfers {
            return Err(ChainSpecError::ArityMismatch {
                name,
                field: "volumes",
                expected: transfers,
                got: volumes.len(),
            });
        }
        Ok(Self {
            name,
            hops,
            delays,
            volumes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hops(&self) -> &[ContainerId] {
        &self.hops
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChainSpecError {
    #[error("chain {name} has too few hops (expected >= 2, got {n})")]
    TooFewHops { name: String, n: usize },

    #[error("chain {name} has mismatched {field} (expected {expected}, got {got})")]
    ArityMismatch {
        name: String,
        field: &'static str,
        expected: usize,
        got: usize,
    },
}

/// One transfer emitted by an active chain on a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HopTraffic {
    pub src: ContainerId,
    pub dst: ContainerId,
    pub mean_volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    Inactive,
    Active { hop: usize, ticks_since_trigger: u32 },
}

/// The finite-state machine driving one [`ChainSpec`]. The owning generator
/// decides when to `start()` a chain; the chain only advances once started
/// and returns to `Inactive` after its last hop.
#[derive(Debug, Clone)]
pub struct ServiceChain {
    spec: ChainSpec,
    state: ChainState,
}

impl ServiceChain {
    pub fn new(spec: ChainSpec) -> Self {
        Self {
            spec,
            state: ChainState::Inactive,
        }
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ChainState::Active { .. })
    }

    /// Activates the chain at its first hop. No-op if already active.
    pub fn start(&mut self) {
        if let ChainState::Inactive = self.state {
            self.state = ChainState::Active {
                hop: 0,
                ticks_since_trigger: 0,
            };
        }
    }

    /// Forces the chain back to `Inactive`.
    pub fn reset(&mut self) {
        self.state = ChainState::Inactive;
    }

    /// Advances the chain by one tick. Emits the next transfer once the hop's
    /// inter-hop delay has elapsed (the first hop fires immediately); a chain
    /// that has passed its last hop deactivates and emits nothing.
    pub fn tick(&mut self) -> Option<HopTraffic> {
        let ChainState::Active {
            hop,
            ticks_since_trigger,
        } = self.state
        else {
            return None;
        };
        if hop >= self.spec.hops.len() - 1 {
            self.state = ChainState::Inactive;
            return None;
        }
        let required_delay = if hop == 0 { 0 } else { self.spec.delays[hop] };
        if ticks_since_trigger >= required_delay {
            let emitted = HopTraffic {
                src: self.spec.hops[hop],
                dst: self.spec.hops[hop + 1],
                mean_volume: self.spec.volumes[hop] as f64,
            };
            self.state = ChainState::Active {
                hop: hop + 1,
                ticks_since_trigger: 0,
            };
            Some(emitted)
        } else {
            self.state = ChainState::Active {
                hop,
                ticks_since_trigger: ticks_since_trigger + 1,
            };
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(i: usize) -> ContainerId {
        ContainerId::new(i)
    }

    fn abc_chain() -> ServiceChain {
        let spec = ChainSpec::new(
            "request_auth_storage",
            vec![c(0), c(1), c(2)],
            vec![0, 2],
            vec![5000, 4000],
        )
        .expect("valid chain spec");
        ServiceChain::new(spec)
    }

    #[test]
    fn too_few_hops_fails() {
        let res = ChainSpec::new("stub", vec![c(0)], vec![], vec![]);
        assert!(matches!(res, Err(ChainSpecError::TooFewHops { n: 1, .. })));
    }

    #[test]
    fn mismatched_delays_fails() {
        let res = ChainSpec::new("bad", vec![c(0), c(1), c(2)], vec![0], vec![10, 10]);
        assert!(matches!(
            res,
            Err(ChainSpecError::ArityMismatch {
                field: "delays",
                expected: 2,
                got: 1,
                ..
            })
        ));
    }

    #[test]
    fn mismatched_volumes_fails() {
        let res = ChainSpec::new("bad", vec![c(0), c(1)], vec![0], vec![]);
        assert!(matches!(
            res,
            Err(ChainSpecError::ArityMismatch {
                field: "volumes",
                ..
            })
        ));
    }

    #[test]
    fn inactive_chain_emits_nothing() {
        let mut chain = abc_chain();
        assert!(!chain.is_active());
        assert_eq!(chain.tick(), None);
    }

    #[test]
    fn chain_walks_hops_with_delays() {
        let mut chain = abc_chain();
        chain.start();
        assert!(chain.is_active());
        // First hop fires immediately.
        let first = chain.tick().expect("first hop should fire");
        assert_eq!((first.src, first.dst), (c(0), c(1)));
        assert_eq!(first.mean_volume, 5000.0);
        // Second hop waits out its delay of 2 ticks.
        assert_eq!(chain.tick(), None);
        assert_eq!(chain.tick(), None);
        let second = chain.tick().expect("second hop should fire after delay");
        assert_eq!((second.src, second.dst), (c(1), c(2)));
        assert_eq!(second.mean_volume, 4000.0);
        // Past the last hop the chain deactivates and stays silent.
        assert_eq!(chain.tick(), None);
        assert!(!chain.is_active());
        assert_eq!(chain.tick(), None);
    }

    #[test]
    fn start_is_noop_while_active() {
        let mut chain = abc_chain();
        chain.start();
        let _ = chain.tick();
        // A second start must not rewind the hop index.
        chain.start();
        assert_eq!(chain.tick(), None); // still waiting on hop 1's delay
    }

    #[test]
    fn reset_forces_inactive() {
        let mut chain = abc_chain();
        chain.start();
        let _ = chain.tick();
        chain.reset();
        assert!(!chain.is_active());
        assert_eq!(chain.tick(), None);
    }
}
