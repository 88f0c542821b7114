use rand::prelude::*;

use crate::network::{types::ContainerId, Fabric, TopologyError};
use crate::traffic::chain::ChainSpec;

pub(crate) fn rng() -> StdRng {
    StdRng::seed_from_u64(0)
}

/// 2 pods x 2 servers per pod: core = 0, pod 0 = (1; 2, 3), pod 1 = (4; 5, 6).
pub(crate) fn two_by_two_fabric() -> Result<Fabric, TopologyError> {
    Fabric::new(2, 2)
}

/// The three-hop scenario chain: containers 0 -> 1 -> 2, the second transfer
/// delayed by two ticks.
pub(crate) fn abc_chain_spec() -> ChainSpec {
    ChainSpec::new(
        "request_auth_storage",
        vec![ContainerId::new(0), ContainerId::new(1), ContainerId::new(2)],
        vec![0, 2],
        vec![5000, 4000],
    )
    .expect("valid chain spec")
}
