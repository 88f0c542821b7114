mod topology;
pub mod types;

use std::collections::BTreeMap;

use itertools::Itertools;
use rand::prelude::*;
use rustc_hash::FxHashMap;

pub use topology::TopologyError;
pub use types::*;

use self::topology::Topology;

/// The three-tier fabric plus the mutable container placement on top of it.
///
/// The underlying graph never changes after construction; only the
/// container-to-server mapping mutates, through [`Fabric::place_containers`]
/// and [`Fabric::move_container`].
#[derive(Debug, Clone)]
pub struct Fabric {
    topology: Topology,
    placements: FxHashMap<ContainerId, NodeId>,
}

impl Fabric {
    pub fn new(num_pods: usize, servers_per_pod: usize) -> Result<Self, TopologyError> {
        let topology = Topology::tiered(num_pods, servers_per_pod)?;
        Ok(Self {
            topology,
            placements: FxHashMap::default(),
        })
    }

    /// Assigns each of `n` containers to a uniformly random server.
    /// Independent draws with replacement, so servers may host several
    /// containers. Any prior container set is discarded entirely.
    pub fn place_containers(&mut self, n: usize, rng: &mut impl Rng) {
        self.placements.clear();
        for i in 0..n {
            // `tiered()` guarantees at least one server.
            let server = *self
                .topology
                .servers()
                .choose(rng)
                .expect("topology has no servers");
            self.placements.insert(ContainerId::new(i), server);
        }
    }

    /// Reassigns `container` to `server`. Returns `false` and leaves the
    /// placement untouched if the container is unknown or the target is not a
    /// server of this topology.
    pub fn move_container(&mut self, container: ContainerId, server: NodeId) -> bool {
        if !self.placements.contains_key(&container) || !self.topology.is_server(server) {
            return false;
        }
        self.placements.insert(container, server);
        true
    }

    /// Shortest weighted-path cost between two servers. Zero when both ends
    /// are the same server; on this tree, 2 within a pod and 12 across pods.
    pub fn distance(&self, a: NodeId, b: NodeId) -> u64 {
        self.topology.distance(a, b)
    }

    /// Server IDs in stable enumeration order.
    pub fn servers(&self) -> &[NodeId] {
        self.topology.servers()
    }

    pub fn host_of(&self, container: ContainerId) -> Option<NodeId> {
        self.placements.get(&container).copied()
    }

    pub fn placements(&self) -> &FxHashMap<ContainerId, NodeId> {
        &self.placements
    }

    /// Distinct servers currently hosting at least one container, sorted.
    pub fn active_servers(&self) -> Vec<NodeId> {
        self.placements.values().copied().unique().sorted().collect()
    }

    /// A read-only, serializable view of the fabric for external
    /// presentation.
    pub fn snapshot(&self) -> FabricState {
        FabricState {
            nodes: self
                .nodes()
                .map(|n| NodeState {
                    id: n.id,
                    kind: n.kind,
                    layer: n.layer(),
                })
                .collect(),
            links: self
                .links()
                .map(|l| LinkState {
                    source: l.a,
                    target: l.b,
                    weight: l.weight,
                })
                .collect(),
            containers: self.placements.iter().map(|(&c, &s)| (c, s)).collect(),
        }
    }

    delegate::delegate! {
        to self.topology.graph {
            #[call(node_weights)]
            pub fn nodes(&self) -> impl Iterator<Item = &Node>;
        }

        to self.topology.links {
            #[call(iter)]
            pub fn links(&self) -> impl Iterator<Item = &Link>;
        }

        to self.placements {
            #[call(len)]
            pub fn nr_containers(&self) -> usize;
        }
    }
}

/// Plain-data view of the fabric, shaped for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FabricState {
    pub nodes: Vec<NodeState>,
    pub links: Vec<LinkState>,
    pub containers: BTreeMap<ContainerId, NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct NodeState {
    pub id: NodeId,
    pub kind: NodeKind,
    pub layer: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct LinkState {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: u64,
}
