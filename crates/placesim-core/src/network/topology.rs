use petgraph::algo::dijkstra;
use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::FxHashMap;

use crate::constants::{AGG_SERVER_WEIGHT, CORE_AGG_WEIGHT};
use crate::network::types::{Link, Node, NodeId};

/// The fixed three-tier switch/server tree. The graph is immutable after
/// construction; container placement lives in [`Fabric`](crate::Fabric).
#[derive(Debug, Clone)]
pub(crate) struct Topology {
    pub(crate) graph: UnGraph<Node, u64>,
    pub(crate) links: Vec<Link>,
    id2idx: FxHashMap<NodeId, NodeIndex>,
    servers: Vec<NodeId>,
}

impl Topology {
    /// Builds the tiered topology: one core node, `num_pods` aggregation
    /// nodes each linked to the core (weight 10), and `servers_per_pod`
    /// server leaves under each aggregation node (weight 1).
    ///
    /// Construction is deterministic: node IDs are assigned in build order
    /// (core, then per pod the aggregation switch followed by its servers),
    /// and the server enumeration order is stable across runs.
    pub(crate) fn tiered(num_pods: usize, servers_per_pod: usize) -> Result<Self, TopologyError> {
        if num_pods == 0 {
            return Err(TopologyError::NoPods);
        }
        if servers_per_pod == 0 {
            return Err(TopologyError::NoServers);
        }
        let mut g = UnGraph::new_undirected();
        let mut id2idx = FxHashMap::default();
        let mut links = Vec::new();
        let mut servers = Vec::new();
        let mut next_id = 0..;
        let mut add_node = |g: &mut UnGraph<Node, u64>,
                            id2idx: &mut FxHashMap<NodeId, NodeIndex>,
                            node: Node| {
            let idx = g.add_node(node);
            id2idx.insert(node.id, idx);
            idx
        };
        let core_id = NodeId::new(next_id.next().unwrap());
        let core = add_node(&mut g, &mut id2idx, Node::new_core(core_id));
        for _ in 0..num_pods {
            let agg_id = NodeId::new(next_id.next().unwrap());
            let agg = add_node(&mut g, &mut id2idx, Node::new_aggregation(agg_id));
            g.add_edge(core, agg, CORE_AGG_WEIGHT);
            links.push(Link::new(core_id, agg_id, CORE_AGG_WEIGHT));
            for _ in 0..servers_per_pod {
                let server_id = NodeId::new(next_id.next().unwrap());
                let server = add_node(&mut g, &mut id2idx, Node::new_server(server_id));
                g.add_edge(agg, server, AGG_SERVER_WEIGHT);
                links.push(Link::new(agg_id, server_id, AGG_SERVER_WEIGHT));
                servers.push(server_id);
            }
        }
        Ok(Self {
            graph: g,
            links,
            id2idx,
            servers,
        })
    }

    /// Server node IDs in stable enumeration order.
    pub(crate) fn servers(&self) -> &[NodeId] {
        &self.servers
    }

    pub(crate) fn is_server(&self, id: NodeId) -> bool {
        self.servers.contains(&id)
    }

    pub(crate) fn idx_of(&self, id: &NodeId) -> Option<&NodeIndex> {
        self.id2idx.get(id)
    }

    /// Shortest weighted-path cost between two nodes. Callers guarantee both
    /// IDs exist; an unknown ID is a construction defect.
    pub(crate) fn distance(&self, a: NodeId, b: NodeId) -> u64 {
        if a == b {
            return 0;
        }
        // These lookups are guaranteed to succeed because the graph is
        // immutable after `tiered()`.
        let src = *self.idx_of(&a).expect("missing node in topology");
        let dst = *self.idx_of(&b).expect("missing node in topology");
        let costs = dijkstra(&self.graph, src, Some(dst), |e| *e.weight());
        *costs.get(&dst).expect("disconnected topology")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("Topology requires at least one pod")]
    NoPods,

    #[error("Topology requires at least one server per pod")]
    NoServers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_pods_fails() {
        assert!(matches!(Topology::tiered(0, 4), Err(TopologyError::NoPods)));
    }

    #[test]
    fn zero_servers_per_pod_fails() {
        assert!(matches!(
            Topology::tiered(4, 0),
            Err(TopologyError::NoServers)
        ));
    }

    #[test]
    fn tiered_topology_has_expected_shape() -> anyhow::Result<()> {
        let topo = Topology::tiered(4, 4)?;
        // 1 core + 4 aggs + 16 servers
        assert_eq!(topo.graph.node_count(), 21);
        assert_eq!(topo.graph.edge_count(), 20);
        assert_eq!(topo.servers().len(), 16);
        Ok(())
    }

    #[test]
    fn distance_is_zero_on_self() -> anyhow::Result<()> {
        let topo = Topology::tiered(2, 2)?;
        for &s in topo.servers() {
            assert_eq!(topo.distance(s, s), 0);
        }
        Ok(())
    }

    #[test]
    fn distance_is_symmetric() -> anyhow::Result<()> {
        let topo = Topology::tiered(3, 3)?;
        for &a in topo.servers() {
            for &b in topo.servers() {
                assert_eq!(topo.distance(a, b), topo.distance(b, a));
            }
        }
        Ok(())
    }

    #[test]
    fn distances_reduce_to_tree_cases() -> anyhow::Result<()> {
        // Node IDs in build order: core = 0, pod 0 = (1; 2, 3), pod 1 = (4; 5, 6).
        let topo = Topology::tiered(2, 2)?;
        assert_eq!(topo.servers(), [2, 3, 5, 6].map(NodeId::new).as_slice());
        // Same pod: server-agg-server.
        assert_eq!(topo.distance(NodeId::new(2), NodeId::new(3)), 2);
        // Across pods: server-agg-core-agg-server.
        assert_eq!(topo.distance(NodeId::new(2), NodeId::new(5)), 12);
        Ok(())
    }
}
