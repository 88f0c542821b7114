use crate::constants::SERVER_CAPACITY;

identifier!(NodeId, usize);

identifier!(ContainerId, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
}

impl Node {
    pub fn new_core(id: NodeId) -> Self {
        Self {
            id,
            kind: NodeKind::Core,
        }
    }

    pub fn new_aggregation(id: NodeId) -> Self {
        Self {
            id,
            kind: NodeKind::Aggregation,
        }
    }

    pub fn new_server(id: NodeId) -> Self {
        Self {
            id,
            kind: NodeKind::Server {
                capacity: SERVER_CAPACITY,
            },
        }
    }

    pub fn is_server(&self) -> bool {
        matches!(self.kind, NodeKind::Server { .. })
    }

    /// The node's tier in the tree, core being the root.
    pub fn layer(&self) -> u8 {
        match self.kind {
            NodeKind::Core => 0,
            NodeKind::Aggregation => 1,
            NodeKind::Server { .. } => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Core,
    Aggregation,
    Server {
        /// Unused by the cost model; reserved for future constraints.
        capacity: u32,
    },
}

/// An undirected weighted edge between two nodes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, derive_new::new, serde::Serialize, serde::Deserialize,
)]
pub struct Link {
    pub a: NodeId,
    pub b: NodeId,
    pub weight: u64,
}

impl Link {
    pub fn connects(&self, x: NodeId, y: NodeId) -> bool {
        self.a == x && self.b == y || self.a == y && self.b == x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_and_order_by_inner_value() {
        assert_eq!(NodeId::new(5).to_string(), "5");
        assert_eq!(ContainerId::ZERO.to_string(), "0");
        assert!(ContainerId::ZERO < ContainerId::ONE);
        assert_eq!(NodeId::new(3).inner(), 3);
    }

    #[test]
    fn link_connects_either_direction() {
        let link = Link::new(NodeId::new(0), NodeId::new(1), 10);
        assert!(link.connects(NodeId::new(0), NodeId::new(1)));
        assert!(link.connects(NodeId::new(1), NodeId::new(0)));
        assert!(!link.connects(NodeId::new(0), NodeId::new(2)));
    }
}
