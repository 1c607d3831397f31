use super::{DEFAULT_REPLICAS, Node, Ring, Sha1Hasher, SlotHasher};

/// Ring builder.
///
/// Collects the initial nodes, the number of replicas per node and the hash
/// function, then builds a ring with the nodes added in iteration order.
pub struct RingBuilder<N: Node, H: SlotHasher = Sha1Hasher> {
    nodes: Vec<N>,
    replicas: usize,
    hasher: H,
}

impl<N: Node> RingBuilder<N> {
    /// Create new ring builder.
    pub fn new<I: IntoIterator<Item = N>>(init_nodes: I) -> Self {
        Self {
            nodes: init_nodes.into_iter().collect(),
            replicas: DEFAULT_REPLICAS,
            hasher: Sha1Hasher,
        }
    }
}

impl<N: Node, H: SlotHasher> RingBuilder<N, H> {
    /// Set the number of slots each node claims.
    pub fn with_replicas(self, replicas: usize) -> Self {
        Self { replicas, ..self }
    }

    /// Transform the builder into one with a different hash function.
    pub fn with_hasher<CustomH: SlotHasher>(self, hasher: CustomH) -> RingBuilder<N, CustomH> {
        RingBuilder {
            nodes: self.nodes,
            replicas: self.replicas,
            hasher,
        }
    }

    /// Build the ring.
    pub fn build(self) -> Ring<N, H> {
        let ring = Ring::with_hasher(self.replicas, self.hasher);
        self.nodes.into_iter().for_each(|node| ring.add(node));
        ring
    }
}
