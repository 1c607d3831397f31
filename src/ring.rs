use {
    crate::{
        error::{RingError, RingResult},
        hash::{Sha1Hasher, Slot, SlotHasher, replica_key},
        node::{Node, NodeIdx, NodeRef, Nodes},
    },
    parking_lot::{RwLock, RwLockReadGuard},
    std::collections::HashMap,
    tracing::{debug, trace, warn},
};

/// Number of replicas per node used when none is given explicitly.
pub const DEFAULT_REPLICAS: usize = 100;

/// Slots and their owners, guarded as one unit.
struct State<N> {
    /// Sorted ascending.
    slots: Vec<Slot>,

    /// Owner of every distinct value in `slots`.
    owners: HashMap<Slot, NodeIdx>,

    nodes: Nodes<N>,
}

impl<N> State<N> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            owners: HashMap::new(),
            nodes: Nodes::new(),
        }
    }

    /// First slot at or after `position`, wrapping to the start of the ring.
    fn successor(&self, position: Slot) -> Option<Slot> {
        let idx = self.slots.partition_point(|slot| *slot < position);
        self.slots.get(idx).or_else(|| self.slots.first()).copied()
    }

    fn owner(&self, position: Slot) -> Option<&N> {
        let slot = self.successor(position)?;
        self.owners
            .get(&slot)
            .and_then(|idx| self.nodes.get(*idx))
    }

    fn contains_slot(&self, slot: Slot) -> bool {
        self.slots.binary_search(&slot).is_ok()
    }
}

/// Consistent hashing ring.
///
/// Every node is placed on a `u32` circle at `replicas` positions (slots),
/// each being the hash of `"<node name>-<replica index>"`. A key is routed to
/// the owner of the first slot at or after the key's hash, wrapping around
/// past the highest slot. Adding or removing a node therefore only remaps the
/// keys falling into the arcs its slots cover.
///
/// The ring is safe to share between threads: lookups take a shared lock,
/// while adding and removing nodes take an exclusive one. Read accessors
/// acquire the shared lock recursively, so they never wait on a queued
/// writer while the calling thread already holds a [`NodeRef`].
pub struct Ring<N, H = Sha1Hasher> {
    state: RwLock<State<N>>,
    replicas: usize,
    hasher: H,
}

impl<N: Node> Default for Ring<N> {
    fn default() -> Self {
        Self::new(DEFAULT_REPLICAS)
    }
}

impl<N: Node> Ring<N> {
    /// Creates an empty ring placing `replicas` slots per node, hashed with
    /// [`Sha1Hasher`].
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, Sha1Hasher)
    }
}

impl<N: Node, H: SlotHasher> Ring<N, H> {
    /// Creates an empty ring with a custom hash function.
    ///
    /// A `replicas` count of zero yields a ring that never stores any slot.
    pub fn with_hasher(replicas: usize, hasher: H) -> Self {
        Self {
            state: RwLock::new(State::new()),
            replicas,
            hasher,
        }
    }

    /// Adds a node to the ring.
    ///
    /// The node claims `replicas` slots. Adding a node that is already present
    /// duplicates its slots, so callers should remove it first.
    ///
    /// Should two replica keys hash to the same slot, the node added last
    /// becomes that slot's owner.
    pub fn add(&self, node: N) {
        if self.replicas == 0 {
            warn!(node = %node.name(), "ring has no replicas per node, node not added");
            return;
        }

        let name = node.name().into_owned();
        let new_slots = self.replica_slots(&name);

        let mut state = self.state.write();
        let State {
            slots,
            owners,
            nodes,
        } = &mut *state;

        let Some(idx) = nodes.insert(node) else {
            warn!(node = %name, "out of node indexes, node not added");
            return;
        };
        for slot in new_slots {
            slots.push(slot);
            nodes.retain(idx);
            if let Some(prev) = owners.insert(slot, idx) {
                trace!(slot, node = %name, "slot collision, owner replaced");
                nodes.release(prev);
            }
        }
        slots.sort_unstable();

        debug!(node = %name, replicas = self.replicas, "added node to ring");
    }

    /// Removes a node, given its name, from the ring.
    ///
    /// Every replica slot of the node that is still present is removed. Fails
    /// with [`RingError::NodeNotFound`] if none is found, that is the node was
    /// never added or has already been removed. Callers treating removal of
    /// an absent node as a no-op can discard the error.
    ///
    /// A slot shared with another node (hash collision) has a single owner,
    /// the node added last. If that owner is the node being removed, every
    /// occurrence of the slot goes with it, so a removed node is never
    /// returned by a lookup; the node that lost the slot earlier does not get
    /// it back. Otherwise one occurrence is dropped and the owner is kept.
    pub fn remove(&self, name: &str) -> RingResult<()> {
        let old_slots = self.replica_slots(name);

        let mut state = self.state.write();
        let State {
            slots,
            owners,
            nodes,
        } = &mut *state;

        let mut removed = 0usize;
        for slot in old_slots {
            let pos = slots.partition_point(|s| *s < slot);
            if slots.get(pos) != Some(&slot) {
                continue;
            }
            slots.remove(pos);
            removed += 1;

            // Duplicate slot values share a single owner entry.
            if slots.get(pos) == Some(&slot) {
                let owned = owners
                    .get(&slot)
                    .and_then(|idx| nodes.get(*idx))
                    .is_some_and(|node| node.name() == name);
                if !owned {
                    continue;
                }
                let end = pos + slots[pos..].partition_point(|s| *s == slot);
                removed += end - pos;
                slots.drain(pos..end);
            }
            if let Some(idx) = owners.remove(&slot) {
                nodes.release(idx);
            }
        }

        if removed == 0 {
            return Err(RingError::NodeNotFound(name.to_owned()));
        }

        debug!(node = name, removed, "removed node from ring");
        Ok(())
    }

    /// Returns the node responsible for the given key.
    ///
    /// If the ring is empty (no nodes has been added), `None` is returned.
    ///
    /// The returned reference holds a shared lock on the ring; see
    /// [`NodeRef`].
    pub fn node(&self, key: &str) -> Option<NodeRef<'_, N>> {
        let state = self.state.read_recursive();
        if state.slots.is_empty() {
            return None;
        }

        let position = self.hasher.slot(key);
        RwLockReadGuard::try_map(state, |state| state.owner(position))
            .ok()
            .map(NodeRef::new)
    }

    /// Returns a copy of the node responsible for the given key.
    ///
    /// Same as [`node()`](Self::node), but the lock is released before
    /// returning.
    pub fn node_owned(&self, key: &str) -> Option<N>
    where
        N: Clone,
    {
        self.node(key).map(|node| N::clone(&node))
    }

    /// Returns the ring position to which a given key is hashed.
    pub fn position(&self, key: &str) -> Slot {
        self.hasher.slot(key)
    }

    /// Checks whether any replica slot of the named node is on the ring.
    pub fn contains(&self, name: &str) -> bool {
        let slots = self.replica_slots(name);
        let state = self.state.read_recursive();
        slots.into_iter().any(|slot| state.contains_slot(slot))
    }

    /// Number of distinct nodes on the ring.
    pub fn len(&self) -> usize {
        self.state.read_recursive().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read_recursive().slots.is_empty()
    }

    /// Number of slots on the ring.
    pub fn slot_count(&self) -> usize {
        self.state.read_recursive().slots.len()
    }

    /// Snapshot of the sorted slot sequence.
    pub fn slots(&self) -> Vec<Slot> {
        self.state.read_recursive().slots.clone()
    }

    /// Number of slots claimed by each node.
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    fn replica_slots(&self, name: &str) -> Vec<Slot> {
        (0..self.replicas)
            .map(|i| self.hasher.slot(&replica_key(name, i)))
            .collect()
    }
}
