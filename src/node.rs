use {
    auto_impl::auto_impl,
    parking_lot::MappedRwLockReadGuard,
    std::{
        borrow::Cow,
        collections::{HashMap, VecDeque},
        fmt,
        ops::Deref,
    },
};

/// Node that keys are routed to.
///
/// The ring never looks inside a node: all it needs is a stable name, from
/// which the node's replica slots are derived. Structured nodes (address plus
/// metadata, say) expose their canonical name here.
#[auto_impl(&, Box, Arc)]
pub trait Node {
    /// Stable string form of the node.
    ///
    /// Must return the same value for the whole time the node is part of a
    /// ring, otherwise its slots cannot be found on removal.
    fn name(&self) -> Cow<'_, str>;
}

impl Node for str {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl Node for String {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

macro_rules! impl_node {
    ($($t:ty),*) => {
        $(
            impl Node for $t {
                fn name(&self) -> Cow<'_, str> {
                    Cow::Owned(self.to_string())
                }
            }
        )*
    };
}

impl_node!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// Reference to a node.
///
/// Nodes live inside the ring, behind its lock. The reference keeps the
/// shared lock held, binding its lifetime to the ring's state: the ring
/// cannot be mutated while a `NodeRef` is alive. Further lookups and other
/// read accessors are fine from the holding thread, even with a writer
/// queued, but `add` or `remove` from that thread deadlocks.
pub struct NodeRef<'a, N>(MappedRwLockReadGuard<'a, N>);

impl<'a, N> NodeRef<'a, N> {
    pub(crate) fn new(guard: MappedRwLockReadGuard<'a, N>) -> Self {
        Self(guard)
    }
}

impl<N> Deref for NodeRef<'_, N> {
    type Target = N;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<N: fmt::Debug> fmt::Debug for NodeRef<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&*self.0).finish()
    }
}

pub(crate) type NodeIdx = u32;

struct Entry<N> {
    node: N,
    /// Number of slots owned by the node.
    slots: usize,
}

/// Nodes collection.
///
/// Each node is stored once and assigned an index, which serves as a handle
/// throughout the rest of the ring: slots map to indexes, not to copies of
/// the node. An entry lives as long as at least one slot refers to it.
pub(crate) struct Nodes<N> {
    nodes: HashMap<NodeIdx, Entry<N>>,

    /// Next index that will be assigned to a node.
    ///
    /// If the free list is not empty, the next index will be taken from it.
    next_idx: NodeIdx,

    /// When a node is released, its index is added to this queue, so that
    /// it can be reused.
    free_list: VecDeque<NodeIdx>,
}

impl<N> Default for Nodes<N> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            next_idx: 0,
            free_list: VecDeque::new(),
        }
    }
}

impl<N> Nodes<N> {
    /// Creates a new empty nodes collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node to the collection, owning no slots yet.
    ///
    /// Returns the index of the node in the collection, or `None` once all
    /// indexes are taken.
    pub fn insert(&mut self, node: N) -> Option<NodeIdx> {
        let idx = match self.free_list.pop_front() {
            Some(idx) => idx,
            None => {
                let idx = self.next_idx;
                self.next_idx = idx.checked_add(1)?;
                idx
            }
        };

        self.nodes.insert(idx, Entry { node, slots: 0 });
        Some(idx)
    }

    /// Records one more slot owned by the node.
    pub fn retain(&mut self, idx: NodeIdx) {
        if let Some(entry) = self.nodes.get_mut(&idx) {
            entry.slots += 1;
        }
    }

    /// Records one slot fewer owned by the node.
    ///
    /// Once the node owns no slots it is removed from the collection and
    /// returned.
    pub fn release(&mut self, idx: NodeIdx) -> Option<N> {
        let entry = self.nodes.get_mut(&idx)?;
        entry.slots = entry.slots.saturating_sub(1);
        if entry.slots > 0 {
            return None;
        }

        self.free_list.push_back(idx);
        self.nodes.remove(&idx).map(|entry| entry.node)
    }

    /// Returns a reference to the node with given index.
    pub fn get(&self, idx: NodeIdx) -> Option<&N> {
        self.nodes.get(&idx).map(|entry| &entry.node)
    }

    /// Number of nodes in the collection.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
