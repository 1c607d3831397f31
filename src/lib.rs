//! Consistent hashing ring.
//!
//! Routes arbitrary keys to a dynamic set of named nodes (cache shards,
//! storage replicas and the like). Each node is placed on a 32-bit circular
//! keyspace at several positions (virtual replicas), and a key belongs to the
//! node owning the first position at or after the key's hash. Adding or
//! removing a node only remaps the keys that fall next to its positions.
//!
//! ```
//! use slotring::Ring;
//!
//! let ring = Ring::new(3);
//! ring.add("node1");
//! ring.add("node2");
//! ring.add("node3");
//! assert_eq!(ring.slot_count(), 9);
//!
//! let owner = ring.node_owned("test").unwrap();
//! assert_eq!(owner, "node2");
//!
//! ring.remove("node2").unwrap();
//! assert_eq!(ring.node_owned("test"), Some("node3"));
//! assert!(ring.remove("node2").is_err());
//! ```

mod builder;
mod error;
mod hash;
mod node;
mod ring;

pub use {
    builder::RingBuilder,
    error::{RingError, RingResult},
    hash::{RapidHasher, Sha1Hasher, Slot, SlotHasher},
    node::{Node, NodeRef},
    ring::{DEFAULT_REPLICAS, Ring},
};
