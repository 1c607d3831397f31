use {
    rapidhash::v3::rapidhash_v3,
    sha1::{Digest, Sha1},
};

/// Position on the ring.
///
/// The ring is a circular keyspace of size `2^32`.
pub type Slot = u32;

/// Hash function mapping a string key onto the ring.
///
/// Any `Fn(&str) -> Slot` implements this trait, so a closure can be passed
/// wherever a hasher is expected. The function must be deterministic, and
/// should spread its output uniformly over the 32-bit space for a balanced
/// ring.
pub trait SlotHasher {
    fn slot(&self, key: &str) -> Slot;
}

impl<F> SlotHasher for F
where
    F: Fn(&str) -> Slot,
{
    fn slot(&self, key: &str) -> Slot {
        self(key)
    }
}

/// Default hasher for the ring.
///
/// Takes the first four bytes of the SHA-1 digest of the key, read as a
/// big-endian integer. The output is portable across platforms and releases.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha1Hasher;

impl SlotHasher for Sha1Hasher {
    fn slot(&self, key: &str) -> Slot {
        let digest = Sha1::digest(key.as_bytes());
        Slot::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    }
}

/// Non-cryptographic hasher.
///
/// Uses the rapidhash V3 algorithm with the default seed and secrets, keeping
/// the low 32 bits of the output.
#[derive(Debug, Default, Clone, Copy)]
pub struct RapidHasher;

impl SlotHasher for RapidHasher {
    fn slot(&self, key: &str) -> Slot {
        rapidhash_v3(key.as_bytes()) as Slot
    }
}

/// Key under which the `idx`-th replica of a node is hashed.
pub(crate) fn replica_key(name: &str, idx: usize) -> String {
    format!("{name}-{idx}")
}
