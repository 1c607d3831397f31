use {
    slotring::{Node, RapidHasher, Ring, RingBuilder, RingError, Slot, SlotHasher},
    std::{
        borrow::Cow,
        collections::HashMap,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    },
};

#[derive(Debug, Clone, PartialEq)]
struct CacheShard {
    name: String,
    addr: String,
    weight: u8,
}

impl Node for CacheShard {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}

impl CacheShard {
    fn new(name: &str, addr: &str) -> Self {
        Self {
            name: name.to_string(),
            addr: addr.to_string(),
            weight: 1,
        }
    }
}

fn three_nodes() -> Ring<&'static str> {
    let ring = Ring::new(3);
    ring.add("node1");
    ring.add("node2");
    ring.add("node3");
    ring
}

#[test]
fn add_remove_lookup() {
    let ring = three_nodes();
    assert_eq!(ring.slot_count(), 9);
    assert_eq!(ring.len(), 3);

    let before = ring.node_owned("test");
    assert_eq!(before, Some("node2"));

    ring.remove("node2").unwrap();
    assert_eq!(ring.slot_count(), 6);
    assert_eq!(ring.len(), 2);
    assert!(!ring.contains("node2"));

    let slots = ring.slots();
    for i in 0..3 {
        let slot = ring.position(&format!("node2-{i}"));
        assert!(!slots.contains(&slot));
    }

    let after = ring.node_owned("test");
    assert_eq!(after, Some("node3"));
    assert_ne!(before, after);
}

#[test]
fn remove_twice() {
    let ring = three_nodes();
    assert!(ring.remove("node1").is_ok());
    assert_eq!(
        ring.remove("node1"),
        Err(RingError::NodeNotFound("node1".to_string()))
    );
    assert_eq!(
        ring.remove("node4").unwrap_err().to_string(),
        "Node not found: node4"
    );

    // Lenient removal.
    assert!(ring.remove("node1").ok().is_none());
    assert_eq!(ring.slot_count(), 6);
}

#[test]
fn lookup_on_empty_ring() {
    let ring = Ring::<String>::new(10);
    assert!(ring.node("test").is_none());

    ring.add("node1".to_string());
    ring.remove("node1").unwrap();
    assert!(ring.is_empty());
    assert!(ring.node("test").is_none());
}

#[test]
fn lookup_wraps_around() {
    let ring = three_nodes();
    let slots = ring.slots();
    let (first, last) = (slots[0], slots[slots.len() - 1]);

    // "key-40" is hashed past the highest slot.
    assert!(ring.position("key-40") > last);
    assert_eq!(ring.node_owned("key-40"), Some("node3"));
    assert_eq!(ring.position("node3-0"), first);
}

#[test]
fn lookup_returns_member() {
    let ring = Ring::new(16);
    (0..8).for_each(|i| ring.add(format!("node{i}")));
    ring.remove("node3").unwrap();
    ring.remove("node6").unwrap();

    for i in 0..1000 {
        let node = ring.node_owned(&format!("key-{i}")).unwrap();
        assert_ne!(node, "node3");
        assert_ne!(node, "node6");
        assert!(ring.contains(&node));
    }
}

#[test]
fn custom_hash_function() {
    let calls = Arc::new(AtomicUsize::new(0));
    let hasher = {
        let calls = calls.clone();
        move |key: &str| -> Slot {
            calls.fetch_add(1, Ordering::SeqCst);
            key.chars().map(Slot::from).sum()
        }
    };

    let ring = Ring::with_hasher(1, hasher);
    ring.add("node1");
    ring.add("node2");
    ring.add("node3");
    assert_eq!(ring.slots(), vec![564, 565, 566]);

    // "foobar" sums up past every slot, and wraps to the first one.
    let node = ring.node_owned("foobar");
    assert_eq!(node, Some("node1"));

    ring.remove("node1").unwrap();
    let new_node = ring.node_owned("foobar");
    assert_eq!(new_node, Some("node2"));

    assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[test]
fn structured_nodes() {
    let shards = [
        CacheShard::new("cache-a", "10.0.0.1:6379"),
        CacheShard::new("cache-b", "10.0.0.2:6379"),
        CacheShard::new("cache-c", "10.0.0.3:6379"),
    ];
    let ring = RingBuilder::new(shards.clone()).with_replicas(50).build();
    assert_eq!(ring.len(), 3);

    let owner = ring.node("user:42").unwrap();
    assert!(shards.contains(&owner));
    assert_eq!(owner.weight, 1);
    let addr = owner.addr.clone();
    drop(owner);

    // Node is found by name alone, whatever its other fields.
    let name = shards.iter().find(|s| s.addr == addr).unwrap().name.clone();
    ring.remove(&name).unwrap();
    assert_ne!(ring.node_owned("user:42").unwrap().addr, addr);

    // Shared nodes.
    let ring = Ring::new(4);
    let shard = Arc::new(CacheShard::new("cache-a", "10.0.0.1:6379"));
    ring.add(shard.clone());
    assert!(Arc::ptr_eq(&ring.node_owned("key").unwrap(), &shard));
}

#[test]
fn fair_distribution() {
    let ring = RingBuilder::new((0..5).map(|i| format!("node{i}")))
        .with_replicas(100)
        .build();
    assert_eq!(ring.slot_count(), 500);

    let keys = (0..10_000).map(|i| format!("key-{i}")).collect::<Vec<_>>();
    let owners = keys
        .iter()
        .map(|key| ring.node_owned(key).unwrap())
        .collect::<Vec<_>>();

    let mut counts = HashMap::<&String, usize>::new();
    owners
        .iter()
        .for_each(|owner| *counts.entry(owner).or_default() += 1);
    assert_eq!(counts.len(), 5);
    for (node, count) in &counts {
        assert!(
            (1500..=2500).contains(count),
            "{node} owns {count} keys out of {}",
            keys.len()
        );
    }

    // Adding a node only moves keys onto that node.
    ring.add("node5".to_string());
    let mut moved = 0;
    for (key, old_owner) in keys.iter().zip(&owners) {
        let new_owner = ring.node_owned(key).unwrap();
        if &new_owner != old_owner {
            assert_eq!(new_owner, "node5");
            moved += 1;
        }
    }
    assert!(moved > 0 && moved < 2500, "moved {moved} keys");

    // And removing it moves them back.
    ring.remove("node5").unwrap();
    for (key, old_owner) in keys.iter().zip(&owners) {
        assert_eq!(&ring.node_owned(key).unwrap(), old_owner);
    }
}

#[test]
fn concurrent_readers_and_writers() {
    let ring = Ring::new(32);
    ring.add("stable".to_string());

    thread::scope(|s| {
        for t in 0..4 {
            let ring = &ring;
            s.spawn(move || {
                for round in 0..50 {
                    let name = format!("node-{t}-{round}");
                    ring.add(name.clone());
                    assert!(ring.contains(&name));
                    ring.remove(&name).unwrap();
                }
            });
        }
        for _ in 0..4 {
            let ring = &ring;
            s.spawn(move || {
                for i in 0..500 {
                    assert!(ring.node(&format!("key-{i}")).is_some());
                }
            });
        }
    });

    assert_eq!(ring.len(), 1);
    assert_eq!(ring.slot_count(), 32);
    assert_eq!(ring.node_owned("any").as_deref(), Some("stable"));
}

#[test]
fn fast_hasher() {
    let ring = RingBuilder::new(["node1", "node2", "node3"])
        .with_hasher(RapidHasher)
        .with_replicas(10)
        .build();
    assert_eq!(ring.position("key"), RapidHasher.slot("key"));
    assert!(ring.node("key").is_some());
    ring.remove("node2").unwrap();
    assert!(!ring.contains("node2"));
}

#[test]
fn nested_lookup_with_queued_writer() {
    let ring = Ring::new(8);
    ring.add("node1");

    thread::scope(|s| {
        let first = ring.node("a").unwrap();
        let writer = s.spawn(|| ring.add("node2"));

        // Let the writer queue up on the lock.
        thread::sleep(Duration::from_millis(100));
        assert!(!writer.is_finished());

        let second = ring.node("b").unwrap();
        assert!(ring.contains("node1"));
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.slots().len(), ring.slot_count());
        assert!(!ring.is_empty());
        assert_eq!((*first, *second), ("node1", "node1"));

        drop(first);
        drop(second);
        writer.join().unwrap();
    });

    assert_eq!(ring.len(), 2);
}
