use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::hash::{DefaultRingHasher, RingHasher};

/// Number of virtual nodes each node places on the ring by default.
pub const DEFAULT_REPLICAS: usize = 160;

#[derive(Debug)]
struct VirtualNode {
    point: u32,
    node: Arc<str>,
}

/// Sorted `(point, node)` pairs.
///
/// When two virtual nodes hash to the same point, the one inserted later
/// replaces the earlier one. Insertion follows node id order, then replica
/// index, so the outcome is deterministic, but the losing node ends up with
/// fewer than `replicas` points.
#[derive(Debug, Default)]
struct Circle {
    vnodes: Vec<VirtualNode>,
}

impl Circle {
    fn build<H: RingHasher>(hasher: &H, nodes: &BTreeSet<String>, replicas: usize) -> Self {
        let mut points = BTreeMap::new();
        for id in nodes.iter() {
            let node: Arc<str> = Arc::from(id.as_str());
            for i in 0..replicas {
                let point = hasher.hash_vnode(id, i);
                if let Some(prev) = points.insert(point, node.clone()) {
                    trace!(point, replaced = %prev, by = %node, "virtual node collision");
                }
            }
        }
        let vnodes = points
            .into_iter()
            .map(|(point, node)| VirtualNode { point, node })
            .collect();
        Circle { vnodes }
    }

    /// Index of the first virtual node at or after `point`, wrapping to 0.
    fn find_start(&self, point: u32) -> Option<usize> {
        if self.vnodes.is_empty() {
            return None;
        }
        let i = self.vnodes.partition_point(|vn| vn.point < point);
        Some(if i == self.vnodes.len() { 0 } else { i })
    }

    fn len(&self) -> usize {
        self.vnodes.len()
    }
}

#[derive(Debug, Default)]
struct State {
    nodes: BTreeSet<String>,
    circle: Circle,
}

/// A consistent hash ring mapping keys to named nodes.
///
/// Lookups take a shared lock and may run concurrently. Membership changes
/// take the exclusive lock and rebuild the whole circle before releasing
/// it, so a lookup sees either the old circle or the new one.
///
/// Every change pays a full rebuild. Use [`HashRing::add_nodes`] and
/// [`HashRing::remove_nodes`] to apply several changes at once.
#[derive(Debug)]
pub struct HashRing<H = DefaultRingHasher> {
    hasher: H,
    replicas: usize,
    state: RwLock<State>,
}

impl HashRing<DefaultRingHasher> {
    /// Creates an empty ring with [`DEFAULT_REPLICAS`] virtual nodes per node.
    pub fn new() -> Self {
        Self::with_replicas(DEFAULT_REPLICAS)
    }

    /// Creates an empty ring with `replicas` virtual nodes per node.
    ///
    /// A count of zero is treated as one.
    pub fn with_replicas(replicas: usize) -> Self {
        Self::with_hasher(DefaultRingHasher::new(), replicas)
    }
}

impl Default for HashRing<DefaultRingHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: RingHasher> HashRing<H> {
    pub fn with_hasher(hasher: H, replicas: usize) -> Self {
        HashRing {
            hasher,
            replicas: replicas.max(1),
            state: RwLock::new(State::default()),
        }
    }

    /// Registers `id`. Re-adding a present node leaves the ring unchanged.
    pub fn add_node<S: Into<String>>(&self, id: S) {
        self.add_nodes(std::iter::once(id));
    }

    /// Registers every node in `ids` with a single rebuild.
    pub fn add_nodes<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.write();
        let mut nodes = state.nodes.clone();
        for id in ids {
            let id = id.into();
            if !nodes.contains(&id) {
                debug!(node = %id, "adding node to ring");
                nodes.insert(id);
            }
        }
        self.replace(&mut state, nodes);
    }

    /// Unregisters `id`. Removing an unknown node is a no-op.
    pub fn remove_node(&self, id: &str) {
        self.remove_nodes(std::iter::once(id));
    }

    /// Unregisters every node in `ids` with a single rebuild.
    pub fn remove_nodes<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.write();
        let mut nodes = state.nodes.clone();
        for id in ids {
            let id = id.as_ref();
            if nodes.remove(id) {
                debug!(node = id, "removed node from ring");
            }
        }
        self.replace(&mut state, nodes);
    }

    /// Returns the node owning `key`.
    ///
    /// The owner is the node of the first virtual node whose point is at or
    /// after the key's point, wrapping around to the lowest point.
    pub fn get_node<K: AsRef<[u8]>>(&self, key: K) -> Result<String> {
        let point = self.hasher.hash(key.as_ref());
        let state = self.read();
        let start = state
            .circle
            .find_start(point)
            .ok_or(Error::NoNodesAvailable)?;
        Ok(state.circle.vnodes[start].node.to_string())
    }

    /// Returns up to `n` distinct nodes for `key`, walking clockwise from
    /// its point. The first entry is the one [`HashRing::get_node`] returns.
    pub fn get_nodes<K: AsRef<[u8]>>(&self, key: K, n: usize) -> Result<Vec<String>> {
        let point = self.hasher.hash(key.as_ref());
        let state = self.read();
        let circle = &state.circle;
        let start = circle.find_start(point).ok_or(Error::NoNodesAvailable)?;

        let wanted = n.min(state.nodes.len());
        let mut found: Vec<String> = Vec::with_capacity(wanted);
        for offset in 0..circle.len() {
            if found.len() == wanted {
                break;
            }
            let vn = &circle.vnodes[(start + offset) % circle.len()];
            if !found.iter().any(|f| **f == *vn.node) {
                found.push(vn.node.to_string());
            }
        }
        Ok(found)
    }

    /// Registered node ids in ascending order.
    pub fn nodes(&self) -> Vec<String> {
        self.read().nodes.iter().cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().nodes.contains(id)
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().nodes.is_empty()
    }

    /// Number of points on the circle. Equals `len() * replicas()` unless
    /// virtual nodes collided.
    pub fn vnode_count(&self) -> usize {
        self.read().circle.len()
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Builds the circle for `nodes` and installs both together. If the build
    /// panics, the previous node set and circle stay in place.
    fn replace(&self, state: &mut State, nodes: BTreeSet<String>) {
        let circle = Circle::build(&self.hasher, &nodes, self.replicas);
        *state = State { nodes, circle };
        debug!(
            nodes = state.nodes.len(),
            vnodes = state.circle.len(),
            "rebuilt ring"
        );
    }

    // State is only ever assigned whole, after the circle is built, so a
    // panic while holding the write lock leaves the previous consistent state.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
