use std::hash::Hasher;

use siphasher::sip::SipHasher13;

/// Maps byte strings to points on a 32-bit ring.
///
/// Implementations must be deterministic: the same input yields the same
/// point in every process.
pub trait RingHasher {
    fn hash(&self, bytes: &[u8]) -> u32;

    /// Point of the `replica`-th virtual node of `node`, i.e. the hash of
    /// `"<node>:<replica>"`.
    fn hash_vnode(&self, node: &str, replica: usize) -> u32 {
        self.hash(format!("{}:{}", node, replica).as_bytes())
    }
}

/// SipHash-1-3 with fixed keys, folded down to 32 bits.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRingHasher(());

impl DefaultRingHasher {
    pub fn new() -> Self {
        DefaultRingHasher(())
    }
}

impl RingHasher for DefaultRingHasher {
    fn hash(&self, bytes: &[u8]) -> u32 {
        let mut hasher = SipHasher13::new_with_keys(0, 0);
        hasher.write(bytes);
        let h = hasher.finish();
        ((h >> 32) ^ h) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable() {
        let a = DefaultRingHasher::new();
        let b = DefaultRingHasher::new();
        assert_eq!(a.hash(b"key1"), b.hash(b"key1"));
        assert_eq!(a.hash(b""), b.hash(b""));
        assert_ne!(a.hash(b"key1"), a.hash(b"key2"));
    }

    #[test]
    fn hash_matches_known_points() {
        let h = DefaultRingHasher::new();
        assert_eq!(h.hash(b"key1"), 465419899);
        assert_eq!(h.hash(b"node1:0"), 1633776664);
        assert_eq!(h.hash_vnode("node1", 0), 1633776664);
    }

    #[test]
    fn vnode_label_format() {
        let h = DefaultRingHasher::new();
        assert_eq!(h.hash_vnode("node1", 7), h.hash(b"node1:7"));
        assert_ne!(h.hash_vnode("node1", 7), h.hash_vnode("node1", 8));
    }

    #[test]
    fn points_spread_across_range() {
        let h = DefaultRingHasher::new();
        let mut buckets = [0usize; 4];
        for i in 0..4000 {
            let point = h.hash(format!("k{}", i).as_bytes());
            buckets[(point >> 30) as usize] += 1;
        }
        for &count in buckets.iter() {
            assert!(count > 700 && count < 1300, "skewed buckets: {:?}", buckets);
        }
    }
}
