//! A consistent hash ring.
//!
//! Keys are mapped onto a 32-bit circle and assigned to the node owning the
//! first virtual point at or after the key's position. Each node places
//! [`DEFAULT_REPLICAS`] virtual points on the circle (configurable), so adding
//! or removing a node only remaps the keys in the arcs it gains or loses.
//!
//! ```
//! use consistent_ring::HashRing;
//!
//! let ring = HashRing::new();
//! ring.add_node("node1");
//! ring.add_node("node2");
//!
//! let owner = ring.get_node("key1").unwrap();
//! assert!(owner == "node1" || owner == "node2");
//!
//! ring.remove_node("node2");
//! assert_eq!(ring.get_node("key1").unwrap(), "node1");
//! ```
//!
//! The ring only computes assignments. Moving data between nodes after a
//! membership change is up to the caller.
mod error;
mod hash;
mod ring;

pub use error::{Error, Result};
pub use hash::{DefaultRingHasher, RingHasher};
pub use ring::{HashRing, DEFAULT_REPLICAS};
