//! Topology inputs.
//!
//! This module contains the Layer-1 cabling topology (and its named
//! variants) and the VXLAN overlay topology that the adjacency engine reads.

pub mod layer1;
pub mod vxlan;

// Re-export key types for easier access
pub use layer1::{Layer1Edge, Layer1Node, Layer1Topologies, Layer1Topology, Layer1Variant};
pub use vxlan::{VniLayer, VxlanNode, VxlanTopology};
