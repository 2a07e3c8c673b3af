//! Vendor-independent configuration model.
//!
//! Parsing vendor configurations happens elsewhere; this module only holds
//! the normalized snapshot that the topology engine consumes.

pub mod configuration;
pub mod interface;
pub mod node_interface_pair;
pub mod vlan;

pub use configuration::{Configuration, Layer2Vni, Vrf, DEFAULT_VRF_NAME};
pub use interface::{
    AddressError, Dependency, DependencyType, Interface, InterfaceAddress, InterfaceType,
    SwitchportMode,
};
pub use node_interface_pair::NodeInterfacePair;
pub use vlan::{is_valid_vlan, Vlan, VlanSet, VlanSetError, MAX_VLAN, MIN_VLAN};
