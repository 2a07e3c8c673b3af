//! Single-hop frame transformations.
//!
//! Every edge of the broadcast graph is one of these small, stateless
//! functions. A `None` result means the frame is dropped on that hop.

use super::ethernet_tag::EthernetTag;
use crate::datamodel::{Vlan, VlanSet};

/// One L2 hop: maps the frame as it leaves one node to the frame as it enters the next.
pub trait Traverse<In, Out> {
    fn traverse(&self, input: In) -> Option<Out>;
}

/// Passes frames through unchanged (hub ports, VNI fabric).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preserve;

impl<T> Traverse<T, T> for Preserve {
    fn traverse(&self, input: T) -> Option<T> {
        Some(input)
    }
}

/// An SVI (or VNI) injecting a frame into its VLAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginateInVlan(pub Vlan);

impl Traverse<(), Vlan> for OriginateInVlan {
    fn traverse(&self, _input: ()) -> Option<Vlan> {
        Some(self.0)
    }
}

/// An L3 interface sending onto its port with its own encapsulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginateWithTag(pub EthernetTag);

impl Traverse<(), EthernetTag> for OriginateWithTag {
    fn traverse(&self, _input: ()) -> Option<EthernetTag> {
        Some(self.0)
    }
}

/// An SVI (or VNI) accepting only frames in its own VLAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverFromVlan(pub Vlan);

impl Traverse<Vlan, ()> for DeliverFromVlan {
    fn traverse(&self, input: Vlan) -> Option<()> {
        (input == self.0).then_some(())
    }
}

/// An L3 interface accepting only frames carrying its own encapsulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverWithTag(pub EthernetTag);

impl Traverse<EthernetTag, ()> for DeliverWithTag {
    fn traverse(&self, input: EthernetTag) -> Option<()> {
        (input == self.0).then_some(())
    }
}

/// How a switchport admits frames between its wire and the device bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchportAdmission {
    /// Untagged frames only, bridged into one VLAN
    Access(Vlan),
    /// Tagged frames for allowed VLANs, untagged frames for the native VLAN
    Trunk {
        allowed_vlans: VlanSet,
        native_vlan: Option<Vlan>,
    },
}

impl SwitchportAdmission {
    /// Frame arriving on the wire, entering the bridge.
    pub fn ingress(&self, tag: EthernetTag) -> Option<Vlan> {
        match (self, tag) {
            (Self::Access(vlan), EthernetTag::Untagged) => Some(*vlan),
            (Self::Access(_), EthernetTag::Tagged(_)) => None,
            (
                Self::Trunk {
                    allowed_vlans,
                    native_vlan,
                },
                EthernetTag::Untagged,
            ) => native_vlan.filter(|v| allowed_vlans.contains(*v)),
            (Self::Trunk { allowed_vlans, .. }, EthernetTag::Tagged(vlan)) => {
                allowed_vlans.contains(vlan).then_some(vlan)
            }
        }
    }

    /// Frame leaving the bridge through this port onto the wire.
    pub fn egress(&self, vlan: Vlan) -> Option<EthernetTag> {
        match self {
            Self::Access(access) => (vlan == *access).then_some(EthernetTag::Untagged),
            Self::Trunk {
                allowed_vlans,
                native_vlan,
            } => {
                if !allowed_vlans.contains(vlan) {
                    None
                } else if *native_vlan == Some(vlan) {
                    Some(EthernetTag::Untagged)
                } else {
                    Some(EthernetTag::Tagged(vlan))
                }
            }
        }
    }
}
