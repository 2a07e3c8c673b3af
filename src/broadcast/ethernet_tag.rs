use serde::{Deserialize, Serialize};
use std::fmt;

use crate::datamodel::Vlan;

/// How an Ethernet frame appears on one wire segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EthernetTag {
    Untagged,
    Tagged(Vlan),
}

impl EthernetTag {
    /// `Tagged(vlan)` for an 802.1Q encapsulation, `Untagged` otherwise.
    pub fn from_encapsulation(vlan: Option<Vlan>) -> Self {
        vlan.map_or(Self::Untagged, Self::Tagged)
    }

    pub fn vlan(self) -> Option<Vlan> {
        match self {
            Self::Untagged => None,
            Self::Tagged(vlan) => Some(vlan),
        }
    }
}

impl fmt::Display for EthernetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untagged => write!(f, "untagged"),
            Self::Tagged(vlan) => write!(f, "tagged {}", vlan),
        }
    }
}
