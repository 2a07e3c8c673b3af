//! VLAN identifiers and allowed-VLAN sets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// IEEE 802.1Q VLAN id.
pub type Vlan = u16;

/// Lowest usable VLAN id.
pub const MIN_VLAN: Vlan = 1;

/// Highest usable VLAN id.
pub const MAX_VLAN: Vlan = 4094;

/// Returns true if `vlan` is a usable 802.1Q VLAN id (1-4094).
pub fn is_valid_vlan(vlan: Vlan) -> bool {
    (MIN_VLAN..=MAX_VLAN).contains(&vlan)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VlanSetError {
    #[error("Invalid VLAN range '{0}'")]
    InvalidRange(String),

    #[error("Invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(u32),
}

/// A set of VLAN ids, kept as sorted, non-overlapping, non-adjacent inclusive ranges.
///
/// Trunk allowed-VLAN lists are usually written as ranges (`1-10,20,30-40`), and
/// that is also the textual form used for (de)serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VlanSet {
    ranges: Vec<(Vlan, Vlan)>,
}

impl VlanSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A set containing exactly one VLAN.
    pub fn of(vlan: Vlan) -> Self {
        Self {
            ranges: vec![(vlan, vlan)],
        }
    }

    /// Builds a set from arbitrary (possibly overlapping, unordered) inclusive ranges.
    pub fn from_ranges(ranges: impl IntoIterator<Item = (Vlan, Vlan)>) -> Self {
        let mut ranges: Vec<(Vlan, Vlan)> = ranges
            .into_iter()
            .map(|(lo, hi)| if lo <= hi { (lo, hi) } else { (hi, lo) })
            .collect();
        ranges.sort_unstable();

        let mut merged: Vec<(Vlan, Vlan)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some(last) if u32::from(lo) <= u32::from(last.1) + 1 => {
                    last.1 = last.1.max(hi);
                }
                _ => merged.push((lo, hi)),
            }
        }
        Self { ranges: merged }
    }

    pub fn contains(&self, vlan: Vlan) -> bool {
        self.ranges
            .iter()
            .any(|&(lo, hi)| (lo..=hi).contains(&vlan))
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[(Vlan, Vlan)] {
        &self.ranges
    }

    /// Iterates every VLAN in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Vlan> + '_ {
        self.ranges.iter().flat_map(|&(lo, hi)| lo..=hi)
    }
}

impl FromIterator<Vlan> for VlanSet {
    fn from_iter<I: IntoIterator<Item = Vlan>>(iter: I) -> Self {
        Self::from_ranges(iter.into_iter().map(|v| (v, v)))
    }
}

impl fmt::Display for VlanSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .ranges
            .iter()
            .map(|&(lo, hi)| {
                if lo == hi {
                    lo.to_string()
                } else {
                    format!("{}-{}", lo, hi)
                }
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

impl FromStr for VlanSet {
    type Err = VlanSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ranges = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (lo, hi) = match part.split_once('-') {
                Some((lo, hi)) => (parse_vlan(lo, part)?, parse_vlan(hi, part)?),
                None => {
                    let vlan = parse_vlan(part, part)?;
                    (vlan, vlan)
                }
            };
            ranges.push((lo, hi));
        }
        Ok(Self::from_ranges(ranges))
    }
}

fn parse_vlan(value: &str, part: &str) -> Result<Vlan, VlanSetError> {
    let parsed = value
        .trim()
        .parse::<u32>()
        .map_err(|_| VlanSetError::InvalidRange(part.to_string()))?;
    match Vlan::try_from(parsed) {
        Ok(vlan) if is_valid_vlan(vlan) => Ok(vlan),
        _ => Err(VlanSetError::InvalidVlanId(parsed)),
    }
}

impl TryFrom<String> for VlanSet {
    type Error = VlanSetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VlanSet> for String {
    fn from(value: VlanSet) -> Self {
        value.to_string()
    }
}
