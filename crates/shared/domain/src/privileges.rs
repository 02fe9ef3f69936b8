use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Debug;

bitflags! {
    /// Feature areas a privilege can grant. A user's effective rights are two of these sets,
    /// one for reading and one for writing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct FeatureSet: u32 {
        const USERS = 1 << 0;
        const METADATA = 1 << 1;
        const BUSINESS = 1 << 2;
        const CONNECTIONS = 1 << 3;
        const POOLS = 1 << 4;
        const TEMPLATES = 1 << 5;
        const FAVORITES = 1 << 6;
        const VIEWS = 1 << 7;
        const QUERIES = 1 << 8;
        const TASKS = 1 << 9;
        const REPORTS = 1 << 10;
        const CONFIG = 1 << 11;
        const PROXIES = 1 << 12;
        const VALIDATORS = 1 << 13;
        const BUSINESS_RULES = 1 << 14;
        const FILES = 1 << 15;
        const SYNC = 1 << 16;
        const IPAM = 1 << 17;
        const SERVICES = 1 << 18;
        const CONTRACTS = 1 << 19;
        const PROJECTS = 1 << 20;
        const WAREHOUSES = 1 << 21;
        const AUDIT = 1 << 22;
        const SDH = 1 << 23;
        const OUTSIDE_PLANT = 1 << 24;
        const PROCESSES = 1 << 25;

        const ALL = (1 << 26) - 1;
    }
}

/// Feature tokens as stored in privileges, in flag order.
pub const FEATURE_TOKENS: &[(&str, FeatureSet)] = &[
    ("users", FeatureSet::USERS),
    ("metadata", FeatureSet::METADATA),
    ("business", FeatureSet::BUSINESS),
    ("connections", FeatureSet::CONNECTIONS),
    ("pools", FeatureSet::POOLS),
    ("templates", FeatureSet::TEMPLATES),
    ("favorites", FeatureSet::FAVORITES),
    ("views", FeatureSet::VIEWS),
    ("queries", FeatureSet::QUERIES),
    ("tasks", FeatureSet::TASKS),
    ("reports", FeatureSet::REPORTS),
    ("config", FeatureSet::CONFIG),
    ("proxies", FeatureSet::PROXIES),
    ("validators", FeatureSet::VALIDATORS),
    ("businessRules", FeatureSet::BUSINESS_RULES),
    ("files", FeatureSet::FILES),
    ("sync", FeatureSet::SYNC),
    ("ipam", FeatureSet::IPAM),
    ("services", FeatureSet::SERVICES),
    ("contracts", FeatureSet::CONTRACTS),
    ("projects", FeatureSet::PROJECTS),
    ("warehouses", FeatureSet::WAREHOUSES),
    ("audit", FeatureSet::AUDIT),
    ("sdh", FeatureSet::SDH),
    ("outsidePlant", FeatureSet::OUTSIDE_PLANT),
    ("processes", FeatureSet::PROCESSES),
];

/// Token granting every feature.
pub const WILDCARD_TOKEN: &str = "*";

impl From<&str> for FeatureSet {
    fn from(s: &str) -> Self {
        if s == WILDCARD_TOKEN || s == "all" {
            return Self::ALL;
        }
        FEATURE_TOKENS.iter().find(|(token, _)| *token == s).map_or(Self::empty(), |(_, f)| *f)
    }
}

impl From<u32> for FeatureSet {
    fn from(bits: u32) -> Self {
        Self::from_bits_truncate(bits)
    }
}

impl FeatureSet {
    /// Token of a single flag, `None` for combinations.
    #[must_use]
    pub fn token(self) -> Option<&'static str> {
        if self == Self::ALL {
            return Some(WILDCARD_TOKEN);
        }
        FEATURE_TOKENS.iter().find(|(_, f)| *f == self).map(|(token, _)| *token)
    }
}

impl Serialize for FeatureSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for FeatureSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(Self::from_bits_retain(bits))
    }
}

/// Access level of a privilege: `1` read only, `2` read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Access {
    Read,
    Write,
}

impl Access {
    pub const READ_LEVEL: u8 = 1;
    pub const WRITE_LEVEL: u8 = 2;

    #[must_use]
    pub const fn from_level(level: u8) -> Option<Self> {
        match level {
            Self::READ_LEVEL => Some(Self::Read),
            Self::WRITE_LEVEL => Some(Self::Write),
            _ => None,
        }
    }

    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Read => Self::READ_LEVEL,
            Self::Write => Self::WRITE_LEVEL,
        }
    }
}

/// Effective rights after merging a user's own privileges with those of their groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grants {
    pub read: FeatureSet,
    pub write: FeatureSet,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl Grants {
    /// Adds one privilege. Write implies read.
    pub fn grant(&mut self, features: FeatureSet, access: Access) {
        self.read |= features;
        if access == Access::Write {
            self.write |= features;
        }
    }

    #[must_use]
    pub fn allows(&self, feature: FeatureSet, access: Access) -> bool {
        match access {
            Access::Read => self.read.contains(feature),
            Access::Write => self.write.contains(feature),
        }
    }
}
