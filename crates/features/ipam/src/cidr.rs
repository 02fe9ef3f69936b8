//! Address arithmetic on IPv4 and IPv6 blocks.
//!
//! Addresses of both families are handled as `u128`; IPv4 values simply never use more
//! than the low 32 bits.

use kw_domain::constants::{IPV4_TYPE, IPV6_TYPE};
use kw_kernel::error::InventoryError;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const fn width(v6: bool) -> u32 {
    if v6 { 128 } else { 32 }
}

fn to_bits(address: IpAddr) -> u128 {
    match address {
        IpAddr::V4(address) => u128::from(u32::from(address)),
        IpAddr::V6(address) => u128::from(address),
    }
}

fn from_bits(v6: bool, bits: u128) -> IpAddr {
    if v6 {
        IpAddr::V6(Ipv6Addr::from(bits))
    } else {
        IpAddr::V4(u32::try_from(bits).map_or(Ipv4Addr::BROADCAST, Ipv4Addr::from))
    }
}

/// Parses one address.
///
/// # Errors
/// [`InventoryError::InvalidArgument`] for text that is not an IP address.
pub fn parse_address(text: &str) -> Result<IpAddr, InventoryError> {
    text.trim()
        .parse()
        .map_err(|_| InventoryError::invalid(format!("'{text}' is not a valid IP address")))
}

/// A closed range of addresses of one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub v6: bool,
    pub first: u128,
    pub last: u128,
}

impl Span {
    /// The range from `first` to `last`, both included.
    ///
    /// # Errors
    /// [`InventoryError::InvalidArgument`] for mixed families or reversed bounds.
    pub fn between(first: IpAddr, last: IpAddr) -> Result<Self, InventoryError> {
        if first.is_ipv6() != last.is_ipv6() {
            return Err(InventoryError::invalid(format!("{first} and {last} belong to different IP versions")));
        }
        let span = Self { v6: first.is_ipv6(), first: to_bits(first), last: to_bits(last) };
        if span.first > span.last {
            return Err(InventoryError::invalid(format!("{first} comes after {last}")));
        }
        Ok(span)
    }

    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.v6 == other.v6 && self.first <= other.last && other.first <= self.last
    }

    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.v6 == other.v6 && self.first <= other.first && other.last <= self.last
    }
}

/// A subnet in CIDR notation, always normalized to its network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cidr {
    v6: bool,
    network: u128,
    prefix: u32,
}

impl Cidr {
    /// Parses `address/prefix`. Host bits in the address are dropped, so `10.0.0.7/24`
    /// reads as `10.0.0.0/24`.
    ///
    /// # Errors
    /// [`InventoryError::InvalidArgument`] for malformed text or prefixes longer than the
    /// address.
    pub fn parse(text: &str) -> Result<Self, InventoryError> {
        let invalid = || InventoryError::invalid(format!("'{text}' is not a subnet in CIDR notation"));
        let (address, prefix) = text.trim().split_once('/').ok_or_else(invalid)?;
        let address: IpAddr = address.trim().parse().map_err(|_| invalid())?;
        let prefix: u32 = prefix.trim().parse().map_err(|_| invalid())?;
        let v6 = address.is_ipv6();
        if prefix > width(v6) {
            return Err(invalid());
        }
        let mut cidr = Self { v6, network: 0, prefix };
        cidr.network = to_bits(address) & !cidr.host_mask();
        Ok(cidr)
    }

    fn host_mask(&self) -> u128 {
        let host_bits = width(self.v6) - self.prefix;
        1u128.checked_shl(host_bits).map_or(u128::MAX, |size| size - 1)
    }

    /// `4` or `6`.
    #[must_use]
    pub const fn version(&self) -> i32 {
        if self.v6 { IPV6_TYPE } else { IPV4_TYPE }
    }

    #[must_use]
    pub const fn prefix(&self) -> u32 {
        self.prefix
    }

    #[must_use]
    pub fn network(&self) -> IpAddr {
        from_bits(self.v6, self.network)
    }

    #[must_use]
    pub fn broadcast(&self) -> IpAddr {
        from_bits(self.v6, self.network | self.host_mask())
    }

    #[must_use]
    pub fn span(&self) -> Span {
        Span { v6: self.v6, first: self.network, last: self.network | self.host_mask() }
    }

    /// Usable host addresses. IPv4 blocks lose the network and broadcast addresses except
    /// for point-to-point `/31` and single host `/32` blocks.
    #[must_use]
    pub fn hosts(&self) -> u128 {
        let size = self.host_mask().saturating_add(1);
        if self.v6 || self.prefix >= 31 { size } else { size - 2 }
    }

    #[must_use]
    pub fn contains(&self, address: IpAddr) -> bool {
        address.is_ipv6() == self.v6 && self.span().contains(&Span { v6: self.v6, first: to_bits(address), last: to_bits(address) })
    }

    /// The mask as stored on addresses: dotted for IPv4, the prefix length for IPv6.
    #[must_use]
    pub fn mask(&self) -> String {
        if self.v6 {
            self.prefix.to_string()
        } else {
            from_bits(false, !self.host_mask() & u128::from(u32::MAX)).to_string()
        }
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix)
    }
}
