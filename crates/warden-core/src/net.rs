// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Allowlist network ranges.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A network range whose base address is stored already masked.
///
/// Containment is a single mask-and-compare against the stored base.
/// Prefix lengths are bounded by the address family (32 for IPv4, 128 for
/// IPv6); an address of one family never falls inside a range of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkRange {
    base: IpAddr,
    prefix_len: u8,
}

impl NetworkRange {
    /// Builds a range from any address inside it.
    ///
    /// Returns `None` when `prefix_len` exceeds the width of the address family.
    pub fn new(addr: IpAddr, prefix_len: u8) -> Option<Self> {
        let addr = addr.to_canonical();
        if prefix_len > max_prefix_len(&addr) {
            return None;
        }
        Some(Self {
            base: mask(addr, prefix_len),
            prefix_len,
        })
    }

    /// A range matching exactly one address.
    pub fn host(addr: IpAddr) -> Self {
        let addr = addr.to_canonical();
        Self {
            base: addr,
            prefix_len: max_prefix_len(&addr),
        }
    }

    pub fn base(&self) -> IpAddr {
        self.base
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Checks whether `ip` falls within this range.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        let ip = ip.to_canonical();
        match (self.base, ip) {
            (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_)) => {
                mask(ip, self.prefix_len) == self.base
            }
            _ => false,
        }
    }
}

impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix_len)
    }
}

/// Width in bits of the address family of `addr`.
pub fn max_prefix_len(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn mask(addr: IpAddr, prefix_len: u8) -> IpAddr {
    match addr {
        IpAddr::V4(v4) => {
            let bits = u32::MAX
                .checked_shl(32 - prefix_len as u32)
                .unwrap_or(0);
            IpAddr::V4(Ipv4Addr::from(u32::from(v4) & bits))
        }
        IpAddr::V6(v6) => {
            let bits = u128::MAX
                .checked_shl(128 - prefix_len as u32)
                .unwrap_or(0);
            IpAddr::V6(Ipv6Addr::from(u128::from(v6) & bits))
        }
    }
}
