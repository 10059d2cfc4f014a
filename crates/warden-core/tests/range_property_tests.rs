// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use warden_core::NetworkRange;

proptest! {
    /// Any address is contained in the range built from itself.
    #[test]
    fn v4_range_contains_its_source(raw in any::<u32>(), prefix in 0u8..=32) {
        let ip = IpAddr::V4(Ipv4Addr::from(raw));
        let range = NetworkRange::new(ip, prefix).expect("prefix in bounds");
        prop_assert!(range.contains(&ip));
    }

    #[test]
    fn v6_range_contains_its_source(raw in any::<u128>(), prefix in 0u8..=128) {
        let ip = IpAddr::V6(Ipv6Addr::from(raw));
        // IPv4-mapped addresses are matched as IPv4.
        let width = if ip.to_canonical().is_ipv4() { 32 } else { 128 };
        let range = NetworkRange::new(ip, prefix.min(width)).expect("prefix in bounds");
        prop_assert!(range.contains(&ip));
    }

    /// The stored base is idempotent under re-masking.
    #[test]
    fn base_is_stable(raw in any::<u32>(), prefix in 0u8..=32) {
        let ip = IpAddr::V4(Ipv4Addr::from(raw));
        let range = NetworkRange::new(ip, prefix).unwrap();
        let again = NetworkRange::new(range.base(), prefix).unwrap();
        prop_assert_eq!(range, again);
    }

    /// A host range matches only its own address.
    #[test]
    fn host_range_is_exact(a in any::<u32>(), b in any::<u32>()) {
        let range = NetworkRange::host(IpAddr::V4(Ipv4Addr::from(a)));
        prop_assert_eq!(range.contains(&IpAddr::V4(Ipv4Addr::from(b))), a == b);
    }

    #[test]
    fn oversized_prefix_rejected(raw in any::<u32>(), prefix in 33u8..=255) {
        prop_assert!(NetworkRange::new(IpAddr::V4(Ipv4Addr::from(raw)), prefix).is_none());
    }
}
