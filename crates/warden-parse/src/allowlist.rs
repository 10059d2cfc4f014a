use std::net::IpAddr;

use nom::{
    bytes::complete::{take_till, take_till1},
    character::complete::char,
    combinator::{opt, rest},
    sequence::{preceded, tuple},
    IResult,
};
use warden_core::net::max_prefix_len;
use warden_core::{ConfigError, NetworkRange};

/// Parses a comma-separated allowlist, preserving entry order.
///
/// Empty input yields an empty list; any malformed entry fails the whole list.
pub fn parse_allowlist(value: &str) -> Result<Vec<NetworkRange>, ConfigError> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    value.split(',').map(parse_allowlist_entry).collect()
}

/// Parses one `ip[/maskbits]` entry. Without a mask the entry matches a single host.
pub fn parse_allowlist_entry(entry: &str) -> Result<NetworkRange, ConfigError> {
    let entry = entry.trim();
    let (_, (addr_part, mask_part, trailing)) =
        split_entry(entry).map_err(|_| ConfigError::InvalidAddress(entry.to_owned()))?;
    if !trailing.is_empty() {
        return Err(ConfigError::InvalidAddress(entry.to_owned()));
    }

    let addr: IpAddr = addr_part
        .parse()
        .map_err(|_| ConfigError::InvalidAddress(entry.to_owned()))?;

    let Some(mask) = mask_part else {
        return Ok(NetworkRange::host(addr));
    };

    let max = max_prefix_len(&addr.to_canonical());
    let invalid_mask = || ConfigError::InvalidMask {
        entry: entry.to_owned(),
        max,
    };
    let bits = mask.parse::<u8>().map_err(|_| invalid_mask())?;
    NetworkRange::new(addr, bits).ok_or_else(invalid_mask)
}

/// Splits `addr[/mask]` and returns whatever follows a second `/`.
fn split_entry(input: &str) -> IResult<&str, (&str, Option<&str>, &str)> {
    tuple((
        take_till1(|c: char| c == '/'),
        opt(preceded(char('/'), take_till(|c: char| c == '/'))),
        rest,
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn masked_entry_matches_range() {
        let range = parse_allowlist_entry("10.0.0.0/8").unwrap();
        assert!(range.contains(&ip("10.1.2.3")));
        assert!(!range.contains(&ip("11.0.0.0")));
    }

    #[test]
    fn bare_address_is_exact_host() {
        let range = parse_allowlist_entry("192.168.1.5").unwrap();
        assert_eq!(range.prefix_len(), 32);
        assert!(range.contains(&ip("192.168.1.5")));
        assert!(!range.contains(&ip("192.168.1.6")));

        let v6 = parse_allowlist_entry("::1").unwrap();
        assert_eq!(v6.prefix_len(), 128);
    }

    #[test]
    fn list_preserves_order_and_trims() {
        let ranges = parse_allowlist(" 127.0.0.1 , 192.168.0.0/16,2001:db8::/32").unwrap();
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0].to_string(), "127.0.0.1/32");
        assert_eq!(ranges[1].to_string(), "192.168.0.0/16");
        assert_eq!(ranges[2].to_string(), "2001:db8::/32");
    }

    #[test]
    fn empty_list_is_empty() {
        assert!(parse_allowlist("").unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_addresses() {
        for entry in ["", "not-an-ip", "10.0.0.0/8/8", "300.1.1.1", "/8"] {
            assert!(
                matches!(
                    parse_allowlist_entry(entry),
                    Err(ConfigError::InvalidAddress(_))
                ),
                "{:?} should be rejected",
                entry
            );
        }
        assert!(parse_allowlist("127.0.0.1,").is_err());
    }

    #[test]
    fn rejects_bad_masks() {
        assert!(matches!(
            parse_allowlist_entry("10.0.0.0/33"),
            Err(ConfigError::InvalidMask { max: 32, .. })
        ));
        assert!(matches!(
            parse_allowlist_entry("2001:db8::/129"),
            Err(ConfigError::InvalidMask { max: 128, .. })
        ));
        assert!(matches!(
            parse_allowlist_entry("10.0.0.0/x"),
            Err(ConfigError::InvalidMask { .. })
        ));
        assert!(matches!(
            parse_allowlist_entry("10.0.0.0/"),
            Err(ConfigError::InvalidMask { .. })
        ));
    }
}
