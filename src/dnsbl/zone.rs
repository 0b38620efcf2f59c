//! DNSBL query name construction.
//!
//! A DNSBL is queried by reversing the octets of the address and appending
//! the provider's zone: `1.2.3.4` against `zen.spamhaus.org` becomes
//! `4.3.2.1.zen.spamhaus.org.`.

use crate::error::GateError;
use std::net::{IpAddr, Ipv4Addr};

/// Build the fully-qualified DNSBL query name for `ip` under `suffix`.
///
/// `suffix` is expected without a trailing dot (see [`normalize_suffix`]).
pub fn build_zone(ip: Ipv4Addr, suffix: &str) -> String {
    let [a, b, c, d] = ip.octets();
    format!("{d}.{c}.{b}.{a}.{suffix}.")
}

/// Parse a dotted-quad string, rejecting anything that is not IPv4.
pub fn parse_ipv4(input: &str) -> Result<Ipv4Addr, GateError> {
    input
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| GateError::InvalidAddress(input.to_string()))
}

/// Extract the IPv4 address of a connected peer.
///
/// IPv4-mapped IPv6 peers (`::ffff:a.b.c.d`, as seen on dual-stack
/// listeners) are unwrapped. Any other IPv6 peer is rejected.
pub fn peer_ipv4(addr: IpAddr) -> Result<Ipv4Addr, GateError> {
    match addr {
        IpAddr::V4(v4) => Ok(v4),
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .ok_or_else(|| GateError::InvalidAddress(v6.to_string())),
    }
}

/// Canonical form of a provider suffix: trimmed, lower-case, no leading or
/// trailing dot.
pub fn normalize_suffix(suffix: &str) -> String {
    suffix.trim().trim_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_zone_reverses_octets() {
        let ip: Ipv4Addr = "89.218.52.234".parse().unwrap();
        assert_eq!(
            build_zone(ip, "ix.dnsbl.manitu.net"),
            "234.52.218.89.ix.dnsbl.manitu.net."
        );
    }

    #[test]
    fn test_build_zone_is_repeatable() {
        let ip = Ipv4Addr::new(127, 0, 0, 2);
        let first = build_zone(ip, "zen.spamhaus.org");
        let second = build_zone(ip, "zen.spamhaus.org");
        assert_eq!(first, second);
        assert_eq!(first, "2.0.0.127.zen.spamhaus.org.");
    }

    #[test]
    fn test_build_zone_keeps_suffix_intact() {
        let suffix = "b.barracudacentral.org";
        for ip in [
            Ipv4Addr::new(0, 0, 0, 0),
            Ipv4Addr::new(255, 255, 255, 255),
            Ipv4Addr::new(10, 20, 30, 40),
            Ipv4Addr::new(1, 22, 133, 4),
        ] {
            let zone = build_zone(ip, suffix);
            let (reversed, rest) = zone.split_at(zone.len() - suffix.len() - 2);
            assert_eq!(rest, format!(".{suffix}."));

            let mut octets: Vec<u8> = reversed.split('.').map(|o| o.parse().unwrap()).collect();
            octets.reverse();
            assert_eq!(octets, ip.octets());
        }
    }

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("192.0.2.1"), Ok(Ipv4Addr::new(192, 0, 2, 1)));
        assert_eq!(parse_ipv4(" 192.0.2.1\n"), Ok(Ipv4Addr::new(192, 0, 2, 1)));
        assert!(matches!(
            parse_ipv4("2001:db8::1"),
            Err(GateError::InvalidAddress(_))
        ));
        assert!(matches!(
            parse_ipv4("300.1.1.1"),
            Err(GateError::InvalidAddress(_))
        ));
        assert!(matches!(
            parse_ipv4("mail.example.com"),
            Err(GateError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_peer_ipv4_unwraps_mapped_v6() {
        let mapped: IpAddr = "::ffff:198.51.100.7".parse().unwrap();
        assert_eq!(peer_ipv4(mapped), Ok(Ipv4Addr::new(198, 51, 100, 7)));

        let native: IpAddr = "2001:db8::1".parse().unwrap();
        assert_eq!(
            peer_ipv4(native),
            Err(GateError::InvalidAddress("2001:db8::1".to_string()))
        );
    }

    #[test]
    fn test_normalize_suffix() {
        assert_eq!(normalize_suffix("Zen.Spamhaus.ORG."), "zen.spamhaus.org");
        assert_eq!(normalize_suffix(" bl.spamcop.net "), "bl.spamcop.net");
        assert_eq!(normalize_suffix(".dnsbl.sorbs.net"), "dnsbl.sorbs.net");
    }
}
