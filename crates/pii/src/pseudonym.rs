//! One-way IP pseudonymization.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Sentinel for input that does not parse as an IP address.
const UNKNOWN: &str = "unknown";

/// Coarsens an IP address so it no longer identifies a host.
///
/// IPv4: last octet zeroed. IPv6: truncated to the /64 network prefix with
/// a zero suffix. Deterministic and irreversible; anything unparseable
/// maps to `"unknown"`.
pub fn pseudonymize_ip(ip: &str) -> String {
    match ip.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            let [a, b, c, _] = v4.octets();
            Ipv4Addr::new(a, b, c, 0).to_string()
        }
        Ok(IpAddr::V6(v6)) => {
            let seg = v6.segments();
            Ipv6Addr::new(seg[0], seg[1], seg[2], seg[3], 0, 0, 0, 0).to_string()
        }
        Err(_) => UNKNOWN.to_string(),
    }
}
