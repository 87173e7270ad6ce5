use std::net::Ipv4Addr;

use super::entity::Indicator;

/// Whether the value is an RFC 1918 private IPv4 address
/// (`10/8`, `172.16/12`, `192.168/16`).
pub fn is_private_ipv4(value: &str) -> bool {
    value
        .parse::<Ipv4Addr>()
        .is_ok_and(|addr| addr.is_private())
}

/// Drop indicators flagged as IPs whose value is a private IPv4 address.
/// Non-IP indicators and public addresses pass through unchanged.
pub fn remove_private_ips(indicators: Vec<Indicator>) -> Vec<Indicator> {
    indicators
        .into_iter()
        .filter(|ind| !(ind.is_ip && is_private_ipv4(&ind.value)))
        .collect()
}
