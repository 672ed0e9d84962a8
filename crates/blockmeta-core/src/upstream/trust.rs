//! Outbound host trust policy.
//!
//! Enrichment only ever talks to a node on the same machine. A host is trusted
//! when it is the literal `localhost` or a loopback IP literal; names are never
//! resolved through DNS for this decision.

use std::net::IpAddr;

/// Returns `true` if `host` is `localhost` or a loopback IP literal.
///
/// Accepts `127.0.0.0/8`, `::1`, bracketed IPv6 literals and IPv4-mapped IPv6
/// loopback addresses.
#[must_use]
pub fn is_loopback_host(host: &str) -> bool {
    let host = host.trim();
    if host.is_empty() {
        return false;
    }

    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    let literal = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);

    match literal.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => ip.is_loopback(),
        Ok(IpAddr::V6(ip)) => ip.is_loopback() || ip.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback()),
        Err(_) => false,
    }
}
