//! Client address resolution across proxy chains.
//!
//! Candidates are considered in the order the caller supplies them (typically
//! each `X-Forwarded-For` hop left to right, then `X-Real-IP`, then the socket
//! peer). The first publicly routable address wins. If none is routable, the
//! first parseable candidate is returned flagged as non-routable so callers can
//! still log it.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use relay_core::ClientAddr;

/// Parses one candidate, accepting bare addresses as well as `ip:port` and
/// `[v6]:port` forms that some proxies emit.
pub fn parse_candidate(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim().trim_matches('"');
    if raw.is_empty() || raw.eq_ignore_ascii_case("unknown") {
        return None;
    }
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|s| s.ip()))
}

/// Picks the client address from an ordered list of candidates.
pub fn resolve_client_addr<'a, I>(candidates: I) -> Option<ClientAddr>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut fallback = None;

    for ip in candidates.into_iter().filter_map(parse_candidate) {
        if is_routable(ip) {
            return Some(ClientAddr::new(ip, true));
        }
        fallback.get_or_insert(ClientAddr::new(ip, false));
    }

    fallback
}

/// Whether the address is globally routable (not private, loopback,
/// link-local, shared, documentation, multicast or reserved).
pub fn is_routable(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_routable_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_routable_v4(v4),
            None => is_routable_v6(v6),
        },
    }
}

fn is_routable_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    let shared = a == 100 && (b & 0b1100_0000) == 64; // 100.64.0.0/10
    let this_network = a == 0; // 0.0.0.0/8
    let reserved = a >= 240; // 240.0.0.0/4 and broadcast

    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_documentation()
        || ip.is_multicast()
        || shared
        || this_network
        || reserved)
}

fn is_routable_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00; // fc00::/7
    let link_local = (first & 0xffc0) == 0xfe80; // fe80::/10
    let documentation = first == 0x2001 && ip.segments()[1] == 0x0db8; // 2001:db8::/32

    !(ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || unique_local
        || link_local
        || documentation)
}
