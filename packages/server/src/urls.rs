use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use tracing::debug;

/// Addresses a freshly started webapp can be reached at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUrls {
    pub local: String,
    pub external: Option<String>,
}

impl AccessUrls {
    /// Loopback URL plus the first non-loopback IPv4 address of this host.
    pub fn for_port(port: u16) -> Self {
        let addresses = match get_if_addrs::get_if_addrs() {
            Ok(interfaces) => interfaces
                .into_iter()
                .map(|iface| (iface.is_loopback(), iface.ip()))
                .collect(),
            Err(e) => {
                debug!("Could not list network interfaces: {}", e);
                Vec::new()
            }
        };
        Self::from_addresses(port, &addresses)
    }

    /// Build from `(is_loopback, address)` pairs.
    pub fn from_addresses(port: u16, addresses: &[(bool, IpAddr)]) -> Self {
        let ipv4 = |loopback: bool| {
            addresses.iter().find_map(|(is_loopback, ip)| match ip {
                IpAddr::V4(v4) if *is_loopback == loopback => Some(*v4),
                _ => None,
            })
        };

        let local = ipv4(true).unwrap_or(Ipv4Addr::LOCALHOST);
        Self {
            local: format!("http://{}:{}", local, port),
            external: ipv4(false).map(|ip| format!("http://{}:{}", ip, port)),
        }
    }
}

impl fmt::Display for AccessUrls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Local:    {}", self.local)?;
        if let Some(external) = &self.external {
            write!(f, "\nExternal: {}", external)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn test_picks_first_external_ipv4() {
        let addresses = [
            (true, IpAddr::V4(Ipv4Addr::LOCALHOST)),
            (false, IpAddr::V6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1))),
            (false, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))),
            (false, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))),
        ];
        let urls = AccessUrls::from_addresses(8080, &addresses);
        assert_eq!(urls.local, "http://127.0.0.1:8080");
        assert_eq!(urls.external.as_deref(), Some("http://192.168.1.20:8080"));
    }

    #[test]
    fn test_no_interfaces() {
        let urls = AccessUrls::from_addresses(9090, &[]);
        assert_eq!(urls.local, "http://127.0.0.1:9090");
        assert_eq!(urls.external, None);
        assert_eq!(urls.to_string(), "Local:    http://127.0.0.1:9090");
    }
}
