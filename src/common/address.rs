//! Peer addresses

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// A node address. Equality and hashing follow the canonical `host:port` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerAddress {
    host: String,
    port: u16,
}

impl PeerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(Error::InvalidAddress("empty host".into()));
        }
        if host.chars().any(|c| c.is_whitespace() || c.is_control() || c == '/') {
            return Err(Error::InvalidAddress(format!("invalid host: {:?}", host)));
        }
        if port == 0 {
            return Err(Error::InvalidAddress(format!("{}: port must be non-zero", host)));
        }
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Address a listener bound to `addr` should advertise.
    ///
    /// Unspecified IPs (`0.0.0.0`, `::`) are not dialable, so loopback is used instead.
    pub fn advertised(addr: SocketAddr) -> Result<Self> {
        let ip = if addr.ip().is_unspecified() {
            std::net::IpAddr::from([127, 0, 0, 1])
        } else {
            addr.ip()
        };
        Self::new(ip.to_string(), addr.port())
    }

    /// Base URL for HTTP requests.
    pub fn http_url(&self) -> String {
        format!("http://{}", self)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for PeerAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidAddress(format!("{}: missing port", s)))?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        let port: u16 = port
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("{}: port must be an integer", s)))?;
        Self::new(host, port)
    }
}

impl TryFrom<String> for PeerAddress {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<PeerAddress> for String {
    fn from(addr: PeerAddress) -> Self {
        addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let addr: PeerAddress = "127.0.0.1:4000".parse().unwrap();
        assert_eq!(addr.host(), "127.0.0.1");
        assert_eq!(addr.port(), 4000);
        assert_eq!(addr.to_string(), "127.0.0.1:4000");

        let named: PeerAddress = "node-a.local:80".parse().unwrap();
        assert_eq!(named.to_string(), "node-a.local:80");

        let v6: PeerAddress = "[::1]:4000".parse().unwrap();
        assert_eq!(v6.host(), "::1");
        assert_eq!(v6.to_string(), "[::1]:4000");
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<PeerAddress>().is_err());
        assert!("localhost".parse::<PeerAddress>().is_err());
        assert!(":4000".parse::<PeerAddress>().is_err());
        assert!("localhost:port".parse::<PeerAddress>().is_err());
        assert!("localhost:0".parse::<PeerAddress>().is_err());
        assert!("localhost:70000".parse::<PeerAddress>().is_err());
    }

    #[test]
    fn test_advertised_replaces_unspecified_ip() {
        let addr = PeerAddress::advertised("0.0.0.0:5000".parse().unwrap()).unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:5000");

        let addr = PeerAddress::advertised("10.0.0.7:5000".parse().unwrap()).unwrap();
        assert_eq!(addr.to_string(), "10.0.0.7:5000");
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let addr = PeerAddress::new("127.0.0.1", 4001).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"127.0.0.1:4001\"");
        let back: PeerAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
