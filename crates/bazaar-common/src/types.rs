use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// How the total visit counter advances when a client connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CountingPolicy {
    /// Every connect event counts as a visit. Connections are tracked by identity.
    #[default]
    PerConnect,
    /// Only a connect from an address with no live connection counts.
    /// Connections are tracked by client address, one per address.
    UniqueAddress,
}

impl CountingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerConnect => "per_connect",
            Self::UniqueAddress => "unique_address",
        }
    }
}

impl std::str::FromStr for CountingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_connect" => Ok(Self::PerConnect),
            "unique_address" => Ok(Self::UniqueAddress),
            other => Err(format!(
                "unknown counting policy '{other}' (expected per_connect or unique_address)"
            )),
        }
    }
}

impl fmt::Display for CountingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network identity of a client, used as the presence key under
/// [`CountingPolicy::UniqueAddress`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientKey(String);

impl ClientKey {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        if key.is_empty() {
            Self::unknown()
        } else {
            Self(key)
        }
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn from_peer(peer: Option<SocketAddr>) -> Self {
        match peer {
            Some(addr) => Self::from(addr.ip()),
            None => Self::unknown(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<IpAddr> for ClientKey {
    fn from(ip: IpAddr) -> Self {
        Self(ip.to_string())
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
