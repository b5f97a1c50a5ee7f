use std::fmt;

use crate::error::{CheckerError, Result};

/// Candidate proxy address split from an `IP:PORT` query value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAddress {
    pub host: String,
    pub port: u16,
}

impl ProxyAddress {
    /// Parse `host:port`, splitting on the first colon only.
    ///
    /// Only IPv4-style addresses are expected; anything after the first
    /// colon is treated as the port and must parse as a `u16` once
    /// surrounding whitespace is stripped.
    pub fn parse(input: &str) -> Result<Self> {
        let (host, port) = input.split_once(':').ok_or(CheckerError::InvalidFormat)?;
        let port = port.trim().parse::<u16>().map_err(|_| CheckerError::InvalidPort)?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
