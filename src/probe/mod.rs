//! Proxy probing
//!
//! A probe decides whether an `host:port` pair is usable and gathers the
//! network metadata reported through it.

mod meta;
mod tls;

pub use meta::MetaProbe;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ProxyCheckResult;

/// Failures that prevent a probe from reaching a verdict.
///
/// An unreachable proxy is not an error; it yields a `Dead` result.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to resolve {host}: {reason}")]
    Resolve { host: String, reason: String },

    #[error("invalid probe target host: {0}")]
    InvalidTarget(String),

    #[error("TLS configuration error: {0}")]
    Tls(String),
}

/// Trait for proxy liveness probes
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe a single candidate proxy
    async fn probe(&self, host: &str, port: u16) -> Result<ProxyCheckResult, ProbeError>;

    /// Get the probe name
    fn name(&self) -> &'static str;
}
