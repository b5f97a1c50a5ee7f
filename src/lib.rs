//! Proxy Checker
//!
//! A small HTTP service that checks whether a proxy endpoint is usable.
//!
//! ## Features
//!
//! - `GET /check?ip=IP:PORT` proxy liveness check with ASN, ISP and geo data
//! - `GET /endpoint?ip=IP` direct endpoint check on port 443
//! - Pluggable probe behind the [`probe::Probe`] trait
//! - Environment based configuration and structured logging

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod probe;

pub use config::Config;
pub use error::{CheckerError, Result};
