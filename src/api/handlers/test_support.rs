//! Shared helpers for handler tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use crate::api::routes::create_router;
use crate::api::server::AppState;
use crate::config::{ApiServerConfig, Config, LogConfig, ProbeConfig};
use crate::models::{ProbeStatus, ProxyCheckResult};
use crate::probe::{Probe, ProbeError};

enum Outcome {
    Result(ProxyCheckResult),
    Fail(String),
}

/// Probe returning a canned outcome and recording its calls
pub struct MockProbe {
    outcome: Outcome,
    calls: AtomicUsize,
    last_target: Mutex<Option<(String, u16)>>,
}

impl MockProbe {
    fn with(outcome: Outcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_target: Mutex::new(None),
        }
    }

    pub fn active() -> Self {
        Self::with(Outcome::Result(
            ProxyCheckResult {
                status: ProbeStatus::Active,
                message: "ok".to_string(),
                asn: Some(13335),
                http_protocol: "HTTP/1.1".to_string(),
                org_name: "Cloudflare, Inc.".to_string(),
                connection_time_ms: 123.6,
                latitude: Some(-6.2),
                longitude: Some(106.8),
                colo: "CGK".to_string(),
                ..Default::default()
            }
            .with_country_code("ID"),
        ))
    }

    pub fn dead(asn: Option<u64>) -> Self {
        let mut result = ProxyCheckResult::dead("connect failed: Connection refused");
        result.asn = asn;
        Self::with(Outcome::Result(result))
    }

    pub fn failing(reason: &str) -> Self {
        Self::with(Outcome::Fail(reason.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_target(&self) -> Option<(String, u16)> {
        self.last_target.lock().unwrap().clone()
    }
}

#[async_trait]
impl Probe for MockProbe {
    async fn probe(&self, host: &str, port: u16) -> Result<ProxyCheckResult, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_target.lock().unwrap() = Some((host.to_string(), port));

        match &self.outcome {
            Outcome::Result(result) => Ok(result.clone()),
            Outcome::Fail(reason) => Err(ProbeError::Resolve {
                host: host.to_string(),
                reason: reason.clone(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
            cors_origins: vec![],
            request_timeout: 10,
        },
        probe: ProbeConfig::default(),
        log: LogConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
    }
}

/// Router wired to the given mock, plus a handle to inspect it
pub fn test_app(probe: MockProbe) -> (Router, Arc<MockProbe>) {
    let probe = Arc::new(probe);
    let state = AppState::new(test_config(), probe.clone());
    (create_router(state), probe)
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}
