//! Proxy check handler

use axum::extract::{Query, State};
use axum::Json;
use tracing::{error, info};

use super::{last_param, QueryPairs};
use crate::api::server::AppState;
use crate::error::CheckerError;
use crate::models::{ProxyAddress, ProxyCheckResponse};

/// Check a single proxy given as `?ip=IP:PORT`
pub async fn check_proxy(
    State(state): State<AppState>,
    Query(query): Query<QueryPairs>,
) -> Result<Json<ProxyCheckResponse>, CheckerError> {
    let input = last_param(query, "ip").ok_or(CheckerError::InvalidFormat)?;
    let address = ProxyAddress::parse(&input)?;

    let result = state
        .probe
        .probe(&address.host, address.port)
        .await
        .map_err(|e| {
            error!(input = %input, probe = state.probe.name(), "Proxy check failed: {}", e);
            CheckerError::ProbeFailure {
                input: input.clone(),
                reason: e.to_string(),
            }
        })?;

    info!(address = %address, status = %result.status, "Checked proxy");

    Ok(Json(ProxyCheckResponse::from_result(
        &address.host,
        address.port,
        result,
    )))
}
