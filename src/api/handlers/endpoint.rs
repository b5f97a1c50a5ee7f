//! Endpoint check handler
//!
//! Checks a bare IP on port 443 with the same probe used for proxies.

use axum::extract::{Query, State};
use axum::Json;
use tracing::{error, info};

use super::{last_param, QueryPairs};
use crate::api::server::AppState;
use crate::error::CheckerError;
use crate::models::EndpointCheckResponse;

/// Port probed for bare endpoint checks
pub const ENDPOINT_PORT: u16 = 443;

/// Check whether an IP serves the metadata host directly
pub async fn check_endpoint(
    State(state): State<AppState>,
    Query(query): Query<QueryPairs>,
) -> Result<Json<EndpointCheckResponse>, CheckerError> {
    let ip = last_param(query, "ip")
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .ok_or(CheckerError::MissingParameter("ip"))?;

    let result = state
        .probe
        .probe(&ip, ENDPOINT_PORT)
        .await
        .map_err(|e| {
            error!(ip = %ip, probe = state.probe.name(), "Endpoint check failed: {}", e);
            CheckerError::EndpointFailure {
                input: ip.clone(),
                reason: e.to_string(),
            }
        })?;

    info!(ip = %ip, status = %result.status, "Checked endpoint");

    Ok(Json(EndpointCheckResponse::from_result(&ip, result)))
}
