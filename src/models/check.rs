use serde::Serialize;

use super::country;

/// Outcome of a liveness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeStatus {
    Active,
    #[default]
    Dead,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Active => "Active",
            ProbeStatus::Dead => "Dead",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ProbeStatus::Active)
    }
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result produced by a probe for a single proxy.
///
/// Fields past `asn` are only meaningful when `status` is `Active`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProxyCheckResult {
    pub status: ProbeStatus,
    pub message: String,
    pub country_code: String,
    pub asn: Option<u64>,
    pub country_name: String,
    pub country_flag: String,
    pub http_protocol: String,
    pub org_name: String,
    pub connection_time_ms: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub colo: String,
}

impl ProxyCheckResult {
    /// A dead result carrying the reason the probe gave up
    pub fn dead(message: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Dead,
            message: message.into(),
            ..Default::default()
        }
    }

    /// Fill country name and flag from the country code
    pub fn with_country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = code.into();
        self.country_name = country::country_name(&self.country_code)
            .unwrap_or("Unknown")
            .to_string();
        self.country_flag = country::flag_emoji(&self.country_code).unwrap_or_default();
        self
    }

    /// Latency rendered for display, e.g. `124 ms`
    pub fn delay(&self) -> String {
        format_delay(self.connection_time_ms)
    }

    /// Country name and flag joined by a single space
    pub fn country(&self) -> String {
        format!("{} {}", self.country_name, self.country_flag)
    }
}

/// Round a millisecond measurement to the nearest integer, halves away from zero
pub fn format_delay(ms: f64) -> String {
    format!("{} ms", ms.round() as i64)
}

/// Response body of `GET /check`, discriminated by `status`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum ProxyCheckResponse {
    #[serde(rename = "ACTIVE", rename_all = "camelCase")]
    Active {
        ip: String,
        port: u16,
        isp: String,
        country_code: String,
        country: String,
        asn: Option<u64>,
        colo: String,
        http_protocol: String,
        delay: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
    },
    #[serde(rename = "DEAD")]
    Dead {
        ip: String,
        port: u16,
        asn: Option<u64>,
    },
}

impl ProxyCheckResponse {
    pub fn from_result(ip: &str, port: u16, result: ProxyCheckResult) -> Self {
        if !result.status.is_active() {
            return ProxyCheckResponse::Dead {
                ip: ip.to_string(),
                port,
                asn: result.asn,
            };
        }

        ProxyCheckResponse::Active {
            ip: ip.to_string(),
            port,
            delay: result.delay(),
            country: result.country(),
            isp: result.org_name,
            country_code: result.country_code,
            asn: result.asn,
            colo: result.colo,
            http_protocol: result.http_protocol,
            latitude: result.latitude,
            longitude: result.longitude,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ProxyCheckResponse::Active { .. })
    }
}

/// Response body of `GET /endpoint`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum EndpointCheckResponse {
    #[serde(rename = "VALID_CLOUDFLARE_ENDPOINT", rename_all = "camelCase")]
    Valid {
        ip: String,
        isp: String,
        country_code: String,
        asn: String,
        colo: String,
        http_protocol: String,
        delay: String,
        latitude: String,
        longitude: String,
    },
    #[serde(rename = "INVALID_OR_UNREACHABLE")]
    Invalid { ip: String, error: String },
}

impl EndpointCheckResponse {
    pub fn from_result(ip: &str, result: ProxyCheckResult) -> Self {
        if !result.status.is_active() {
            return EndpointCheckResponse::Invalid {
                ip: ip.to_string(),
                error: result.message,
            };
        }

        EndpointCheckResponse::Valid {
            ip: ip.to_string(),
            delay: result.delay(),
            isp: or_unknown(result.org_name),
            country_code: or_unknown(result.country_code),
            asn: result
                .asn
                .map(|asn| asn.to_string())
                .unwrap_or_else(unknown),
            colo: or_unknown(result.colo),
            http_protocol: or_unknown(result.http_protocol),
            latitude: result
                .latitude
                .map(|v| v.to_string())
                .unwrap_or_else(unknown),
            longitude: result
                .longitude
                .map(|v| v.to_string())
                .unwrap_or_else(unknown),
        }
    }
}

fn unknown() -> String {
    "Unknown".to_string()
}

fn or_unknown(value: String) -> String {
    if value.is_empty() {
        unknown()
    } else {
        value
    }
}
