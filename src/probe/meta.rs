//! Probe that fetches a metadata document through the candidate proxy
//!
//! The candidate `host:port` is dialled directly and a TLS session is opened
//! with the SNI of the metadata host. A proxy that relays the session to the
//! metadata host answers with a JSON document describing the egress
//! network; anything else marks the proxy dead.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{ACCEPT, CONNECTION, HOST, USER_AGENT};
use http::{Method, Request};
use http_body_util::{BodyExt, Empty, Limited};
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::{debug, instrument};

use super::{tls, Probe, ProbeError};
use crate::config::ProbeConfig;
use crate::models::{ProbeStatus, ProxyCheckResult};

/// Upper bound for the metadata body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Metadata document returned by the target host
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetaResponse {
    #[serde(default, deserialize_with = "lenient_u64")]
    asn: Option<u64>,
    #[serde(default)]
    as_organization: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    colo: Option<String>,
    #[serde(default)]
    http_protocol: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    longitude: Option<f64>,
}

impl MetaResponse {
    fn into_result(self, elapsed: Duration) -> ProxyCheckResult {
        ProxyCheckResult {
            status: ProbeStatus::Active,
            message: "ok".to_string(),
            asn: self.asn,
            http_protocol: self.http_protocol.unwrap_or_default(),
            org_name: self.as_organization.unwrap_or_default(),
            connection_time_ms: elapsed.as_secs_f64() * 1000.0,
            latitude: self.latitude,
            longitude: self.longitude,
            colo: self.colo.unwrap_or_default(),
            ..Default::default()
        }
        .with_country_code(self.country.unwrap_or_default())
    }
}

/// Numbers may arrive as JSON numbers or strings
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.strip_prefix("AS").unwrap_or(s).parse().ok()
        }
        _ => None,
    })
}

/// Probe that requests the metadata endpoint through the candidate proxy
pub struct MetaProbe {
    config: ProbeConfig,
    connector: TlsConnector,
}

impl MetaProbe {
    /// Create a new metadata probe
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        Ok(Self {
            connector: tls::connector()?,
            config,
        })
    }

    async fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr, ProbeError> {
        let resolve_error = |reason: String| ProbeError::Resolve {
            host: host.to_string(),
            reason,
        };

        let mut addrs = timeout(self.config.timeout(), lookup_host((host, port)))
            .await
            .map_err(|_| resolve_error("lookup timed out".to_string()))?
            .map_err(|e| resolve_error(e.to_string()))?;

        addrs
            .next()
            .ok_or_else(|| resolve_error("no addresses found".to_string()))
    }

    /// Run the TLS + HTTP exchange. `Err` carries the reason the proxy is dead.
    async fn fetch_meta(
        &self,
        addr: SocketAddr,
        server_name: ServerName<'static>,
    ) -> Result<MetaResponse, String> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| format!("connect failed: {}", e))?;

        let tls_stream = self
            .connector
            .connect(server_name, stream)
            .await
            .map_err(|e| format!("TLS handshake failed: {}", e))?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(tls_stream))
            .await
            .map_err(|e| format!("HTTP handshake failed: {}", e))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!("Probe connection closed with error: {}", e);
            }
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri(self.config.target_path.as_str())
            .header(HOST, self.config.target_host.as_str())
            .header(USER_AGENT, self.config.user_agent.as_str())
            .header(ACCEPT, "application/json")
            .header(CONNECTION, "close")
            .body(Empty::<Bytes>::new())
            .map_err(|e| format!("invalid probe request: {}", e))?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!(
                "Endpoint returned non-2xx status: {}",
                status.as_u16()
            ));
        }

        let body = Limited::new(response.into_body(), MAX_BODY_BYTES)
            .collect()
            .await
            .map_err(|e| format!("failed to read response body: {}", e))?
            .to_bytes();

        serde_json::from_slice(&body).map_err(|e| format!("invalid metadata response: {}", e))
    }
}

#[async_trait]
impl Probe for MetaProbe {
    #[instrument(skip(self), fields(meta_host = %self.config.target_host))]
    async fn probe(&self, host: &str, port: u16) -> Result<ProxyCheckResult, ProbeError> {
        let server_name = ServerName::try_from(self.config.target_host.clone())
            .map_err(|e| ProbeError::InvalidTarget(format!("{}: {}", self.config.target_host, e)))?;

        let addr = self.resolve(host, port).await?;

        let start = Instant::now();
        match timeout(self.config.timeout(), self.fetch_meta(addr, server_name)).await {
            Ok(Ok(meta)) => {
                let elapsed = start.elapsed();
                debug!("Proxy {}:{} is active ({:?})", host, port, elapsed);
                Ok(meta.into_result(elapsed))
            }
            Ok(Err(reason)) => {
                debug!("Proxy {}:{} is dead: {}", host, port, reason);
                Ok(ProxyCheckResult::dead(reason))
            }
            Err(_) => {
                let reason = format!("probe timed out after {} ms", self.config.timeout_ms);
                debug!("Proxy {}:{} is dead: {}", host, port, reason);
                Ok(ProxyCheckResult::dead(reason))
            }
        }
    }

    fn name(&self) -> &'static str {
        "meta"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    fn test_probe(timeout_ms: u64) -> MetaProbe {
        MetaProbe::new(ProbeConfig {
            timeout_ms,
            ..ProbeConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_meta_response_parsing() {
        let body = r#"{
            "clientIp": "1.2.3.4",
            "asn": 13335,
            "asOrganization": "Cloudflare, Inc.",
            "colo": "SIN",
            "country": "SG",
            "httpProtocol": "HTTP/1.1",
            "latitude": "1.28967",
            "longitude": 103.85007
        }"#;

        let meta: MetaResponse = serde_json::from_str(body).unwrap();
        let result = meta.into_result(Duration::from_millis(42));

        assert_eq!(result.status, ProbeStatus::Active);
        assert_eq!(result.asn, Some(13335));
        assert_eq!(result.org_name, "Cloudflare, Inc.");
        assert_eq!(result.colo, "SIN");
        assert_eq!(result.country_code, "SG");
        assert_eq!(result.country_name, "Singapore");
        assert_eq!(result.country_flag, "🇸🇬");
        assert_eq!(result.http_protocol, "HTTP/1.1");
        assert_eq!(result.latitude, Some(1.28967));
        assert_eq!(result.longitude, Some(103.85007));
        assert_eq!(result.delay(), "42 ms");
    }

    #[test]
    fn test_meta_response_tolerates_missing_and_odd_fields() {
        let meta: MetaResponse =
            serde_json::from_str(r#"{"asn": "AS64500", "latitude": "n/a"}"#).unwrap();
        assert_eq!(meta.asn, Some(64500));
        assert_eq!(meta.latitude, None);
        assert_eq!(meta.longitude, None);
        assert!(meta.colo.is_none());
    }

    #[tokio::test]
    async fn test_probe_closed_port_is_dead() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = test_probe(2000).probe("127.0.0.1", port).await.unwrap();
        assert_eq!(result.status, ProbeStatus::Dead);
        assert!(result.message.contains("connect failed"), "{}", result.message);
    }

    #[tokio::test]
    async fn test_probe_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(socket);
        });

        let result = test_probe(200).probe("127.0.0.1", port).await.unwrap();
        assert_eq!(result.status, ProbeStatus::Dead);
        assert!(result.message.contains("timed out"), "{}", result.message);

        server.abort();
    }

    #[tokio::test]
    async fn test_probe_plaintext_server_is_dead() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = socket
                .write_all(b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n")
                .await;
            let _ = socket.shutdown().await;
        });

        let result = test_probe(2000).probe("127.0.0.1", port).await.unwrap();
        assert_eq!(result.status, ProbeStatus::Dead);
        assert!(result.message.contains("TLS"), "{}", result.message);
    }

    #[tokio::test]
    async fn test_probe_unresolvable_host_is_error() {
        let err = test_probe(500)
            .probe("host.invalid", 8080)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Resolve { .. }));
    }

    #[tokio::test]
    async fn test_probe_invalid_target_is_error() {
        let probe = MetaProbe::new(ProbeConfig {
            target_host: "not a host name".to_string(),
            ..ProbeConfig::default()
        })
        .unwrap();

        let err = probe.probe("127.0.0.1", 443).await.unwrap_err();
        assert!(matches!(err, ProbeError::InvalidTarget(_)));
    }
}
