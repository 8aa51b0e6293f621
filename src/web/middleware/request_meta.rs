//! Client address and user agent for the audit log.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header::USER_AGENT, request::Parts, HeaderMap},
};

const UNKNOWN: &str = "unknown";

/// Client metadata taken from proxy headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMeta {
    pub ip: String,
    pub user_agent: String,
}

/// First hop of `X-Forwarded-For`, then `X-Real-IP`.
pub fn client_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next().map(str::trim) {
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
    }

    headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

/// Client IP for a request, falling back to the socket peer and then `"unknown"`.
pub fn client_ip(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> String {
    client_ip_from_headers(headers)
        .or_else(|| peer.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = client_ip(
            &parts.headers,
            parts.extensions.get::<ConnectInfo<SocketAddr>>(),
        );
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .filter(|ua| !ua.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();

        Ok(ClientMeta { ip, user_agent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    async fn extract(request: Request<()>) -> ClientMeta {
        let (mut parts, _) = request.into_parts();
        ClientMeta::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_forwarded_for_first_hop() {
        let request = Request::builder()
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .header("X-Real-IP", "10.0.0.2")
            .header(USER_AGENT, "curl/8.0")
            .body(())
            .unwrap();
        let meta = extract(request).await;
        assert_eq!(meta.ip, "203.0.113.7");
        assert_eq!(meta.user_agent, "curl/8.0");
    }

    #[tokio::test]
    async fn test_real_ip_fallback() {
        let request = Request::builder()
            .header("X-Real-IP", "198.51.100.4")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.ip, "198.51.100.4");
    }

    #[tokio::test]
    async fn test_defaults_to_unknown() {
        let meta = extract(Request::builder().body(()).unwrap()).await;
        assert_eq!(meta.ip, "unknown");
        assert_eq!(meta.user_agent, "unknown");
    }

    #[test]
    fn test_peer_address_fallback() {
        let headers = HeaderMap::new();
        let peer = ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000)));
        assert_eq!(client_ip(&headers, Some(&peer)), "192.0.2.1");

        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static(" "));
        assert_eq!(client_ip(&headers, None), "unknown");
    }
}
