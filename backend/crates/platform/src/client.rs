//! Client identification utilities
//!
//! Captures the ip/user-agent pair attached to issued refresh tokens and
//! audit events. Both fields are best-effort: a client without a User-Agent
//! header is still served.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Client metadata captured from request headers
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    /// Client IP address (from X-Forwarded-For or direct connection)
    pub ip: Option<IpAddr>,
    /// User-Agent string
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Get IP as string (for database storage)
    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

/// Capture client metadata from request headers.
///
/// Never fails: missing headers yield `None` fields.
pub fn extract_client_info(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> ClientInfo {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    ClientInfo {
        ip: extract_client_ip(headers, direct_ip),
        user_agent,
    }
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    // Check X-Forwarded-For header (first IP in the list)
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_client_info() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 Test Browser"),
        );

        let info = extract_client_info(&headers, None);
        assert_eq!(info.user_agent, Some("Mozilla/5.0 Test Browser".to_string()));
        assert_eq!(info.ip, None);
    }

    #[test]
    fn test_extract_client_info_missing_ua() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "10.1.2.3".parse().unwrap();

        let info = extract_client_info(&headers, Some(direct));
        assert_eq!(info.user_agent, None);
        assert_eq!(info.ip_string(), Some("10.1.2.3".to_string()));
    }

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        let ip = extract_client_ip(&headers, Some(direct));
        assert_eq!(ip, Some(direct));
    }
}
