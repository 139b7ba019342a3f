//! Client identification utilities
//!
//! Common functions for identifying clients and reading credentials
//! from HTTP headers.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Error when reading the `Authorization` header
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("Missing Authorization header")]
    Missing,
    #[error("Authorization header is not a Bearer credential")]
    NotBearer,
}

/// Extract the token from `Authorization: Bearer <token>`
///
/// The scheme is matched case-insensitively (RFC 7235). An empty token is
/// treated as not being a bearer credential.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(BearerError::Missing)?
        .to_str()
        .map_err(|_| BearerError::NotBearer)?;

    let (scheme, token) = value.trim().split_once(' ').ok_or(BearerError::NotBearer)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(BearerError::NotBearer);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(BearerError::NotBearer);
    }
    Ok(token)
}

/// Resolve the client IP for rate limiting
///
/// `X-Forwarded-For` is written by the caller, so it is only read when
/// `trusted_proxy_hops` proxies in front of the server append to it. The
/// client is then the entry that many hops from the right; everything to its
/// left is caller-supplied. Without trusted proxies, or when the header is
/// shorter than the proxy chain, the peer address is used.
pub fn extract_client_ip(
    headers: &HeaderMap,
    direct_ip: Option<IpAddr>,
    trusted_proxy_hops: usize,
) -> Option<IpAddr> {
    if trusted_proxy_hops == 0 {
        return direct_ip;
    }

    let hops: Vec<&str> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .collect();

    hops.len()
        .checked_sub(trusted_proxy_hops)
        .and_then(|i| hops[i].parse().ok())
        .or(direct_ip)
}

/// Rate-limit key for a client; requests without a known IP share one bucket
pub fn client_key(ip: Option<IpAddr>) -> String {
    ip.map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers), Ok("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer   abc.def "));
        assert_eq!(extract_bearer_token(&headers), Ok("abc.def"));
    }

    #[test]
    fn test_extract_bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), Err(BearerError::Missing));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_bearer_token(&headers), Err(BearerError::NotBearer));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), Err(BearerError::NotBearer));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc.def"));
        assert_eq!(extract_bearer_token(&headers), Err(BearerError::NotBearer));
    }

    #[test]
    fn test_forwarded_for_ignored_without_trusted_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        let peer: IpAddr = "198.51.100.7".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(peer), 0), Some(peer));
        assert_eq!(extract_client_ip(&headers, None, 0), None);
    }

    #[test]
    fn test_forwarded_for_uses_rightmost_untrusted_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.1.1.1, 192.168.1.1, 10.0.0.1"),
        );
        let peer: IpAddr = "127.0.0.1".parse().unwrap();

        assert_eq!(
            extract_client_ip(&headers, Some(peer), 1),
            Some("10.0.0.1".parse().unwrap())
        );
        assert_eq!(
            extract_client_ip(&headers, Some(peer), 2),
            Some("192.168.1.1".parse().unwrap())
        );
        // Chain longer than the header: fall back to the peer
        assert_eq!(extract_client_ip(&headers, Some(peer), 4), Some(peer));
    }

    #[test]
    fn test_extract_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(direct), 1), Some(direct));
        assert_eq!(client_key(Some(direct)), "127.0.0.1");
        assert_eq!(client_key(None), "unknown");
    }
}
