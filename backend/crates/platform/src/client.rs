//! Client identification utilities
//!
//! Common functions for identifying clients via HTTP headers.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Placeholder used when a piece of metadata cannot be determined
pub const UNKNOWN: &str = "unknown";

/// Country headers set by common edge proxies, checked in order
const COUNTRY_HEADERS: &[&str] = &["cf-ipcountry", "x-country-code"];

/// Browser families recognised in the User-Agent, most specific first.
/// Each entry is (product token, display name).
const BROWSER_TOKENS: &[(&str, &str)] = &[
    ("Edg/", "Edge"),
    ("OPR/", "Opera"),
    ("Firefox/", "Firefox"),
    ("Chrome/", "Chrome"),
    ("Version/", "Safari"),
];

/// Request metadata recorded on access logs and password-reset requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    /// Client IP (from X-Forwarded-For or direct connection)
    pub ip: String,
    /// `"<family> <major>"` derived from the User-Agent
    pub browser: String,
    /// ISO country code supplied by the edge proxy
    pub country: String,
}

impl RequestMeta {
    /// Metadata with every field unknown (background jobs, tests)
    pub fn unknown() -> Self {
        Self {
            ip: UNKNOWN.to_string(),
            browser: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
        }
    }
}

/// Extract request metadata from headers and the socket address
pub fn extract_request_meta(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> RequestMeta {
    RequestMeta {
        ip: extract_client_ip(headers, direct_ip)
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        browser: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(browser_from_user_agent)
            .unwrap_or_else(|| UNKNOWN.to_string()),
        country: extract_country(headers).unwrap_or_else(|| UNKNOWN.to_string()),
    }
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    // First IP in the list is the original client
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}

/// Country code from proxy headers, upper-cased
pub fn extract_country(headers: &HeaderMap) -> Option<String> {
    COUNTRY_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_ascii_uppercase)
    })
}

/// Reduce a User-Agent string to `"<family> <major>"`
pub fn browser_from_user_agent(user_agent: &str) -> String {
    for (token, family) in BROWSER_TOKENS {
        if let Some(pos) = user_agent.find(token) {
            let version = &user_agent[pos + token.len()..];
            let major: String = version.chars().take_while(char::is_ascii_digit).collect();
            return if major.is_empty() {
                family.to_string()
            } else {
                format!("{family} {major}")
            };
        }
    }

    // Fall back to the leading product token (e.g. "curl/8.4.0" -> "curl 8")
    match user_agent.split_whitespace().next() {
        Some(product) if !product.is_empty() => match product.split_once('/') {
            Some((name, version)) => {
                let major: String = version.chars().take_while(char::is_ascii_digit).collect();
                if major.is_empty() {
                    name.to_string()
                } else {
                    format!("{name} {major}")
                }
            }
            None => product.to_string(),
        },
        _ => UNKNOWN.to_string(),
    }
}

/// Extract the token from `Authorization: Bearer <token>`
///
/// Returns `None` when the header is missing, not valid ASCII, uses another
/// scheme or carries an empty token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
