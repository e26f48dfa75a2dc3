//! Request metadata helpers: client IP, user agent, session cookie.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

/// Name of the anonymous session cookie.
pub const SESSION_COOKIE: &str = "publink_session";

/// Best-effort client IP: first `X-Forwarded-For` hop, else the socket
/// peer address.
pub fn client_ip(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }
    match connect_info {
        Some(ConnectInfo(addr)) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}

/// Client user agent, or an empty string.
pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Parse the session id out of the cookie jar, if present and valid.
pub fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

/// Build the session cookie for a session id.
pub fn session_cookie(session: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let info = ConnectInfo(addr);
        assert_eq!(client_ip(&headers, Some(&info)), "203.0.113.9");

        headers.clear();
        assert_eq!(client_ip(&headers, Some(&info)), "127.0.0.1");
        assert_eq!(client_ip(&headers, None), "unknown");
    }

    #[test]
    fn test_session_cookie_round_trip() {
        let id = Uuid::new_v4();
        let jar = CookieJar::new().add(session_cookie(id));
        assert_eq!(session_id(&jar), Some(id));
    }
}
