//! Header allow-list shared by both legs of the proxy

use axum::http::{header::HeaderName, HeaderMap, HeaderValue};

use crate::auth::AuthContext;

/// Trust header carrying the authenticated caller's role
pub const X_USER_ROLE: HeaderName = HeaderName::from_static("x-user-role");
/// Trust header carrying the authenticated caller's user id
pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
/// Request correlation header, assigned by the gateway when absent
pub const X_CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

/// The only header names permitted to cross the gateway boundary, in either
/// direction. Anything else on an inbound request or an upstream response is
/// silently dropped.
pub const FORWARDABLE_HEADERS: [&str; 7] = [
    "accept",
    "content-type",
    "authorization",
    "x-requested-with",
    "x-correlation-id",
    "x-user-role",
    "x-user-id",
];

/// Keep only the allow-listed subset of a header map
pub fn filter_forwardable(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();
    for name in FORWARDABLE_HEADERS {
        let name = HeaderName::from_static(name);
        for value in headers.get_all(&name) {
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}

/// Build the outbound header map: the allow-listed inbound subset plus the
/// trust headers derived from a successful token validation.
///
/// This is a pure function of (inbound headers, auth context); the inbound
/// request is never mutated. When an auth context is present it overwrites
/// any client-supplied trust headers, so the forwarded values are always the
/// gateway's own.
pub fn outbound_headers(inbound: &HeaderMap, auth: Option<&AuthContext>) -> HeaderMap {
    let mut headers = filter_forwardable(inbound);

    if let Some(auth) = auth {
        if let Ok(role) = HeaderValue::from_str(&auth.role.to_lowercase()) {
            headers.insert(X_USER_ROLE, role);
        }
        if let Ok(id) = HeaderValue::from_str(&auth.id.to_string()) {
            headers.insert(X_USER_ID, id);
        }
    }

    headers
}
