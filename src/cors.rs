//! Cross-origin policy for browser clients.

use axum::http::{
    HeaderName, HeaderValue, Method,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

const X_CSRF_TOKEN: HeaderName = HeaderName::from_static("x-csrf-token");

/// Allow credentialed requests from the listed origins only.
///
/// The matching origin is echoed back; others get no CORS headers. A `*`
/// entry cannot be combined with credentials, so it is skipped with a warning
/// like any entry that is not a valid header value.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter(|origin| {
            if *origin == "*" {
                warn!("Ignoring wildcard CORS origin, list origins explicitly");
                return false;
            }
            true
        })
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ACCEPT, CONTENT_TYPE, X_CSRF_TOKEN, AUTHORIZATION])
}
