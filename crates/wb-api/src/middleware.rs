//! Cross-origin policy and request tracing layers.

use axum::http::{header, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{HttpMakeClassifier, TraceLayer};
use tracing::warn;

/// Only the configured origins get an `Access-Control-Allow-Origin` header.
pub fn cors_policy(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring allowed origin that is not a valid header value");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

pub fn request_tracing() -> TraceLayer<HttpMakeClassifier> {
    TraceLayer::new_for_http()
}
