//! HTTP Basic authentication for mutating requests.

use crate::config::AuthConfig;
use crate::server::AppContext;
use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// `WWW-Authenticate` value sent with every 401.
const CHALLENGE: &str = "Basic realm=\"Restricted\"";

/// Whether `method` needs credentials at all.
fn requires_auth(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Decode the `user:password` pair of a Basic `Authorization` header.
fn basic_credentials(value: &str) -> Option<String> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    credentials.contains(':').then_some(credentials)
}

/// Check an `Authorization` header value against the configured users.
pub fn check_auth(auth: &AuthConfig, authorization: Option<&str>) -> bool {
    if !auth.enabled() {
        return true;
    }
    authorization
        .and_then(basic_credentials)
        .is_some_and(|c| auth.users.iter().any(|u| *u == c))
}

/// Middleware rejecting unauthenticated writes and deletes.
pub async fn basic_auth_middleware(
    State(ctx): State<AppContext>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if requires_auth(request.method()) {
        let authorization = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        if !check_auth(&ctx.config.auth, authorization) {
            tracing::debug!("Rejected unauthenticated {} {}", request.method(), request.uri());
            return (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, CHALLENGE)],
                "Unauthorized",
            )
                .into_response();
        }
    }

    next.run(request).await
}
