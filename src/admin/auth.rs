use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use crate::admin::AdminState;

pub async fn admin_auth_middleware(
    State(state): State<AdminState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if let Some(token) = auth_header.and_then(|v| v.strip_prefix("Bearer ")) {
        if token == state.api_key.as_ref() {
            return Ok(next.run(request).await);
        }
    }

    tracing::warn!(path = %request.uri().path(), "Rejected admin request");
    Err(StatusCode::UNAUTHORIZED)
}
