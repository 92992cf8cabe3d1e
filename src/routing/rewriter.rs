//! Internal path rewriting for custom-domain requests.
//!
//! # Responsibilities
//! - Prefix the request path with the tenant: `/designs/7` → `/alice/designs/7`
//! - Preserve query string, method, headers and body
//! - Mark the request as served on a custom domain
//!
//! # Design Decisions
//! - Rewrite, never redirect: the client-visible URL does not change
//! - The custom-domain marker is only ever set here; inbound copies are stripped

use axum::http::uri::{InvalidUri, PathAndQuery};
use axum::http::{HeaderName, HeaderValue, Request, Uri};

/// Internal signal consumed by page rendering: "true" on custom-domain requests.
pub const X_CUSTOM_DOMAIN: HeaderName = HeaderName::from_static("x-custom-domain");

/// Original Host of a rewritten request.
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// `"/" + username + path`, with `/` collapsing to `/{username}`.
pub fn rewrite_path(username: &str, path: &str) -> String {
    if path.is_empty() || path == "/" {
        format!("/{username}")
    } else if path.starts_with('/') {
        format!("/{username}{path}")
    } else {
        format!("/{username}/{path}")
    }
}

/// Rewrite a URI's path, keeping scheme, authority and query.
pub fn rewrite_uri(uri: &Uri, username: &str) -> Result<Uri, InvalidUri> {
    let path = rewrite_path(username, uri.path());
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path,
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    // Only fails on scheme/authority mismatches, which were valid on the way in.
    Ok(Uri::from_parts(parts).unwrap_or_else(|_| uri.clone()))
}

/// Remove any client-supplied custom-domain marker.
pub fn strip_custom_domain_marker<B>(req: &mut Request<B>) {
    req.headers_mut().remove(X_CUSTOM_DOMAIN);
}

/// Rewrite a request in place to the tenant's internal route.
pub fn rewrite_request<B>(req: &mut Request<B>, username: &str, host: &str) -> Result<(), InvalidUri> {
    let uri = rewrite_uri(req.uri(), username)?;
    *req.uri_mut() = uri;

    let headers = req.headers_mut();
    headers.insert(X_CUSTOM_DOMAIN, HeaderValue::from_static("true"));
    if let Ok(value) = HeaderValue::from_str(host) {
        headers.insert(X_FORWARDED_HOST, value);
    }
    Ok(())
}
