//! Request inspection and preparation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4)
//! - Derive the visitor-facing origin (scheme, authority, host)
//! - Build the `CurrentRequest` the redirect policy works on
//! - Prepare headers for forwarding to the upstream site
//!
//! # Design Decisions
//! - Host comes from the `Host` header, falling back to the URI authority
//! - `X-Forwarded-Proto` wins over `language.assume_https`
//! - The language-selection cookie never reaches the upstream

use axum::http::{
    header::{self, HeaderName},
    request::Parts,
    HeaderMap, HeaderValue, Request,
};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

use crate::filter::RequestFacts;
use crate::redirect::CurrentRequest;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_LANGUAGE_TAG: HeaderName = HeaderName::from_static("x-language-tag");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// Request ID generator for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request ID set by the middleware stack, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Scheme and authority as the visitor used them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub https: bool,
    /// Host plus non-default port.
    pub authority: String,
    /// Lower-cased host without port.
    pub host: String,
}

impl Origin {
    pub fn scheme(&self) -> &'static str {
        if self.https {
            "https"
        } else {
            "http"
        }
    }
}

/// `None` when the request names no usable host.
pub fn origin(parts: &Parts, assume_https: bool) -> Option<Origin> {
    let raw = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()))?;

    let https = match forwarded_proto(&parts.headers) {
        Some(proto) => proto.eq_ignore_ascii_case("https"),
        None => assume_https,
    };

    let parsed = Url::parse(&format!("http://{}/", raw.trim())).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.clone(),
    };

    Some(Origin {
        https,
        authority,
        host,
    })
}

fn forwarded_proto(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The policy view of the request.
pub fn current_request(parts: &Parts, origin: &Origin, base_path: &str) -> CurrentRequest {
    let scheme = origin.scheme();
    let base = base_path.trim_matches('/');
    let base_url = if base.is_empty() {
        format!("{scheme}://{}/", origin.authority)
    } else {
        format!("{scheme}://{}/{base}/", origin.authority)
    };

    CurrentRequest {
        url: format!("{scheme}://{}{}", origin.authority, parts.uri.path()),
        base_url,
        host: origin.host.clone(),
        https: origin.https,
        facts: request_facts(parts),
    }
}

pub fn request_facts(parts: &Parts) -> RequestFacts {
    let headers = &parts.headers;
    let query = parts.uri.query();

    let has_post_body = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .is_some_and(|len| len > 0)
        || headers.contains_key(header::TRANSFER_ENCODING);

    let has_uploaded_files = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"));

    let is_ajax = headers
        .get(X_REQUESTED_WITH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

    RequestFacts {
        method: parts.method.as_str().to_ascii_uppercase(),
        has_post_body,
        has_uploaded_files,
        template_mode: query_param(query, "tmpl"),
        response_format: query_param(query, "format"),
        is_ajax,
    }
}

/// First non-empty value of `name` in the query string.
pub fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, v)| k == name && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

/// `debug=1` in the query string.
pub fn debug_requested(query: Option<&str>) -> bool {
    query_param(query, "debug").as_deref() == Some("1")
}

/// Remove cookie `name` from the `Cookie` header(s). Returns whether it was present.
pub fn strip_cookie(headers: &mut HeaderMap, name: &str) -> bool {
    let mut found = false;
    let mut kept = Vec::new();

    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            return false;
        };
        for pair in value.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let key = pair.split('=').next().unwrap_or(pair).trim();
            if key == name {
                found = true;
            } else {
                kept.push(pair.to_string());
            }
        }
    }

    if !found {
        return false;
    }

    headers.remove(header::COOKIE);
    if !kept.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&kept.join("; ")) {
            headers.insert(header::COOKIE, value);
        }
    }
    true
}

/// Add forwarding headers and ask for an uncompressed body.
pub fn prepare_forward_headers(headers: &mut HeaderMap, origin: &Origin, language_tag: Option<&str>) {
    headers.remove(header::ACCEPT_ENCODING);

    if let Ok(value) = HeaderValue::from_str(&origin.authority) {
        headers.insert(X_FORWARDED_HOST, value);
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static(origin.scheme()));

    match language_tag.and_then(|tag| HeaderValue::from_str(tag).ok()) {
        Some(value) => {
            headers.insert(X_LANGUAGE_TAG, value);
        }
        None => {
            headers.remove(X_LANGUAGE_TAG);
        }
    }
}
