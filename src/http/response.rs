//! Response construction and transformation.
//!
//! # Responsibilities
//! - Turn redirect decisions into 30x responses (or debug links)
//! - Expire the language-selection cookie
//! - Decide which upstream bodies are rewritable HTML
//! - Replace a rewritten body and fix its framing headers
//!
//! # Design Decisions
//! - Only uncompressed UTF-8 `text/html` is buffered; everything else streams
//! - Rewritten bodies carry an exact `Content-Length`

use axum::{
    body::Body,
    http::{header, response::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::config::LanguageConfig;
use crate::redirect::RedirectTarget;

/// `Set-Cookie` value expiring the language-selection cookie.
pub fn expired_cookie(settings: &LanguageConfig) -> String {
    let mut cookie = format!(
        "{}=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path={}",
        settings.cookie_name, settings.cookie_path
    );
    if let Some(domain) = settings.cookie_domain.as_deref().filter(|d| !d.is_empty()) {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    cookie
}

pub fn append_expired_cookie(headers: &mut HeaderMap, settings: &LanguageConfig) {
    if let Ok(value) = HeaderValue::from_str(&expired_cookie(settings)) {
        headers.append(header::SET_COOKIE, value);
    }
}

/// 30x with `Location`; LanguageToDomain also expires the language cookie.
pub fn redirect(target: &RedirectTarget, settings: &LanguageConfig) -> Response {
    let status = StatusCode::from_u16(settings.redirect_status)
        .ok()
        .filter(StatusCode::is_redirection)
        .unwrap_or(StatusCode::SEE_OTHER);

    let Ok(location) = HeaderValue::from_str(&target.url) else {
        tracing::warn!(url = %target.url, "Redirect target is not a valid header value");
        return StatusCode::BAD_GATEWAY.into_response();
    };

    let mut response = status.into_response();
    response.headers_mut().insert(header::LOCATION, location);
    if target.clear_language_cookie {
        append_expired_cookie(response.headers_mut(), settings);
    }
    response
}

/// Debug mode: show the redirect target as a link instead of following it.
pub fn debug_link(target: &RedirectTarget) -> Response {
    let url = html_escape(&target.url);
    Html(format!(
        "<!DOCTYPE html><html><body><a href=\"{url}\">{url}</a></body></html>"
    ))
    .into_response()
}

/// Uncompressed UTF-8 `text/html`.
pub fn is_rewritable_html(headers: &HeaderMap) -> bool {
    let encoded = headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.trim().eq_ignore_ascii_case("identity"));
    if encoded {
        return false;
    }

    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_ascii_lowercase)
    else {
        return false;
    };

    let mut params = content_type.split(';').map(str::trim);
    if params.next() != Some("text/html") {
        return false;
    }

    params
        .filter_map(|p| p.strip_prefix("charset="))
        .all(|charset| matches!(charset.trim_matches('"'), "utf-8" | "utf8"))
}

/// Reassemble a response around a rewritten body.
pub fn with_body(mut parts: Parts, body: Vec<u8>) -> Response {
    parts.headers.remove(header::TRANSFER_ENCODING);
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
    Response::from_parts(parts, Body::from(body))
}

pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
