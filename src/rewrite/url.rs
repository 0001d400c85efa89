//! Small URL helpers shared by the rewrite engine and redirect policy.

/// Fully qualified URL for a bound domain.
///
/// Adds a scheme unless present, guarantees a trailing slash and appends
/// `index.php/` when the site runs without URL rewriting.
pub fn primary_url(domain: &str, https: bool, sef_rewrite: bool) -> String {
    let mut url = if has_http_scheme(domain) {
        domain.to_string()
    } else if https {
        format!("https://{domain}")
    } else {
        format!("http://{domain}")
    };

    if !url.ends_with('/') {
        url.push('/');
    }

    if !sef_rewrite && !url.contains("index.php") {
        url.push_str("index.php/");
    }

    url
}

/// Host of an `http(s)://` URL, limited to `[A-Za-z0-9._-]`.
pub fn domain_from_url(url: &str) -> Option<&str> {
    let rest = strip_http_scheme(url)?;
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        .unwrap_or(rest.len());

    if end == 0 {
        return None;
    }
    Some(&rest[..end])
}

pub fn has_http_scheme(url: &str) -> bool {
    strip_http_scheme(url).is_some()
}

fn strip_http_scheme(url: &str) -> Option<&str> {
    url.strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
}
