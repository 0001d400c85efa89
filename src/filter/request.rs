//! Request eligibility for redirects.

use serde::Serialize;

const NON_BROWSER_FORMATS: [&str; 4] = ["json", "feed", "api", "opchtml"];

/// What the redirect filter needs to know about the inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestFacts {
    /// Upper-case HTTP method.
    pub method: String,
    pub has_post_body: bool,
    pub has_uploaded_files: bool,
    /// `tmpl` query parameter.
    pub template_mode: Option<String>,
    /// `format` query parameter.
    pub response_format: Option<String>,
    /// `X-Requested-With: XMLHttpRequest`.
    pub is_ajax: bool,
}

impl RequestFacts {
    /// Facts of a plain browser GET.
    pub fn get() -> Self {
        Self {
            method: "GET".to_string(),
            ..Self::default()
        }
    }

    pub fn is_redirect_eligible(&self) -> bool {
        is_redirect_eligible(
            &self.method,
            self.has_post_body,
            self.has_uploaded_files,
            self.template_mode.as_deref(),
            self.response_format.as_deref(),
            self.is_ajax,
        )
    }
}

/// False for form submissions, component-only renders, API formats and AJAX.
pub fn is_redirect_eligible(
    request_method: &str,
    has_post_body: bool,
    has_uploaded_files: bool,
    template_mode: Option<&str>,
    response_format: Option<&str>,
    is_ajax: bool,
) -> bool {
    if request_method.eq_ignore_ascii_case("POST") || has_post_body || has_uploaded_files {
        return false;
    }

    if template_mode == Some("component") {
        return false;
    }

    if response_format.is_some_and(|f| NON_BROWSER_FORMATS.contains(&f)) {
        return false;
    }

    !is_ajax
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_get_is_eligible() {
        assert!(RequestFacts::get().is_redirect_eligible());
    }

    #[test]
    fn test_post_and_uploads_rejected() {
        let mut facts = RequestFacts::get();
        facts.method = "post".into();
        assert!(!facts.is_redirect_eligible());

        let mut facts = RequestFacts::get();
        facts.has_post_body = true;
        assert!(!facts.is_redirect_eligible());

        let mut facts = RequestFacts::get();
        facts.has_uploaded_files = true;
        assert!(!facts.is_redirect_eligible());
    }

    #[test]
    fn test_template_and_format_rejected() {
        assert!(!is_redirect_eligible("GET", false, false, Some("component"), None, false));
        for format in ["json", "feed", "api", "opchtml"] {
            assert!(!is_redirect_eligible("GET", false, false, None, Some(format), false));
        }
        assert!(is_redirect_eligible("GET", false, false, Some("index"), Some("html"), false));
    }

    #[test]
    fn test_ajax_rejected() {
        assert!(!is_redirect_eligible("GET", false, false, None, None, true));
    }
}
