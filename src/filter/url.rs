//! URL eligibility for rewriting.

/// Substrings that are never rewritten regardless of configuration.
pub const ALWAYS_EXCLUDED_URLS: [&str; 2] = ["/media/jui/js/", "/assets/js/"];

const RAW_FORMATS: [&str; 3] = ["raw", "json", "api"];

/// Configured exclusions, built once per runtime snapshot.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    components: Vec<String>,
    urls: Vec<String>,
}

impl ExclusionRules {
    pub fn new(components: &[String], urls: &[String]) -> Self {
        let clean = |items: &[String]| -> Vec<String> {
            items
                .iter()
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };

        let mut urls = clean(urls);
        urls.extend(ALWAYS_EXCLUDED_URLS.iter().map(|s| s.to_string()));

        Self {
            components: clean(components),
            urls,
        }
    }

    /// Returns false when any exclusion matches `url`.
    pub fn is_url_eligible(&self, url: &str) -> bool {
        if has_raw_format(url) || url.ends_with(".js") {
            return false;
        }

        let lowered = url.to_ascii_lowercase();
        if lowered.contains("index.php?option=") || lowered.contains("layout=edit") {
            return false;
        }

        let excluded_component = self.components.iter().any(|name| {
            lowered.contains(&format!("components/{name}"))
                || lowered.contains(&format!("option={name}&"))
        });
        if excluded_component {
            return false;
        }

        !self.urls.iter().any(|fragment| lowered.contains(fragment.as_str()))
    }
}

/// One-shot form of [`ExclusionRules::is_url_eligible`].
pub fn is_url_eligible(url: &str, excluded_components: &[String], excluded_urls: &[String]) -> bool {
    ExclusionRules::new(excluded_components, excluded_urls).is_url_eligible(url)
}

fn has_raw_format(url: &str) -> bool {
    query_values(url, "format").any(|value| RAW_FORMATS.contains(&value))
}

/// Values of every `name=` pair in the query part of `url`.
///
/// Tolerates HTML-escaped separators (`&amp;`) as found in rendered markup.
pub(crate) fn query_values<'a>(url: &'a str, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    let query = url
        .split_once('?')
        .map(|(_, q)| q)
        .unwrap_or_default();
    let query = query.split('#').next().unwrap_or_default();

    query.split('&').filter_map(move |pair| {
        let pair = pair.strip_prefix("amp;").unwrap_or(pair);
        match pair.split_once('=') {
            Some((key, value)) if key == name => Some(value),
            _ => None,
        }
    })
}
