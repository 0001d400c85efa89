//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, status codes and the language catalog
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Malformed bindings lines are not errors; the registry skips them

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::bindings::BindingsRegistry;
use crate::config::schema::ProxyConfig;
use crate::language::derive_sef;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.address must not be empty")]
    EmptyUpstream,

    #[error("language.redirect_status {0} is not a redirect status")]
    InvalidRedirectStatus(u16),

    #[error("language.languages: `{0}` is not a valid language tag")]
    InvalidLanguageTag(String),

    #[error("language.languages: empty SEF code for `{0}`")]
    EmptySef(String),

    #[error("language.languages: SEF code `{0}` used more than once")]
    DuplicateSef(String),

    #[error("language.bindings: `{tag}` derives SEF code `{sef}` already used by another language; add it to language.languages")]
    DerivedSefCollision { tag: String, sef: String },

    #[error("language.cookie_name must not be empty")]
    EmptyCookieName,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }

    if config.upstream.address.trim().is_empty() {
        errors.push(ValidationError::EmptyUpstream);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let language = &config.language;
    if !matches!(language.redirect_status, 301 | 302 | 303 | 307 | 308) {
        errors.push(ValidationError::InvalidRedirectStatus(language.redirect_status));
    }

    if language.cookie_name.trim().is_empty() {
        errors.push(ValidationError::EmptyCookieName);
    }

    let mut seen = HashSet::new();
    let mut configured = HashSet::new();
    for entry in &language.languages {
        let tag = entry.tag.trim().replace('_', "-");
        configured.insert(tag.clone());
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
            errors.push(ValidationError::InvalidLanguageTag(entry.tag.clone()));
        }

        let sef = entry.sef.trim();
        if sef.is_empty() {
            errors.push(ValidationError::EmptySef(entry.tag.clone()));
        } else if !seen.insert(sef.to_string()) {
            errors.push(ValidationError::DuplicateSef(sef.to_string()));
        }
    }

    for binding in BindingsRegistry::parse(&language.bindings).iter() {
        if configured.contains(&binding.language_tag) {
            continue;
        }
        let sef = derive_sef(&binding.language_tag);
        if !seen.insert(sef.clone()) {
            errors.push(ValidationError::DerivedSefCollision {
                tag: binding.language_tag.clone(),
                sef,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
