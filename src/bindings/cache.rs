//! Process-wide memo of the parsed registry.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::bindings::registry::{BindingsRegistry, SkippedLine};

struct Entry {
    raw: String,
    registry: Arc<BindingsRegistry>,
}

/// Caches the registry for the last raw bindings string seen.
///
/// Reads are lock-free. A different raw string replaces the entry.
pub struct BindingsCache {
    current: ArcSwap<Entry>,
}

impl BindingsCache {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Entry {
                raw: String::new(),
                registry: Arc::new(BindingsRegistry::default()),
            }),
        }
    }

    /// Registry for `raw`, parsing only when it differs from the cached string.
    pub fn get(&self, raw: &str) -> Arc<BindingsRegistry> {
        let key = raw.trim();
        let entry = self.current.load();
        if entry.raw == key {
            return entry.registry.clone();
        }

        let (registry, _) = parse_logged(raw);
        let registry = Arc::new(registry);
        self.current.store(Arc::new(Entry {
            raw: key.to_string(),
            registry: registry.clone(),
        }));
        registry
    }
}

/// Parse the untrimmed string so skipped-line numbers match the config file.
fn parse_logged(raw: &str) -> (BindingsRegistry, Vec<SkippedLine>) {
    let (registry, skipped) = BindingsRegistry::parse_with_report(raw);
    for line in &skipped {
        tracing::warn!(
            line = line.line_number,
            content = %line.content,
            reason = %line.reason,
            "Ignoring bindings line"
        );
    }
    tracing::info!(bindings = registry.len(), "Bindings parsed");
    (registry, skipped)
}

impl Default for BindingsCache {
    fn default() -> Self {
        Self::new()
    }
}
