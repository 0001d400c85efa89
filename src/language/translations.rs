//! Translation reload capability the host application exposes.
//!
//! When the current language changes mid-request, every translation file
//! already loaded for the old tag is re-loaded for the new one.

/// Capability a host application implements to let the language switch
/// re-point its loaded translations.
pub trait TranslationHost {
    /// Paths of all translation files loaded so far.
    fn loaded_translation_paths(&self) -> Vec<String>;

    /// Load `paths` (already retargeted to `new_tag`). Returns how many loaded.
    fn reload_translations(&mut self, old_tag: &str, new_tag: &str, paths: &[String]) -> usize;
}

/// Outcome of [`switch_translations`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationSwitch {
    pub requested: Vec<String>,
    pub loaded: usize,
}

/// Replace `old_tag` with `new_tag` in every loaded path and ask the host to reload them.
pub fn switch_translations<H>(host: &mut H, old_tag: &str, new_tag: &str) -> TranslationSwitch
where
    H: TranslationHost + ?Sized,
{
    if old_tag.is_empty() || new_tag.is_empty() || old_tag == new_tag {
        return TranslationSwitch::default();
    }

    let requested: Vec<String> = host
        .loaded_translation_paths()
        .iter()
        .map(|path| path.replace(old_tag, new_tag))
        .collect();

    let loaded = host.reload_translations(old_tag, new_tag, &requested);
    tracing::debug!(old_tag, new_tag, requested = requested.len(), loaded, "Translations switched");

    TranslationSwitch { requested, loaded }
}
