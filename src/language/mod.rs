//! Language subsystem.
//!
//! # Data Flow
//! ```text
//! config languages + bindings
//!     → catalog.rs (tag ⇄ SEF)
//! request (query, path, host)
//!     → detect.rs (current tag + where it came from)
//! language switch in host
//!     → translations.rs (TranslationHost capability)
//! ```

pub mod catalog;
pub mod detect;
pub mod translations;

pub use catalog::{derive_sef, CatalogLanguage, LanguageCatalog};
pub use detect::{detect_language, DetectedLanguage, DetectionInput, LanguageSource};
pub use translations::{switch_translations, TranslationHost, TranslationSwitch};
