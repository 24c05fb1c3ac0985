//! # Theme Resolution
//!
//! Picks light or dark mode before the first paint and applies it to the
//! document root. Lookup order:
//!
//! 1. the current `theme` key (`"dark"` / `"light"`; anything else defers),
//! 2. the legacy `darkMode` key (`"true"` / `"false"`),
//! 3. the operating system's colour-scheme preference,
//! 4. light.
//!
//! Resolution is best-effort: a storage or media-query error is logged at
//! debug level and treated as "no preference".

use std::collections::HashMap;

use thiserror::Error;

use crate::dom::Document;

/// Current preference key.
pub const THEME_KEY: &str = "theme";
/// Legacy boolean preference key.
pub const LEGACY_DARK_MODE_KEY: &str = "darkMode";
/// Class toggled on the document root.
pub const DARK_CLASS: &str = "dark";
/// Name of the meta tag carrying the browser chrome colour.
pub const THEME_COLOR_META: &str = "theme-color";

const DARK_THEME_COLOR: &str = "#0f172a";
const LIGHT_THEME_COLOR: &str = "#ffffff";

/// Resolved colour scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Light mode.
    #[default]
    Light,
    /// Dark mode.
    Dark,
}

impl Theme {
    /// The `theme-color` meta value for this theme.
    pub fn theme_color(&self) -> &'static str {
        match self {
            Theme::Light => LIGHT_THEME_COLOR,
            Theme::Dark => DARK_THEME_COLOR,
        }
    }
}

/// A preference backend failed.
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// Storage exists but cannot be read (privacy mode, quota, ...).
    #[error("preference storage unavailable: {0}")]
    Unavailable(String),
}

/// Persisted key/value preferences (`localStorage`).
pub trait PreferenceStore {
    /// Reads `key`.
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
}

/// The `prefers-color-scheme: dark` media query.
pub trait ColorSchemeQuery {
    /// Whether the OS prefers a dark scheme.
    fn prefers_dark(&self) -> Result<bool, PreferenceError>;
}

/// `HashMap`-backed [`PreferenceStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.get(key).cloned())
    }
}

/// A fixed OS preference.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedColorScheme(pub bool);

impl ColorSchemeQuery for FixedColorScheme {
    fn prefers_dark(&self) -> Result<bool, PreferenceError> {
        Ok(self.0)
    }
}

fn stored(store: &dyn PreferenceStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(key, error = %e, "theme preference unreadable");
            None
        }
    }
}

/// Resolves the theme without touching the document.
pub fn resolve_theme(store: &dyn PreferenceStore, os: &dyn ColorSchemeQuery) -> Theme {
    match stored(store, THEME_KEY).as_deref() {
        Some("dark") => return Theme::Dark,
        Some("light") => return Theme::Light,
        _ => {}
    }

    match stored(store, LEGACY_DARK_MODE_KEY).as_deref() {
        Some("true") => return Theme::Dark,
        Some("false") => return Theme::Light,
        _ => {}
    }

    match os.prefers_dark() {
        Ok(true) => Theme::Dark,
        Ok(false) => Theme::Light,
        Err(e) => {
            tracing::debug!(error = %e, "color scheme query failed");
            Theme::Light
        }
    }
}

/// Toggles the `dark` class on the root and updates `theme-color` if present.
pub fn apply_theme(document: &dyn Document, theme: Theme) {
    document
        .document_element()
        .set_class(DARK_CLASS, theme == Theme::Dark);
    if let Some(meta) = document.meta(THEME_COLOR_META) {
        meta.set_attribute("content", theme.theme_color());
    }
}

/// Resolves and applies the theme; returns what was applied.
pub fn init_theme(
    store: &dyn PreferenceStore,
    os: &dyn ColorSchemeQuery,
    document: &dyn Document,
) -> Theme {
    let theme = resolve_theme(store, os);
    apply_theme(document, theme);
    tracing::debug!(?theme, "theme applied");
    theme
}
