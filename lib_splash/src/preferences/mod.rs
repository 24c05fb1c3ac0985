//! User preferences resolved during page bootstrap.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Light/dark theme resolution.
pub mod theme;

pub use theme::{init_theme, resolve_theme, ColorSchemeQuery, PreferenceStore, Theme};
