//! Address-bar handling at page load.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// `?redirect=` rewrite for statically hosted single-page apps.
pub mod redirect;

pub use redirect::{rewrite_spa_redirect, History};
