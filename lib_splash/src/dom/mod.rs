//! # Document Abstraction
//!
//! The loading orchestrator and the theme resolver only ever touch a handful of
//! elements: a status-text node, the loading-screen container, the application
//! mount point, the document root and the `theme-color` meta tag. This module
//! describes that surface as two small traits so the orchestration logic can be
//! driven by a real host (a webview bridge, a wasm binding) or by the
//! in-memory [`MemoryDocument`] shipped here for the simulator and the tests.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// In-memory document with recorded element history.
pub mod memory;

pub use memory::{MemoryDocument, MemoryElement};

use std::sync::Arc;

/// A single element handle.
///
/// All methods take `&self`; implementations are expected to use interior
/// mutability since handles are shared between timer tasks.
pub trait Element: Send + Sync {
    /// The element id.
    fn id(&self) -> &str;
    /// Replaces the element's text content.
    fn set_text_content(&self, text: &str);
    /// Returns the current text content.
    fn text_content(&self) -> String;
    /// Toggles the reversible "hidden" visual state (opacity/visibility class).
    fn set_hidden(&self, hidden: bool);
    /// Detaches the element from its document. Further lookups by id miss.
    fn remove(&self);
    /// Number of child elements currently attached.
    fn child_element_count(&self) -> usize;
    /// Adds (`enabled = true`) or removes a CSS class.
    fn set_class(&self, class: &str, enabled: bool);
    /// Sets an attribute value.
    fn set_attribute(&self, name: &str, value: &str);
}

/// Element lookup.
pub trait Document: Send + Sync {
    /// Looks up an attached element by id.
    fn element_by_id(&self, id: &str) -> Option<Arc<dyn Element>>;
    /// The document root (`<html>`).
    fn document_element(&self) -> Arc<dyn Element>;
    /// Looks up `<meta name="...">`.
    fn meta(&self, name: &str) -> Option<Arc<dyn Element>>;
}
