//! In-memory [`Document`] used by the simulator binary and the test-suite.
//!
//! Each [`MemoryElement`] keeps a timestamped history of what was done to it
//! (text writes, hide, removal, mount-point queries) so timing behaviour can be
//! asserted after the fact.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use super::{Document, Element};

/// Everything observed on one element.
#[derive(Debug, Clone, Default)]
pub struct ElementRecord {
    /// Current text content.
    pub text: String,
    /// Every text write, oldest first.
    pub text_history: Vec<(Instant, String)>,
    /// Current hidden state.
    pub hidden: bool,
    /// When the element was first hidden.
    pub hidden_at: Option<Instant>,
    /// When the element was removed.
    pub removed_at: Option<Instant>,
    /// How many times `remove` was called.
    pub remove_calls: usize,
    /// Attached child count.
    pub children: usize,
    /// How many times the child count was queried.
    pub child_queries: usize,
    /// Active CSS classes.
    pub classes: BTreeSet<String>,
    /// Attribute values.
    pub attributes: BTreeMap<String, String>,
}

/// An element living in a [`MemoryDocument`].
#[derive(Debug)]
pub struct MemoryElement {
    id: String,
    record: Mutex<ElementRecord>,
}

impl MemoryElement {
    /// Creates a detached element with the given id and initial text.
    pub fn new(id: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            record: Mutex::new(ElementRecord {
                text: text.to_string(),
                ..ElementRecord::default()
            }),
        }
    }

    fn record(&self) -> MutexGuard<'_, ElementRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulates the application rendering one more child into this element.
    pub fn append_child(&self) {
        self.record().children += 1;
    }

    /// A copy of everything recorded so far.
    pub fn snapshot(&self) -> ElementRecord {
        self.record().clone()
    }

    /// Texts written so far, without timestamps.
    pub fn texts(&self) -> Vec<String> {
        self.record()
            .text_history
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Whether the element has been removed.
    pub fn is_removed(&self) -> bool {
        self.record().removed_at.is_some()
    }

    /// Whether the element carries `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.record().classes.contains(class)
    }

    /// Attribute value, if set.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.record().attributes.get(name).cloned()
    }
}

impl Element for MemoryElement {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_text_content(&self, text: &str) {
        let mut record = self.record();
        record.text = text.to_string();
        record.text_history.push((Instant::now(), text.to_string()));
    }

    fn text_content(&self) -> String {
        self.record().text.clone()
    }

    fn set_hidden(&self, hidden: bool) {
        let mut record = self.record();
        record.hidden = hidden;
        if hidden && record.hidden_at.is_none() {
            record.hidden_at = Some(Instant::now());
        }
    }

    fn remove(&self) {
        let mut record = self.record();
        record.remove_calls += 1;
        if record.removed_at.is_none() {
            record.removed_at = Some(Instant::now());
        }
    }

    fn child_element_count(&self) -> usize {
        let mut record = self.record();
        record.child_queries += 1;
        record.children
    }

    fn set_class(&self, class: &str, enabled: bool) {
        let mut record = self.record();
        if enabled {
            record.classes.insert(class.to_string());
        } else {
            record.classes.remove(class);
        }
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.record()
            .attributes
            .insert(name.to_string(), value.to_string());
    }
}

/// A flat id → element map plus a root element and named meta tags.
#[derive(Debug)]
pub struct MemoryDocument {
    root: Arc<MemoryElement>,
    elements: Mutex<HashMap<String, Arc<MemoryElement>>>,
    metas: Mutex<HashMap<String, Arc<MemoryElement>>>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// An empty document with only the `<html>` root.
    pub fn new() -> Self {
        Self {
            root: Arc::new(MemoryElement::new("html", "")),
            elements: Mutex::new(HashMap::new()),
            metas: Mutex::new(HashMap::new()),
        }
    }

    /// Inserts (or replaces) an element and returns its concrete handle.
    pub fn insert(&self, id: &str, text: &str) -> Arc<MemoryElement> {
        let element = Arc::new(MemoryElement::new(id, text));
        self.elements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), Arc::clone(&element));
        element
    }

    /// Inserts a `<meta name=...>` tag.
    pub fn insert_meta(&self, name: &str, content: &str) -> Arc<MemoryElement> {
        let meta = Arc::new(MemoryElement::new(name, ""));
        meta.set_attribute("content", content);
        self.metas
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&meta));
        meta
    }

    /// Concrete handle for an element, even if it has been removed.
    pub fn memory_element(&self, id: &str) -> Option<Arc<MemoryElement>> {
        self.elements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Concrete handle for the `<html>` root.
    pub fn root(&self) -> Arc<MemoryElement> {
        Arc::clone(&self.root)
    }
}

impl Document for MemoryDocument {
    fn element_by_id(&self, id: &str) -> Option<Arc<dyn Element>> {
        self.memory_element(id)
            .filter(|element| !element.is_removed())
            .map(|element| element as Arc<dyn Element>)
    }

    fn document_element(&self) -> Arc<dyn Element> {
        self.root() as Arc<dyn Element>
    }

    fn meta(&self, name: &str) -> Option<Arc<dyn Element>> {
        self.metas
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .map(|meta| meta as Arc<dyn Element>)
    }
}
