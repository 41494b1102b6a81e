//! Node handles and node payloads for the arena document.

use std::fmt;

// =============================================================================
// Node Identity
// =============================================================================

/// Generational handle into the document arena.
///
/// A handle carries no ownership: holding one never keeps a node alive.
/// Once a node is released its slot generation is bumped, so stale handles
/// stop resolving instead of aliasing whatever reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Pack into a single integer for hosts that cannot hold the struct.
    #[inline]
    pub const fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    /// Inverse of [`NodeId::to_bits`]. The result may be stale.
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self::new(bits as u32, (bits >> 32) as u32)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

// =============================================================================
// Namespaces
// =============================================================================

/// Element namespace. Foreign content (SVG, MathML) is walked like any
/// other element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    /// Map a namespace URI to a known namespace. Unknown URIs are HTML.
    pub fn from_uri(uri: &str) -> Self {
        match uri {
            "http://www.w3.org/2000/svg" => Self::Svg,
            "http://www.w3.org/1998/Math/MathML" => Self::MathMl,
            _ => Self::Html,
        }
    }
}

// =============================================================================
// Elements
// =============================================================================

/// Element payload: lowercase local name, namespace and ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    namespace: Namespace,
    attrs: Vec<(String, String)>,
    /// Content from another browsing context; introspection through the
    /// document fails with `DomError::CrossOrigin`.
    pub(crate) cross_origin: bool,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self::with_namespace(name, Namespace::Html)
    }

    pub fn with_namespace(name: &str, namespace: Namespace) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            namespace,
            attrs: Vec::new(),
            cross_origin: false,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    #[inline]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let joined = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr("class", joined);
    }

    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let kept: Vec<&str> = self.classes().filter(|c| *c != class).collect();
        let joined = kept.join(" ");
        self.set_attr("class", joined);
    }
}

// =============================================================================
// Node Data
// =============================================================================

/// Payload of a node in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The document root. Exactly one per arena.
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

impl NodeData {
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }
}
