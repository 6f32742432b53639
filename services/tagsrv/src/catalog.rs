//! Static tag catalog
//!
//! The tag table is built once at startup and never mutated. Catalog position
//! is the stable tag index: the current-value store and all poll results
//! correspond positionally.

use s7block::ResolvedAddress;
use tracing::warn;

/// One named, typed view onto a location inside a data block.
#[derive(Debug, Clone)]
pub struct TagDefinition {
    /// Unique key, matched case-insensitively
    pub name: String,
    /// Textual address, e.g. `DB1.DBW8`
    pub address: String,
    /// Display unit, may be empty
    pub unit: String,
    /// Engineering scale factor; <= 0 acts as 1.0
    pub scale: f64,
    /// Free-text description
    pub description: String,
}

impl TagDefinition {
    /// Resolve the textual address. Derived per call; the definition itself
    /// stays textual so the catalog has no partially-initialized state.
    pub fn resolve(&self) -> ResolvedAddress {
        ResolvedAddress::parse(&self.address)
    }
}

/// Immutable, ordered tag table.
#[derive(Debug, Clone, Default)]
pub struct TagCatalog {
    tags: Vec<TagDefinition>,
}

impl TagCatalog {
    /// Build a catalog from definitions. Unparseable addresses are kept (they
    /// poll as zero-width) but warned once here so misconfiguration shows up
    /// at startup rather than as silently stale values.
    pub fn new(tags: Vec<TagDefinition>) -> Self {
        for tag in &tags {
            if !tag.resolve().is_valid() {
                warn!(
                    tag = %tag.name,
                    address = %tag.address,
                    "tag address does not match the DB notation, tag will not be polled"
                );
            }
        }
        Self { tags }
    }

    /// Case-insensitive exact-match lookup. First match wins; duplicate names
    /// are a configuration concern, not checked here.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.tags
            .iter()
            .position(|tag| tag.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, index: usize) -> Option<&TagDefinition> {
        self.tags.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagDefinition> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
