//! Slot schema - the known slots and their expected kinds
//!
//! A schema is an immutable, ordered list of `(name, kind)` pairs handed to a
//! [`TagQueue`](crate::queue::TagQueue) at construction. Its order is the
//! order of the known rows in the inspection view.
//!
//! ## Loading from JSON
//!
//! ```rust
//! use trueno_tag::{ArtifactKind, SlotSchema};
//!
//! let schema = SlotSchema::from_json_str(r#"{
//!     "slots": [
//!         { "name": "train", "kind": "dataframe" },
//!         { "name": "auc",   "kind": "float" }
//!     ]
//! }"#)?;
//!
//! assert_eq!(schema.kind_of("train"), Some(ArtifactKind::Tabular));
//! assert_eq!(schema.kind_of("auc"), Some(ArtifactKind::Numeric));
//! # Ok::<(), trueno_tag::Error>(())
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactKind;
use crate::{Error, Result};

/// One known slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpec {
    name: String,
    kind: ArtifactKind,
}

impl SlotSpec {
    /// Create a slot spec.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Slot name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expected kind.
    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        self.kind
    }
}

/// Ordered set of known slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSchema {
    slots: Vec<SlotSpec>,
}

#[derive(Deserialize)]
struct SchemaFile {
    slots: Vec<SlotSpec>,
}

impl SlotSchema {
    /// Build a schema from slot specs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on an empty or duplicate slot name.
    pub fn new(slots: Vec<SlotSpec>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(slots.len());
        for slot in &slots {
            if slot.name.is_empty() {
                return Err(Error::Config("slot names must not be empty".to_string()));
            }
            if !seen.insert(slot.name.as_str()) {
                return Err(Error::Config(format!("duplicate slot name '{}'", slot.name)));
            }
        }
        Ok(Self { slots })
    }

    /// Schema with no known slots; every save is then a custom save.
    #[must_use]
    pub const fn empty() -> Self {
        Self { slots: Vec::new() }
    }

    /// Start building a schema.
    #[must_use]
    pub fn builder() -> SlotSchemaBuilder {
        SlotSchemaBuilder::default()
    }

    /// Parse a schema from `{"slots": [{"name": ..., "kind": ...}, ...]}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] on malformed JSON and [`Error::Config`] on
    /// invalid slot names.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: SchemaFile = serde_json::from_str(json)?;
        Self::new(file.slots)
    }

    /// Read and parse a schema file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Number of known slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when there are no known slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Known slots in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &SlotSpec> {
        self.slots.iter()
    }

    /// Configured kind of a known slot.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<ArtifactKind> {
        self.slots.iter().find(|s| s.name == name).map(SlotSpec::kind)
    }

    /// Whether `name` is a known slot.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.kind_of(name).is_some()
    }
}

impl Default for SlotSchema {
    /// Standard experiment slots.
    fn default() -> Self {
        Self {
            slots: vec![
                SlotSpec::new("train", ArtifactKind::Tabular),
                SlotSpec::new("test", ArtifactKind::Tabular),
                SlotSpec::new("features", ArtifactKind::Tabular),
                SlotSpec::new("predictions", ArtifactKind::Tabular),
                SlotSpec::new("model", ArtifactKind::Model),
                SlotSpec::new("score", ArtifactKind::Numeric),
                SlotSpec::new("notes", ArtifactKind::Text),
            ],
        }
    }
}

/// Builder for `SlotSchema`.
#[derive(Debug, Default)]
pub struct SlotSchemaBuilder {
    slots: Vec<SlotSpec>,
}

impl SlotSchemaBuilder {
    /// Append a known slot.
    #[must_use]
    pub fn slot(mut self, name: impl Into<String>, kind: ArtifactKind) -> Self {
        self.slots.push(SlotSpec::new(name, kind));
        self
    }

    /// Build the `SlotSchema`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on an empty or duplicate slot name.
    pub fn build(self) -> Result<SlotSchema> {
        SlotSchema::new(self.slots)
    }
}
