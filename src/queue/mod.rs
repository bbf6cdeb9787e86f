//! Tag Queue - in-process slot → artifact mapping
//!
//! Slots come in two namespaces:
//!
//! ```text
//! known   (named by the SlotSchema)  → kind implied by the schema
//! custom  (any other name)           → kind supplied by the caller
//! ```
//!
//! Both live in one map keyed by slot name, so a name can never be in both
//! namespaces. Saving again under the same name replaces the previous value.
//! Flushing reads the queue and never clears it.
//!
//! ## Usage
//!
//! ```rust
//! use trueno_tag::{ArtifactKind, SlotSchema, TagQueue};
//!
//! let mut queue = TagQueue::new(SlotSchema::default());
//!
//! // save() hands the value back, so tagging fits inline
//! let auc = queue.save(0.91_f64, "score", None)?;
//! let lr = queue.save(0.001_f64, "learning_rate", Some(ArtifactKind::Numeric))?;
//!
//! assert!((auc - 0.91).abs() < f64::EPSILON);
//! assert_eq!(queue.inspect().len(), SlotSchema::default().len() + 1);
//! # let _ = lr;
//! # Ok::<(), trueno_tag::Error>(())
//! ```

mod inspect;

pub use inspect::{Inspection, InspectionRow};

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::artifact::{Artifact, ArtifactKind};
use crate::flush::{FlushReport, Flusher};
use crate::schema::SlotSchema;
use crate::store::ObjectStore;
use crate::{Error, Result};

/// Namespace of a slot together with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOrigin {
    /// Declared by the schema
    Known(ArtifactKind),
    /// Declared by the caller at save time
    Custom(ArtifactKind),
}

impl SlotOrigin {
    /// Kind of the slot, whichever namespace it lives in.
    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        match self {
            Self::Known(kind) | Self::Custom(kind) => *kind,
        }
    }

    /// True for caller-declared slots.
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// Namespace label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Known(_) => "known",
            Self::Custom(_) => "custom",
        }
    }
}

/// A queued artifact and the namespace it was saved under.
#[derive(Debug, Clone)]
pub struct QueuedArtifact {
    artifact: Artifact,
    origin: SlotOrigin,
}

impl QueuedArtifact {
    /// The tagged value.
    #[must_use]
    pub const fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    /// Namespace and kind.
    #[must_use]
    pub const fn origin(&self) -> SlotOrigin {
        self.origin
    }
}

/// Queue of tagged artifacts for one experiment run.
///
/// `save` takes `&mut self`; a queue belongs to one run on one thread.
#[derive(Debug, Default)]
pub struct TagQueue {
    schema: SlotSchema,
    entries: HashMap<String, QueuedArtifact>,
    custom_order: Vec<String>,
}

impl TagQueue {
    /// Create an empty queue over `schema`.
    #[must_use]
    pub fn new(schema: SlotSchema) -> Self {
        Self {
            schema,
            entries: HashMap::new(),
            custom_order: Vec::new(),
        }
    }

    /// Tag `artifact` under `slot` and return it unchanged.
    ///
    /// For a known slot `kind` is ignored and the schema's kind applies. Any
    /// other slot is custom and requires `kind`. A repeated save replaces
    /// the previous value; a custom slot keeps its original position in the
    /// inspection order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTag`] for a custom slot saved without a kind.
    pub fn save<A>(&mut self, artifact: A, slot: &str, kind: Option<ArtifactKind>) -> Result<A>
    where
        A: Clone + Into<Artifact>,
    {
        let origin = match self.schema.kind_of(slot) {
            Some(configured) => SlotOrigin::Known(configured),
            None => SlotOrigin::Custom(kind.ok_or_else(|| Error::InvalidTag {
                slot: slot.to_string(),
            })?),
        };

        if let SlotOrigin::Custom(kind) = origin {
            match self.entries.get(slot) {
                None => self.custom_order.push(slot.to_string()),
                Some(previous) if previous.origin.kind() != kind => warn!(
                    slot,
                    previous = %previous.origin.kind(),
                    kind = %kind,
                    "custom slot re-saved under a different kind"
                ),
                Some(_) => {}
            }
        }

        let queued = QueuedArtifact {
            artifact: artifact.clone().into(),
            origin,
        };
        debug!(
            slot,
            namespace = origin.label(),
            kind = %origin.kind(),
            artifact = queued.artifact.variant_name(),
            "artifact tagged"
        );
        self.entries.insert(slot.to_string(), queued);

        Ok(artifact)
    }

    /// Known-slot mapping. Custom slots are only visible through
    /// [`inspect`](Self::inspect).
    #[must_use]
    pub fn ret_queue(&self) -> HashMap<&str, &Artifact> {
        self.entries
            .iter()
            .filter(|(_, queued)| !queued.origin.is_custom())
            .map(|(slot, queued)| (slot.as_str(), &queued.artifact))
            .collect()
    }

    /// Artifact saved under `slot`, in either namespace.
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<&Artifact> {
        self.entries.get(slot).map(QueuedArtifact::artifact)
    }

    /// Queued entry for `slot`.
    #[must_use]
    pub fn entry(&self, slot: &str) -> Option<&QueuedArtifact> {
        self.entries.get(slot)
    }

    /// Number of slots that hold a value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schema this queue was created with.
    #[must_use]
    pub const fn schema(&self) -> &SlotSchema {
        &self.schema
    }

    /// Custom slot names in first-save order.
    pub fn custom_slots(&self) -> impl Iterator<Item = &str> {
        self.custom_order.iter().map(String::as_str)
    }

    /// Flush the queue to `store` with the default [`FlushConfig`](crate::flush::FlushConfig).
    ///
    /// # Errors
    ///
    /// See [`Flusher::flush`].
    pub fn flush<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        project: &str,
        experiment: &str,
        tag: Option<&str>,
    ) -> Result<FlushReport> {
        Flusher::new(store).flush(self, project, experiment, tag)
    }
}
