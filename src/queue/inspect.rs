//! Inspection view over a tag queue
//!
//! Rows are ordered: every known slot in schema order (absent when unset),
//! then custom slots in first-save order. Row count is always
//! `schema.len() + distinct custom slots`.

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use super::{SlotOrigin, TagQueue};
use crate::artifact::{Artifact, ArtifactKind};
use crate::Result;

/// One row of the inspection view.
#[derive(Debug, Clone, Copy)]
pub struct InspectionRow<'a> {
    slot: &'a str,
    artifact: Option<&'a Artifact>,
    origin: SlotOrigin,
}

impl<'a> InspectionRow<'a> {
    /// Slot name (the row index).
    #[must_use]
    pub const fn slot(&self) -> &'a str {
        self.slot
    }

    /// Tagged value, `None` for an unset known slot.
    #[must_use]
    pub const fn artifact(&self) -> Option<&'a Artifact> {
        self.artifact
    }

    /// Configured or declared kind.
    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        self.origin.kind()
    }

    /// Namespace and kind.
    #[must_use]
    pub const fn origin(&self) -> SlotOrigin {
        self.origin
    }

    /// True for an unset known slot.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        self.artifact.is_none()
    }
}

/// Ordered inspection table borrowed from a [`TagQueue`].
#[derive(Debug, Clone)]
pub struct Inspection<'a> {
    rows: Vec<InspectionRow<'a>>,
}

impl<'a> Inspection<'a> {
    /// All rows in order.
    #[must_use]
    pub fn rows(&self) -> &[InspectionRow<'a>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the schema is empty and no custom slot was saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Slot names in row order.
    #[must_use]
    pub fn index(&self) -> Vec<&'a str> {
        self.rows.iter().map(InspectionRow::slot).collect()
    }

    /// Row for `slot`.
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<&InspectionRow<'a>> {
        self.rows.iter().find(|row| row.slot == slot)
    }

    /// Rows of one kind, absent rows included.
    pub fn of_kind(&self, kind: ArtifactKind) -> impl Iterator<Item = &InspectionRow<'a>> {
        self.rows.iter().filter(move |row| row.kind() == kind)
    }

    /// Render as an Arrow table with columns `slot`, `artifact`, `kind`,
    /// `origin`. Absent artifacts are nulls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Arrow`](crate::Error::Arrow) if the batch cannot be assembled.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("slot", DataType::Utf8, false),
            Field::new("artifact", DataType::Utf8, true),
            Field::new("kind", DataType::Utf8, false),
            Field::new("origin", DataType::Utf8, false),
        ]));

        let slots = StringArray::from_iter_values(self.rows.iter().map(|r| r.slot));
        let artifacts: StringArray = self
            .rows
            .iter()
            .map(|r| r.artifact.map(Artifact::preview))
            .collect();
        let kinds = StringArray::from_iter_values(self.rows.iter().map(|r| r.kind().as_str()));
        let origins = StringArray::from_iter_values(self.rows.iter().map(|r| r.origin.label()));

        let columns: Vec<ArrayRef> = vec![
            Arc::new(slots),
            Arc::new(artifacts),
            Arc::new(kinds),
            Arc::new(origins),
        ];
        Ok(RecordBatch::try_new(schema, columns)?)
    }
}

impl TagQueue {
    /// Build the inspection view. Pure; the queue is not modified.
    #[must_use]
    pub fn inspect(&self) -> Inspection<'_> {
        let known = self.schema.iter().map(|spec| InspectionRow {
            slot: spec.name(),
            artifact: self
                .entries
                .get(spec.name())
                .map(super::QueuedArtifact::artifact),
            origin: SlotOrigin::Known(spec.kind()),
        });

        let custom = self.custom_order.iter().filter_map(|slot| {
            self.entries.get(slot).map(|queued| InspectionRow {
                slot: slot.as_str(),
                artifact: Some(&queued.artifact),
                origin: queued.origin,
            })
        });

        Inspection {
            rows: known.chain(custom).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SlotSchema;
    use arrow::array::Array;

    fn queue() -> TagQueue {
        let schema = SlotSchema::builder()
            .slot("train", ArtifactKind::Tabular)
            .slot("model", ArtifactKind::Model)
            .slot("score", ArtifactKind::Numeric)
            .build()
            .unwrap();
        TagQueue::new(schema)
    }

    #[test]
    fn test_unset_known_slots_are_absent() {
        let q = queue();
        let view = q.inspect();

        assert_eq!(view.len(), 3);
        assert_eq!(view.index(), vec!["train", "model", "score"]);
        assert!(view.rows().iter().all(InspectionRow::is_absent));
    }

    #[test]
    fn test_custom_rows_follow_known_rows() {
        let mut q = queue();
        q.save(0.3f64, "dropout", Some(ArtifactKind::Numeric)).unwrap();
        q.save(0.8f64, "score", None).unwrap();
        q.save("adam", "optimizer", Some(ArtifactKind::Text)).unwrap();

        let view = q.inspect();
        assert_eq!(
            view.index(),
            vec!["train", "model", "score", "dropout", "optimizer"]
        );
        assert!(!view.get("score").unwrap().is_absent());
        assert_eq!(view.get("optimizer").unwrap().kind(), ArtifactKind::Text);
        assert!(view.get("dropout").unwrap().origin().is_custom());
    }

    #[test]
    fn test_inspect_is_repeatable() {
        let mut q = queue();
        q.save(1i32, "epochs", Some(ArtifactKind::Numeric)).unwrap();

        let first = q.inspect().index();
        let second = q.inspect().index();
        assert_eq!(first, second);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_of_kind_filters() {
        let mut q = queue();
        q.save(1i32, "epochs", Some(ArtifactKind::Numeric)).unwrap();

        let view = q.inspect();
        let numeric: Vec<&str> = view.of_kind(ArtifactKind::Numeric).map(InspectionRow::slot).collect();
        assert_eq!(numeric, vec!["score", "epochs"]);
    }

    #[test]
    fn test_to_record_batch() {
        let mut q = queue();
        q.save(0.9f64, "score", None).unwrap();

        let batch = q.inspect().to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 4);

        let artifacts = batch.column(1);
        assert!(artifacts.is_null(0));
        assert!(artifacts.is_null(1));
        assert!(!artifacts.is_null(2));
    }
}
