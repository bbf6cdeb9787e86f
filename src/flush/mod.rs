//! Flusher - pushes a tag queue to an object store as one batch
//!
//! ## Object layout
//!
//! ```text
//! <project>/                      (bucket)
//!   <experiment>/<tag>/
//!     <slot>.csv                  tabular   (or <slot>.parquet)
//!     summary.json                types + stats + scalars
//!     <slot>.pkl                  model
//!     <slot>.bin                  visualization / other
//! ```
//!
//! Writes happen in that order. Each write is independent: the first error
//! aborts the flush and objects already written stay on the store. Re-running
//! the flush with the same tag overwrites them.

pub mod metadata;

use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::arrow::ArrowWriter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use self::metadata::{column_types, describe, SummaryDocument};
use crate::artifact::{Artifact, ArtifactKind};
use crate::queue::{InspectionRow, TagQueue};
use crate::store::ObjectStore;
use crate::{Error, Result};

/// Object name of the summary document.
pub const SUMMARY_OBJECT: &str = "summary.json";

/// Content type of the summary document.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type of model and opaque blobs.
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Extension of model objects.
pub const MODEL_EXTENSION: &str = "pkl";

/// Extension of visualization/other objects.
pub const BLOB_EXTENSION: &str = "bin";

/// On-store encoding of tabular artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabularFormat {
    /// Header row + values, no index column
    #[default]
    Csv,
    /// Parquet file, for larger tables
    Parquet,
}

impl TabularFormat {
    /// File extension
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }

    /// MIME content type
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Parquet => "application/vnd.apache.parquet",
        }
    }

    /// Encode a table in this format
    ///
    /// # Errors
    /// Returns [`Error::Serialization`] for either format if a column type
    /// is not representable in it (e.g. nested lists in CSV)
    pub fn encode(&self, batch: &RecordBatch) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        match self {
            Self::Csv => {
                let mut writer = WriterBuilder::new().with_header(true).build(&mut buf);
                writer
                    .write(batch)
                    .map_err(|e| Error::Serialization(format!("CSV write: {e}")))?;
            }
            Self::Parquet => {
                let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), None)
                    .map_err(|e| Error::Serialization(format!("Parquet writer: {e}")))?;
                writer
                    .write(batch)
                    .map_err(|e| Error::Serialization(format!("Parquet write: {e}")))?;
                writer
                    .close()
                    .map_err(|e| Error::Serialization(format!("Parquet close: {e}")))?;
            }
        }
        Ok(buf)
    }
}

/// Flush behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushConfig {
    tabular_format: TabularFormat,
    write_opaque_blobs: bool,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            tabular_format: TabularFormat::Csv,
            write_opaque_blobs: true,
        }
    }
}

impl FlushConfig {
    /// Set the tabular encoding
    #[must_use]
    pub const fn with_tabular_format(mut self, format: TabularFormat) -> Self {
        self.tabular_format = format;
        self
    }

    /// Write visualization/other rows as `<slot>.bin` (default) or skip them
    #[must_use]
    pub const fn with_opaque_blobs(mut self, enabled: bool) -> Self {
        self.write_opaque_blobs = enabled;
        self
    }

    /// Tabular encoding
    #[must_use]
    pub const fn tabular_format(&self) -> TabularFormat {
        self.tabular_format
    }

    /// Whether opaque blobs are written
    #[must_use]
    pub const fn write_opaque_blobs(&self) -> bool {
        self.write_opaque_blobs
    }
}

/// Outcome of a successful flush.
#[derive(Debug, Clone)]
pub struct FlushReport {
    tag: String,
    written: Vec<String>,
    summary: serde_json::Value,
}

impl FlushReport {
    /// Tag used for the object paths
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Object keys in write order
    #[must_use]
    pub fn written(&self) -> &[String] {
        &self.written
    }

    /// The summary document as written
    #[must_use]
    pub const fn summary(&self) -> &serde_json::Value {
        &self.summary
    }
}

/// Render the default tag for a flush started at `now`.
#[must_use]
pub fn default_tag(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// `experiment/tag/file`
#[must_use]
pub fn object_key(experiment: &str, tag: &str, file: &str) -> String {
    format!("{experiment}/{tag}/{file}")
}

/// Batch writer from a [`TagQueue`] to an [`ObjectStore`].
///
/// # Example
///
/// ```rust
/// use trueno_tag::flush::{FlushConfig, Flusher, TabularFormat};
/// use trueno_tag::store::MemoryObjectStore;
/// use trueno_tag::{ArtifactKind, SlotSchema, TagQueue};
///
/// let mut queue = TagQueue::new(SlotSchema::empty());
/// queue.save(0.87_f64, "score", Some(ArtifactKind::Numeric))?;
///
/// let store = MemoryObjectStore::new();
/// let report = Flusher::new(&store)
///     .with_config(FlushConfig::default().with_tabular_format(TabularFormat::Parquet))
///     .flush(&queue, "proj", "exp", Some("t1"))?;
///
/// assert_eq!(report.written(), ["exp/t1/summary.json"]);
/// assert_eq!(report.summary()["scalars"]["score"], 0.87);
/// # Ok::<(), trueno_tag::Error>(())
/// ```
#[derive(Debug)]
pub struct Flusher<'s, S: ObjectStore + ?Sized> {
    store: &'s S,
    config: FlushConfig,
}

impl<'s, S: ObjectStore + ?Sized> Flusher<'s, S> {
    /// Flusher with the default configuration
    #[must_use]
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            config: FlushConfig::default(),
        }
    }

    /// Replace the configuration
    #[must_use]
    pub const fn with_config(mut self, config: FlushConfig) -> Self {
        self.config = config;
        self
    }

    /// Push every queued artifact plus the summary document.
    ///
    /// An empty or missing `tag` is replaced by the current UTC timestamp.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while encoding or writing; earlier
    /// writes are not rolled back.
    /// - [`Error::KindMismatch`] if an artifact does not fit its slot kind
    /// - [`Error::Serialization`] if a table or model cannot be encoded
    /// - [`Error::Arrow`] if statistics cannot be computed for a table
    /// - [`Error::Store`] if the object store rejects a write
    pub fn flush(
        &self,
        queue: &TagQueue,
        project: &str,
        experiment: &str,
        tag: Option<&str>,
    ) -> Result<FlushReport> {
        let tag = match tag {
            Some(tag) if !tag.is_empty() => tag.to_string(),
            _ => {
                let tag = default_tag(Utc::now());
                info!(%tag, "no tag supplied, using UTC timestamp");
                tag
            }
        };

        let inspection = queue.inspect();
        let mut batch = Batch {
            store: self.store,
            project,
            experiment,
            tag: &tag,
            written: Vec::new(),
        };

        for row in inspection.rows().iter().filter(|r| r.is_absent()) {
            debug!(slot = row.slot(), kind = %row.kind(), "slot not set, skipping");
        }

        let mut summary = SummaryDocument::default();
        let format = self.config.tabular_format;
        for (row, artifact) in present(inspection.of_kind(ArtifactKind::Tabular)) {
            let table = artifact.as_tabular().ok_or_else(|| mismatch(row, artifact))?;
            summary.types.insert(row.slot().to_string(), column_types(table));
            summary.stats.insert(row.slot().to_string(), describe(table)?);

            let file = format!("{}.{}", row.slot(), format.extension());
            batch.put(&file, format.encode(table)?, format.content_type())?;
        }

        for (row, artifact) in present(inspection.rows().iter().filter(|r| r.kind().is_scalar())) {
            let value = artifact.as_scalar().ok_or_else(|| mismatch(row, artifact))?;
            summary.scalars.insert(row.slot().to_string(), value.clone());
        }

        let document = summary.to_json();
        batch.put(SUMMARY_OBJECT, serde_json::to_vec(&document)?, JSON_CONTENT_TYPE)?;

        for (row, artifact) in present(inspection.of_kind(ArtifactKind::Model)) {
            let body = match artifact {
                Artifact::Model(model) => model.encode()?,
                Artifact::Binary(bytes) => bytes.clone(),
                _ => return Err(mismatch(row, artifact)),
            };
            let file = format!("{}.{MODEL_EXTENSION}", row.slot());
            batch.put(&file, body, BINARY_CONTENT_TYPE)?;
        }

        let opaque = inspection.rows().iter().filter(|r| r.kind().is_opaque());
        for (row, artifact) in present(opaque) {
            if !self.config.write_opaque_blobs {
                debug!(slot = row.slot(), kind = %row.kind(), "opaque blobs disabled, skipping");
                continue;
            }
            let body = match artifact {
                Artifact::Binary(bytes) => bytes.clone(),
                Artifact::Model(model) => model.encode()?,
                _ => return Err(mismatch(row, artifact)),
            };
            let file = format!("{}.{BLOB_EXTENSION}", row.slot());
            batch.put(&file, body, BINARY_CONTENT_TYPE)?;
        }

        info!(
            project,
            experiment,
            %tag,
            objects = batch.written.len(),
            "flush complete"
        );

        Ok(FlushReport {
            written: batch.written,
            tag,
            summary: document,
        })
    }
}

/// Writes sharing one `(project, experiment, tag)` prefix.
struct Batch<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    project: &'a str,
    experiment: &'a str,
    tag: &'a str,
    written: Vec<String>,
}

impl<S: ObjectStore + ?Sized> Batch<'_, S> {
    fn put(&mut self, file: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        let key = object_key(self.experiment, self.tag, file);
        let bytes = body.len();
        self.store.put(self.project, &key, body, content_type)?;
        debug!(bucket = self.project, %key, bytes, content_type, "object written");
        self.written.push(key);
        Ok(())
    }
}

fn present<'r, 'a: 'r>(
    rows: impl Iterator<Item = &'r InspectionRow<'a>>,
) -> impl Iterator<Item = (&'r InspectionRow<'a>, &'a Artifact)> {
    rows.filter_map(|row| row.artifact().map(|artifact| (row, artifact)))
}

fn mismatch(row: &InspectionRow<'_>, artifact: &Artifact) -> Error {
    Error::KindMismatch {
        slot: row.slot().to_string(),
        kind: row.kind().to_string(),
        found: artifact.variant_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;
    use chrono::TimeZone;
    use std::sync::Arc;

    #[test]
    fn test_default_tag_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(default_tag(now), "2024-03-09 14:05:07.000000");
    }

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("e", "t1", "df.csv"), "e/t1/df.csv");
    }

    #[test]
    fn test_tabular_format_metadata() {
        assert_eq!(TabularFormat::default(), TabularFormat::Csv);
        assert_eq!(TabularFormat::Csv.extension(), "csv");
        assert_eq!(TabularFormat::Parquet.extension(), "parquet");
        assert_eq!(TabularFormat::Csv.content_type(), "text/csv");
    }

    #[test]
    fn test_flush_config_builder() {
        let config = FlushConfig::default()
            .with_tabular_format(TabularFormat::Parquet)
            .with_opaque_blobs(false);
        assert_eq!(config.tabular_format(), TabularFormat::Parquet);
        assert!(!config.write_opaque_blobs());
        assert!(FlushConfig::default().write_opaque_blobs());
    }

    #[test]
    fn test_empty_tag_uses_timestamp() {
        let queue = TagQueue::new(crate::SlotSchema::empty());
        let store = MemoryObjectStore::new();

        let report = queue.flush(&store, "p", "e", Some("")).unwrap();
        assert!(!report.tag().is_empty());
        assert_eq!(report.written(), [format!("e/{}/summary.json", report.tag())]);
    }

    #[test]
    fn test_scalar_under_tabular_slot_is_mismatch() {
        let schema = crate::SlotSchema::builder()
            .slot("df", ArtifactKind::Tabular)
            .build()
            .unwrap();
        let mut queue = TagQueue::new(schema);
        queue.save(1i64, "df", None).unwrap();

        let store = MemoryObjectStore::new();
        let err = queue.flush(&store, "p", "e", Some("t")).unwrap_err();
        assert!(matches!(err, Error::KindMismatch { ref slot, .. } if slot == "df"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_csv_rejects_nested_columns() {
        use arrow::array::{ArrayRef, ListArray};
        use arrow::datatypes::Int32Type;

        let lists = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![Some(vec![Some(1)])]);
        let batch = RecordBatch::try_from_iter(vec![("xs", Arc::new(lists) as ArrayRef)]).unwrap();

        let err = TabularFormat::Csv.encode(&batch).unwrap_err();
        assert!(matches!(err, Error::Serialization(ref msg) if msg.starts_with("CSV write")));
    }

    #[test]
    fn test_pre_encoded_model_bytes_written_as_is() {
        let mut queue = TagQueue::default();
        queue.save(vec![1u8, 2, 3], "model", None).unwrap();

        let store = MemoryObjectStore::new();
        let report = queue.flush(&store, "p", "e", Some("t")).unwrap();

        assert_eq!(report.written(), ["e/t/summary.json", "e/t/model.pkl"]);
        let object = store.get("p", "e/t/model.pkl").unwrap().unwrap();
        assert_eq!(object.body, vec![1u8, 2, 3]);
        assert_eq!(object.content_type, BINARY_CONTENT_TYPE);
    }

    #[test]
    fn test_opaque_blobs_can_be_disabled() {
        let mut queue = TagQueue::new(crate::SlotSchema::empty());
        queue.save(vec![0x89u8, b'P', b'N', b'G'], "roc", Some(ArtifactKind::Visualization)).unwrap();

        let store = MemoryObjectStore::new();
        let report = Flusher::new(&store)
            .with_config(FlushConfig::default().with_opaque_blobs(false))
            .flush(&queue, "p", "e", Some("t"))
            .unwrap();
        assert_eq!(report.written(), ["e/t/summary.json"]);
    }
}
