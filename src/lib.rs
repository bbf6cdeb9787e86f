//! # trueno-tag: Declarative Artifact Tagging for Experiment Tracking
//!
//! **Version**: 0.1.0
//!
//! Tag in-memory values (tables, metrics, models, plots) against named slots
//! while an experiment runs, then flush them to an object store as one batch
//! together with a JSON summary of column dtypes, descriptive statistics and
//! scalar values.
//!
//! ## Components
//!
//! ```text
//! TagQueue ──inspect()──▶ Inspection ──▶ Flusher ──put()──▶ ObjectStore
//!    ▲                                      │
//! SlotSchema                          SummaryDocument
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::{Float64Array, Int64Array, RecordBatch};
//! use arrow::datatypes::{DataType, Field, Schema};
//! use trueno_tag::store::MemoryObjectStore;
//! use trueno_tag::{ArtifactKind, SlotSchema, TagQueue};
//!
//! let schema = SlotSchema::builder()
//!     .slot("df", ArtifactKind::Tabular)
//!     .build()?;
//! let mut queue = TagQueue::new(schema);
//!
//! let df = RecordBatch::try_new(
//!     Arc::new(Schema::new(vec![
//!         Field::new("a", DataType::Int64, false),
//!         Field::new("b", DataType::Float64, false),
//!     ])),
//!     vec![
//!         Arc::new(Int64Array::from(vec![1, 2])),
//!         Arc::new(Float64Array::from(vec![0.5, 1.5])),
//!     ],
//! )?;
//!
//! let df = queue.save(df, "df", None)?;
//! queue.save(0.87_f64, "score", Some(ArtifactKind::Numeric))?;
//!
//! let store = MemoryObjectStore::new();
//! let report = queue.flush(&store, "p", "e", Some("t1"))?;
//!
//! assert_eq!(report.written(), ["e/t1/df.csv", "e/t1/summary.json"]);
//! assert_eq!(report.summary()["scalars"]["score"], 0.87);
//! # let _ = df;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod artifact;
pub mod error;
pub mod flush;
pub mod model;
pub mod queue;
pub mod schema;
pub mod store;

pub use artifact::{Artifact, ArtifactKind, ScalarValue};
pub use error::{Error, Result};
pub use flush::{FlushConfig, FlushReport, Flusher, TabularFormat};
pub use model::{BincodeModel, ModelArtifact};
pub use queue::{Inspection, InspectionRow, SlotOrigin, TagQueue};
pub use schema::{SlotSchema, SlotSpec};
