//! Artifacts and their kinds
//!
//! An [`Artifact`] is the in-memory value a caller tags against a slot. Its
//! [`ArtifactKind`] decides how the flusher treats it:
//!
//! | Kind            | Flushed as                         | Summary document      |
//! |-----------------|------------------------------------|-----------------------|
//! | `Tabular`       | `slot.csv` (or `slot.parquet`)     | `types` + `stats`     |
//! | `Numeric`/`Text`| nothing                            | `scalars`             |
//! | `Model`         | `slot.pkl`                         | nothing               |
//! | `Visualization` | `slot.bin`                         | nothing               |
//! | `Other`         | `slot.bin`                         | nothing               |

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::model::{BincodeModel, ModelArtifact};
use crate::Error;

/// Classification of an artifact.
///
/// Deserializes through [`FromStr`], so schema files accept the same
/// case-insensitive aliases as `"DataFrame".parse()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ArtifactKind {
    /// Dataframe-like table
    Tabular,
    /// Integer or floating point scalar
    Numeric,
    /// String scalar
    Text,
    /// Trained model, pushed as an encoded blob
    Model,
    /// Plot or image bytes
    Visualization,
    /// Anything else, pushed as an opaque blob
    Other,
}

impl ArtifactKind {
    /// Canonical lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tabular => "tabular",
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Model => "model",
            Self::Visualization => "visualization",
            Self::Other => "other",
        }
    }

    /// Scalars are embedded in the summary document instead of being written.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Numeric | Self::Text)
    }

    /// Kinds flushed as raw bytes without metadata.
    #[must_use]
    pub const fn is_opaque(&self) -> bool {
        matches!(self, Self::Visualization | Self::Other)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tabular" | "dataframe" | "df" => Ok(Self::Tabular),
            "numeric" | "int" | "float" => Ok(Self::Numeric),
            "text" | "string" | "str" => Ok(Self::Text),
            "model" => Ok(Self::Model),
            "visualization" | "viz" => Ok(Self::Visualization),
            "other" => Ok(Self::Other),
            _ => Err(Error::UnknownKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for ArtifactKind {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Scalar value as produced by the caller or the statistics engine.
///
/// Platform-width variants are kept as-is until the summary document is
/// normalized; see [`ScalarValue::to_json`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// Missing value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer (any width)
    Int(i64),
    /// Unsigned integer (any width)
    UInt(u64),
    /// Single precision float
    Float32(f32),
    /// Double precision float
    Float64(f64),
    /// String
    Text(String),
}

impl ScalarValue {
    /// Normalize to the nearest standard JSON value.
    ///
    /// Integers stay integers. `f32` is widened through its shortest decimal
    /// representation so `0.87f32` becomes `0.87`, not `0.8700000047683716`.
    /// NaN becomes `null`; infinities become the strings `"Infinity"` and
    /// `"-Infinity"`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::UInt(u) => Value::from(*u),
            Self::Float32(f) => {
                if f.is_finite() {
                    let widened = f.to_string().parse::<f64>().unwrap_or_else(|_| f64::from(*f));
                    float_to_json(widened)
                } else {
                    float_to_json(f64::from(*f))
                }
            }
            Self::Float64(f) => float_to_json(*f),
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    /// Variant name for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int64",
            Self::UInt(_) => "uint64",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::Text(_) => "string",
        }
    }
}

fn float_to_json(f: f64) -> serde_json::Value {
    if f.is_nan() {
        serde_json::Value::Null
    } else if f.is_infinite() {
        let label = if f.is_sign_positive() { "Infinity" } else { "-Infinity" };
        serde_json::Value::String(label.to_string())
    } else {
        serde_json::Number::from_f64(f).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float32(x) => write!(f, "{x}"),
            Self::Float64(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! scalar_from {
    ($variant:ident, $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for ScalarValue {
                fn from(value: $source) -> Self {
                    Self::$variant(<$target>::from(value))
                }
            }

            impl From<$source> for Artifact {
                fn from(value: $source) -> Self {
                    Self::Scalar(ScalarValue::from(value))
                }
            }
        )+
    };
}

scalar_from!(Int, i64: i8, i16, i32, i64);
scalar_from!(UInt, u64: u8, u16, u32, u64);
scalar_from!(Float32, f32: f32);
scalar_from!(Float64, f64: f64);
scalar_from!(Bool, bool: bool);
scalar_from!(Text, String: String, &str);

/// A tagged in-memory value.
///
/// Cloning is cheap: tables share their Arrow buffers and models sit behind
/// an `Arc`.
#[derive(Debug, Clone)]
pub enum Artifact {
    /// Dataframe-like table
    Tabular(RecordBatch),
    /// Numeric, boolean or string scalar
    Scalar(ScalarValue),
    /// Model with its own byte encoding
    Model(Arc<dyn ModelArtifact>),
    /// Opaque bytes (plots, images, anything else)
    Binary(Vec<u8>),
}

impl Artifact {
    /// Wrap a model.
    pub fn model<M: ModelArtifact + 'static>(model: M) -> Self {
        Self::Model(Arc::new(model))
    }

    /// Table view, if this is a tabular artifact.
    #[must_use]
    pub const fn as_tabular(&self) -> Option<&RecordBatch> {
        match self {
            Self::Tabular(batch) => Some(batch),
            _ => None,
        }
    }

    /// Scalar view, if this is a scalar artifact.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Model view, if this is a model artifact.
    #[must_use]
    pub fn as_model(&self) -> Option<&dyn ModelArtifact> {
        match self {
            Self::Model(model) => Some(model.as_ref()),
            _ => None,
        }
    }

    /// Variant name for diagnostics.
    #[must_use]
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::Tabular(_) => "tabular",
            Self::Scalar(_) => "scalar",
            Self::Model(_) => "model",
            Self::Binary(_) => "binary",
        }
    }

    /// Short human-readable rendering used by the inspection view.
    #[must_use]
    pub fn preview(&self) -> String {
        match self {
            Self::Tabular(batch) => format!(
                "RecordBatch[{} rows x {} columns]",
                batch.num_rows(),
                batch.num_columns()
            ),
            Self::Scalar(value) => value.to_string(),
            Self::Model(model) => format!("Model<{}>", model.type_name()),
            Self::Binary(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

impl From<RecordBatch> for Artifact {
    fn from(batch: RecordBatch) -> Self {
        Self::Tabular(batch)
    }
}

impl From<ScalarValue> for Artifact {
    fn from(value: ScalarValue) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<u8>> for Artifact {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl<T> From<BincodeModel<T>> for Artifact
where
    T: Serialize + fmt::Debug + Send + Sync + 'static,
{
    fn from(model: BincodeModel<T>) -> Self {
        Self::model(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType, Field, Schema};

    #[test]
    fn test_kind_parse_aliases() {
        assert_eq!("dataframe".parse::<ArtifactKind>().unwrap(), ArtifactKind::Tabular);
        assert_eq!("df".parse::<ArtifactKind>().unwrap(), ArtifactKind::Tabular);
        assert_eq!("int".parse::<ArtifactKind>().unwrap(), ArtifactKind::Numeric);
        assert_eq!("Float".parse::<ArtifactKind>().unwrap(), ArtifactKind::Numeric);
        assert_eq!("string".parse::<ArtifactKind>().unwrap(), ArtifactKind::Text);
        assert_eq!("viz".parse::<ArtifactKind>().unwrap(), ArtifactKind::Visualization);
        assert_eq!("model".parse::<ArtifactKind>().unwrap(), ArtifactKind::Model);
    }

    #[test]
    fn test_kind_parse_unknown() {
        let err = "spreadsheet".parse::<ArtifactKind>().unwrap_err();
        assert!(err.to_string().contains("spreadsheet"));
    }

    #[test]
    fn test_kind_serde_aliases() {
        let kind: ArtifactKind = serde_json::from_str("\"dataframe\"").unwrap();
        assert_eq!(kind, ArtifactKind::Tabular);
        assert_eq!(serde_json::to_string(&ArtifactKind::Text).unwrap(), "\"text\"");
    }

    #[test]
    fn test_kind_serde_matches_parse() {
        for name in ["DataFrame", "Float", "VIZ", " model "] {
            let parsed: ArtifactKind = name.parse().unwrap();
            let decoded: ArtifactKind = serde_json::to_value(name)
                .and_then(serde_json::from_value)
                .unwrap();
            assert_eq!(decoded, parsed, "{name}");
        }
        assert!(serde_json::from_str::<ArtifactKind>("\"spreadsheet\"").is_err());
    }

    #[test]
    fn test_kind_classes() {
        assert!(ArtifactKind::Numeric.is_scalar());
        assert!(ArtifactKind::Text.is_scalar());
        assert!(!ArtifactKind::Model.is_scalar());
        assert!(ArtifactKind::Visualization.is_opaque());
        assert!(ArtifactKind::Other.is_opaque());
        assert!(!ArtifactKind::Tabular.is_opaque());
    }

    #[test]
    fn test_scalar_json_normalization() {
        assert_eq!(ScalarValue::Int(-3).to_json(), serde_json::json!(-3));
        assert_eq!(ScalarValue::UInt(7).to_json(), serde_json::json!(7));
        assert_eq!(ScalarValue::Float32(0.87).to_json(), serde_json::json!(0.87));
        assert_eq!(ScalarValue::Float64(f64::NAN).to_json(), serde_json::Value::Null);
        assert_eq!(
            ScalarValue::Float64(f64::INFINITY).to_json(),
            serde_json::json!("Infinity")
        );
        assert_eq!(
            ScalarValue::Float32(f32::NEG_INFINITY).to_json(),
            serde_json::json!("-Infinity")
        );
        assert_eq!(ScalarValue::from("abc").to_json(), serde_json::json!("abc"));
    }

    #[test]
    fn test_platform_widths_convert() {
        assert_eq!(ScalarValue::from(5i8), ScalarValue::Int(5));
        assert_eq!(ScalarValue::from(5u16), ScalarValue::UInt(5));
        assert_eq!(ScalarValue::from(true), ScalarValue::Bool(true));
    }

    #[test]
    fn test_artifact_preview() {
        let schema = Arc::new(Schema::new(vec![Field::new("a", DataType::Int64, false)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1, 2, 3]))]).unwrap();
        assert_eq!(Artifact::from(batch).preview(), "RecordBatch[3 rows x 1 columns]");
        assert_eq!(Artifact::from(0.5f64).preview(), "0.5");
        assert_eq!(Artifact::from(vec![1u8, 2]).preview(), "<2 bytes>");
    }

    #[test]
    fn test_artifact_views() {
        let artifact = Artifact::from(42i64);
        assert!(artifact.as_tabular().is_none());
        assert!(artifact.as_model().is_none());
        assert_eq!(artifact.as_scalar(), Some(&ScalarValue::Int(42)));
        assert_eq!(artifact.variant_name(), "scalar");
    }
}
