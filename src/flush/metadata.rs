//! Summary document: column dtypes, descriptive statistics and scalars
//!
//! Statistics follow the conventional `describe()` layout:
//!
//! - numeric columns: `count`, `mean`, `std` (sample, n-1), `min`, `25%`,
//!   `50%`, `75%`, `max`, quantiles by linear interpolation
//! - tables without numeric columns: string, bool and date columns get
//!   `count`, `unique`, `top`, `freq` over their string form
//!
//! Nulls (and NaN) are excluded from every statistic.

use std::collections::{BTreeMap, HashMap};

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;
use serde_json::{Map, Value};

use crate::artifact::ScalarValue;
use crate::Result;

/// `column → statistic → value` for one table.
pub type ColumnStats = BTreeMap<String, BTreeMap<String, ScalarValue>>;

/// Metadata written once per flush as `summary.json`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryDocument {
    /// `slot → column → dtype`
    pub types: BTreeMap<String, BTreeMap<String, String>>,
    /// `slot → column → statistic → value`
    pub stats: BTreeMap<String, ColumnStats>,
    /// `slot → literal value`
    pub scalars: BTreeMap<String, ScalarValue>,
}

impl SummaryDocument {
    /// Normalize every scalar to a standard JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let types = self
            .types
            .iter()
            .map(|(slot, columns)| {
                let columns: Map<String, Value> = columns
                    .iter()
                    .map(|(name, dtype)| (name.clone(), Value::String(dtype.clone())))
                    .collect();
                (slot.clone(), Value::Object(columns))
            })
            .collect::<Map<String, Value>>();

        let stats = self
            .stats
            .iter()
            .map(|(slot, columns)| {
                let columns: Map<String, Value> = columns
                    .iter()
                    .map(|(name, column)| {
                        let column: Map<String, Value> = column
                            .iter()
                            .map(|(stat, value)| (stat.clone(), value.to_json()))
                            .collect();
                        (name.clone(), Value::Object(column))
                    })
                    .collect();
                (slot.clone(), Value::Object(columns))
            })
            .collect::<Map<String, Value>>();

        let scalars = self
            .scalars
            .iter()
            .map(|(slot, value)| (slot.clone(), value.to_json()))
            .collect::<Map<String, Value>>();

        let mut document = Map::new();
        document.insert("types".to_string(), Value::Object(types));
        document.insert("stats".to_string(), Value::Object(stats));
        document.insert("scalars".to_string(), Value::Object(scalars));
        Value::Object(document)
    }

    /// Encode as UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_json())?)
    }
}

/// Dtype name of an Arrow column type.
#[must_use]
pub fn dtype_name(data_type: &DataType) -> String {
    let name = match data_type {
        DataType::Boolean => "bool",
        DataType::Int8 => "int8",
        DataType::Int16 => "int16",
        DataType::Int32 => "int32",
        DataType::Int64 => "int64",
        DataType::UInt8 => "uint8",
        DataType::UInt16 => "uint16",
        DataType::UInt32 => "uint32",
        DataType::UInt64 => "uint64",
        DataType::Float16 => "float16",
        DataType::Float32 => "float32",
        DataType::Float64 => "float64",
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => "string",
        DataType::Date32 | DataType::Date64 => "date",
        other => return other.to_string().to_lowercase(),
    };
    name.to_string()
}

/// `column → dtype` for every column of `batch`.
#[must_use]
pub fn column_types(batch: &RecordBatch) -> BTreeMap<String, String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|field| (field.name().clone(), dtype_name(field.data_type())))
        .collect()
}

/// Descriptive statistics of `batch`.
///
/// # Errors
///
/// Returns [`Error::Arrow`](crate::Error::Arrow) if a column cannot be cast
/// for aggregation.
pub fn describe(batch: &RecordBatch) -> Result<ColumnStats> {
    let schema = batch.schema();
    let numeric: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| field.data_type().is_numeric())
        .map(|(i, _)| i)
        .collect();

    let mut stats = ColumnStats::new();
    if numeric.is_empty() {
        for (i, field) in schema.fields().iter().enumerate() {
            if is_categorical(field.data_type()) {
                stats.insert(field.name().clone(), describe_strings(batch.column(i).as_ref())?);
            }
        }
    } else {
        for i in numeric {
            let field = schema.field(i);
            stats.insert(field.name().clone(), describe_numeric(batch.column(i).as_ref())?);
        }
    }
    Ok(stats)
}

const fn is_categorical(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Utf8View
            | DataType::Boolean
            | DataType::Date32
            | DataType::Date64
    )
}

#[allow(clippy::cast_precision_loss)]
fn describe_numeric(column: &dyn Array) -> Result<BTreeMap<String, ScalarValue>> {
    let floats = cast(column, &DataType::Float64)?;
    let mut values: Vec<f64> = floats
        .as_primitive::<Float64Type>()
        .iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect();
    values.sort_by(f64::total_cmp);

    let n = values.len();
    let mut out = BTreeMap::new();
    out.insert("count".to_string(), ScalarValue::UInt(n as u64));

    if n == 0 {
        for stat in ["mean", "std", "min", "25%", "50%", "75%", "max"] {
            out.insert(stat.to_string(), ScalarValue::Null);
        }
        return Ok(out);
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n < 2 {
        f64::NAN
    } else {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    };

    out.insert("mean".to_string(), ScalarValue::Float64(mean));
    out.insert("std".to_string(), ScalarValue::Float64(std));
    out.insert("min".to_string(), ScalarValue::Float64(values[0]));
    out.insert("25%".to_string(), ScalarValue::Float64(quantile(&values, 0.25)));
    out.insert("50%".to_string(), ScalarValue::Float64(quantile(&values, 0.50)));
    out.insert("75%".to_string(), ScalarValue::Float64(quantile(&values, 0.75)));
    out.insert("max".to_string(), ScalarValue::Float64(values[n - 1]));
    Ok(out)
}

/// Linear-interpolation quantile of non-empty sorted `values`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn describe_strings(column: &dyn Array) -> Result<BTreeMap<String, ScalarValue>> {
    let strings = cast(column, &DataType::Utf8)?;
    let mut counts: HashMap<&str, u64> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    let mut n = 0u64;

    for value in strings.as_string::<i32>().iter().flatten() {
        n += 1;
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            first_seen.push(value);
        }
        *count += 1;
    }

    // ties go to the value seen first
    let mut top: Option<(&str, u64)> = None;
    for value in first_seen {
        let count = counts[value];
        if top.map_or(true, |(_, best)| count > best) {
            top = Some((value, count));
        }
    }

    let mut out = BTreeMap::new();
    out.insert("count".to_string(), ScalarValue::UInt(n));
    out.insert("unique".to_string(), ScalarValue::UInt(counts.len() as u64));
    match top {
        Some((value, freq)) => {
            out.insert("top".to_string(), ScalarValue::Text(value.to_string()));
            out.insert("freq".to_string(), ScalarValue::UInt(freq));
        }
        None => {
            out.insert("top".to_string(), ScalarValue::Null);
            out.insert("freq".to_string(), ScalarValue::Null);
        }
    }
    Ok(out)
}
