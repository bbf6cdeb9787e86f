//! Model serialization
//!
//! Models are opaque to the flusher: it only asks them for bytes. Anything
//! serde-serializable can be wrapped in a [`BincodeModel`]; custom formats
//! implement [`ModelArtifact`] directly.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Result};

/// A trained model that knows how to encode itself.
pub trait ModelArtifact: fmt::Debug + Send + Sync {
    /// Encode the model to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the model cannot be encoded.
    fn encode(&self) -> Result<Vec<u8>>;

    /// Type name shown in the inspection view.
    fn type_name(&self) -> &str {
        "model"
    }
}

/// Serde model encoded with `bincode`.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use trueno_tag::model::{BincodeModel, ModelArtifact};
///
/// #[derive(Debug, Serialize, Deserialize, PartialEq)]
/// struct Linear { weights: Vec<f64>, bias: f64 }
///
/// let model = BincodeModel::new(Linear { weights: vec![0.5, -1.0], bias: 0.1 });
/// let bytes = model.encode()?;
/// let restored = BincodeModel::<Linear>::decode(&bytes)?;
/// assert_eq!(restored.inner(), model.inner());
/// # Ok::<(), trueno_tag::Error>(())
/// ```
#[derive(Debug)]
pub struct BincodeModel<T> {
    inner: Arc<T>,
}

impl<T> Clone for BincodeModel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> BincodeModel<T> {
    /// Wrap a model value.
    pub fn new(model: T) -> Self {
        Self {
            inner: Arc::new(model),
        }
    }

    /// Borrow the wrapped model.
    #[must_use]
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: DeserializeOwned> BincodeModel<T> {
    /// Decode a model previously produced by [`ModelArtifact::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the bytes are not a valid encoding of `T`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let model = bincode::deserialize(bytes)
            .map_err(|e| Error::Serialization(format!("bincode decoding failed: {e}")))?;
        Ok(Self::new(model))
    }
}

impl<T> ModelArtifact for BincodeModel<T>
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self.inner.as_ref())
            .map_err(|e| Error::Serialization(format!("bincode encoding failed: {e}")))
    }

    fn type_name(&self) -> &str {
        std::any::type_name::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Stump {
        feature: usize,
        threshold: f64,
    }

    #[test]
    fn test_bincode_round_trip() {
        let model = BincodeModel::new(Stump {
            feature: 3,
            threshold: 0.25,
        });
        let bytes = model.encode().unwrap();
        let restored = BincodeModel::<Stump>::decode(&bytes).unwrap();
        assert_eq!(restored.inner(), model.inner());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = BincodeModel::<Stump>::decode(&[1, 2]);
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_type_name_reports_inner_type() {
        let model = BincodeModel::new(Stump {
            feature: 0,
            threshold: 0.0,
        });
        assert!(model.type_name().ends_with("Stump"));
    }

    #[test]
    fn test_clone_shares_model() {
        let model = BincodeModel::new(vec![1u8, 2, 3]);
        let copy = model.clone();
        assert!(std::ptr::eq(model.inner(), copy.inner()));
    }
}
