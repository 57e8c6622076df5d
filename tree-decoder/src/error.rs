//! Errors returned while decoding a [`ValueTree`](crate::ValueTree).
//!
//! Every error carries the [`CodingPath`] of the node that failed, so a caller
//! can point at the exact field of the original document.

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::{path::CodingPath, value::ValueKind};

/// Alias for a `Result` with the error type [`DecodeError`].
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Why a required value could not be produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingValue {
    /// The node was present but empty.
    Null,
    /// An unkeyed container was asked for an element past its end.
    EndOfContainer,
}

impl Display for MissingValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "found null",
            Self::EndOfContainer => "container is at end",
        })
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The node's shape does not match what the target type requires.
    #[error("type mismatch at {path}: expected {expected}, found {actual}: {description}")]
    TypeMismatch {
        expected: &'static str,
        actual: ValueKind,
        path: CodingPath,
        description: String,
    },

    /// A value was required but none was available.
    #[error("value not found at {path}: expected {expected}, {missing}: {description}")]
    ValueNotFound {
        expected: &'static str,
        missing: MissingValue,
        path: CodingPath,
        description: String,
    },

    /// A required field is absent from an object node.
    #[error("key `{key}` not found at {path}: {description}")]
    KeyNotFound {
        key: String,
        path: CodingPath,
        description: String,
    },

    /// The value has the right shape but cannot be interpreted.
    #[error("data corrupted at {path}: {description}")]
    DataCorrupted {
        path: CodingPath,
        description: String,
    },
}

impl DecodeError {
    pub fn type_mismatch(
        expected: &'static str,
        actual: ValueKind,
        path: CodingPath,
        description: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            expected,
            actual,
            path,
            description: description.into(),
        }
    }

    pub fn value_not_found(
        expected: &'static str,
        missing: MissingValue,
        path: CodingPath,
        description: impl Into<String>,
    ) -> Self {
        Self::ValueNotFound {
            expected,
            missing,
            path,
            description: description.into(),
        }
    }

    pub fn key_not_found(
        key: impl Into<String>,
        path: CodingPath,
        description: impl Into<String>,
    ) -> Self {
        Self::KeyNotFound {
            key: key.into(),
            path,
            description: description.into(),
        }
    }

    pub fn data_corrupted(path: CodingPath, description: impl Into<String>) -> Self {
        Self::DataCorrupted {
            path,
            description: description.into(),
        }
    }

    /// Returns the location of the node that failed to decode.
    #[must_use]
    pub const fn coding_path(&self) -> &CodingPath {
        match self {
            Self::TypeMismatch { path, .. }
            | Self::ValueNotFound { path, .. }
            | Self::KeyNotFound { path, .. }
            | Self::DataCorrupted { path, .. } => path,
        }
    }

    /// Returns the human-readable detail of this error.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::TypeMismatch { description, .. }
            | Self::ValueNotFound { description, .. }
            | Self::KeyNotFound { description, .. }
            | Self::DataCorrupted { description, .. } => description,
        }
    }

    /// Whether this error means "there is nothing here" rather than "what is here is wrong".
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::ValueNotFound { .. } | Self::KeyNotFound { .. })
    }
}

// Assertion macros

/// Asserts that a decode result is `Ok` and holds `$right`.
#[macro_export]
macro_rules! assert_decoded {
    ($left:expr, $right:expr $(,)?) => {{
        match $left {
            Ok(value) => assert_eq!(value, $right, "decoding succeeded but the value doesn't match"),
            Err(error) => panic!("Expected a successful decode, got: {error}"),
        }
    }};
}

/// Asserts that a decode result is an `Err` of the given [`DecodeError`] variant.
#[macro_export]
macro_rules! assert_decode_error {
    ($left:expr, $variant:ident $(,)?) => {{
        match $left {
            Err($crate::DecodeError::$variant { .. }) => {}
            Err(error) => panic!(
                concat!("Expected a `", stringify!($variant), "` error, got: {}"),
                error
            ),
            Ok(value) => panic!(
                concat!("Expected a `", stringify!($variant), "` error, got value: {:?}"),
                value
            ),
        }
    }};
}

#[cfg(test)]
mod test {
    use super::{DecodeError, MissingValue};
    use crate::{path::CodingPath, value::ValueKind};

    #[test]
    fn messages_name_the_path() {
        let path = CodingPath::new().appending("order").appending(1).appending("qty");

        let error = DecodeError::type_mismatch("u32", ValueKind::Object, path.clone(), "not a leaf");
        assert_eq!(
            error.to_string(),
            "type mismatch at order[1].qty: expected u32, found object: not a leaf"
        );

        let error = DecodeError::value_not_found(
            "String",
            MissingValue::EndOfContainer,
            path.clone(),
            "no more elements",
        );
        assert_eq!(
            error.to_string(),
            "value not found at order[1].qty: expected String, container is at end: no more elements"
        );
        assert_eq!(error.coding_path(), &path);
        assert!(error.is_missing());

        let error = DecodeError::data_corrupted(CodingPath::new(), "bad base64");
        assert_eq!(error.to_string(), "data corrupted at <root>: bad base64");
        assert_eq!(error.description(), "bad base64");
        assert!(!error.is_missing());
    }
}
