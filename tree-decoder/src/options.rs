//! Strategies and caller context that tune how a tree is decoded.
//!
//! A [`DecodingOptions`] is built once by the caller and shared read-only by
//! every container of a decode call.

use std::{
    any::Any,
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime,
    error::InvalidFormatDescription,
    format_description::{self, OwnedFormatItem},
};

use crate::{decoder::Decoder, error::Result, path::CodingPath};

/// A caller-supplied date decoder. It receives a decoder rooted at the date's node.
pub type DateDecodeFn =
    dyn for<'d, 'a> Fn(&'d mut Decoder<'a>) -> Result<OffsetDateTime> + Send + Sync;
/// A caller-supplied binary data decoder. It receives a decoder rooted at the data's node.
pub type DataDecodeFn = dyn for<'d, 'a> Fn(&'d mut Decoder<'a>) -> Result<Vec<u8>> + Send + Sync;
/// A caller-supplied key transformation.
///
/// The path passed in ends with the document key being transformed; the returned
/// string is the name fields are looked up by.
pub type KeyDecodeFn = dyn Fn(&CodingPath) -> String + Send + Sync;

/// A date format used by [`DateDecodingStrategy::Formatted`].
///
/// The format uses the `time` crate's format description syntax, such as
/// `[year]-[month]-[day] [hour]:[minute]`. Formats without an offset are read as UTC,
/// and formats without a time are read as midnight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateFormatter {
    format: OwnedFormatItem,
}

impl DateFormatter {
    /// Compiles a format description.
    pub fn new(description: &str) -> std::result::Result<Self, InvalidFormatDescription> {
        format_description::parse_owned::<2>(description).map(|format| Self { format })
    }

    /// Parses a date string, returning `None` if it does not match this format.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(text, &self.format)
            .or_else(|_| PrimitiveDateTime::parse(text, &self.format).map(PrimitiveDateTime::assume_utc))
            .or_else(|_| Date::parse(text, &self.format).map(|date| date.midnight().assume_utc()))
            .ok()
    }
}

/// How dates are read from the tree.
#[derive(Clone, Default)]
pub enum DateDecodingStrategy {
    /// Decode a floating-point number of seconds relative to 2001-01-01T00:00:00Z.
    #[default]
    DeferToGeneric,
    /// Decode a floating-point number of seconds since the Unix epoch.
    SecondsSince1970,
    /// Decode a floating-point number of milliseconds since the Unix epoch.
    MillisecondsSince1970,
    /// Decode an ISO 8601 (RFC 3339 profile) timestamp such as `2021-06-03T00:00:00Z`.
    Iso8601,
    /// Decode a string with a caller-supplied format.
    Formatted(DateFormatter),
    /// Decode with a caller-supplied function.
    Custom(Arc<DateDecodeFn>),
}

impl Debug for DateDecodingStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeferToGeneric => f.write_str("DeferToGeneric"),
            Self::SecondsSince1970 => f.write_str("SecondsSince1970"),
            Self::MillisecondsSince1970 => f.write_str("MillisecondsSince1970"),
            Self::Iso8601 => f.write_str("Iso8601"),
            Self::Formatted(formatter) => f.debug_tuple("Formatted").field(formatter).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// How binary data is read from the tree.
#[derive(Clone, Default)]
pub enum DataDecodingStrategy {
    /// Decode a sequence of byte values.
    DeferToGeneric,
    /// Decode a Base64 (standard alphabet, padded) string.
    #[default]
    Base64,
    /// Decode with a caller-supplied function.
    Custom(Arc<DataDecodeFn>),
}

impl Debug for DataDecodingStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeferToGeneric => f.write_str("DeferToGeneric"),
            Self::Base64 => f.write_str("Base64"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// How floating-point values that are not plain numbers are read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NonConformingFloatDecodingStrategy {
    /// Reject anything that isn't a finite number.
    #[default]
    Throw,
    /// Map the given strings to positive infinity, negative infinity and NaN.
    ConvertFromStrings {
        positive_infinity: String,
        negative_infinity: String,
        nan: String,
    },
}

/// How document keys are matched against requested field names.
#[derive(Clone, Default)]
pub enum KeyDecodingStrategy {
    /// Use document keys as they are.
    #[default]
    UseDefaultKeys,
    /// Convert `snake_case` document keys to `camelCase` before lookup.
    ConvertFromSnakeCase,
    /// Transform document keys with a caller-supplied function.
    Custom(Arc<KeyDecodeFn>),
}

impl Debug for KeyDecodingStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UseDefaultKeys => f.write_str("UseDefaultKeys"),
            Self::ConvertFromSnakeCase => f.write_str("ConvertFromSnakeCase"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Opaque caller context made available to custom strategies and `Decodable` impls.
#[derive(Clone, Debug, Default)]
pub struct UserInfo(HashMap<String, Arc<dyn Any + Send + Sync>>);

impl UserInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.0.insert(key.into(), Arc::new(value));
    }

    /// Returns the value stored under `key` if it has type `T`.
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.0.get(key).and_then(|value| value.downcast_ref())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The full configuration of a decode call.
#[derive(Clone, Debug, Default)]
pub struct DecodingOptions {
    pub date_strategy: DateDecodingStrategy,
    pub data_strategy: DataDecodingStrategy,
    pub non_conforming_float_strategy: NonConformingFloatDecodingStrategy,
    pub key_decoding_strategy: KeyDecodingStrategy,
    pub user_info: UserInfo,
}

impl DecodingOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_date_strategy(mut self, strategy: DateDecodingStrategy) -> Self {
        self.date_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_data_strategy(mut self, strategy: DataDecodingStrategy) -> Self {
        self.data_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_non_conforming_float_strategy(
        mut self,
        strategy: NonConformingFloatDecodingStrategy,
    ) -> Self {
        self.non_conforming_float_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_key_decoding_strategy(mut self, strategy: KeyDecodingStrategy) -> Self {
        self.key_decoding_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_user_info<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.user_info.insert(key, value);
        self
    }

    /// Shorthand for a custom date strategy.
    #[must_use]
    pub fn with_custom_date_decoder<F>(self, f: F) -> Self
    where
        F: Fn(&mut Decoder<'_>) -> Result<OffsetDateTime> + Send + Sync + 'static,
    {
        self.with_date_strategy(DateDecodingStrategy::Custom(Arc::new(f)))
    }

    /// Shorthand for a custom data strategy.
    #[must_use]
    pub fn with_custom_data_decoder<F>(self, f: F) -> Self
    where
        F: Fn(&mut Decoder<'_>) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.with_data_strategy(DataDecodingStrategy::Custom(Arc::new(f)))
    }

    /// Shorthand for a custom key strategy.
    #[must_use]
    pub fn with_custom_key_decoder<F>(self, f: F) -> Self
    where
        F: Fn(&CodingPath) -> String + Send + Sync + 'static,
    {
        self.with_key_decoding_strategy(KeyDecodingStrategy::Custom(Arc::new(f)))
    }
}

// Serializable configuration

/// An error turning an [`OptionsConfig`] into [`DecodingOptions`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid date format description: {0}")]
    DateFormat(#[from] InvalidFormatDescription),
}

/// Date strategies that can be named in a configuration file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DateStrategyConfig {
    #[default]
    DeferToGeneric,
    #[serde(rename = "seconds-since-1970")]
    SecondsSince1970,
    #[serde(rename = "milliseconds-since-1970")]
    MillisecondsSince1970,
    Iso8601,
    /// A `time` format description.
    Formatted(String),
}

/// Data strategies that can be named in a configuration file.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DataStrategyConfig {
    DeferToGeneric,
    #[default]
    Base64,
}

/// Key strategies that can be named in a configuration file.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum KeyStrategyConfig {
    #[default]
    UseDefaultKeys,
    ConvertFromSnakeCase,
}

/// Sentinel strings for non-conforming floats.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct NonConformingFloatConfig {
    pub positive_infinity: String,
    pub negative_infinity: String,
    pub nan: String,
}

/// The closure-free part of [`DecodingOptions`], loadable with serde.
///
/// ```
/// use tree_decoder::options::OptionsConfig;
///
/// let config: OptionsConfig = serde_json::from_str(
///     r#"{ "date": "iso8601", "keys": "convert-from-snake-case" }"#,
/// ).unwrap();
/// let options = config.into_options().unwrap();
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct OptionsConfig {
    pub date: DateStrategyConfig,
    pub data: DataStrategyConfig,
    pub non_conforming_floats: Option<NonConformingFloatConfig>,
    pub keys: KeyStrategyConfig,
}

impl OptionsConfig {
    pub fn into_options(self) -> std::result::Result<DecodingOptions, ConfigError> {
        let dates = match self.date {
            DateStrategyConfig::DeferToGeneric => DateDecodingStrategy::DeferToGeneric,
            DateStrategyConfig::SecondsSince1970 => DateDecodingStrategy::SecondsSince1970,
            DateStrategyConfig::MillisecondsSince1970 => {
                DateDecodingStrategy::MillisecondsSince1970
            }
            DateStrategyConfig::Iso8601 => DateDecodingStrategy::Iso8601,
            DateStrategyConfig::Formatted(description) => {
                DateDecodingStrategy::Formatted(DateFormatter::new(&description)?)
            }
        };
        let data = match self.data {
            DataStrategyConfig::DeferToGeneric => DataDecodingStrategy::DeferToGeneric,
            DataStrategyConfig::Base64 => DataDecodingStrategy::Base64,
        };
        let non_conforming_float_strategy = self.non_conforming_floats.map_or(
            NonConformingFloatDecodingStrategy::Throw,
            |floats| NonConformingFloatDecodingStrategy::ConvertFromStrings {
                positive_infinity: floats.positive_infinity,
                negative_infinity: floats.negative_infinity,
                nan: floats.nan,
            },
        );
        let key_decoding_strategy = match self.keys {
            KeyStrategyConfig::UseDefaultKeys => KeyDecodingStrategy::UseDefaultKeys,
            KeyStrategyConfig::ConvertFromSnakeCase => KeyDecodingStrategy::ConvertFromSnakeCase,
        };

        Ok(DecodingOptions {
            date_strategy: dates,
            data_strategy: data,
            non_conforming_float_strategy,
            key_decoding_strategy,
            user_info: UserInfo::new(),
        })
    }
}
