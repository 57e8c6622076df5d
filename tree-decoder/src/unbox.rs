//! Strict conversion of leaf text into typed scalars.
//!
//! Every leaf of a tree is text, so numbers, booleans, dates and binary data all
//! have to be recovered from strings. The rules here never round or truncate:
//! anything that can't be represented exactly in the requested type is rejected
//! with an error carrying the coding path of the offending node.

use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, trace};
use url::Url;

use crate::{
    decoder::{Decodable, Decoder},
    error::{DecodeError, MissingValue, Result},
    options::{DataDecodingStrategy, DateDecodingStrategy, NonConformingFloatDecodingStrategy},
    value::{ValueKind, ValueTree},
};

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z.
const REFERENCE_DATE_OFFSET: f64 = 978_307_200.0;

/// 2^53. From here on, neighbouring integers share one `f64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// An integer type that can be recovered from a parsed `f64` without loss.
pub trait UnboxInteger: Sized + FromStr {
    const NAME: &'static str;

    /// Converts `value` if it is an integer within range, `None` otherwise.
    fn from_f64_exact(value: f64) -> Option<Self>;
}

macro_rules! impl_unbox_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl UnboxInteger for $ty {
                const NAME: &'static str = stringify!($ty);

                fn from_f64_exact(value: f64) -> Option<Self> {
                    // The upper bound is exclusive: `MAX as f64` may round up past `MAX`.
                    if value >= <$ty>::MIN as f64 && value < <$ty>::MAX as f64 + 1.0 {
                        let narrowed = value as $ty;
                        (narrowed as f64 == value).then_some(narrowed)
                    } else {
                        None
                    }
                }
            }
        )*
    };
}

impl_unbox_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<'a> Decoder<'a> {
    /// Returns the text of the current leaf.
    ///
    /// An object with exactly one entry or an array with exactly one element is looked
    /// through, since a document element that wraps a single value is common.
    pub(crate) fn leaf_text(&self, expected: &'static str) -> Result<&'a str> {
        let mut node = self.current();
        loop {
            let child = match node {
                ValueTree::Text(text) => return Ok(text.as_str()),
                ValueTree::Null => {
                    return Err(DecodeError::value_not_found(
                        expected,
                        MissingValue::Null,
                        self.coding_path().clone(),
                        format!("Expected {expected} value but found null instead."),
                    ));
                }
                ValueTree::Object(entries) if entries.len() == 1 => {
                    entries.first().map(|(_, child)| child)
                }
                ValueTree::Array(elements) if elements.len() == 1 => elements.first(),
                ValueTree::Object(_) | ValueTree::Array(_) => None,
            };

            let Some(child) = child else {
                return Err(self.mismatch(expected, node.kind()));
            };
            debug!(
                path = %self.coding_path(),
                "looking through single-child {} for {expected}",
                node.kind()
            );
            node = child;
        }
    }

    fn mismatch(&self, expected: &'static str, actual: ValueKind) -> DecodeError {
        DecodeError::type_mismatch(
            expected,
            actual,
            self.coding_path().clone(),
            format!("Expected to decode {expected} but found {actual} instead."),
        )
    }

    pub(crate) fn unbox_bool(&self) -> Result<bool> {
        match self.leaf_text("bool")? {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(self.mismatch("bool", ValueKind::Text)),
        }
    }

    pub(crate) fn unbox_integer<T: UnboxInteger>(&self) -> Result<T> {
        let text = self.leaf_text(T::NAME)?;
        if let Ok(value) = text.parse::<T>() {
            return Ok(value);
        }

        let Ok(parsed) = text.parse::<f64>() else {
            return Err(self.mismatch(T::NAME, ValueKind::Text));
        };
        // Text that is not a plain integer goes through an f64, which may already
        // have rounded it once it is past 2^53.
        (parsed.abs() < MAX_EXACT_INTEGER)
            .then_some(parsed)
            .and_then(T::from_f64_exact)
            .ok_or_else(|| {
                DecodeError::data_corrupted(
                    self.coding_path().clone(),
                    format!("Parsed XML number <{text}> does not fit in {}.", T::NAME),
                )
            })
    }

    pub(crate) fn unbox_f32(&self) -> Result<f32> {
        let text = self.leaf_text("f32")?;
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                if value.abs() <= f64::from(f32::MAX) {
                    Ok(value as f32)
                } else {
                    Err(DecodeError::data_corrupted(
                        self.coding_path().clone(),
                        format!("Parsed XML number <{text}> does not fit in f32."),
                    ))
                }
            }
            _ => self.non_conforming_float(text, "f32").map(|value| value as f32),
        }
    }

    pub(crate) fn unbox_f64(&self) -> Result<f64> {
        let text = self.leaf_text("f64")?;
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => self.non_conforming_float(text, "f64"),
        }
    }

    /// Maps the configured sentinel strings to infinities and NaN.
    fn non_conforming_float(&self, text: &str, expected: &'static str) -> Result<f64> {
        if let NonConformingFloatDecodingStrategy::ConvertFromStrings {
            positive_infinity,
            negative_infinity,
            nan,
        } = &self.options().non_conforming_float_strategy
        {
            if text == positive_infinity.as_str() {
                return Ok(f64::INFINITY);
            }
            if text == negative_infinity.as_str() {
                return Ok(f64::NEG_INFINITY);
            }
            if text == nan.as_str() {
                return Ok(f64::NAN);
            }
        }

        Err(DecodeError::type_mismatch(
            expected,
            ValueKind::Text,
            self.coding_path().clone(),
            format!("Parsed XML number <{text}> is not a valid {expected}."),
        ))
    }

    pub(crate) fn unbox_date(&mut self) -> Result<OffsetDateTime> {
        let options = self.options();
        trace!(path = %self.coding_path(), strategy = ?options.date_strategy, "decoding date");
        match &options.date_strategy {
            DateDecodingStrategy::DeferToGeneric => {
                let seconds = self.unbox_f64()?;
                self.date_from_seconds(seconds + REFERENCE_DATE_OFFSET)
            }
            DateDecodingStrategy::SecondsSince1970 => {
                let seconds = self.unbox_f64()?;
                self.date_from_seconds(seconds)
            }
            DateDecodingStrategy::MillisecondsSince1970 => {
                let milliseconds = self.unbox_f64()?;
                self.date_from_seconds(milliseconds / 1000.0)
            }
            DateDecodingStrategy::Iso8601 => {
                let text = self.leaf_text("date")?;
                OffsetDateTime::parse(text, &Rfc3339).map_err(|_| {
                    DecodeError::data_corrupted(
                        self.coding_path().clone(),
                        "Expected date string to be ISO8601-formatted.",
                    )
                })
            }
            DateDecodingStrategy::Formatted(formatter) => {
                let text = self.leaf_text("date")?;
                formatter.parse(text).ok_or_else(|| {
                    DecodeError::data_corrupted(
                        self.coding_path().clone(),
                        "Date string does not match format expected by formatter.",
                    )
                })
            }
            DateDecodingStrategy::Custom(decode) => decode(self),
        }
    }

    fn date_from_seconds(&self, seconds: f64) -> Result<OffsetDateTime> {
        let out_of_range = || {
            DecodeError::data_corrupted(
                self.coding_path().clone(),
                format!("Date value {seconds} is out of range."),
            )
        };

        let whole = seconds.floor();
        if !whole.is_finite() || whole < i64::MIN as f64 || whole >= i64::MAX as f64 {
            return Err(out_of_range());
        }
        let nanoseconds = ((seconds - whole) * 1e9).round() as i64;

        OffsetDateTime::from_unix_timestamp(whole as i64)
            .ok()
            .and_then(|date| date.checked_add(Duration::nanoseconds(nanoseconds)))
            .ok_or_else(out_of_range)
    }

    pub(crate) fn unbox_data(&mut self) -> Result<Vec<u8>> {
        let options = self.options();
        trace!(path = %self.coding_path(), strategy = ?options.data_strategy, "decoding data");
        match &options.data_strategy {
            DataDecodingStrategy::DeferToGeneric => Vec::<u8>::decode(self),
            DataDecodingStrategy::Base64 => {
                let text = self.leaf_text("data")?;
                STANDARD.decode(text).map_err(|_| {
                    DecodeError::data_corrupted(
                        self.coding_path().clone(),
                        "Encountered Data is not valid Base64.",
                    )
                })
            }
            DataDecodingStrategy::Custom(decode) => decode(self),
        }
    }

    pub(crate) fn unbox_url(&self) -> Result<Url> {
        let text = self.leaf_text("url")?;
        Url::parse(text).map_err(|error| {
            DecodeError::data_corrupted(
                self.coding_path().clone(),
                format!("Invalid URL string <{text}>: {error}"),
            )
        })
    }
}

#[cfg(test)]
mod test {
    use super::UnboxInteger;
    use crate::{
        Data, Decimal, assert_decode_error, assert_decoded,
        decoder::{decode, decode_default},
        error::DecodeError,
        options::{
            DataDecodingStrategy, DateDecodingStrategy, DateFormatter, DecodingOptions,
            NonConformingFloatDecodingStrategy,
        },
        value::ValueTree,
    };
    use proptest::prelude::*;
    use serde_json::json;
    use time::{OffsetDateTime, macros::datetime};

    fn text(value: &str) -> ValueTree {
        ValueTree::text(value)
    }

    #[test]
    fn bool_lexicon() {
        assert_decoded!(decode_default::<bool>(&text("true")), true);
        assert_decoded!(decode_default::<bool>(&text("1")), true);
        assert_decoded!(decode_default::<bool>(&text("false")), false);
        assert_decoded!(decode_default::<bool>(&text("0")), false);
        assert_decode_error!(decode_default::<bool>(&text("yes")), TypeMismatch);
        assert_decode_error!(decode_default::<bool>(&text("True")), TypeMismatch);
        assert_decode_error!(decode_default::<bool>(&ValueTree::Null), ValueNotFound);
    }

    #[test]
    fn integers() {
        assert_decoded!(decode_default::<u32>(&text("42")), 42);
        assert_decoded!(decode_default::<i8>(&text("-128")), -128);
        assert_decoded!(decode_default::<u8>(&text("1e2")), 100);
        assert_decoded!(decode_default::<i32>(&text("-4.0")), -4);
        assert_decoded!(decode_default::<u64>(&text("18446744073709551615")), u64::MAX);
        assert_decoded!(decode_default::<i64>(&text("-9223372036854775808")), i64::MIN);

        assert_decode_error!(decode_default::<u32>(&text("3.14")), DataCorrupted);
        assert_decode_error!(decode_default::<u8>(&text("256")), DataCorrupted);
        assert_decode_error!(decode_default::<u16>(&text("-1")), DataCorrupted);
        assert_decode_error!(decode_default::<i64>(&text("9.3e18")), DataCorrupted);
        assert_decode_error!(decode_default::<i32>(&text("inf")), DataCorrupted);
        assert_decode_error!(decode_default::<i32>(&text("twelve")), TypeMismatch);
        assert_decode_error!(decode_default::<usize>(&text("")), TypeMismatch);
    }

    #[test]
    fn large_integers_outside_plain_notation() {
        // Both parse to an f64 that is a different integer than the text.
        assert_decode_error!(decode_default::<i64>(&text("9007199254740993.0")), DataCorrupted);
        assert_decode_error!(decode_default::<i64>(&text("123456789012345678e0")), DataCorrupted);
        assert_decode_error!(decode_default::<u64>(&text("9.007199254740992e15")), DataCorrupted);

        // Plain integers of any size in range still parse exactly.
        assert_decoded!(decode_default::<i64>(&text("9007199254740993")), 9_007_199_254_740_993);
        assert_decoded!(decode_default::<i64>(&text("9007199254740991.0")), 9_007_199_254_740_991);
        assert_decoded!(decode_default::<u64>(&text("-0e0")), 0);
    }

    #[test]
    fn corruption_names_value_and_width() {
        let error = decode_default::<u8>(&text("300")).unwrap_err();
        assert_eq!(
            error.description(),
            "Parsed XML number <300> does not fit in u8."
        );
    }

    #[test]
    fn exact_bounds() {
        assert_eq!(i64::from_f64_exact(-9_223_372_036_854_775_808.0), Some(i64::MIN));
        assert_eq!(i64::from_f64_exact(9_223_372_036_854_775_808.0), None);
        assert_eq!(u64::from_f64_exact(18_446_744_073_709_551_616.0), None);
        assert_eq!(u8::from_f64_exact(255.0), Some(255));
        assert_eq!(u8::from_f64_exact(255.5), None);
        assert_eq!(u8::from_f64_exact(f64::NAN), None);
        assert_eq!(u32::from_f64_exact(-0.0), Some(0));
    }

    #[test]
    fn floats() {
        assert_decoded!(decode_default::<f64>(&text("0.1")), 0.1);
        assert_decoded!(decode_default::<f64>(&text("-2.5e-3")), -0.0025);
        assert_decoded!(decode_default::<f32>(&text("1.5")), 1.5);
        assert_decoded!(decode_default::<f32>(&text("3.4028234663852886e38")), f32::MAX);

        assert_decode_error!(decode_default::<f32>(&text("1e39")), DataCorrupted);
        assert_decode_error!(decode_default::<f64>(&text("abc")), TypeMismatch);
        assert_decode_error!(decode_default::<f64>(&text("inf")), TypeMismatch);
        assert_decode_error!(decode_default::<f32>(&text("NaN")), TypeMismatch);
    }

    #[test]
    fn non_conforming_floats() {
        let options = DecodingOptions::new().with_non_conforming_float_strategy(
            NonConformingFloatDecodingStrategy::ConvertFromStrings {
                positive_infinity: "+Infinity".to_string(),
                negative_infinity: "-Infinity".to_string(),
                nan: "NaN".to_string(),
            },
        );

        assert_decoded!(decode::<f64>(&text("+Infinity"), &options), f64::INFINITY);
        assert_decoded!(decode::<f32>(&text("-Infinity"), &options), f32::NEG_INFINITY);
        assert!(decode::<f64>(&text("NaN"), &options).unwrap().is_nan());
        assert!(decode::<f32>(&text("NaN"), &options).unwrap().is_nan());
        assert_decode_error!(decode::<f64>(&text("nan"), &options), TypeMismatch);
        assert_decoded!(decode::<f64>(&text("2"), &options), 2.0);
    }

    #[test]
    fn decimal_uses_the_double_path() {
        assert_decoded!(decode_default::<Decimal>(&text("12.5")), Decimal(12.5));
        // Precision beyond an f64 is lost.
        assert_decoded!(
            decode_default::<Decimal>(&text("0.10000000000000000000001")),
            Decimal(0.1)
        );
    }

    #[test]
    fn leaves_inside_single_child_wrappers() {
        let tree = ValueTree::from(json!({ "value": ["7"] }));
        assert_decoded!(decode_default::<u8>(&tree), 7);

        let tree = ValueTree::from(json!({ "a": "1", "b": "2" }));
        assert_decode_error!(decode_default::<u8>(&tree), TypeMismatch);
        assert_decode_error!(decode_default::<String>(&ValueTree::array([])), TypeMismatch);

        let tree = ValueTree::from(json!({ "value": null }));
        assert_decode_error!(decode_default::<String>(&tree), ValueNotFound);
    }

    #[test]
    fn single_child_element_reads_as_its_content() {
        // `<y><a>1</a></y>` wrapping one value is common in documents, so a
        // single-child object stands in for its child wherever a scalar is wanted.
        let options = DecodingOptions::default();
        let tree = ValueTree::from(json!({ "y": { "a": "1" } }));
        let mut decoder = crate::Decoder::new(&tree, &options);
        let mut container = decoder.keyed_container().unwrap();
        assert_decoded!(container.decode::<Option<u8>>("y"), Some(1));
        assert_decoded!(container.decode::<u8>("y"), 1);

        // Two children are structure, not a wrapped value.
        let tree = ValueTree::from(json!({ "y": { "a": "1", "b": "2" } }));
        let mut decoder = crate::Decoder::new(&tree, &options);
        let mut container = decoder.keyed_container().unwrap();
        assert_decode_error!(container.decode::<Option<u8>>("y"), TypeMismatch);
    }

    #[test]
    fn dates() {
        let iso = DecodingOptions::new().with_date_strategy(DateDecodingStrategy::Iso8601);
        let date: OffsetDateTime = decode(&text("2021-06-03T00:00:00Z"), &iso).unwrap();
        assert_eq!(date.unix_timestamp(), 1_622_678_400);
        assert_decode_error!(decode::<OffsetDateTime>(&text("not-a-date"), &iso), DataCorrupted);

        let seconds = DecodingOptions::new().with_date_strategy(DateDecodingStrategy::SecondsSince1970);
        assert_decoded!(
            decode::<OffsetDateTime>(&text("1622678400.5"), &seconds),
            datetime!(2021-06-03 00:00:00.5 UTC)
        );

        let millis =
            DecodingOptions::new().with_date_strategy(DateDecodingStrategy::MillisecondsSince1970);
        assert_decoded!(
            decode::<OffsetDateTime>(&text("1622678400250"), &millis),
            datetime!(2021-06-03 00:00:00.25 UTC)
        );
        assert_decode_error!(decode::<OffsetDateTime>(&text("1e300"), &millis), DataCorrupted);

        assert_decoded!(
            decode_default::<OffsetDateTime>(&text("0")),
            datetime!(2001-01-01 00:00:00 UTC)
        );

        let formatted = DecodingOptions::new().with_date_strategy(DateDecodingStrategy::Formatted(
            DateFormatter::new("[day]/[month]/[year]").unwrap(),
        ));
        assert_decoded!(
            decode::<OffsetDateTime>(&text("03/06/2021"), &formatted),
            datetime!(2021-06-03 00:00:00 UTC)
        );
        assert_decode_error!(decode::<OffsetDateTime>(&text("2021-06-03"), &formatted), DataCorrupted);
    }

    #[test]
    fn custom_date_reenters_the_decoder() {
        // Dates stored as `{ "epoch": "..." }`.
        let options = DecodingOptions::new().with_custom_date_decoder(|decoder| {
            let mut container = decoder.keyed_container()?;
            let seconds: i64 = container.decode("epoch")?;
            OffsetDateTime::from_unix_timestamp(seconds).map_err(|error| {
                DecodeError::data_corrupted(container.coding_path().clone(), error.to_string())
            })
        });

        let tree = ValueTree::from(json!({ "created": { "epoch": "86400" } }));
        let mut decoder = crate::Decoder::new(&tree, &options);
        let mut container = decoder.keyed_container().unwrap();
        assert_decoded!(
            container.decode::<OffsetDateTime>("created"),
            datetime!(1970-01-02 00:00:00 UTC)
        );

        let tree = ValueTree::from(json!({ "created": { "when": "86400" } }));
        let mut decoder = crate::Decoder::new(&tree, &options);
        let mut container = decoder.keyed_container().unwrap();
        let error = container.decode::<OffsetDateTime>("created").unwrap_err();
        assert!(matches!(error, DecodeError::KeyNotFound { ref key, .. } if key == "epoch"));
        assert_eq!(error.coding_path().to_string(), "created");
    }

    #[test]
    fn data() {
        assert_decoded!(decode_default::<Data>(&text("aGVsbG8=")), Data(b"hello".to_vec()));
        assert_decoded!(decode_default::<Data>(&text("")), Data(Vec::new()));
        assert_decode_error!(decode_default::<Data>(&text("not base64!")), DataCorrupted);

        let generic = DecodingOptions::new().with_data_strategy(DataDecodingStrategy::DeferToGeneric);
        let tree = ValueTree::from(json!(["104", "105"]));
        assert_decoded!(decode::<Data>(&tree, &generic), Data(b"hi".to_vec()));
        assert_decode_error!(decode::<Data>(&ValueTree::from(json!(["300"])), &generic), DataCorrupted);

        let hex = DecodingOptions::new().with_custom_data_decoder(|decoder| {
            let text: String = decoder.single_value_container().decode()?;
            (0..text.len())
                .step_by(2)
                .map(|i| {
                    text.get(i..i + 2)
                        .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                        .ok_or_else(|| {
                            DecodeError::data_corrupted(decoder.coding_path().clone(), "bad hex")
                        })
                })
                .collect()
        });
        assert_decoded!(decode::<Data>(&text("cafe"), &hex), Data(vec![0xca, 0xfe]));
        assert_decode_error!(decode::<Data>(&text("zz"), &hex), DataCorrupted);
    }

    #[test]
    fn urls() {
        let url: url::Url = decode_default(&text("https://example.com/a?b=c")).unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_decode_error!(decode_default::<url::Url>(&text("not a url")), DataCorrupted);
    }

    proptest! {
        #[test]
        fn integers_round_trip(n: i64, m: u64, k: i16, b: u8) {
            prop_assert_eq!(decode_default::<i64>(&text(&n.to_string())).unwrap(), n);
            prop_assert_eq!(decode_default::<u64>(&text(&m.to_string())).unwrap(), m);
            prop_assert_eq!(decode_default::<i16>(&text(&k.to_string())).unwrap(), k);
            prop_assert_eq!(decode_default::<u8>(&text(&b.to_string())).unwrap(), b);
        }

        #[test]
        fn scientific_notation_round_trips(n: i32) {
            let scientific = format!("{:e}", f64::from(n));
            prop_assert_eq!(decode_default::<i32>(&text(&scientific)).unwrap(), n);
        }

        #[test]
        fn fractions_are_rejected(n: i32, fraction in 1u32..1000) {
            let value = format!("{n}.{fraction:03}");
            let is_corrupted = matches!(
                decode_default::<i32>(&text(&value)),
                Err(DecodeError::DataCorrupted { .. })
            );
            prop_assert!(is_corrupted);
        }

        #[test]
        fn out_of_range_is_rejected(n in i64::from(u32::MAX) + 1..i64::MAX) {
            let is_corrupted = matches!(
                decode_default::<u32>(&text(&n.to_string())),
                Err(DecodeError::DataCorrupted { .. })
            );
            prop_assert!(is_corrupted);
        }
    }
}
