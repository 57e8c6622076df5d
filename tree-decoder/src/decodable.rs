//! [`Decodable`] implementations for standard and ecosystem types.

use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
};

use indexmap::IndexMap;
use time::OffsetDateTime;
use url::Url;

use crate::{
    decoder::{Decodable, Decoder},
    error::{DecodeError, MissingValue, Result},
    value::ValueTree,
};

/// Binary data, read according to the configured
/// [`DataDecodingStrategy`](crate::options::DataDecodingStrategy).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Data(pub Vec<u8>);

/// An arbitrary-precision decimal. It is read through the `f64` path, so precision
/// beyond a double is lost.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Decimal(pub f64);

macro_rules! impl_decodable_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Decodable for $ty {
                fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
                    decoder.unbox_integer()
                }
            }
        )*
    };
}

impl_decodable_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Decodable for bool {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        decoder.unbox_bool()
    }
}

impl Decodable for f32 {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        decoder.unbox_f32()
    }
}

impl Decodable for f64 {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        decoder.unbox_f64()
    }
}

impl Decodable for String {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        decoder.leaf_text("String").map(str::to_owned)
    }
}

impl Decodable for Decimal {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        decoder.unbox_f64().map(Self)
    }
}

impl Decodable for Data {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        decoder.unbox_data().map(Self)
    }
}

impl Decodable for OffsetDateTime {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        decoder.unbox_date()
    }
}

impl Decodable for Url {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        decoder.unbox_url()
    }
}

/// A copy of the node itself, for callers that want to inspect it by hand.
impl Decodable for ValueTree {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        Ok(decoder.current().clone())
    }
}

/// `None` for a null node, including a null wrapped in a single-child element.
impl<T: Decodable> Decodable for Option<T> {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        if decoder.current().is_null() {
            return Ok(None);
        }
        match T::decode(decoder) {
            Ok(value) => Ok(Some(value)),
            Err(DecodeError::ValueNotFound {
                missing: MissingValue::Null,
                ref path,
                ..
            }) if path == decoder.coding_path() => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn decode_missing() -> Option<Self> {
        Some(None)
    }
}

impl<T: Decodable> Decodable for Box<T> {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        T::decode(decoder).map(Self::new)
    }
}

impl<T: Decodable> Decodable for Vec<T> {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        let mut container = decoder.unkeyed_container()?;
        let mut elements = Self::with_capacity(container.count().unwrap_or_default());
        while !container.is_at_end() {
            elements.push(container.decode_next()?);
        }
        Ok(elements)
    }
}

impl<T: Decodable, S: BuildHasher + Default> Decodable for HashMap<String, T, S> {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        let mut container = decoder.keyed_container()?;
        container
            .all_keys()
            .into_iter()
            .map(|key| {
                let value = container.decode(&key)?;
                Ok((key, value))
            })
            .collect()
    }
}

impl<T: Decodable> Decodable for BTreeMap<String, T> {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        let mut container = decoder.keyed_container()?;
        container
            .all_keys()
            .into_iter()
            .map(|key| {
                let value = container.decode(&key)?;
                Ok((key, value))
            })
            .collect()
    }
}

impl<T: Decodable, S: BuildHasher + Default> Decodable for IndexMap<String, T, S> {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self> {
        let mut container = decoder.keyed_container()?;
        container
            .all_keys()
            .into_iter()
            .map(|key| {
                let value = container.decode(&key)?;
                Ok((key, value))
            })
            .collect()
    }
}
