use std::borrow::Cow;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::{
    containers::UnkeyedContainer,
    decoder::{Decodable, Decoder},
    error::{DecodeError, MissingValue, Result},
    key::convert_from_snake_case,
    options::KeyDecodingStrategy,
    path::CodingPath,
    value::ValueTree,
};

/// A null node to hand out for absent keys.
static NULL: ValueTree = ValueTree::Null;

/// The key [`KeyedContainer::super_decoder`] reads.
pub const SUPER_KEY: &str = "super";

/// A map-like view of an object node.
///
/// Field names are looked up after the configured [`KeyDecodingStrategy`] has been
/// applied to the document's keys.
pub struct KeyedContainer<'d, 'a> {
    decoder: &'d mut Decoder<'a>,
    entries: IndexMap<Cow<'a, str>, &'a ValueTree>,
    coding_path: CodingPath,
}

impl<'d, 'a> KeyedContainer<'d, 'a> {
    pub(crate) fn new(
        decoder: &'d mut Decoder<'a>,
        node: &'a ValueTree,
        coding_path: CodingPath,
    ) -> Result<Self> {
        let map = match node {
            ValueTree::Object(map) => map,
            ValueTree::Array(elements) => match elements.as_slice() {
                [ValueTree::Object(map)] => {
                    debug!(path = %coding_path, "unwrapping single-element array into keyed container");
                    map
                }
                _ => {
                    return Err(DecodeError::type_mismatch(
                        "keyed container",
                        node.kind(),
                        coding_path,
                        "Expected to decode an object but found an array instead.",
                    ));
                }
            },
            ValueTree::Null => {
                return Err(DecodeError::value_not_found(
                    "keyed container",
                    MissingValue::Null,
                    coding_path,
                    "Cannot get keyed decoding container -- found null value instead.",
                ));
            }
            ValueTree::Text(_) => {
                return Err(DecodeError::type_mismatch(
                    "keyed container",
                    node.kind(),
                    coding_path,
                    "Expected to decode an object but found text instead.",
                ));
            }
        };

        let strategy = &decoder.options().key_decoding_strategy;
        let mut entries = IndexMap::with_capacity(map.len());
        for (key, value) in map {
            let key = match strategy {
                KeyDecodingStrategy::UseDefaultKeys => Cow::Borrowed(key.as_str()),
                KeyDecodingStrategy::ConvertFromSnakeCase => {
                    Cow::Owned(convert_from_snake_case(key))
                }
                KeyDecodingStrategy::Custom(f) => {
                    Cow::Owned(f(&coding_path.appending(key.as_str())))
                }
            };
            // The first document key wins when two convert to the same name.
            entries.entry(key).or_insert(value);
        }
        trace!(path = %coding_path, keys = entries.len(), "keyed container");

        Ok(Self {
            decoder,
            entries,
            coding_path,
        })
    }

    /// Returns the location of this container's node.
    #[must_use]
    pub const fn coding_path(&self) -> &CodingPath {
        &self.coding_path
    }

    /// Returns every (converted) key of this container, in document order.
    #[must_use]
    pub fn all_keys(&self) -> IndexSet<String> {
        self.entries.keys().map(ToString::to_string).collect()
    }

    /// Whether the container has an entry for `key`, null or not.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn entry(&self, key: &str) -> Result<&'a ValueTree> {
        self.entries.get(key).copied().ok_or_else(|| {
            DecodeError::key_not_found(
                key,
                self.coding_path.clone(),
                format!("No value associated with key \"{key}\"."),
            )
        })
    }

    /// Whether the entry for `key` is null. Fails with `KeyNotFound` if there is no entry.
    pub fn decode_nil(&self, key: &str) -> Result<bool> {
        self.entry(key).map(ValueTree::is_null)
    }

    /// Decodes the entry for `key`.
    ///
    /// A missing key is a `KeyNotFound` error unless `T` provides a
    /// [missing value](Decodable::decode_missing), as `Option` does.
    pub fn decode<T: Decodable>(&mut self, key: &str) -> Result<T> {
        let Some(node) = self.entries.get(key).copied() else {
            return T::decode_missing().ok_or_else(|| {
                DecodeError::key_not_found(
                    key,
                    self.coding_path.clone(),
                    format!("No value associated with key \"{key}\"."),
                )
            });
        };
        let path = self.coding_path.appending(key);
        self.decoder.decode_nested(node, path)
    }

    /// Decodes the entry for `key`, or returns `None` if it is absent or null.
    ///
    /// A value that is present but malformed is still an error.
    pub fn decode_if_present<T: Decodable>(&mut self, key: &str) -> Result<Option<T>> {
        let Some(node) = self.entries.get(key).copied() else {
            return Ok(None);
        };
        if node.is_null() {
            return Ok(None);
        }
        let path = self.coding_path.appending(key);
        match self.decoder.decode_nested(node, path.clone()) {
            Ok(value) => Ok(Some(value)),
            Err(DecodeError::ValueNotFound { path: failed, .. }) if failed == path => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Returns a keyed container for the object stored under `key`.
    pub fn nested_keyed_container(&mut self, key: &str) -> Result<KeyedContainer<'_, 'a>> {
        let node = self.entry(key)?;
        KeyedContainer::new(self.decoder, node, self.coding_path.appending(key))
    }

    /// Returns an unkeyed container for the sequence stored under `key`.
    pub fn nested_unkeyed_container(&mut self, key: &str) -> Result<UnkeyedContainer<'_, 'a>> {
        let node = self.entry(key)?;
        UnkeyedContainer::new(self.decoder, node, self.coding_path.appending(key))
    }

    /// Returns a decoder for the entry stored under [`SUPER_KEY`], for decoding a parent schema.
    ///
    /// A missing entry yields a decoder over a null node.
    #[must_use]
    pub fn super_decoder(&self) -> Decoder<'a> {
        self.super_decoder_for_key(SUPER_KEY)
    }

    /// Returns a decoder for the entry stored under `key`.
    ///
    /// A missing entry yields a decoder over a null node.
    #[must_use]
    pub fn super_decoder_for_key(&self, key: &str) -> Decoder<'a> {
        let node = self.entries.get(key).copied().unwrap_or(&NULL);
        Decoder::nested(node, self.decoder.options(), self.coding_path.appending(key))
    }
}
