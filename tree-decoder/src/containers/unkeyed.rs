use std::slice;

use tracing::{debug, trace};

use crate::{
    containers::KeyedContainer,
    decoder::{Decodable, Decoder},
    error::{DecodeError, MissingValue, Result},
    path::CodingPath,
    value::ValueTree,
};

/// A sequential view of an array node.
///
/// The cursor only moves forward after an element was decoded successfully, so a
/// failed element can be retried or skipped by the caller.
pub struct UnkeyedContainer<'d, 'a> {
    decoder: &'d mut Decoder<'a>,
    elements: &'a [ValueTree],
    current_index: usize,
    coding_path: CodingPath,
}

impl<'d, 'a> UnkeyedContainer<'d, 'a> {
    pub(crate) fn new(
        decoder: &'d mut Decoder<'a>,
        node: &'a ValueTree,
        coding_path: CodingPath,
    ) -> Result<Self> {
        let elements = match node {
            ValueTree::Array(elements) => elements.as_slice(),
            ValueTree::Object(_) => {
                debug!(path = %coding_path, "treating object as a single-element sequence");
                slice::from_ref(node)
            }
            ValueTree::Null => {
                return Err(DecodeError::value_not_found(
                    "unkeyed container",
                    MissingValue::Null,
                    coding_path,
                    "Cannot get unkeyed decoding container -- found null value instead.",
                ));
            }
            ValueTree::Text(_) => {
                return Err(DecodeError::type_mismatch(
                    "unkeyed container",
                    node.kind(),
                    coding_path,
                    "Expected to decode an array but found text instead.",
                ));
            }
        };
        trace!(path = %coding_path, count = elements.len(), "unkeyed container");

        Ok(Self {
            decoder,
            elements,
            current_index: 0,
            coding_path,
        })
    }

    /// Returns the location of this container's node.
    #[must_use]
    pub const fn coding_path(&self) -> &CodingPath {
        &self.coding_path
    }

    /// Returns the number of elements. The tree is fully materialized, so this is always known.
    #[must_use]
    pub const fn count(&self) -> Option<usize> {
        Some(self.elements.len())
    }

    #[must_use]
    pub const fn is_at_end(&self) -> bool {
        self.current_index >= self.elements.len()
    }

    /// Returns the index of the next element to decode.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// Returns the next element, or a `ValueNotFound` error if the container is exhausted.
    fn next_element(&self, expected: &'static str) -> Result<&'a ValueTree> {
        self.elements.get(self.current_index).ok_or_else(|| {
            DecodeError::value_not_found(
                expected,
                MissingValue::EndOfContainer,
                self.coding_path.appending(self.current_index),
                "Unkeyed container is at end.",
            )
        })
    }

    fn element_path(&self) -> CodingPath {
        self.coding_path.appending(self.current_index)
    }

    /// Consumes the next element if it is null.
    pub fn decode_nil(&mut self) -> Result<bool> {
        let node = self.next_element("null")?;
        if node.is_null() {
            self.current_index += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Decodes the next element and advances the cursor.
    pub fn decode_next<T: Decodable>(&mut self) -> Result<T> {
        let node = self.next_element(std::any::type_name::<T>())?;
        let path = self.element_path();
        let value = self.decoder.decode_nested(node, path)?;
        self.current_index += 1;
        Ok(value)
    }

    /// Decodes the next element, returning `None` at the end or for a null element.
    pub fn decode_next_if_present<T: Decodable>(&mut self) -> Result<Option<T>> {
        if self.is_at_end() || self.decode_nil()? {
            return Ok(None);
        }
        self.decode_next().map(Some)
    }

    /// Returns a keyed container for the next element and advances the cursor.
    pub fn nested_keyed_container(&mut self) -> Result<KeyedContainer<'_, 'a>> {
        let node = self.next_element("keyed container")?;
        let path = self.element_path();
        let container = KeyedContainer::new(self.decoder, node, path)?;
        self.current_index += 1;
        Ok(container)
    }

    /// Returns an unkeyed container for the next element and advances the cursor.
    pub fn nested_unkeyed_container(&mut self) -> Result<UnkeyedContainer<'_, 'a>> {
        let node = self.next_element("unkeyed container")?;
        let path = self.element_path();
        let container = UnkeyedContainer::new(self.decoder, node, path)?;
        self.current_index += 1;
        Ok(container)
    }

    /// Returns an independent decoder for the next element and advances the cursor.
    pub fn super_decoder(&mut self) -> Result<Decoder<'a>> {
        let node = self.next_element("decoder")?;
        let path = self.element_path();
        let decoder = Decoder::nested(node, self.decoder.options(), path);
        self.current_index += 1;
        Ok(decoder)
    }
}
