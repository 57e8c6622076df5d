//! The [`Decodable`] trait and the [`Decoder`] it decodes itself through.
//!
//! A [`Decoder`] always points at one node of the tree. A type reads that node by
//! asking the decoder for the container matching the node's shape:
//!
//! - [`Decoder::keyed_container`] for objects (structs, maps),
//! - [`Decoder::unkeyed_container`] for sequences,
//! - [`Decoder::single_value_container`] for leaves.
//!
//! ```
//! use tree_decoder::{Decodable, Decoder, ValueTree, decode_default};
//!
//! #[derive(Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl Decodable for Point {
//!     fn decode(decoder: &mut Decoder<'_>) -> tree_decoder::Result<Self> {
//!         let mut container = decoder.keyed_container()?;
//!         Ok(Self {
//!             x: container.decode("x")?,
//!             y: container.decode("y")?,
//!         })
//!     }
//! }
//!
//! let tree = ValueTree::object([("x", ValueTree::text("3")), ("y", ValueTree::text("-4"))]);
//! assert_eq!(decode_default::<Point>(&tree).unwrap(), Point { x: 3, y: -4 });
//! ```

use std::any::type_name;

use tracing::trace;

use crate::{
    containers::{KeyedContainer, SingleValueContainer, UnkeyedContainer},
    error::Result,
    options::{DecodingOptions, UserInfo},
    path::CodingPath,
    state::DecodingState,
    value::ValueTree,
};

/// A type that can build itself from a [`ValueTree`] node.
pub trait Decodable: Sized {
    /// Decodes a value from the node `decoder` currently points at.
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self>;

    /// Returns the value to use when a keyed container has no entry for the field.
    ///
    /// `None` (the default) makes a missing key an error.
    #[must_use]
    fn decode_missing() -> Option<Self> {
        None
    }
}

/// Decodes a `T` from `tree` using `options`.
pub fn decode<T: Decodable>(tree: &ValueTree, options: &DecodingOptions) -> Result<T> {
    trace!("decoding {} from a {} root", type_name::<T>(), tree.kind());
    let mut decoder = Decoder::new(tree, options);
    T::decode(&mut decoder)
}

/// Decodes a `T` from `tree` using the default [`DecodingOptions`].
pub fn decode_default<T: Decodable>(tree: &ValueTree) -> Result<T> {
    decode(tree, &DecodingOptions::default())
}

/// The façade through which [`Decodable`] types read the tree.
#[derive(Debug)]
pub struct Decoder<'a> {
    state: DecodingState<'a>,
    options: &'a DecodingOptions,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder rooted at `root`.
    #[must_use]
    pub const fn new(root: &'a ValueTree, options: &'a DecodingOptions) -> Self {
        Self {
            state: DecodingState::new(root),
            options,
        }
    }

    /// Creates an independent decoder rooted at `node`, reporting errors under `path`.
    pub(crate) fn nested(
        node: &'a ValueTree,
        options: &'a DecodingOptions,
        path: CodingPath,
    ) -> Self {
        let mut decoder = Self::new(node, options);
        decoder.state.push(node, path);
        decoder
    }

    /// Returns the node this decoder currently points at.
    #[must_use]
    pub const fn current(&self) -> &'a ValueTree {
        self.state.current()
    }

    /// Returns the location of the current node in the document.
    #[must_use]
    pub const fn coding_path(&self) -> &CodingPath {
        self.state.coding_path()
    }

    #[must_use]
    pub const fn options(&self) -> &'a DecodingOptions {
        self.options
    }

    #[must_use]
    pub const fn user_info(&self) -> &'a UserInfo {
        &self.options.user_info
    }

    /// Returns how many nodes have been descended into from the root.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.state.depth()
    }

    /// Views the current node as a map of fields.
    ///
    /// Fails with `ValueNotFound` for a null node and `TypeMismatch` for text or arrays,
    /// except an array holding exactly one object, which is unwrapped.
    pub fn keyed_container(&mut self) -> Result<KeyedContainer<'_, 'a>> {
        let node = self.current();
        let path = self.coding_path().clone();
        KeyedContainer::new(self, node, path)
    }

    /// Views the current node as a sequence.
    ///
    /// Fails with `ValueNotFound` for a null node and `TypeMismatch` for text.
    /// An object is treated as a sequence of one element.
    pub fn unkeyed_container(&mut self) -> Result<UnkeyedContainer<'_, 'a>> {
        let node = self.current();
        let path = self.coding_path().clone();
        UnkeyedContainer::new(self, node, path)
    }

    /// Views the current node as a single value.
    pub const fn single_value_container(&mut self) -> SingleValueContainer<'_, 'a> {
        SingleValueContainer::new(self)
    }

    /// Decodes `node` as a `T`, with `node` on top of the stack for the duration of the call.
    ///
    /// The node is popped again whether or not decoding succeeds.
    pub(crate) fn decode_nested<T: Decodable>(
        &mut self,
        node: &'a ValueTree,
        path: CodingPath,
    ) -> Result<T> {
        self.state.push(node, path);
        let result = T::decode(self);
        self.state.pop();
        result
    }
}
