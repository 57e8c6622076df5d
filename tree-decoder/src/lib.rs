//! Decodes loosely typed, string-valued document trees into strongly typed values.
//!
//! A document is parsed elsewhere into a [`ValueTree`], whose leaves are all text.
//! Types implement [`Decodable`] and read the tree through a [`Decoder`], which hands
//! out keyed, unkeyed and single-value containers. Leaf text is converted strictly:
//! numbers are never rounded, and every failure names the path of the node that
//! caused it.

pub mod containers;
pub mod decodable;
pub mod decoder;
pub mod error;
pub mod key;
pub mod options;
pub mod path;
mod state;
mod unbox;
pub mod value;

pub use containers::{KeyedContainer, SingleValueContainer, UnkeyedContainer};
pub use decodable::{Data, Decimal};
pub use decoder::{Decodable, Decoder, decode, decode_default};
pub use error::{DecodeError, MissingValue, Result};
pub use options::{
    DataDecodingStrategy, DateDecodingStrategy, DateFormatter, DecodingOptions,
    KeyDecodingStrategy, NonConformingFloatDecodingStrategy, OptionsConfig, UserInfo,
};
pub use path::{CodingPath, CodingPathComponent};
pub use value::{ValueKind, ValueTree};
