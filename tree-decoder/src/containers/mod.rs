//! The three views a [`Decoder`](crate::Decoder) offers over a node.

mod keyed;
mod single_value;
mod unkeyed;

pub use keyed::{KeyedContainer, SUPER_KEY};
pub use single_value::SingleValueContainer;
pub use unkeyed::UnkeyedContainer;
