use crate::{
    decoder::{Decodable, Decoder},
    error::Result,
    path::CodingPath,
};

/// A view of the current node as one value.
pub struct SingleValueContainer<'d, 'a> {
    decoder: &'d mut Decoder<'a>,
}

impl<'d, 'a> SingleValueContainer<'d, 'a> {
    pub(crate) const fn new(decoder: &'d mut Decoder<'a>) -> Self {
        Self { decoder }
    }

    #[must_use]
    pub const fn coding_path(&self) -> &CodingPath {
        self.decoder.coding_path()
    }

    /// Whether the node is null.
    #[must_use]
    pub const fn decode_nil(&self) -> bool {
        self.decoder.current().is_null()
    }

    /// Decodes the node as a `T`.
    pub fn decode<T: Decodable>(&mut self) -> Result<T> {
        T::decode(self.decoder)
    }
}
