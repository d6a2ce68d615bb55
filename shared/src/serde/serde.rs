use super::{error::SerdeErr, reader::ByteReader, writer::ByteWriter};

/// A type that can be written to and read from replication payloads.
///
/// Replicated field types, remote-call argument types, and the engine's own
/// wire structures all go through this trait. `PartialEq` is required
/// because change tracking compares by value before marking a field dirty.
pub trait Serde: Clone + PartialEq + Sized {
    /// Writes self into outgoing payload bytes
    fn ser(&self, writer: &mut ByteWriter);

    /// Reads self from incoming payload bytes
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;
}
