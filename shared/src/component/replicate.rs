use std::any::Any;

use crate::serde::{ByteReader, ByteWriter, SerdeErr};

use super::{component_kinds::ComponentKind, diff_mask::DiffMask, property_mutate::PropertyMutator};

/// The contract every replicated component implements.
///
/// Implementations are normally produced by the code-generation collaborator
/// from the component's declared fields; hand-written impls are equivalent
/// as long as they obey the ordering rules:
///
/// - `write_full` writes every field in flattened declaration order, with no
///   mask prefix.
/// - `write_delta` writes the full 8-byte mask first, then exactly the
///   fields whose bits are set, in declaration order. An all-clear mask
///   writes the mask alone.
/// - `read_full` reads every field in declaration order, assigning each
///   before its change hook runs.
/// - `read_delta` reads the mask, then each set-bit field in order, and
///   returns the mask it applied so a relaying host can merge it into its
///   own dirty state.
pub trait Replicate: Any {
    fn kind(&self) -> ComponentKind;

    /// Fields across the whole flattened chain
    fn field_count(&self) -> u8;

    /// Hands every property its handle into the component's dirty tracker
    fn set_mutator(&mut self, mutator: &PropertyMutator);

    fn write_full(&self, writer: &mut ByteWriter);

    fn write_delta(&self, mask: &DiffMask, writer: &mut ByteWriter);

    fn read_full(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr>;

    fn read_delta(&mut self, reader: &mut ByteReader) -> Result<DiffMask, SerdeErr>;

    fn to_any(&self) -> &dyn Any;

    fn to_any_mut(&mut self) -> &mut dyn Any;
}
