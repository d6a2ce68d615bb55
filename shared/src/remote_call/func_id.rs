use crate::serde::{ByteReader, ByteWriter, Serde, SerdeErr};

/// Stable identifier of a remote-callable method.
///
/// Derived deterministically from the method's declared signature so every
/// peer build computes the same value; transmitted on the wire in place of
/// the method name. Uniqueness within a type hierarchy is enforced at
/// registration, where a collision is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(u16);

impl FuncId {
    /// FNV-1a over the signature string, folded down to 16 bits
    pub fn from_signature(signature: &str) -> Self {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in signature.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        let folded = (hash ^ (hash >> 16) ^ (hash >> 32) ^ (hash >> 48)) as u16;
        Self(folded)
    }

    pub fn from_raw(value: u16) -> Self {
        Self(value)
    }

    pub fn to_raw(self) -> u16 {
        self.0
    }
}

impl Serde for FuncId {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u16(self.0);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self(reader.read_u16()?))
    }
}
