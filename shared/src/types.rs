use crate::{
    bigmap::BigMapKey,
    serde::{ByteReader, ByteWriter, Serde, SerdeErr},
};

pub type Tick = u16;

/// Index of a component within its object's ordered component list
pub type ComponentIndex = u8;

/// Which side of the connection this host is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}

impl HostType {
    pub fn invert(self) -> Self {
        match self {
            HostType::Server => HostType::Client,
            HostType::Client => HostType::Server,
        }
    }
}

/// Network identity of a replicated object.
///
/// Assigned once by the server when the object is spawned, never reused for
/// the lifetime of the [`Server`](../../mimic_server), and shared verbatim
/// with every peer on the wire.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl BigMapKey for ObjectId {
    fn to_u64(&self) -> u64 {
        self.0
    }

    fn from_u64(value: u64) -> Self {
        ObjectId(value)
    }
}

impl Serde for ObjectId {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u64(self.0);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(ObjectId(reader.read_u64()?))
    }
}

/// Logical partition ("scene") a replicated object can be assigned to
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct PartitionId(pub u32);

impl Serde for PartitionId {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.0);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(PartitionId(reader.read_u32()?))
    }
}
