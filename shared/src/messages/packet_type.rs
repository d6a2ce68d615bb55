use crate::serde::{ByteReader, ByteWriter, Serde, SerdeErr};

/// First byte of every replication payload.
///
/// Body shapes, all little-endian:
///
/// - `Spawn`     : `[objectId][owned][componentCount:u8][kindNetId:u16 ...]`
/// - `Despawn`   : `[objectId]`
/// - `FullState` : `[objectId][componentIndex:u8][kindNetId:u16][all fields]`
/// - `Delta`     : `[objectId][componentIndex:u8][8-byte mask][set fields]`
/// - `Call`      : `[objectId][componentIndex:u8][funcId:u16][arguments]`
///
/// Framing and channel selection around a payload belong to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Spawn,
    Despawn,
    FullState,
    Delta,
    Call,
}

impl Serde for PacketType {
    fn ser(&self, writer: &mut ByteWriter) {
        let tag: u8 = match self {
            PacketType::Spawn => 0,
            PacketType::Despawn => 1,
            PacketType::FullState => 2,
            PacketType::Delta => 3,
            PacketType::Call => 4,
        };
        writer.write_u8(tag);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_u8()? {
            0 => Ok(PacketType::Spawn),
            1 => Ok(PacketType::Despawn),
            2 => Ok(PacketType::FullState),
            3 => Ok(PacketType::Delta),
            4 => Ok(PacketType::Call),
            value => Err(SerdeErr::InvalidTag {
                what: "PacketType",
                value,
            }),
        }
    }
}
