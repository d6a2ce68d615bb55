use super::{error::SerdeErr, reader::ByteReader, serde::Serde, writer::ByteWriter};

// Primitive impls. Everything is little-endian on the wire; signed integers
// reuse the unsigned paths via two's-complement casts.

impl Serde for bool {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u8(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(SerdeErr::InvalidTag {
                what: "bool",
                value,
            }),
        }
    }
}

impl Serde for u8 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u8(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_u8()
    }
}

impl Serde for u16 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u16(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_u16()
    }
}

impl Serde for u32 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u32(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_u32()
    }
}

impl Serde for u64 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u64(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_u64()
    }
}

impl Serde for i8 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u8(*self as u8);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(reader.read_u8()? as i8)
    }
}

impl Serde for i16 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u16(*self as u16);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(reader.read_u16()? as i16)
    }
}

impl Serde for i32 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u32(*self as u32);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(reader.read_u32()? as i32)
    }
}

impl Serde for i64 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u64(*self as u64);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(reader.read_u64()? as i64)
    }
}

impl Serde for f32 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_f32(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_f32()
    }
}

impl Serde for f64 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_f64(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_f64()
    }
}

// Strings and sequences are u16-length-prefixed. Payloads this engine emits
// are far below that bound; hosts feeding user data through a Property are
// responsible for staying under it.

impl Serde for String {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u16(self.len() as u16);
        writer.write_bytes(self.as_bytes());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = reader.read_u16()? as usize;
        let bytes = reader.read_bytes(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SerdeErr::BadString)
    }
}

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            None => writer.write_u8(0),
            Some(value) => {
                writer.write_u8(1);
                value.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_u8()? {
            0 => Ok(None),
            1 => Ok(Some(T::de(reader)?)),
            value => Err(SerdeErr::InvalidTag {
                what: "Option",
                value,
            }),
        }
    }
}

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u16(self.len() as u16);
        for value in self {
            value.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = reader.read_u16()? as usize;
        let mut values = Vec::with_capacity(length.min(256));
        for _ in 0..length {
            values.push(T::de(reader)?);
        }
        Ok(values)
    }
}

impl<T: Serde + Default + Copy, const N: usize> Serde for [T; N] {
    fn ser(&self, writer: &mut ByteWriter) {
        for value in self {
            value.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let mut values = [T::default(); N];
        for value in values.iter_mut() {
            *value = T::de(reader)?;
        }
        Ok(values)
    }
}

impl<A: Serde, B: Serde> Serde for (A, B) {
    fn ser(&self, writer: &mut ByteWriter) {
        self.0.ser(writer);
        self.1.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok((A::de(reader)?, B::de(reader)?))
    }
}

impl<A: Serde, B: Serde, C: Serde> Serde for (A, B, C) {
    fn ser(&self, writer: &mut ByteWriter) {
        self.0.ser(writer);
        self.1.ser(writer);
        self.2.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok((A::de(reader)?, B::de(reader)?, C::de(reader)?))
    }
}
