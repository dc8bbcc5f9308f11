use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::Result;

/// A value that can be read from its little-endian wire representation.
pub trait ReadWire: Sized {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read;
}

/// A value that can be written in its little-endian wire representation.
pub trait WriteWire {
    fn wire_len(&self) -> u16;

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write;
}

pub trait ReadWireExt: Read + Sized {
    fn read_wire<T>(&mut self) -> Result<T>
    where
        T: ReadWire,
    {
        T::read_wire(self)
    }
}

impl<R> ReadWireExt for R where R: Read {}

pub trait WriteWireExt: Write + Sized {
    fn write_wire<T>(&mut self, value: T) -> Result<()>
    where
        T: WriteWire,
    {
        value.write_wire(self)
    }
}

impl<W> WriteWireExt for W where W: Write {}

impl ReadWire for u8 {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(r.read_u8()?)
    }
}

impl WriteWire for u8 {
    fn wire_len(&self) -> u16 {
        1
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_u8(self)?;
        Ok(())
    }
}

impl ReadWire for u16 {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(r.read_u16::<LittleEndian>()?)
    }
}

impl WriteWire for u16 {
    fn wire_len(&self) -> u16 {
        2
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_u16::<LittleEndian>(self)?;
        Ok(())
    }
}

impl ReadWire for u32 {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(r.read_u32::<LittleEndian>()?)
    }
}

impl WriteWire for u32 {
    fn wire_len(&self) -> u16 {
        4
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_u32::<LittleEndian>(self)?;
        Ok(())
    }
}

impl ReadWire for u64 {
    fn read_wire<R>(r: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(r.read_u64::<LittleEndian>()?)
    }
}

impl WriteWire for u64 {
    fn wire_len(&self) -> u16 {
        8
    }

    fn write_wire<W>(self, w: &mut W) -> Result<()>
    where
        W: Write,
    {
        w.write_u64::<LittleEndian>(self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn integers_are_little_endian() {
        let mut buffer = Vec::new();
        buffer.write_wire(0x1234 as u16).unwrap();
        buffer.write_wire(0xDEADBEEF as u32).unwrap();
        assert_eq!(buffer, [0x34, 0x12, 0xEF, 0xBE, 0xAD, 0xDE]);

        let mut cursor = Cursor::new(&buffer);
        let short: u16 = cursor.read_wire().unwrap();
        let long: u32 = cursor.read_wire().unwrap();
        assert_eq!(short, 0x1234);
        assert_eq!(long, 0xDEADBEEF);
    }

    #[test]
    fn short_read_is_an_error() {
        let mut cursor = Cursor::new(&[0x01][..]);
        assert!(u16::read_wire(&mut cursor).is_err());
    }
}
