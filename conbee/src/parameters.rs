use std::convert::TryFrom;
use std::fmt::{self, Display};
use std::io::{Cursor, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{Error, ErrorKind, Result};

macro_rules! define_parameters {
    ($(($param:ident, $id:expr, $ty:ty)),+ $(,)?) => {
        pub const PARAMETERS: &[ParameterId] = &[$(ParameterId::$param),+];

        #[derive(Copy, Clone, Debug, Eq, PartialEq)]
        pub enum ParameterId {
            $($param),+
        }

        #[derive(Clone, Debug, PartialEq)]
        pub enum Parameter {
            $($param($ty)),+
        }

        impl Parameter {
            pub fn id(&self) -> ParameterId {
                match self {
                    $(Parameter::$param(_) => ParameterId::$param),+
                }
            }

            pub fn len(&self) -> u16 {
                match self {
                    $(Parameter::$param(value) => ConvertParameter::len(value)),+
                }
            }

            pub fn write<W>(&self, buffer: W) -> Result<()>
            where
                W: Write,
            {
                match self {
                    $(Parameter::$param(value) => ConvertParameter::write(value, buffer)),+
                }
            }
        }

        impl ParameterId {
            pub fn read_parameter(&self, buffer: &[u8]) -> Result<Parameter> {
                match self {
                    $(
                        ParameterId::$param => {
                            let param = ConvertParameter::read(buffer)
                                .map_err(|err| {
                                    Error {
                                        kind: ErrorKind::InvalidParameter {
                                            parameter_id: *self,
                                            inner: Box::new(err),
                                        }
                                    }
                                })?;
                            Ok(Parameter::$param(param))
                        }
                    )+
                }
            }
        }

        impl Display for ParameterId {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(ParameterId::$param => write!(f, "{} ({})", stringify!($param), $id)),+
                }
            }
        }

        impl TryFrom<u8> for ParameterId {
            type Error = Error;

            fn try_from(byte: u8) -> Result<Self> {
                match byte {
                    $($id => Ok(ParameterId::$param),)+
                    _ => Err(Error { kind: ErrorKind::UnsupportedParameter(byte) }),
                }
            }
        }

        impl From<ParameterId> for u8 {
            fn from(id: ParameterId) -> u8 {
                match id {
                    $(ParameterId::$param => $id,)+
                }
            }
        }
    };
}

define_parameters! {
    (MacAddress, 0x01, u64),
    (NwkPanId, 0x05, u16),
    (NwkAddress, 0x07, u16),
    (NwkExtendedPanId, 0x08, u64),
    (ApsDesignatedCoordinator, 0x09, u8),
    (ChannelMask, 0x0A, u32),
    (ApsExtendedPanId, 0x0B, u64),
    (TrustCenterAddress, 0x0E, u64),
    (SecurityMode, 0x10, u8),
    (Endpoint, 0x13, Vec<u8>),
    (NetworkKey, 0x18, [u8; 16]),
    (CurrentChannel, 0x1C, u8),
    (PermitJoin, 0x21, u8),
    (ProtocolVersion, 0x22, u16),
    (NwkUpdateId, 0x24, u8),
    (WatchdogTtl, 0x26, u32),
}

trait ConvertParameter: Sized {
    fn len(&self) -> u16;
    fn read(buffer: &[u8]) -> Result<Self>;
    fn write<W>(&self, buffer: W) -> Result<()>
    where
        W: Write;
}

impl ConvertParameter for u8 {
    fn len(&self) -> u16 {
        1
    }

    fn read(buffer: &[u8]) -> Result<Self> {
        Ok(Cursor::new(buffer).read_u8()?)
    }

    fn write<W>(&self, mut buffer: W) -> Result<()>
    where
        W: Write,
    {
        buffer.write_u8(*self)?;
        Ok(())
    }
}

impl ConvertParameter for u16 {
    fn len(&self) -> u16 {
        2
    }

    fn read(buffer: &[u8]) -> Result<Self> {
        Ok(Cursor::new(buffer).read_u16::<LittleEndian>()?)
    }

    fn write<W>(&self, mut buffer: W) -> Result<()>
    where
        W: Write,
    {
        buffer.write_u16::<LittleEndian>(*self)?;
        Ok(())
    }
}

impl ConvertParameter for u32 {
    fn len(&self) -> u16 {
        4
    }

    fn read(buffer: &[u8]) -> Result<Self> {
        Ok(Cursor::new(buffer).read_u32::<LittleEndian>()?)
    }

    fn write<W>(&self, mut buffer: W) -> Result<()>
    where
        W: Write,
    {
        buffer.write_u32::<LittleEndian>(*self)?;
        Ok(())
    }
}

impl ConvertParameter for u64 {
    fn len(&self) -> u16 {
        8
    }

    fn read(buffer: &[u8]) -> Result<Self> {
        Ok(Cursor::new(buffer).read_u64::<LittleEndian>()?)
    }

    fn write<W>(&self, mut buffer: W) -> Result<()>
    where
        W: Write,
    {
        buffer.write_u64::<LittleEndian>(*self)?;
        Ok(())
    }
}

impl ConvertParameter for [u8; 16] {
    fn len(&self) -> u16 {
        16
    }

    fn read(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < 16 {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        let mut key = [0; 16];
        key.copy_from_slice(&buffer[..16]);
        Ok(key)
    }

    fn write<W>(&self, mut buffer: W) -> Result<()>
    where
        W: Write,
    {
        buffer.write_all(self)?;
        Ok(())
    }
}

impl ConvertParameter for Vec<u8> {
    fn len(&self) -> u16 {
        Vec::len(self) as u16
    }

    fn read(buffer: &[u8]) -> Result<Self> {
        Ok(buffer.to_vec())
    }

    fn write<W>(&self, mut buffer: W) -> Result<()>
    where
        W: Write,
    {
        buffer.write_all(self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::*;

    #[test]
    fn parameter_ids_round_trip() {
        for id in PARAMETERS {
            assert_eq!(ParameterId::try_from(u8::from(*id)).unwrap(), *id);
        }
    }

    #[test]
    fn unknown_parameter_id_is_rejected() {
        assert!(ParameterId::try_from(0x7F).is_err());
    }

    #[test]
    fn scalar_parameters_round_trip() {
        let mut buffer = Vec::new();
        Parameter::NwkPanId(0x1A62).write(&mut buffer).unwrap();
        assert_eq!(buffer, [0x62, 0x1A]);
        assert_eq!(
            ParameterId::NwkPanId.read_parameter(&buffer).unwrap(),
            Parameter::NwkPanId(0x1A62)
        );
    }

    #[test]
    fn network_key_round_trips() {
        let key = [7; 16];
        let mut buffer = Vec::new();
        Parameter::NetworkKey(key).write(&mut buffer).unwrap();
        assert_eq!(buffer.len(), 16);
        assert_eq!(
            ParameterId::NetworkKey.read_parameter(&buffer).unwrap(),
            Parameter::NetworkKey(key)
        );
    }

    #[test]
    fn short_network_key_is_invalid() {
        assert!(ParameterId::NetworkKey.read_parameter(&[1, 2, 3]).is_err());
    }

    #[test]
    fn endpoint_parameter_is_raw_bytes() {
        let descriptor = vec![0x00, 0x01, 0x04, 0x01];
        let parameter = ParameterId::Endpoint.read_parameter(&descriptor).unwrap();
        assert_eq!(parameter, Parameter::Endpoint(descriptor.clone()));
        assert_eq!(parameter.len(), 4);
    }
}
