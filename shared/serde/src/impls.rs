use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::{
    bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, integer::UnsignedVariableInteger,
    serde::Serde,
};

// Upper bound on any length prefix, guards against hostile allocations.
const MAX_LENGTH: u64 = 1 << 24;

fn write_length(writer: &mut dyn BitWrite, length: usize) {
    UnsignedVariableInteger::<7>::new(length as u64).ser(writer);
}

fn read_length(reader: &mut BitReader, type_name: &'static str) -> Result<usize, SerdeErr> {
    let length = UnsignedVariableInteger::<7>::de(reader)?.get();
    if length > MAX_LENGTH {
        return Err(SerdeErr::LengthOverflow {
            type_name,
            length,
            max: MAX_LENGTH,
        });
    }
    Ok(length as usize)
}

impl Serde for bool {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(*self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_bit()
    }
}

impl Serde for u8 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_byte(*self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_byte()
    }
}

macro_rules! impl_serde_for_le_bytes {
    ($($ty:ty),*) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut dyn BitWrite) {
                    for byte in self.to_le_bytes() {
                        writer.write_byte(byte);
                    }
                }

                fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
                    let mut bytes = [0_u8; std::mem::size_of::<$ty>()];
                    for byte in bytes.iter_mut() {
                        *byte = reader.read_byte()?;
                    }
                    Ok(<$ty>::from_le_bytes(bytes))
                }
            }
        )*
    };
}

impl_serde_for_le_bytes!(u16, u32, u64, f32);

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        match self {
            Some(value) => {
                writer.write_bit(true);
                value.ser(writer);
            }
            None => writer.write_bit(false),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        if reader.read_bit()? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }
}

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_length(writer, self.len());
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let length = read_length(reader, "Vec")?;
        // capacity is bounded by what the buffer can actually hold
        let mut output = Vec::with_capacity(length.min(reader.bits_remaining() as usize));
        for _ in 0..length {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }
}

impl Serde for SocketAddr {
    fn ser(&self, writer: &mut dyn BitWrite) {
        match self.ip() {
            IpAddr::V4(ip) => {
                writer.write_bit(false);
                for byte in ip.octets() {
                    writer.write_byte(byte);
                }
            }
            IpAddr::V6(ip) => {
                writer.write_bit(true);
                for byte in ip.octets() {
                    writer.write_byte(byte);
                }
            }
        }
        self.port().ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let ip = if reader.read_bit()? {
            let mut octets = [0_u8; 16];
            for byte in octets.iter_mut() {
                *byte = reader.read_byte()?;
            }
            IpAddr::V6(Ipv6Addr::from(octets))
        } else {
            let mut octets = [0_u8; 4];
            for byte in octets.iter_mut() {
                *byte = reader.read_byte()?;
            }
            IpAddr::V4(Ipv4Addr::from(octets))
        };
        let port = u16::de(reader)?;
        Ok(SocketAddr::new(ip, port))
    }
}
