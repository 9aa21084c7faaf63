use crate::{bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, serde::Serde};

pub type UnsignedInteger<const BITS: u8> = SerdeUnsigned<false, BITS>;
pub type UnsignedVariableInteger<const BITS: u8> = SerdeUnsigned<true, BITS>;

// The outer generic wraps a non-generic inner type to keep monomorphization small.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SerdeUnsigned<const VARIABLE: bool, const BITS: u8> {
    inner: SerdeUnsignedInner,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
struct SerdeUnsignedInner {
    value: u64,
    variable: bool,
    bits: u8,
}

impl SerdeUnsignedInner {
    fn new(variable: bool, bits: u8, value: u64) -> Self {
        if bits == 0 || bits > 63 {
            panic!("an unsigned integer needs between 1 and 63 bits, got {}", bits);
        }
        if !variable && value >= (1_u64 << bits) {
            panic!(
                "with {} bits, can't encode number greater than {}",
                bits,
                (1_u64 << bits) - 1
            );
        }
        Self {
            value,
            variable,
            bits,
        }
    }

    fn ser(&self, writer: &mut dyn BitWrite) {
        let mut value = self.value;

        if self.variable {
            loop {
                let proceed = value >= (1_u64 << self.bits);
                writer.write_bit(proceed);
                for _ in 0..self.bits {
                    writer.write_bit(value & 1 != 0);
                    value >>= 1;
                }
                if !proceed {
                    return;
                }
            }
        } else {
            for _ in 0..self.bits {
                writer.write_bit(value & 1 != 0);
                value >>= 1;
            }
        }
    }

    fn de(reader: &mut BitReader, variable: bool, bits: u8) -> Result<Self, SerdeErr> {
        let mut output: u64 = 0;
        let mut shift: u32 = 0;

        loop {
            let proceed = if variable { reader.read_bit()? } else { false };

            for _ in 0..bits {
                if reader.read_bit()? {
                    if shift >= 64 {
                        return Err(SerdeErr::LengthOverflow {
                            type_name: "UnsignedVariableInteger",
                            length: u64::from(shift),
                            max: 64,
                        });
                    }
                    output |= 1 << shift;
                }
                shift += 1;
            }

            if !proceed {
                return Ok(Self {
                    value: output,
                    variable,
                    bits,
                });
            }
        }
    }
}

impl<const VARIABLE: bool, const BITS: u8> SerdeUnsigned<VARIABLE, BITS> {
    pub fn new<T: Into<u64>>(value: T) -> Self {
        Self {
            inner: SerdeUnsignedInner::new(VARIABLE, BITS, value.into()),
        }
    }

    pub fn get(&self) -> u64 {
        self.inner.value
    }
}

impl<const VARIABLE: bool, const BITS: u8> Serde for SerdeUnsigned<VARIABLE, BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.inner.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let inner = SerdeUnsignedInner::de(reader, VARIABLE, BITS)?;
        Ok(Self { inner })
    }
}
