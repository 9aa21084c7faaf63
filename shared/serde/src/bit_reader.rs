use crate::error::SerdeErr;

pub struct BitReader<'b> {
    buffer: &'b [u8],
    position: u32,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    fn bits_available(&self) -> u32 {
        (self.buffer.len() as u32) * 8
    }

    pub fn bits_remaining(&self) -> u32 {
        self.bits_available().saturating_sub(self.position)
    }

    /// True once fewer than eight bits remain, i.e. only flush padding is left
    pub fn is_exhausted(&self) -> bool {
        self.bits_remaining() < 8
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        if self.position >= self.bits_available() {
            return Err(SerdeErr::EndOfBuffer {
                bits_read: self.position,
                bits_available: self.bits_available(),
            });
        }
        let byte = self.buffer[(self.position / 8) as usize];
        let bit = (byte >> (self.position % 8)) & 1 != 0;
        self.position += 1;
        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let mut output: u8 = 0;
        for index in 0..8 {
            if self.read_bit()? {
                output |= 1 << index;
            }
        }
        Ok(output)
    }
}
