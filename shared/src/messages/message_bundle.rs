use cellrep_serde::{BitReader, BitWriter, Serde, SerdeErr, UnsignedVariableInteger};

use super::cell_message::CellMessage;

/// Frames the messages queued on a channel between two flushes
pub struct MessageBundle;

impl MessageBundle {
    pub fn write(messages: &[CellMessage]) -> Vec<u8> {
        let mut writer = BitWriter::new();
        // same framing as a serialized Vec<CellMessage>
        UnsignedVariableInteger::<7>::new(messages.len() as u64).ser(&mut writer);
        for message in messages {
            message.ser(&mut writer);
        }
        writer.to_bytes()
    }

    pub fn read(payload: &[u8]) -> Result<Vec<CellMessage>, SerdeErr> {
        let mut reader = BitReader::new(payload);
        Vec::<CellMessage>::de(&mut reader)
    }
}
