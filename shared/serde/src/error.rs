use thiserror::Error;

/// Errors raised while reading a value back out of a bit stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The reader ran past the end of its buffer
    #[error("Attempted to read past the end of the buffer ({bits_read} of {bits_available} bits consumed)")]
    EndOfBuffer {
        bits_read: u32,
        bits_available: u32,
    },

    /// An enum discriminant did not match any known variant
    #[error("Invalid {type_name} discriminant {value}")]
    InvalidDiscriminant {
        type_name: &'static str,
        value: u8,
    },

    /// A length prefix exceeded the configured maximum
    #[error("Length {length} exceeds maximum {max} while reading {type_name}")]
    LengthOverflow {
        type_name: &'static str,
        length: u64,
        max: u64,
    },
}
