//! # Cellrep Serde
//! Bit-level readers and writers, and the `Serde` trait implemented by
//! everything that crosses a cell-to-cell channel.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bit_reader;
mod bit_writer;
mod error;
mod impls;
mod integer;
mod serde;

pub use bit_reader::BitReader;
pub use bit_writer::{BitCounter, BitWrite, BitWriter};
pub use error::SerdeErr;
pub use integer::{UnsignedInteger, UnsignedVariableInteger};
pub use serde::Serde;
