//! # Utility Functions and Types
//!
//! Bit-level field reading and the CRC used by PSI sections.
//!
//! ```rust
//! use tslive::utils::{BitReader, Crc32Mpeg2};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = vec![0b10110011u8];
//! let mut reader = BitReader::new(&data);
//! assert_eq!(reader.read_bits(3)?, 0b101);
//!
//! let crc = Crc32Mpeg2::new();
//! assert_eq!(crc.calculate(&[0x01, 0x01]), 0xD66FB816);
//! # Ok(())
//! # }
//! ```

/// Bitstream reading utilities
pub mod bits;

/// CRC calculation implementations
pub mod crc;

pub use bits::BitReader;
pub use crc::Crc32Mpeg2;
