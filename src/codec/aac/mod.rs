//! ADTS framed AAC.
//!
//! Frames are located by sync word and cut at their declared
//! `aac_frame_length`; the AAC payload itself is left for a decoder.

pub mod parser;
pub mod reassembler;
pub mod types;

pub use parser::{aac_frame_length, find_sync, parse_adts_header, ADTS_SYNC};
pub use reassembler::AdtsFrameReassembler;
pub use types::{AdtsFrame, AdtsHeader, ProfileType, ADTS_HEADER_SIZE};
