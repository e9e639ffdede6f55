pub mod aac;

pub use aac::{AdtsFrame, AdtsFrameReassembler, AdtsHeader};
