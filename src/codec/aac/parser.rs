//! ADTS header parsing and sync search.

use super::types::{AdtsHeader, ProfileType, ADTS_HEADER_SIZE};
use crate::utils::BitReader;
use crate::{Result, TsError};

/// The two bytes a frame must start with: syncword 0xFFF, MPEG-2, layer 0,
/// CRC present.
pub const ADTS_SYNC: [u8; 2] = [0xFF, 0xF8];

const FRAME_LENGTH_HIGH_MASK: u8 = 0x03;
const FRAME_LENGTH_LOW_MASK: u8 = 0xE0;

/// Whether `data` starts with the sync pattern.
pub fn is_sync(data: &[u8]) -> bool {
    data.starts_with(&ADTS_SYNC)
}

/// Offset of the first sync pattern in `data`.
pub fn find_sync(data: &[u8]) -> Option<usize> {
    data.windows(ADTS_SYNC.len()).position(|w| w == ADTS_SYNC)
}

/// `aac_frame_length`, 13 bits spread over header bytes 3 to 5.
pub fn aac_frame_length(header: &[u8]) -> usize {
    ((header[3] & FRAME_LENGTH_HIGH_MASK) as usize) << 11
        | (header[4] as usize) << 3
        | ((header[5] & FRAME_LENGTH_LOW_MASK) as usize) >> 5
}

/// Decodes the 7-byte fixed and variable ADTS header.
pub fn parse_adts_header(data: &[u8]) -> Result<AdtsHeader> {
    if data.len() < ADTS_HEADER_SIZE {
        return Err(TsError::Parser("ADTS header too short".into()));
    }

    let mut reader = BitReader::new(&data[..ADTS_HEADER_SIZE]);

    let sync_word = reader.read_bits(12)? as u16;
    if sync_word != 0xFFF {
        return Err(TsError::Parser("Invalid ADTS sync word".into()));
    }

    let id = reader.read_bits(1)? as u8;
    let layer = reader.read_bits(2)? as u8;
    let protection_absent = reader.read_bit()?;
    let profile = ProfileType::from(reader.read_bits(2)? as u8);
    let sample_rate_index = reader.read_bits(4)? as u8;
    let private_bit = reader.read_bit()?;
    let channel_configuration = reader.read_bits(3)? as u8;
    let original_copy = reader.read_bit()?;
    let home = reader.read_bit()?;

    let copyright_id_bit = reader.read_bit()?;
    let copyright_id_start = reader.read_bit()?;
    let frame_length = reader.read_bits(13)? as u16;
    let buffer_fullness = reader.read_bits(11)? as u16;
    let number_of_raw_blocks = reader.read_bits(2)? as u8;

    Ok(AdtsHeader {
        sync_word,
        id,
        layer,
        protection_absent,
        profile,
        sample_rate_index,
        private_bit,
        channel_configuration,
        original_copy,
        home,
        copyright_id_bit,
        copyright_id_start,
        frame_length,
        buffer_fullness,
        number_of_raw_blocks,
    })
}
