//! ADTS header and frame types.

use crate::format::ts::types::pts_to_seconds;
use bytes::Bytes;
use std::fmt;

/// Fixed ADTS header size, without the optional CRC.
pub const ADTS_HEADER_SIZE: usize = 7;

/// MPEG-2 AAC profile, from the 2-bit `profile` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileType {
    /// Main profile.
    Main = 0,
    /// Low Complexity.
    LC = 1,
    /// Scalable Sample Rate.
    SSR = 2,
    /// Long Term Prediction.
    LTP = 3,
}

impl From<u8> for ProfileType {
    fn from(value: u8) -> Self {
        match value & 0x03 {
            0 => ProfileType::Main,
            1 => ProfileType::LC,
            2 => ProfileType::SSR,
            _ => ProfileType::LTP,
        }
    }
}

/// Fixed and variable ADTS header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    /// Syncword, 12 bits, always 0xFFF.
    pub sync_word: u16,
    /// MPEG version: 0 is MPEG-4, 1 is MPEG-2.
    pub id: u8,
    /// Layer, 2 bits, always 0.
    pub layer: u8,
    /// Set when no CRC follows the header.
    pub protection_absent: bool,
    /// Audio object type.
    pub profile: ProfileType,
    /// Index into the sampling frequency table, 4 bits.
    pub sample_rate_index: u8,
    /// Private bit.
    pub private_bit: bool,
    /// Channel configuration, 3 bits.
    pub channel_configuration: u8,
    /// Original/copy flag.
    pub original_copy: bool,
    /// Home flag.
    pub home: bool,
    /// Copyright identification bit.
    pub copyright_id_bit: bool,
    /// Copyright identification start.
    pub copyright_id_start: bool,
    /// `aac_frame_length`, 13 bits, header included.
    pub frame_length: u16,
    /// Buffer fullness, 11 bits.
    pub buffer_fullness: u16,
    /// Raw data blocks in the frame, minus one.
    pub number_of_raw_blocks: u8,
}

impl AdtsHeader {
    /// Whether the syncword is 0xFFF.
    pub fn sync_word_valid(&self) -> bool {
        self.sync_word == 0xFFF
    }

    /// Sampling frequency in Hz, `None` for the reserved and escape indices.
    pub fn sample_rate(&self) -> Option<u32> {
        match self.sample_rate_index {
            0 => Some(96000),
            1 => Some(88200),
            2 => Some(64000),
            3 => Some(48000),
            4 => Some(44100),
            5 => Some(32000),
            6 => Some(24000),
            7 => Some(22050),
            8 => Some(16000),
            9 => Some(12000),
            10 => Some(11025),
            11 => Some(8000),
            12 => Some(7350),
            _ => None,
        }
    }

    /// Bytes of header, including the 2-byte CRC when protection is present.
    pub fn header_length(&self) -> usize {
        if self.protection_absent {
            ADTS_HEADER_SIZE
        } else {
            ADTS_HEADER_SIZE + 2
        }
    }
}

impl fmt::Display for AdtsHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ADTS Header<syncword:{:#05x} sampling_frequency_index:{:#x} \
             channel_configuration:{} aac_frame_length:{}>",
            self.sync_word, self.sample_rate_index, self.channel_configuration, self.frame_length
        )
    }
}

/// One complete ADTS frame, header included, ready for an AAC decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct AdtsFrame {
    /// Parsed header of the frame.
    pub header: AdtsHeader,
    /// `aac_frame_length` bytes starting at the sync word.
    pub data: Bytes,
    /// PTS of the PES the frame header arrived in, 90 kHz.
    pub pts: u64,
    /// `pts` in seconds.
    pub timestamp: f64,
}

impl AdtsFrame {
    /// Builds a frame, deriving `timestamp` from `pts`.
    pub fn new(header: AdtsHeader, data: Bytes, pts: u64) -> Self {
        Self {
            header,
            data,
            pts,
            timestamp: pts_to_seconds(pts),
        }
    }

    /// Raw AAC data after the header.
    pub fn raw_data(&self) -> &[u8] {
        self.data
            .get(self.header.header_length()..)
            .unwrap_or_default()
    }
}
