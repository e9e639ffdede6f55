use super::payload::PesPayload;
use crate::format::Transform;
use bytes::Bytes;
use log::{debug, warn};
use std::fmt;

/// `packet_start_code_prefix`, always 0x000001 for PES packets.
pub const PES_START_CODE_PREFIX: u32 = 0x000001;

/// Offset of `PES_header_data_length`; optional fields start right after it.
const HEADER_DATA_LENGTH_OFFSET: usize = 8;
const OPTIONAL_FIELDS_OFFSET: usize = 9;

const TIMESTAMP_SIZE: usize = 5;
const ESCR_SIZE: usize = 6;
const ES_RATE_SIZE: usize = 3;
const DSM_TRICK_MODE_SIZE: usize = 1;
const ADDITIONAL_COPY_INFO_SIZE: usize = 1;
const PREVIOUS_CRC_SIZE: usize = 2;

/// `PTS_DTS_flags`: PTS present, no DTS.
pub const PTS_ONLY: u8 = 0b10;
/// `PTS_DTS_flags`: PTS followed by DTS.
pub const PTS_AND_DTS: u8 = 0b11;

/// Decodes a 33-bit timestamp from its 5-byte marker-interleaved layout.
/// Marker bits are skipped, not checked.
pub fn read_timestamp(b: &[u8]) -> u64 {
    ((b[0] as u64 & 0x0E) << 29)
        | ((b[1] as u64) << 22)
        | ((b[2] as u64 & 0xFE) << 14)
        | ((b[3] as u64) << 7)
        | ((b[4] as u64) >> 1)
}

/// Elementary stream clock reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Escr {
    /// 33-bit base, 90 kHz.
    pub base: u64,
    /// 9-bit extension, 27 MHz remainder.
    pub extension: u16,
}

impl Escr {
    /// Value in 27 MHz units.
    pub fn as_27mhz(&self) -> u64 {
        self.base * 300 + self.extension as u64
    }
}

/// Decoded `DSM_trick_mode` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsmTrickMode {
    /// trick_mode_control `000`.
    FastForward {
        /// Fields to display, 2 bits.
        field_id: u8,
        /// Missing macroblocks may be present.
        intra_slice_refresh: bool,
        /// Restricted set of coefficients, 2 bits.
        frequency_truncation: u8,
    },
    /// trick_mode_control `001`.
    SlowMotion {
        /// Times each field is repeated, 5 bits.
        rep_cntrl: u8,
    },
    /// trick_mode_control `010`.
    FreezeFrame {
        /// Fields to display, 2 bits.
        field_id: u8,
    },
    /// trick_mode_control `011`.
    FastReverse {
        /// Fields to display, 2 bits.
        field_id: u8,
        /// Missing macroblocks may be present.
        intra_slice_refresh: bool,
        /// Restricted set of coefficients, 2 bits.
        frequency_truncation: u8,
    },
    /// trick_mode_control `100`.
    SlowReverse {
        /// Times each field is repeated, 5 bits.
        rep_cntrl: u8,
    },
    /// Any other trick_mode_control, kept raw.
    Reserved {
        /// The 3-bit control value.
        trick_mode_control: u8,
        /// The 5 bits after it.
        bits: u8,
    },
}

impl DsmTrickMode {
    /// Decodes the whole `DSM_trick_mode` byte.
    pub fn from_byte(b: u8) -> Self {
        let control = b >> 5;
        let field_id = (b >> 3) & 0x03;
        let intra_slice_refresh = b & 0x04 != 0;
        let frequency_truncation = b & 0x03;
        let rep_cntrl = b & 0x1F;
        match control {
            0b000 => DsmTrickMode::FastForward {
                field_id,
                intra_slice_refresh,
                frequency_truncation,
            },
            0b001 => DsmTrickMode::SlowMotion { rep_cntrl },
            0b010 => DsmTrickMode::FreezeFrame { field_id },
            0b011 => DsmTrickMode::FastReverse {
                field_id,
                intra_slice_refresh,
                frequency_truncation,
            },
            0b100 => DsmTrickMode::SlowReverse { rep_cntrl },
            _ => DsmTrickMode::Reserved {
                trick_mode_control: control,
                bits: rep_cntrl,
            },
        }
    }
}

/// Flags byte leading the PES extension. Only the flags are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PesExtensionFlags {
    /// PES_private_data_flag
    pub private_data: bool,
    /// pack_header_field_flag
    pub pack_header_field: bool,
    /// program_packet_sequence_counter_flag
    pub program_packet_sequence_counter: bool,
    /// P-STD_buffer_flag
    pub p_std_buffer: bool,
    /// PES_extension_flag_2
    pub extension_2: bool,
}

impl PesExtensionFlags {
    /// Decodes the flags byte.
    pub fn from_byte(b: u8) -> Self {
        Self {
            private_data: b & 0x80 != 0,
            pack_header_field: b & 0x40 != 0,
            program_packet_sequence_counter: b & 0x20 != 0,
            p_std_buffer: b & 0x10 != 0,
            extension_2: b & 0x01 != 0,
        }
    }
}

/// Byte offsets of the optional header fields.
///
/// Each field sits after every present field that precedes it in header
/// order, so one offset is only known once all earlier flags are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OptionalOffsets {
    escr: usize,
    es_rate: usize,
    dsm_trick_mode: usize,
    additional_copy_info: usize,
    previous_crc: usize,
    extension: usize,
}

/// View over one reassembled PES packet.
///
/// Accessors read straight from the buffer and return `None` when the
/// field is absent or the buffer is too short to hold it.
#[derive(Clone, PartialEq, Eq)]
pub struct PesPacket {
    pid: u16,
    data: Bytes,
}

impl PesPacket {
    /// Wraps a payload unit received on `pid`.
    pub fn new(pid: u16, data: Bytes) -> Self {
        Self { pid, data }
    }

    /// PID the packet arrived on.
    pub fn pid(&self) -> u16 {
        self.pid
    }

    /// The whole packet, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn byte(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }

    fn bit(&self, offset: usize, mask: u8) -> Option<bool> {
        self.byte(offset).map(|b| b & mask != 0)
    }

    fn field(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.data.get(offset..offset + len)
    }

    /// First three bytes, big-endian.
    pub fn start_code_prefix(&self) -> Option<u32> {
        let b = self.field(0, 3)?;
        Some((b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32)
    }

    /// Whether the packet starts with [`PES_START_CODE_PREFIX`].
    pub fn has_valid_start_code(&self) -> bool {
        self.start_code_prefix() == Some(PES_START_CODE_PREFIX)
    }

    /// stream_id, e.g. 0xC0 for the first audio stream.
    pub fn stream_id(&self) -> Option<u8> {
        self.byte(3)
    }

    /// PES_packet_length; 0 means unbounded.
    pub fn pes_packet_length(&self) -> Option<u16> {
        let b = self.field(4, 2)?;
        Some(u16::from_be_bytes([b[0], b[1]]))
    }

    /// PES_scrambling_control, 2 bits.
    pub fn scrambling_control(&self) -> Option<u8> {
        self.byte(6).map(|b| (b & 0x30) >> 4)
    }

    /// PES_priority
    pub fn priority(&self) -> Option<bool> {
        self.bit(6, 0x08)
    }

    /// data_alignment_indicator
    pub fn data_alignment_indicator(&self) -> Option<bool> {
        self.bit(6, 0x04)
    }

    /// copyright
    pub fn copyright(&self) -> Option<bool> {
        self.bit(6, 0x02)
    }

    /// original_or_copy
    pub fn original_or_copy(&self) -> Option<bool> {
        self.bit(6, 0x01)
    }

    /// PTS_DTS_flags, see [`PTS_ONLY`] and [`PTS_AND_DTS`].
    pub fn pts_dts_flags(&self) -> Option<u8> {
        self.byte(7).map(|b| b >> 6)
    }

    /// ESCR_flag
    pub fn escr_flag(&self) -> Option<bool> {
        self.bit(7, 0x20)
    }

    /// ES_rate_flag
    pub fn es_rate_flag(&self) -> Option<bool> {
        self.bit(7, 0x10)
    }

    /// DSM_trick_mode_flag
    pub fn dsm_trick_mode_flag(&self) -> Option<bool> {
        self.bit(7, 0x08)
    }

    /// additional_copy_info_flag
    pub fn additional_copy_info_flag(&self) -> Option<bool> {
        self.bit(7, 0x04)
    }

    /// PES_CRC_flag
    pub fn crc_flag(&self) -> Option<bool> {
        self.bit(7, 0x02)
    }

    /// PES_extension_flag
    pub fn extension_flag(&self) -> Option<bool> {
        self.bit(7, 0x01)
    }

    /// PES_header_data_length: bytes of optional fields and stuffing.
    pub fn header_data_length(&self) -> Option<u8> {
        self.byte(HEADER_DATA_LENGTH_OFFSET)
    }

    /// Bytes taken by PTS and DTS: 0, 5 or 10.
    pub fn pts_dts_size(&self) -> usize {
        match self.pts_dts_flags() {
            Some(PTS_ONLY) => TIMESTAMP_SIZE,
            Some(PTS_AND_DTS) => 2 * TIMESTAMP_SIZE,
            _ => 0,
        }
    }

    /// Presentation timestamp, 90 kHz.
    pub fn pts(&self) -> Option<u64> {
        match self.pts_dts_flags()? {
            PTS_ONLY | PTS_AND_DTS => self
                .field(OPTIONAL_FIELDS_OFFSET, TIMESTAMP_SIZE)
                .map(read_timestamp),
            _ => None,
        }
    }

    /// Decoding timestamp, 90 kHz. Only present alongside a PTS.
    pub fn dts(&self) -> Option<u64> {
        if self.pts_dts_flags()? != PTS_AND_DTS {
            return None;
        }
        self.field(OPTIONAL_FIELDS_OFFSET + TIMESTAMP_SIZE, TIMESTAMP_SIZE)
            .map(read_timestamp)
    }

    fn optional_offsets(&self) -> Option<OptionalOffsets> {
        let flags = self.byte(7)?;
        let size = |mask: u8, len: usize| if flags & mask != 0 { len } else { 0 };

        let escr = OPTIONAL_FIELDS_OFFSET + self.pts_dts_size();
        let es_rate = escr + size(0x20, ESCR_SIZE);
        let dsm_trick_mode = es_rate + size(0x10, ES_RATE_SIZE);
        let additional_copy_info = dsm_trick_mode + size(0x08, DSM_TRICK_MODE_SIZE);
        let previous_crc = additional_copy_info + size(0x04, ADDITIONAL_COPY_INFO_SIZE);
        let extension = previous_crc + size(0x02, PREVIOUS_CRC_SIZE);
        Some(OptionalOffsets {
            escr,
            es_rate,
            dsm_trick_mode,
            additional_copy_info,
            previous_crc,
            extension,
        })
    }

    /// Elementary stream clock reference, when present.
    pub fn escr(&self) -> Option<Escr> {
        if !self.escr_flag()? {
            return None;
        }
        let b = self.field(self.optional_offsets()?.escr, ESCR_SIZE)?;
        let base = ((b[0] as u64 & 0x38) << 27)
            | ((b[0] as u64 & 0x03) << 28)
            | ((b[1] as u64) << 20)
            | ((b[2] as u64 & 0xF8) << 12)
            | ((b[2] as u64 & 0x03) << 13)
            | ((b[3] as u64) << 5)
            | ((b[4] as u64 & 0xF8) >> 3);
        let extension = ((b[4] as u16 & 0x03) << 7) | ((b[5] as u16) >> 1);
        Some(Escr { base, extension })
    }

    /// `ES_rate` in units of 50 bytes/second.
    pub fn es_rate(&self) -> Option<u32> {
        if !self.es_rate_flag()? {
            return None;
        }
        let b = self.field(self.optional_offsets()?.es_rate, ES_RATE_SIZE)?;
        Some(((b[0] as u32 & 0x7F) << 15) | ((b[1] as u32) << 7) | ((b[2] as u32) >> 1))
    }

    /// Decoded trick mode, when present.
    pub fn dsm_trick_mode(&self) -> Option<DsmTrickMode> {
        if !self.dsm_trick_mode_flag()? {
            return None;
        }
        self.byte(self.optional_offsets()?.dsm_trick_mode)
            .map(DsmTrickMode::from_byte)
    }

    /// The 7-bit additional_copy_info, when present.
    pub fn additional_copy_info(&self) -> Option<u8> {
        if !self.additional_copy_info_flag()? {
            return None;
        }
        self.byte(self.optional_offsets()?.additional_copy_info)
            .map(|b| b & 0x7F)
    }

    /// CRC of the previous PES packet, when present.
    pub fn previous_pes_crc(&self) -> Option<u16> {
        if !self.crc_flag()? {
            return None;
        }
        let b = self.field(self.optional_offsets()?.previous_crc, PREVIOUS_CRC_SIZE)?;
        Some(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Flags of the PES extension, when present.
    pub fn extension_flags(&self) -> Option<PesExtensionFlags> {
        if !self.extension_flag()? {
            return None;
        }
        self.byte(self.optional_offsets()?.extension)
            .map(PesExtensionFlags::from_byte)
    }

    /// Elementary stream bytes after the header, located by
    /// `PES_header_data_length`.
    pub fn payload(&self) -> Option<Bytes> {
        let start = OPTIONAL_FIELDS_OFFSET + self.header_data_length()? as usize;
        (start <= self.data.len()).then(|| self.data.slice(start..))
    }

    /// Space separated hex dump of the elementary payload.
    pub fn payload_hex_dump(&self) -> String {
        self.payload()
            .map(|p| {
                p.iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }
}

impl fmt::Display for PesPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |v: Option<bool>| v.map_or(0, u8::from);
        write!(
            f,
            "PES<pid:{:#06x} start_code_prefix:{:#08x} stream_id:{:#04x} PES_packet_length:{} \
             PES_scrambling_control:{} PES_priority:{} data_alignment_indicator:{} copyright:{} \
             original_or_copy:{} PTS_DTS_flags:{:02b} ESCR_flag:{} ES_rate_flag:{} \
             DSM_trick_mode_flag:{} additional_copy_info_flag:{} PES_CRC_flag:{} \
             PES_extension_flag:{} PES_header_data_length:{}>",
            self.pid,
            self.start_code_prefix().unwrap_or_default(),
            self.stream_id().unwrap_or_default(),
            self.pes_packet_length().unwrap_or_default(),
            self.scrambling_control().unwrap_or_default(),
            flag(self.priority()),
            flag(self.data_alignment_indicator()),
            flag(self.copyright()),
            flag(self.original_or_copy()),
            self.pts_dts_flags().unwrap_or_default(),
            flag(self.escr_flag()),
            flag(self.es_rate_flag()),
            flag(self.dsm_trick_mode_flag()),
            flag(self.additional_copy_info_flag()),
            flag(self.crc_flag()),
            flag(self.extension_flag()),
            self.header_data_length().unwrap_or_default()
        )
    }
}

impl fmt::Debug for PesPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Wraps reassembled payload units into [`PesPacket`] views.
///
/// A unit without the 0x000001 start code is logged and passed on
/// unchanged.
#[derive(Debug, Default)]
pub struct PesHeaderDecoder {
    debug: bool,
}

impl PesHeaderDecoder {
    /// Creates a decoder; `debug` logs every packet with a payload dump.
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl Transform<PesPayload> for PesHeaderDecoder {
    type Output = PesPacket;

    fn transform(&mut self, input: PesPayload, out: &mut Vec<PesPacket>) {
        let packet = PesPacket::new(input.pid, input.data);
        if !packet.has_valid_start_code() {
            warn!(
                "PES on PID {:#06x} has start code {:?}, passing through",
                packet.pid(),
                packet.start_code_prefix()
            );
        }
        if self.debug {
            debug!("{} PES Packet: {}", packet, packet.payload_hex_dump());
        }
        out.push(packet);
    }
}
