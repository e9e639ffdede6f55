//! Slice-level field extraction for TS headers, adaptation fields and
//! PAT/PMT sections. Nothing here holds state; the stateful stages in
//! [`tables`](super::tables) and [`payload`](super::payload) build on it.

use super::types::*;
use crate::error::{Result, TsError};

// TS header, byte 1
pub(crate) const TRANSPORT_ERROR_MASK: u8 = 0x80;
pub(crate) const PAYLOAD_UNIT_START_MASK: u8 = 0x40;
pub(crate) const TRANSPORT_PRIORITY_MASK: u8 = 0x20;
const PID_HIGH_MASK: u8 = 0x1f;
// TS header, byte 3
pub(crate) const SCRAMBLING_CONTROL_MASK: u8 = 0xc0;
pub(crate) const SCRAMBLING_CONTROL_SHIFT: u8 = 6;
pub(crate) const ADAPTATION_FIELD_CONTROL_MASK: u8 = 0x30;
pub(crate) const ADAPTATION_FIELD_CONTROL_SHIFT: u8 = 4;
pub(crate) const CONTINUITY_COUNTER_MASK: u8 = 0x0f;

// PSI section header, relative to table_id
const POINTER_FIELD_SIZE: usize = 1;
const SECTION_LENGTH_OFFSET: usize = 1;
/// table_id and section_length; `section_length` counts every byte after.
pub const SECTION_HEADER_SIZE: usize = 3;
const PAT_ENTRIES_OFFSET: usize = 8;
const PAT_ENTRY_SIZE: usize = 4;
// transport_stream_id .. last_section_number
const PAT_FIXED_FIELDS_SIZE: usize = 5;
const CRC_SIZE: usize = 4;

// PMT body, relative to program_number
const PMT_PCR_PID_OFFSET: usize = 5;
const PMT_PROGRAM_INFO_LENGTH_OFFSET: usize = 7;
const PMT_ES_LOOP_OFFSET: usize = 9;
const PMT_ES_ENTRY_SIZE: usize = 5;
const LENGTH_12_HIGH_MASK: u8 = 0x0f;

/// 13-bit PID from the two bytes carrying it; the top three bits are masked.
pub fn read_pid(high: u8, low: u8) -> u16 {
    ((high & PID_HIGH_MASK) as u16) << 8 | low as u16
}

fn read_length_12(high: u8, low: u8) -> usize {
    ((high & LENGTH_12_HIGH_MASK) as usize) << 8 | low as usize
}

/// Decodes the 4-byte header of a packet already known to be 188 bytes.
pub(crate) fn decode_header(data: &[u8]) -> TsHeader {
    TsHeader {
        sync_byte: data[0],
        transport_error: data[1] & TRANSPORT_ERROR_MASK != 0,
        payload_unit_start: data[1] & PAYLOAD_UNIT_START_MASK != 0,
        transport_priority: data[1] & TRANSPORT_PRIORITY_MASK != 0,
        pid: read_pid(data[1], data[2]),
        scrambling_control: (data[3] & SCRAMBLING_CONTROL_MASK) >> SCRAMBLING_CONTROL_SHIFT,
        adaptation_field_control: AdaptationFieldControl::from_bits(
            (data[3] & ADAPTATION_FIELD_CONTROL_MASK) >> ADAPTATION_FIELD_CONTROL_SHIFT,
        ),
        continuity_counter: data[3] & CONTINUITY_COUNTER_MASK,
    }
}

/// Decodes the adaptation field starting at `offset` (its length byte).
///
/// Returns `Ok(None)` for a zero-length field, which is legal stuffing.
pub fn parse_adaptation_field(data: &[u8], offset: usize) -> Result<Option<AdaptationField>> {
    if data.len() <= offset {
        return Err(TsError::InvalidData("Adaptation field length missing".into()));
    }
    let adaptation_field_length = data[offset] as usize;
    if adaptation_field_length == 0 {
        return Ok(None);
    }

    if data.len() < offset + adaptation_field_length + 1 {
        return Err(TsError::InvalidData("Adaptation field too short".into()));
    }
    let end = offset + 1 + adaptation_field_length;

    let flags = data[offset + 1];
    let mut field = AdaptationField {
        length: adaptation_field_length,
        discontinuity: (flags & 0x80) != 0,
        random_access: (flags & 0x40) != 0,
        es_priority: (flags & 0x20) != 0,
        pcr_flag: (flags & 0x10) != 0,
        opcr_flag: (flags & 0x08) != 0,
        splicing_point_flag: (flags & 0x04) != 0,
        private_data_flag: (flags & 0x02) != 0,
        extension_flag: (flags & 0x01) != 0,
        pcr: None,
        opcr: None,
        splice_countdown: None,
        private_data: None,
    };

    let mut pos = offset + 2;

    if field.pcr_flag {
        if end < pos + 6 {
            return Err(TsError::InvalidData("PCR data too short".into()));
        }
        field.pcr = Some(read_clock_reference(&data[pos..pos + 6]));
        pos += 6;
    }

    if field.opcr_flag {
        if end < pos + 6 {
            return Err(TsError::InvalidData("OPCR data too short".into()));
        }
        field.opcr = Some(read_clock_reference(&data[pos..pos + 6]));
        pos += 6;
    }

    if field.splicing_point_flag {
        if end < pos + 1 {
            return Err(TsError::InvalidData("Splice countdown too short".into()));
        }
        field.splice_countdown = Some(data[pos] as i8);
        pos += 1;
    }

    if field.private_data_flag {
        if end < pos + 1 {
            return Err(TsError::InvalidData(
                "Private data length byte missing".into(),
            ));
        }
        let private_data_length = data[pos] as usize;
        pos += 1;
        if end < pos + private_data_length {
            return Err(TsError::InvalidData("Private data too short".into()));
        }
        field.private_data = Some(data[pos..pos + private_data_length].to_vec());
    }
    Ok(Some(field))
}

/// 33-bit base, 6 reserved bits, 9-bit extension; returned in 27 MHz units.
fn read_clock_reference(b: &[u8]) -> u64 {
    let base = ((b[0] as u64) << 25)
        | ((b[1] as u64) << 17)
        | ((b[2] as u64) << 9)
        | ((b[3] as u64) << 1)
        | ((b[4] & 0x80) as u64 >> 7);
    let ext = (((b[4] & 0x01) as u64) << 8) | (b[5] as u64);
    base * 300 + ext
}

/// Offset of the section starting in a unit-start payload, past
/// `pointer_field` and the bytes it skips.
///
/// `None` when the section header would not fit in the payload.
pub fn section_start(payload: &[u8]) -> Option<usize> {
    let pointer_field = *payload.first()? as usize;
    let start = POINTER_FIELD_SIZE + pointer_field;
    (start + SECTION_HEADER_SIZE <= payload.len()).then_some(start)
}

/// `section_length` of a section whose first byte is `table_id`.
pub fn section_length(section: &[u8]) -> usize {
    read_length_12(
        section[SECTION_LENGTH_OFFSET],
        section[SECTION_LENGTH_OFFSET + 1],
    )
}

/// One entry of the PAT program loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatEntry {
    /// Program number; 0 marks the network PID.
    pub program_number: u16,
    /// PMT PID, or the network PID when `program_number` is 0.
    pub pid: u16,
}

/// Reads the program loop of a PAT section held in one packet.
///
/// The loop spans `section_length - 5 - 4` bytes from byte 8 of the
/// section; entries that would run past the packet are ignored.
pub fn parse_pat_entries(section: &[u8]) -> Vec<PatEntry> {
    let loop_length = section_length(section).saturating_sub(PAT_FIXED_FIELDS_SIZE + CRC_SIZE);
    let end = (PAT_ENTRIES_OFFSET + loop_length).min(section.len());
    section[PAT_ENTRIES_OFFSET.min(end)..end]
        .chunks_exact(PAT_ENTRY_SIZE)
        .map(|entry| PatEntry {
            program_number: u16::from_be_bytes([entry[0], entry[1]]),
            pid: read_pid(entry[2], entry[3]),
        })
        .collect()
}

/// A tag-length-value descriptor, kept undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// descriptor_tag
    pub tag: u8,
    /// The `descriptor_length` bytes after the length.
    pub data: Vec<u8>,
}

/// One entry of the PMT elementary stream loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementaryStreamInfo {
    /// stream_type, e.g. [`STREAM_TYPE_AAC`].
    pub stream_type: u8,
    /// PID carrying the stream.
    pub elementary_pid: u16,
    /// ES_info descriptors.
    pub descriptors: Vec<Descriptor>,
}

/// The fields of a PMT section the demuxer uses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PmtSection {
    /// Program the map describes.
    pub program_number: u16,
    /// PID carrying the program clock reference.
    pub pcr_pid: u16,
    /// Bytes of program descriptors skipped before the stream loop.
    pub program_info_length: usize,
    /// Streams in section order.
    pub elementary_stream_infos: Vec<ElementaryStreamInfo>,
}

/// Parses a complete PMT section body, i.e. the `section_length` bytes that
/// follow the length field: program_number through CRC_32.
pub fn parse_pmt_section(section: &[u8]) -> Result<PmtSection> {
    if section.len() < PMT_ES_LOOP_OFFSET + CRC_SIZE {
        return Err(TsError::InvalidData(format!(
            "PMT section too short: {} bytes",
            section.len()
        )));
    }
    let program_number = u16::from_be_bytes([section[0], section[1]]);
    let pcr_pid = read_pid(section[PMT_PCR_PID_OFFSET], section[PMT_PCR_PID_OFFSET + 1]);
    let program_info_length = read_length_12(
        section[PMT_PROGRAM_INFO_LENGTH_OFFSET],
        section[PMT_PROGRAM_INFO_LENGTH_OFFSET + 1],
    );

    let end = section.len() - CRC_SIZE;
    let mut pos = PMT_ES_LOOP_OFFSET + program_info_length;
    let mut elementary_stream_infos = Vec::new();

    while pos + PMT_ES_ENTRY_SIZE <= end {
        let stream_type = section[pos];
        let elementary_pid = read_pid(section[pos + 1], section[pos + 2]);
        let es_info_length = read_length_12(section[pos + 3], section[pos + 4]);
        pos += PMT_ES_ENTRY_SIZE;

        let descriptors_end = (pos + es_info_length).min(end);
        let descriptors = parse_descriptors(&section[pos..descriptors_end]);
        pos += es_info_length;

        elementary_stream_infos.push(ElementaryStreamInfo {
            stream_type,
            elementary_pid,
            descriptors,
        });
    }

    Ok(PmtSection {
        program_number,
        pcr_pid,
        program_info_length,
        elementary_stream_infos,
    })
}

/// Splits a descriptor loop into tag/data pairs; a truncated trailing
/// descriptor is dropped.
fn parse_descriptors(data: &[u8]) -> Vec<Descriptor> {
    let mut descriptors = Vec::new();
    let mut pos = 0;

    while pos + 2 <= data.len() {
        let tag = data[pos];
        let length = data[pos + 1] as usize;
        pos += 2;

        if pos + length > data.len() {
            break;
        }

        descriptors.push(Descriptor {
            tag,
            data: data[pos..pos + length].to_vec(),
        });
        pos += length;
    }

    descriptors
}
