use super::parser;
use crate::error::{Result, TsError};
use bytes::Bytes;
use std::fmt;

/// PID carrying the Program Association Table.
pub const PID_PAT: u16 = 0x0000;
/// Null packet PID, stuffing only.
pub const PID_NULL: u16 = 0x1fff;

/// table_id of a PAT section.
pub const TABLE_ID_PAT: u8 = 0x00;
/// table_id of a PMT section.
pub const TABLE_ID_PMT: u8 = 0x02;

/// stream_type classified as video.
pub const STREAM_TYPE_MPEG2_VIDEO: u8 = 0x02;
/// stream_type classified as ADTS audio.
pub const STREAM_TYPE_AAC: u8 = 0x0f;

/// Size of every transport stream packet.
pub const TS_PACKET_SIZE: usize = 188;
/// Fixed header bytes before any adaptation field.
pub const TS_HEADER_SIZE: usize = 4;
/// First byte of every packet.
pub const TS_SYNC_BYTE: u8 = 0x47;
/// PTS/DTS clock rate.
pub const PTS_HZ: u64 = 90_000;

/// Largest value a 33-bit PTS/DTS can hold.
pub const MAX_PTS: u64 = (1 << 33) - 1;

/// The two `adaptation_field_control` bits of a TS header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptationFieldControl {
    /// `00`, the packet is to be discarded.
    Reserved,
    /// `01`, payload only.
    PayloadOnly,
    /// `10`, adaptation field only.
    AdaptationOnly,
    /// `11`, adaptation field followed by payload.
    Both,
}

impl AdaptationFieldControl {
    /// Decodes the two low bits of `bits`.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b01 => AdaptationFieldControl::PayloadOnly,
            0b10 => AdaptationFieldControl::AdaptationOnly,
            0b11 => AdaptationFieldControl::Both,
            _ => AdaptationFieldControl::Reserved,
        }
    }

    /// Whether an adaptation field follows the header.
    pub fn has_adaptation_field(self) -> bool {
        matches!(
            self,
            AdaptationFieldControl::AdaptationOnly | AdaptationFieldControl::Both
        )
    }

    /// Whether the packet carries payload bytes.
    pub fn has_payload(self) -> bool {
        matches!(
            self,
            AdaptationFieldControl::PayloadOnly | AdaptationFieldControl::Both
        )
    }
}

impl fmt::Display for AdaptationFieldControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdaptationFieldControl::Reserved => "RESERVED",
            AdaptationFieldControl::PayloadOnly => "NONE",
            AdaptationFieldControl::AdaptationOnly => "ONLY",
            AdaptationFieldControl::Both => "BOTH",
        };
        f.write_str(name)
    }
}

/// Decoded adaptation field. Only the fields before the extension are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptationField {
    /// `adaptation_field_length`, excluding the length byte.
    pub length: usize,
    /// discontinuity_indicator
    pub discontinuity: bool,
    /// random_access_indicator
    pub random_access: bool,
    /// elementary_stream_priority_indicator
    pub es_priority: bool,
    /// PCR_flag
    pub pcr_flag: bool,
    /// OPCR_flag
    pub opcr_flag: bool,
    /// splicing_point_flag
    pub splicing_point_flag: bool,
    /// transport_private_data_flag
    pub private_data_flag: bool,
    /// adaptation_field_extension_flag
    pub extension_flag: bool,
    /// 27 MHz program clock reference (`base * 300 + extension`).
    pub pcr: Option<u64>,
    /// Original PCR, same units as `pcr`.
    pub opcr: Option<u64>,
    /// Packets left until the splice point.
    pub splice_countdown: Option<i8>,
    /// Transport private data bytes.
    pub private_data: Option<Vec<u8>>,
}

/// Decoded fixed 4-byte TS packet header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsHeader {
    /// Always [`TS_SYNC_BYTE`] for a packet that passed sync.
    pub sync_byte: u8,
    /// transport_error_indicator
    pub transport_error: bool,
    /// payload_unit_start_indicator
    pub payload_unit_start: bool,
    /// transport_priority
    pub transport_priority: bool,
    /// 13-bit packet identifier.
    pub pid: u16,
    /// transport_scrambling_control, 2 bits.
    pub scrambling_control: u8,
    /// adaptation_field_control
    pub adaptation_field_control: AdaptationFieldControl,
    /// continuity_counter, 4 bits.
    pub continuity_counter: u8,
}

/// One 188-byte transport stream packet.
///
/// The packet is a cheap handle over its bytes: packets cut from the middle
/// of an input chunk share that chunk's allocation, packets rebuilt across
/// a chunk boundary own a copy. The bytes are never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct TsPacket {
    raw: Bytes,
}

impl TsPacket {
    /// Wraps exactly [`TS_PACKET_SIZE`] bytes starting with the sync byte.
    pub fn new(raw: Bytes) -> Result<Self> {
        if raw.len() != TS_PACKET_SIZE {
            return Err(TsError::InvalidData(format!(
                "TS packet must be {} bytes, got {}",
                TS_PACKET_SIZE,
                raw.len()
            )));
        }
        if raw[0] != TS_SYNC_BYTE {
            return Err(TsError::InvalidData(format!(
                "Invalid sync byte {:#04x}",
                raw[0]
            )));
        }
        Ok(Self { raw })
    }

    /// The 188 raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// All header fields at once.
    pub fn header(&self) -> TsHeader {
        parser::decode_header(&self.raw)
    }

    /// Set by the demodulator when the packet is known to be damaged.
    pub fn transport_error_indicator(&self) -> bool {
        self.raw[1] & parser::TRANSPORT_ERROR_MASK != 0
    }

    /// Set when a PES packet or PSI section starts in this payload.
    pub fn payload_unit_start_indicator(&self) -> bool {
        self.raw[1] & parser::PAYLOAD_UNIT_START_MASK != 0
    }

    /// transport_priority bit.
    pub fn transport_priority(&self) -> bool {
        self.raw[1] & parser::TRANSPORT_PRIORITY_MASK != 0
    }

    /// 13-bit packet identifier.
    pub fn pid(&self) -> u16 {
        parser::read_pid(self.raw[1], self.raw[2])
    }

    /// transport_scrambling_control, 0 when not scrambled.
    pub fn scrambling_control(&self) -> u8 {
        (self.raw[3] & parser::SCRAMBLING_CONTROL_MASK) >> parser::SCRAMBLING_CONTROL_SHIFT
    }

    /// Whether an adaptation field and/or payload follow the header.
    pub fn adaptation_field_control(&self) -> AdaptationFieldControl {
        AdaptationFieldControl::from_bits(
            (self.raw[3] & parser::ADAPTATION_FIELD_CONTROL_MASK)
                >> parser::ADAPTATION_FIELD_CONTROL_SHIFT,
        )
    }

    /// 4-bit counter, incremented per payload-carrying packet of a PID.
    pub fn continuity_counter(&self) -> u8 {
        self.raw[3] & parser::CONTINUITY_COUNTER_MASK
    }

    /// `adaptation_field_length` (byte 4) when an adaptation field is present.
    pub fn adaptation_field_length(&self) -> Option<u8> {
        self.adaptation_field_control()
            .has_adaptation_field()
            .then(|| self.raw[TS_HEADER_SIZE])
    }

    /// Decodes the adaptation field, if the packet carries one.
    pub fn adaptation_field(&self) -> Result<Option<AdaptationField>> {
        if !self.adaptation_field_control().has_adaptation_field() {
            return Ok(None);
        }
        parser::parse_adaptation_field(&self.raw, TS_HEADER_SIZE)
    }

    /// Offset of the first payload byte: 4, plus `1 + adaptation_field_length`
    /// when an adaptation field precedes the payload.
    ///
    /// `None` when the packet carries no payload or the adaptation field
    /// claims more room than the packet has.
    pub fn payload_offset(&self) -> Option<usize> {
        let afc = self.adaptation_field_control();
        if !afc.has_payload() {
            return None;
        }
        let offset = match self.adaptation_field_length() {
            Some(len) => TS_HEADER_SIZE + 1 + len as usize,
            None => TS_HEADER_SIZE,
        };
        (offset <= TS_PACKET_SIZE).then_some(offset)
    }

    /// The payload bytes, sharing the packet's buffer.
    pub fn payload(&self) -> Option<Bytes> {
        self.payload_offset().map(|offset| self.raw.slice(offset..))
    }

    /// Space separated hex dump of the whole packet.
    pub fn hex_dump(&self) -> String {
        self.raw
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for TsPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let afc = self.adaptation_field_control();
        write!(
            f,
            "TS_PACKET<PID:{}:{:#06x} TransportErrorIndicator:{} PayloadUnitStartIndicator:{} \
             TransportPriority:{} TransportScramblingControl:{} AdaptationFieldControl:{} \
             ContinuityCounter:{}>",
            self.pid(),
            self.pid(),
            self.transport_error_indicator() as u8,
            self.payload_unit_start_indicator() as u8,
            self.transport_priority() as u8,
            self.scrambling_control(),
            afc,
            self.continuity_counter()
        )
    }
}

impl fmt::Debug for TsPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Converts a 90 kHz timestamp to seconds.
pub fn pts_to_seconds(pts: u64) -> f64 {
    pts as f64 / PTS_HZ as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn packet(header: [u8; 4], fill: u8) -> TsPacket {
        let mut raw = vec![fill; TS_PACKET_SIZE];
        raw[..4].copy_from_slice(&header);
        TsPacket::new(Bytes::from(raw)).unwrap()
    }

    #[test]
    fn test_header_accessors() {
        let p = packet([0x47, 0xE1, 0x01, 0xD7], 0);
        assert!(p.transport_error_indicator());
        assert!(p.payload_unit_start_indicator());
        assert!(p.transport_priority());
        assert_eq!(p.pid(), 0x0101);
        assert_eq!(p.scrambling_control(), 0b11);
        assert_eq!(p.adaptation_field_control(), AdaptationFieldControl::PayloadOnly);
        assert_eq!(p.continuity_counter(), 7);
        assert_eq!(
            p.header(),
            TsHeader {
                sync_byte: 0x47,
                transport_error: true,
                payload_unit_start: true,
                transport_priority: true,
                pid: 0x0101,
                scrambling_control: 3,
                adaptation_field_control: AdaptationFieldControl::PayloadOnly,
                continuity_counter: 7,
            }
        );
    }

    #[test]
    fn test_rejects_wrong_size_and_sync() {
        assert!(TsPacket::new(Bytes::from(vec![0x47; 187])).is_err());
        assert!(TsPacket::new(Bytes::from(vec![0x48; 188])).is_err());
    }

    #[test]
    fn test_payload_offset() {
        let p = packet([0x47, 0x01, 0x00, 0x10], 0xAA);
        assert_eq!(p.payload_offset(), Some(4));
        assert_eq!(p.payload().unwrap().len(), 184);

        let mut raw = vec![0xFF; TS_PACKET_SIZE];
        raw[..5].copy_from_slice(&[0x47, 0x01, 0x00, 0x30, 7]);
        let p = TsPacket::new(Bytes::from(raw)).unwrap();
        assert_eq!(p.adaptation_field_length(), Some(7));
        assert_eq!(p.payload_offset(), Some(12));

        // adaptation only: no payload at all
        let p = packet([0x47, 0x01, 0x00, 0x20], 0);
        assert_eq!(p.payload_offset(), None);

        // adaptation field longer than the packet
        let mut raw = vec![0x00; TS_PACKET_SIZE];
        raw[..5].copy_from_slice(&[0x47, 0x01, 0x00, 0x30, 200]);
        let p = TsPacket::new(Bytes::from(raw)).unwrap();
        assert_eq!(p.payload_offset(), None);
    }

    #[test]
    fn test_display() {
        let p = packet([0x47, 0x41, 0x00, 0x1A], 0);
        assert_eq!(
            p.to_string(),
            "TS_PACKET<PID:256:0x0100 TransportErrorIndicator:0 PayloadUnitStartIndicator:1 \
             TransportPriority:0 TransportScramblingControl:0 AdaptationFieldControl:NONE \
             ContinuityCounter:10>"
        );
    }

    #[test]
    fn test_clock_conversion() {
        assert_eq!(pts_to_seconds(90_000), 1.0);
        assert_eq!(pts_to_seconds(45_000), 0.5);
        assert!(pts_to_seconds(MAX_PTS) > 95_443.0);
    }
}
