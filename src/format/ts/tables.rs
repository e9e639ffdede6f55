use super::parser::{self, SECTION_HEADER_SIZE};
use super::types::*;
use crate::utils::Crc32Mpeg2;
use log::{debug, trace, warn};
use std::collections::HashMap;

/// How the demuxer treats an elementary stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// `stream_type` 0x02, MPEG-2 video.
    Video,
    /// `stream_type` 0x0f, AAC in ADTS.
    Audio,
    /// Classified but never selected for forwarding.
    Other,
}

impl StreamKind {
    /// Classifies a PMT `stream_type`.
    pub fn from_stream_type(stream_type: u8) -> Self {
        match stream_type {
            STREAM_TYPE_MPEG2_VIDEO => StreamKind::Video,
            STREAM_TYPE_AAC => StreamKind::Audio,
            _ => StreamKind::Other,
        }
    }
}

/// Classification of one elementary-stream PID, taken from a PMT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramMapEntry {
    /// PID carrying the elementary stream.
    pub elementary_pid: u16,
    /// `stream_type` from the PMT loop.
    pub stream_type: u8,
    /// Program whose PMT declared the stream.
    pub program_number: u16,
}

impl ProgramMapEntry {
    /// How the demuxer treats this stream.
    pub fn kind(&self) -> StreamKind {
        StreamKind::from_stream_type(self.stream_type)
    }
}

/// PMT PID to program number mapping from the latest PAT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramAssociation {
    programs: HashMap<u16, u16>,
}

impl ProgramAssociation {
    /// Program whose PMT is carried on `pmt_pid`.
    pub fn program_number(&self, pmt_pid: u16) -> Option<u16> {
        self.programs.get(&pmt_pid).copied()
    }

    /// True when `pid` carries a PMT.
    pub fn is_pmt_pid(&self, pid: u16) -> bool {
        self.programs.contains_key(&pid)
    }

    /// Number of programs, the network PID excluded.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// True before any program has been announced.
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// `(pmt_pid, program_number)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.programs.iter().map(|(&pid, &program)| (pid, program))
    }
}

/// A table whose content changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// New program map from a PAT.
    Pat(ProgramAssociation),
    /// New stream list from a PMT.
    Pmt {
        /// PID the PMT arrived on.
        pmt_pid: u16,
        /// Program the PAT assigned to `pmt_pid`.
        program_number: u16,
        /// Streams in PMT loop order.
        streams: Vec<ProgramMapEntry>,
    },
}

/// A PMT section being collected across packets of one PMT PID.
#[derive(Debug)]
struct SectionBuffer {
    /// table_id and the two section_length bytes, kept for the CRC.
    header: [u8; 3],
    section_length: usize,
    data: Vec<u8>,
}

impl SectionBuffer {
    fn is_complete(&self) -> bool {
        self.data.len() >= self.section_length
    }
}

/// Tracks PAT and PMT sections and classifies elementary-stream PIDs.
///
/// A section starts after `pointer_field` in the payload of a unit-start
/// packet, so adaptation-field stuffing ahead of it is skipped. The PAT
/// must fit in one packet; a PMT section may span several.
///
/// Events are only reported when a table's content changes, not for every
/// repetition. The video/audio PID sets only grow: a PID dropped by a later
/// PMT revision stays selected for the rest of the session.
pub struct ProgramTableTracker {
    association: ProgramAssociation,
    pat_seen: bool,
    sections: HashMap<u16, SectionBuffer>,
    /// Last stream list reported per PMT PID.
    announced: HashMap<u16, Vec<ProgramMapEntry>>,
    streams: HashMap<u16, ProgramMapEntry>,
    video_pids: Vec<u16>,
    audio_pids: Vec<u16>,
    crc: Crc32Mpeg2,
    debug: bool,
}

impl ProgramTableTracker {
    /// Creates an empty tracker; `debug` enables table dumps.
    pub fn new(debug: bool) -> Self {
        Self {
            association: ProgramAssociation::default(),
            pat_seen: false,
            sections: HashMap::new(),
            announced: HashMap::new(),
            streams: HashMap::new(),
            video_pids: Vec::new(),
            audio_pids: Vec::new(),
            crc: Crc32Mpeg2::new(),
            debug,
        }
    }

    /// True for PID 0 and for every PMT PID named by the current PAT.
    pub fn is_table_pid(&self, pid: u16) -> bool {
        pid == PID_PAT || self.association.is_pmt_pid(pid)
    }

    /// Program map from the latest PAT.
    pub fn association(&self) -> &ProgramAssociation {
        &self.association
    }

    /// Classification of `pid`, if a PMT declared it.
    pub fn stream(&self, pid: u16) -> Option<&ProgramMapEntry> {
        self.streams.get(&pid)
    }

    /// Every classified stream.
    pub fn streams(&self) -> impl Iterator<Item = &ProgramMapEntry> {
        self.streams.values()
    }

    /// Video PIDs in discovery order.
    pub fn video_pids(&self) -> &[u16] {
        &self.video_pids
    }

    /// ADTS audio PIDs in discovery order.
    pub fn audio_pids(&self) -> &[u16] {
        &self.audio_pids
    }

    /// True when a PMT declared `pid` as video.
    pub fn is_video_pid(&self, pid: u16) -> bool {
        self.video_pids.contains(&pid)
    }

    /// True when a PMT declared `pid` as ADTS audio.
    pub fn is_audio_pid(&self, pid: u16) -> bool {
        self.audio_pids.contains(&pid)
    }

    /// Feeds one packet. Packets on other PIDs are ignored.
    pub fn feed(&mut self, packet: &TsPacket) -> Option<TableEvent> {
        let pid = packet.pid();
        if pid == PID_PAT {
            self.feed_pat(packet)
        } else if let Some(program_number) = self.association.program_number(pid) {
            self.feed_pmt(packet, program_number)
        } else {
            None
        }
    }

    fn feed_pat(&mut self, packet: &TsPacket) -> Option<TableEvent> {
        if packet.transport_error_indicator()
            || packet.adaptation_field_control() == AdaptationFieldControl::Reserved
            || !packet.payload_unit_start_indicator()
        {
            return None;
        }
        let payload = packet.payload()?;
        let Some(start) = parser::section_start(&payload) else {
            debug!("PAT pointer_field runs past the packet, ignored");
            return None;
        };
        let section = &payload[start..];
        if section[0] != TABLE_ID_PAT {
            debug!("PID 0 section with table_id {:#04x} ignored", section[0]);
            return None;
        }

        let section_end = SECTION_HEADER_SIZE + parser::section_length(section);
        if section_end <= section.len() && self.crc.calculate(&section[..section_end]) != 0 {
            warn!("PAT CRC mismatch, applying anyway");
        }

        // program_number 0 names the network PID, not a PMT
        let programs: HashMap<u16, u16> = parser::parse_pat_entries(section)
            .into_iter()
            .filter(|entry| entry.program_number != 0)
            .map(|entry| (entry.pid, entry.program_number))
            .collect();

        if self.pat_seen && programs == self.association.programs {
            trace!("PAT repeated unchanged");
            return None;
        }
        self.pat_seen = true;
        self.sections.retain(|pid, _| programs.contains_key(pid));
        self.announced.retain(|pid, _| programs.contains_key(pid));
        self.association = ProgramAssociation { programs };

        if self.debug {
            debug!(
                "PAT pmtMap: {:?} Packet: {} {}",
                self.association.programs,
                packet,
                packet.hex_dump()
            );
        }
        Some(TableEvent::Pat(self.association.clone()))
    }

    fn feed_pmt(&mut self, packet: &TsPacket, program_number: u16) -> Option<TableEvent> {
        let pid = packet.pid();
        if packet.transport_error_indicator() {
            if self.sections.remove(&pid).is_some() {
                debug!("transport error on PMT PID {:#06x}, partial section dropped", pid);
            }
            return None;
        }
        let payload = packet.payload()?;

        if packet.payload_unit_start_indicator() {
            let Some(start) = parser::section_start(&payload) else {
                debug!("PID {:#06x} pointer_field runs past the packet, ignored", pid);
                self.sections.remove(&pid);
                return None;
            };
            let section = &payload[start..];
            let table_id = section[0];
            if table_id != TABLE_ID_PMT {
                debug!("PID {:#06x} section with table_id {:#04x} ignored", pid, table_id);
                self.sections.remove(&pid);
                return None;
            }
            let section_length = parser::section_length(section);
            let end = (SECTION_HEADER_SIZE + section_length).min(section.len());
            self.sections.insert(
                pid,
                SectionBuffer {
                    header: [section[0], section[1], section[2]],
                    section_length,
                    data: section[SECTION_HEADER_SIZE..end].to_vec(),
                },
            );
        } else if let Some(buffer) = self.sections.get_mut(&pid) {
            let remaining = buffer.section_length - buffer.data.len();
            let end = remaining.min(payload.len());
            buffer.data.extend_from_slice(&payload[..end]);
        } else {
            return None;
        }

        if !self.sections.get(&pid).is_some_and(SectionBuffer::is_complete) {
            return None;
        }
        let buffer = self.sections.remove(&pid)?;
        self.apply_pmt(pid, program_number, buffer)
    }

    fn apply_pmt(
        &mut self,
        pmt_pid: u16,
        program_number: u16,
        buffer: SectionBuffer,
    ) -> Option<TableEvent> {
        let section = &buffer.data[..buffer.section_length];
        if self.crc.calculate_parts(&[&buffer.header, section]) != 0 {
            warn!("PMT CRC mismatch on PID {:#06x}, applying anyway", pmt_pid);
        }

        let pmt = match parser::parse_pmt_section(section) {
            Ok(pmt) => pmt,
            Err(e) => {
                warn!("PMT on PID {:#06x} dropped: {}", pmt_pid, e);
                return None;
            }
        };

        let streams: Vec<ProgramMapEntry> = pmt
            .elementary_stream_infos
            .iter()
            .map(|info| ProgramMapEntry {
                elementary_pid: info.elementary_pid,
                stream_type: info.stream_type,
                program_number,
            })
            .collect();
        if self.announced.get(&pmt_pid) == Some(&streams) {
            trace!("PMT on PID {:#06x} repeated unchanged", pmt_pid);
            return None;
        }

        for entry in &streams {
            self.streams.insert(entry.elementary_pid, *entry);
            match entry.kind() {
                StreamKind::Video if !self.video_pids.contains(&entry.elementary_pid) => {
                    self.video_pids.push(entry.elementary_pid)
                }
                StreamKind::Audio if !self.audio_pids.contains(&entry.elementary_pid) => {
                    self.audio_pids.push(entry.elementary_pid)
                }
                _ => {}
            }
        }
        self.announced.insert(pmt_pid, streams.clone());

        if self.debug {
            debug!(
                "PMT update! program:{} pid:{:#06x} streams:{:?}",
                program_number, pmt_pid, streams
            );
        }
        Some(TableEvent::Pmt {
            pmt_pid,
            program_number,
            streams,
        })
    }
}

impl Default for ProgramTableTracker {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    fn with_crc(mut section: Vec<u8>) -> Vec<u8> {
        let crc = Crc32Mpeg2::new().calculate(&section);
        section.extend_from_slice(&crc.to_be_bytes());
        section
    }

    fn packet(pid: u16, start: bool, cc: u8, body: &[u8]) -> TsPacket {
        let mut raw = vec![0xFF; TS_PACKET_SIZE];
        raw[0] = TS_SYNC_BYTE;
        raw[1] = (if start { 0x40 } else { 0 }) | (pid >> 8) as u8;
        raw[2] = pid as u8;
        raw[3] = 0x10 | (cc & 0x0f);
        raw[4..4 + body.len()].copy_from_slice(body);
        TsPacket::new(Bytes::from(raw)).unwrap()
    }

    /// Packet whose short `body` is pushed to the end by adaptation-field
    /// stuffing, the way multiplexers pad PSI.
    fn stuffed_packet(pid: u16, start: bool, cc: u8, body: &[u8]) -> TsPacket {
        let mut raw = vec![0xFF; TS_PACKET_SIZE];
        raw[0] = TS_SYNC_BYTE;
        raw[1] = (if start { 0x40 } else { 0 }) | (pid >> 8) as u8;
        raw[2] = pid as u8;
        raw[3] = 0x30 | (cc & 0x0f);
        let stuffing = TS_PACKET_SIZE - TS_HEADER_SIZE - body.len();
        raw[4] = (stuffing - 1) as u8;
        raw[5] = 0x00;
        raw[TS_PACKET_SIZE - body.len()..].copy_from_slice(body);
        TsPacket::new(Bytes::from(raw)).unwrap()
    }

    fn pat_section(programs: &[(u16, u16)]) -> Vec<u8> {
        let mut section = vec![0x00, 0xB0, (5 + 4 * programs.len() + 4) as u8, 0x00, 0x01, 0xC1, 0x00, 0x00];
        for &(program, pid) in programs {
            section.extend_from_slice(&program.to_be_bytes());
            section.extend_from_slice(&[0xE0 | (pid >> 8) as u8, pid as u8]);
        }
        with_crc(section)
    }

    fn pat(programs: &[(u16, u16)]) -> TsPacket {
        let mut body = vec![0x00];
        body.extend(pat_section(programs));
        packet(PID_PAT, true, 0, &body)
    }

    /// PMT section from table_id through CRC, declaring `streams` after a
    /// program descriptor loop of `info_len` bytes.
    fn pmt_section(program: u16, info_len: usize, streams: &[(u8, u16, usize)]) -> Vec<u8> {
        let mut body = program.to_be_bytes().to_vec();
        body.extend_from_slice(&[0xC1, 0x00, 0x00, 0xE1, 0x00]);
        body.extend_from_slice(&[0xF0 | (info_len >> 8) as u8, info_len as u8]);
        body.extend(std::iter::repeat(0x00).take(info_len));
        for &(stream_type, pid, es_len) in streams {
            body.push(stream_type);
            body.extend_from_slice(&[0xE0 | (pid >> 8) as u8, pid as u8]);
            body.extend_from_slice(&[0xF0 | (es_len >> 8) as u8, es_len as u8]);
            body.extend(std::iter::repeat(0x00).take(es_len));
        }
        let section_length = body.len() + 4;
        let mut section = vec![0x02, 0xB0 | (section_length >> 8) as u8, section_length as u8];
        section.extend(body);
        with_crc(section)
    }

    /// Splits a section into packets: pointer field in the first, then full
    /// 184-byte continuations.
    fn pmt_packets(pid: u16, section: &[u8]) -> Vec<TsPacket> {
        let mut packets = Vec::new();
        let first = section.len().min(183);
        let mut body = vec![0x00];
        body.extend_from_slice(&section[..first]);
        packets.push(packet(pid, true, 0, &body));
        for (i, chunk) in section[first..].chunks(184).enumerate() {
            packets.push(packet(pid, false, i as u8 + 1, chunk));
        }
        packets
    }

    #[test]
    fn test_pat_builds_association() {
        let mut tracker = ProgramTableTracker::new(false);
        let event = tracker.feed(&pat(&[(0, 0x10), (1, 0x100), (2, 0x200)]));

        let Some(TableEvent::Pat(association)) = event else {
            panic!("expected PAT event");
        };
        assert_eq!(association.len(), 2);
        assert_eq!(association.program_number(0x100), Some(1));
        assert_eq!(association.program_number(0x200), Some(2));
        assert!(!association.is_pmt_pid(0x10));
        assert!(tracker.is_table_pid(0));
        assert!(tracker.is_table_pid(0x100));
        assert!(!tracker.is_table_pid(0x101));
    }

    #[test]
    fn test_pat_replaced_wholesale() {
        let mut tracker = ProgramTableTracker::new(false);
        tracker.feed(&pat(&[(1, 0x100)]));
        tracker.feed(&pat(&[(3, 0x300)]));
        assert!(!tracker.association().is_pmt_pid(0x100));
        assert_eq!(tracker.association().program_number(0x300), Some(3));
    }

    #[test]
    fn test_pat_with_transport_error_ignored() {
        let mut tracker = ProgramTableTracker::new(false);
        let p = pat(&[(1, 0x100)]);
        let mut raw = p.as_bytes().to_vec();
        raw[1] |= 0x80;
        let p = TsPacket::new(Bytes::from(raw)).unwrap();
        assert_eq!(tracker.feed(&p), None);
        assert!(tracker.association().is_empty());
    }

    #[test]
    fn test_single_packet_pmt() {
        let mut tracker = ProgramTableTracker::new(false);
        tracker.feed(&pat(&[(1, 0x100)]));

        let section = pmt_section(1, 0, &[(0x02, 0x111, 0), (0x0f, 0x112, 0), (0x06, 0x113, 3)]);
        let packets = pmt_packets(0x100, &section);
        assert_eq!(packets.len(), 1);

        let event = tracker.feed(&packets[0]).unwrap();
        let TableEvent::Pmt { program_number, streams, .. } = event else {
            panic!("expected PMT event");
        };
        assert_eq!(program_number, 1);
        assert_eq!(streams.len(), 3);
        assert_eq!(tracker.video_pids(), &[0x111]);
        assert_eq!(tracker.audio_pids(), &[0x112]);
        assert_eq!(tracker.stream(0x113).unwrap().kind(), StreamKind::Other);
        assert_eq!(tracker.stream(0x112).unwrap().program_number, 1);
    }

    #[test]
    fn test_pmt_split_across_packets() {
        // large descriptor loops push the section over three packets
        let section = pmt_section(1, 300, &[(0x02, 0x111, 40), (0x0f, 0x112, 100)]);
        let packets = pmt_packets(0x100, &section);
        assert_eq!(packets.len(), 3);

        let mut tracker = ProgramTableTracker::new(false);
        tracker.feed(&pat(&[(1, 0x100)]));
        assert_eq!(tracker.feed(&packets[0]), None);
        assert_eq!(tracker.feed(&packets[1]), None);
        let Some(TableEvent::Pmt { streams, .. }) = tracker.feed(&packets[2]) else {
            panic!("expected PMT event");
        };
        assert_eq!(
            streams,
            vec![
                ProgramMapEntry { elementary_pid: 0x111, stream_type: 0x02, program_number: 1 },
                ProgramMapEntry { elementary_pid: 0x112, stream_type: 0x0f, program_number: 1 },
            ]
        );
        assert_eq!(tracker.video_pids(), &[0x111]);
        assert_eq!(tracker.audio_pids(), &[0x112]);
    }

    #[test]
    fn test_new_section_start_discards_partial() {
        let mut tracker = ProgramTableTracker::new(false);
        tracker.feed(&pat(&[(1, 0x100)]));
        let long = pmt_packets(0x100, &pmt_section(1, 300, &[(0x0f, 0x112, 0)]));
        let short = pmt_packets(0x100, &pmt_section(1, 0, &[(0x0f, 0x113, 0)]));

        assert_eq!(tracker.feed(&long[0]), None);
        assert!(tracker.feed(&short[0]).is_some());
        assert_eq!(tracker.feed(&long[1]), None);
        assert_eq!(tracker.audio_pids(), &[0x113]);
    }

    #[test]
    fn test_continuation_without_start_ignored() {
        let mut tracker = ProgramTableTracker::new(false);
        tracker.feed(&pat(&[(1, 0x100)]));
        assert_eq!(tracker.feed(&packet(0x100, false, 1, &[0x02, 0xE1])), None);
        assert!(tracker.streams().next().is_none());
    }

    #[test]
    fn test_pids_are_deduplicated_and_never_removed() {
        let mut tracker = ProgramTableTracker::new(false);
        tracker.feed(&pat(&[(1, 0x100)]));
        let first = pmt_section(1, 0, &[(0x02, 0x111, 0), (0x0f, 0x112, 0)]);
        let second = pmt_section(1, 0, &[(0x02, 0x111, 0), (0x0f, 0x114, 0)]);
        tracker.feed(&pmt_packets(0x100, &first)[0]);
        tracker.feed(&pmt_packets(0x100, &first)[0]);
        tracker.feed(&pmt_packets(0x100, &second)[0]);

        assert_eq!(tracker.video_pids(), &[0x111]);
        assert_eq!(tracker.audio_pids(), &[0x112, 0x114]);
    }

    #[test]
    fn test_bad_crc_still_applied() {
        let mut tracker = ProgramTableTracker::new(false);
        tracker.feed(&pat(&[(1, 0x100)]));
        let mut section = pmt_section(1, 0, &[(0x0f, 0x112, 0)]);
        let last = section.len() - 1;
        section[last] ^= 0xFF;
        assert!(tracker.feed(&pmt_packets(0x100, &section)[0]).is_some());
        assert!(tracker.is_audio_pid(0x112));
    }

    #[test]
    fn test_interleaved_programs() {
        let mut tracker = ProgramTableTracker::new(true);
        tracker.feed(&pat(&[(1, 0x100), (2, 0x200)]));
        let a = pmt_packets(0x100, &pmt_section(1, 200, &[(0x0f, 0x112, 0)]));
        let b = pmt_packets(0x200, &pmt_section(2, 200, &[(0x0f, 0x212, 0)]));
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 2);

        assert_eq!(tracker.feed(&a[0]), None);
        assert_eq!(tracker.feed(&b[0]), None);
        assert!(tracker.feed(&a[1]).is_some());
        assert!(tracker.feed(&b[1]).is_some());
        assert_eq!(tracker.stream(0x212).unwrap().program_number, 2);
        assert_eq!(tracker.audio_pids(), &[0x112, 0x212]);
    }

    #[test]
    fn test_tables_behind_adaptation_field() {
        let mut tracker = ProgramTableTracker::new(false);
        let mut body = vec![0x00];
        body.extend(pat_section(&[(1, 0x100)]));
        let Some(TableEvent::Pat(association)) =
            tracker.feed(&stuffed_packet(PID_PAT, true, 0, &body))
        else {
            panic!("expected PAT event");
        };
        assert_eq!(association.len(), 1);
        assert_eq!(association.program_number(0x100), Some(1));
        assert!(!tracker.is_table_pid(PID_NULL));

        let mut body = vec![0x00];
        body.extend(pmt_section(1, 0, &[(0x0f, 0x112, 0)]));
        assert!(tracker.feed(&stuffed_packet(0x100, true, 0, &body)).is_some());
        assert_eq!(tracker.audio_pids(), &[0x112]);
    }

    #[test]
    fn test_pmt_continuation_behind_adaptation_field() {
        let section = pmt_section(1, 200, &[(0x02, 0x111, 0)]);
        let mut tracker = ProgramTableTracker::new(false);
        tracker.feed(&pat(&[(1, 0x100)]));

        let mut body = vec![0x00];
        body.extend_from_slice(&section[..183]);
        assert_eq!(tracker.feed(&packet(0x100, true, 0, &body)), None);
        assert!(tracker.feed(&stuffed_packet(0x100, false, 1, &section[183..])).is_some());
        assert_eq!(tracker.video_pids(), &[0x111]);
    }

    #[test]
    fn test_pointer_field_skips_bytes() {
        let mut tracker = ProgramTableTracker::new(false);
        let mut body = vec![0x02, 0xAA, 0xBB];
        body.extend(pat_section(&[(1, 0x100)]));
        assert!(tracker.feed(&packet(PID_PAT, true, 0, &body)).is_some());
        assert_eq!(tracker.association().program_number(0x100), Some(1));

        // pointer_field pointing past the payload
        let mut tracker = ProgramTableTracker::new(false);
        let mut body = vec![0xF0];
        body.extend(pat_section(&[(1, 0x100)]));
        assert_eq!(tracker.feed(&stuffed_packet(PID_PAT, true, 0, &body)), None);
        assert!(tracker.association().is_empty());
    }

    #[test]
    fn test_repeated_tables_reported_once() {
        let mut tracker = ProgramTableTracker::new(false);
        assert!(tracker.feed(&pat(&[(1, 0x100)])).is_some());
        assert_eq!(tracker.feed(&pat(&[(1, 0x100)])), None);

        let pmt = pmt_packets(0x100, &pmt_section(1, 0, &[(0x0f, 0x112, 0)]));
        assert!(tracker.feed(&pmt[0]).is_some());
        for _ in 0..3 {
            assert_eq!(tracker.feed(&pmt[0]), None);
        }

        let revised = pmt_packets(0x100, &pmt_section(1, 0, &[(0x0f, 0x113, 0)]));
        assert!(tracker.feed(&revised[0]).is_some());
        assert!(tracker.feed(&pat(&[(1, 0x100), (2, 0x200)])).is_some());
    }

    #[test]
    fn test_first_empty_pat_reported() {
        let mut tracker = ProgramTableTracker::new(false);
        let Some(TableEvent::Pat(association)) = tracker.feed(&pat(&[(0, 0x10)])) else {
            panic!("expected PAT event");
        };
        assert!(association.is_empty());
        assert_eq!(tracker.feed(&pat(&[(0, 0x10)])), None);
    }

    #[test]
    fn test_program_readded_is_reannounced() {
        let mut tracker = ProgramTableTracker::new(false);
        let pmt = pmt_packets(0x100, &pmt_section(1, 0, &[(0x0f, 0x112, 0)]));
        tracker.feed(&pat(&[(1, 0x100)]));
        assert!(tracker.feed(&pmt[0]).is_some());

        tracker.feed(&pat(&[(2, 0x200)]));
        tracker.feed(&pat(&[(1, 0x100)]));
        assert!(tracker.feed(&pmt[0]).is_some());
    }
}
