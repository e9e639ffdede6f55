#![allow(dead_code)]

use std::collections::HashMap;
use tslive::utils::Crc32Mpeg2;

pub const TS_PACKET_SIZE: usize = 188;
pub const PMT_PID: u16 = 0x100;
pub const AUDIO_PID: u16 = 0x101;
pub const VIDEO_PID: u16 = 0x102;

/// ADTS frame of `len` bytes (MPEG-2 AAC-LC, 48 kHz, stereo) filled with `fill`.
pub fn adts_frame(len: usize, fill: u8) -> Vec<u8> {
    let mut frame = vec![
        0xFF,
        0xF8,
        0x4C,
        0x80 | (len >> 11) as u8,
        (len >> 3) as u8,
        ((len as u8 & 0x07) << 5) | 0x1F,
        0xFC,
    ];
    frame.resize(len, fill);
    frame
}

/// Writes TS packets with per-PID continuity counters.
#[derive(Default)]
pub struct TsWriter {
    pub bytes: Vec<u8>,
    counters: HashMap<u16, u8>,
}

impl TsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packet(&mut self, pid: u16, start: bool, payload: &[u8]) -> &mut Self {
        assert!(payload.len() <= 184);
        let cc = self.counters.entry(pid).or_insert(0x0f);
        *cc = (*cc + 1) & 0x0f;

        let mut packet = [0xFFu8; TS_PACKET_SIZE];
        packet[0] = 0x47;
        packet[1] = (if start { 0x40 } else { 0x00 }) | (pid >> 8) as u8;
        packet[2] = pid as u8;
        let stuffing = 184 - payload.len();
        if stuffing == 0 {
            packet[3] = 0x10 | *cc;
        } else {
            packet[3] = 0x30 | *cc;
            packet[4] = (stuffing - 1) as u8;
            if stuffing > 1 {
                packet[5] = 0x00;
            }
        }
        packet[TS_PACKET_SIZE - payload.len()..].copy_from_slice(payload);
        self.bytes.extend_from_slice(&packet);
        self
    }

    fn section(&mut self, pid: u16, mut section: Vec<u8>) -> &mut Self {
        let crc = Crc32Mpeg2::new().calculate(&section);
        section.extend_from_slice(&crc.to_be_bytes());
        let mut payload = vec![0x00];
        payload.extend(section);
        self.packet(pid, true, &payload)
    }

    /// PAT mapping each `(program_number, pmt_pid)`.
    pub fn pat(&mut self, programs: &[(u16, u16)]) -> &mut Self {
        let mut section = vec![0x00, 0xB0, (9 + 4 * programs.len()) as u8, 0x00, 0x01, 0xC1, 0x00, 0x00];
        for &(program, pid) in programs {
            section.extend_from_slice(&program.to_be_bytes());
            section.extend_from_slice(&[0xE0 | (pid >> 8) as u8, pid as u8]);
        }
        self.section(0, section)
    }

    /// PMT declaring each `(stream_type, elementary_pid)`.
    pub fn pmt(&mut self, pid: u16, program: u16, streams: &[(u8, u16)]) -> &mut Self {
        let mut section = vec![0x02, 0xB0, (13 + 5 * streams.len()) as u8];
        section.extend_from_slice(&program.to_be_bytes());
        section.extend_from_slice(&[0xC1, 0x00, 0x00, 0xE1, 0x00, 0xF0, 0x00]);
        for &(stream_type, es_pid) in streams {
            section.extend_from_slice(&[stream_type, 0xE0 | (es_pid >> 8) as u8, es_pid as u8, 0xF0, 0x00]);
        }
        self.section(pid, section)
    }

    /// PES packet with a PTS, cut into TS packets.
    pub fn pes(&mut self, pid: u16, stream_id: u8, pts: u64, payload: &[u8]) -> &mut Self {
        let mut pes = vec![0x00, 0x00, 0x01, stream_id, 0x00, 0x00, 0x80, 0x80, 0x05];
        pes.extend_from_slice(&[
            0x21 | (((pts >> 30) as u8 & 0x07) << 1),
            (pts >> 22) as u8,
            (((pts >> 15) as u8) << 1) | 1,
            (pts >> 7) as u8,
            ((pts as u8) << 1) | 1,
        ]);
        pes.extend_from_slice(payload);
        let length = (pes.len() - 6).min(u16::MAX as usize) as u16;
        pes[4..6].copy_from_slice(&length.to_be_bytes());
        for (i, chunk) in pes.chunks(184).enumerate() {
            self.packet(pid, i == 0, chunk);
        }
        self
    }
}

/// Splits `bytes` at the given offsets.
pub fn split_at(bytes: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for &cut in cuts {
        chunks.push(bytes[start..cut].to_vec());
        start = cut;
    }
    chunks.push(bytes[start..].to_vec());
    chunks
}
