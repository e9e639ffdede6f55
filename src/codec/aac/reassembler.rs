//! ADTS frame reassembly across PES payloads.

use super::parser::{find_sync, is_sync, parse_adts_header};
use super::types::{AdtsFrame, AdtsHeader, ADTS_HEADER_SIZE};
use crate::format::ts::pes::PesPacket;
use crate::format::Transform;
use bytes::{Bytes, BytesMut};
use log::{debug, trace};

const SYNC_FIRST_BYTE: u8 = 0xFF;

#[derive(Debug, Default)]
enum State {
    #[default]
    NoFragment,
    /// Fewer than [`ADTS_HEADER_SIZE`] bytes of a possible header.
    HeaderFragment { bytes: BytesMut, pts: u64 },
    /// A parsed header and the frame bytes collected so far.
    FrameInProgress {
        header: AdtsHeader,
        data: BytesMut,
        pts: u64,
    },
}

/// Cuts ADTS frames out of audio PES payloads.
///
/// Frames may start anywhere in a payload and may span any number of
/// payloads. A frame carries the PTS of the PES its header started in.
/// Payloads without a PTS are skipped without touching held state.
#[derive(Debug, Default)]
pub struct AdtsFrameReassembler {
    state: State,
    debug: bool,
}

impl AdtsFrameReassembler {
    /// Creates an idle reassembler; `debug` enables per-frame trace logs.
    pub fn new(debug: bool) -> Self {
        Self {
            state: State::NoFragment,
            debug,
        }
    }

    /// Bytes held over for the next payload.
    pub fn pending_len(&self) -> usize {
        match &self.state {
            State::NoFragment => 0,
            State::HeaderFragment { bytes, .. } => bytes.len(),
            State::FrameInProgress { data, .. } => data.len(),
        }
    }

    /// Feeds elementary stream bytes stamped with `pts`.
    pub fn push(&mut self, mut chunk: Bytes, pts: u64, out: &mut Vec<AdtsFrame>) {
        loop {
            match std::mem::take(&mut self.state) {
                State::NoFragment => {
                    if chunk.is_empty() {
                        return;
                    }
                    let Some(idx) = find_sync(&chunk) else {
                        if chunk.last() == Some(&SYNC_FIRST_BYTE) {
                            self.state = State::HeaderFragment {
                                bytes: BytesMut::from(&[SYNC_FIRST_BYTE][..]),
                                pts,
                            };
                        } else {
                            debug!("no ADTS sync in {} bytes, dropped", chunk.len());
                        }
                        return;
                    };
                    if idx > 0 {
                        debug!("skipped {} bytes before ADTS sync", idx);
                        chunk = chunk.slice(idx..);
                    }
                    if chunk.len() < ADTS_HEADER_SIZE {
                        self.state = State::HeaderFragment {
                            bytes: BytesMut::from(&chunk[..]),
                            pts,
                        };
                        return;
                    }
                    let Some(header) = self.frame_header(&chunk[..ADTS_HEADER_SIZE]) else {
                        chunk = chunk.slice(1..);
                        continue;
                    };
                    let frame_length = header.frame_length as usize;
                    if chunk.len() >= frame_length {
                        self.emit(out, header, chunk.slice(..frame_length), pts);
                        chunk = chunk.slice(frame_length..);
                    } else {
                        self.state = State::FrameInProgress {
                            header,
                            data: BytesMut::from(&chunk[..]),
                            pts,
                        };
                        return;
                    }
                }
                State::HeaderFragment {
                    mut bytes,
                    pts: fragment_pts,
                } => {
                    let need = ADTS_HEADER_SIZE - bytes.len();
                    if chunk.len() < need {
                        bytes.extend_from_slice(&chunk);
                        self.state = State::HeaderFragment {
                            bytes,
                            pts: fragment_pts,
                        };
                        return;
                    }
                    let mut candidate = [0u8; ADTS_HEADER_SIZE];
                    candidate[..bytes.len()].copy_from_slice(&bytes);
                    candidate[bytes.len()..].copy_from_slice(&chunk[..need]);
                    match self.frame_header(&candidate) {
                        Some(header) => {
                            // chunk stays whole: the frame collects from it below
                            self.state = State::FrameInProgress {
                                header,
                                data: bytes,
                                pts: fragment_pts,
                            };
                        }
                        None => {
                            debug!("held ADTS header fragment lost sync, rescanning");
                        }
                    }
                }
                State::FrameInProgress {
                    header,
                    mut data,
                    pts: frame_pts,
                } => {
                    let want = header.frame_length as usize - data.len();
                    if chunk.len() < want {
                        data.extend_from_slice(&chunk);
                        self.state = State::FrameInProgress {
                            header,
                            data,
                            pts: frame_pts,
                        };
                        return;
                    }
                    data.extend_from_slice(&chunk[..want]);
                    chunk = chunk.slice(want..);
                    self.emit(out, header, data.freeze(), frame_pts);
                }
            }
        }
    }

    /// Parses a candidate header, rejecting lengths shorter than the header.
    fn frame_header(&self, candidate: &[u8]) -> Option<AdtsHeader> {
        if !is_sync(candidate) {
            return None;
        }
        match parse_adts_header(candidate) {
            Ok(header) if header.frame_length as usize >= ADTS_HEADER_SIZE => Some(header),
            Ok(header) => {
                debug!("ADTS frame length {} below header size", header.frame_length);
                None
            }
            Err(e) => {
                debug!("ADTS header rejected: {}", e);
                None
            }
        }
    }

    fn emit(&self, out: &mut Vec<AdtsFrame>, header: AdtsHeader, data: Bytes, pts: u64) {
        if self.debug {
            trace!("Found ADTS Frame Header:{} pts:{}", header, pts);
        }
        out.push(AdtsFrame::new(header, data, pts));
    }
}

impl Transform<PesPacket> for AdtsFrameReassembler {
    type Output = AdtsFrame;

    fn transform(&mut self, packet: PesPacket, out: &mut Vec<AdtsFrame>) {
        let Some(pts) = packet.pts() else {
            debug!("audio PES on PID {:#06x} without PTS skipped", packet.pid());
            return;
        };
        if let Some(payload) = packet.payload() {
            self.push(payload, pts, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    /// ADTS frame of `len` bytes whose body is filled with `fill`.
    fn frame(len: usize, fill: u8) -> Vec<u8> {
        let mut data = vec![
            0xFF,
            0xF8,
            0x4C,
            0x80 | (len >> 11) as u8,
            (len >> 3) as u8,
            ((len as u8 & 0x07) << 5) | 0x1F,
            0xFC,
        ];
        data.resize(len, fill);
        data
    }

    fn push(r: &mut AdtsFrameReassembler, chunk: &[u8], pts: u64) -> Vec<AdtsFrame> {
        let mut out = Vec::new();
        r.push(Bytes::copy_from_slice(chunk), pts, &mut out);
        out
    }

    fn bodies(frames: &[AdtsFrame]) -> Vec<Vec<u8>> {
        frames.iter().map(|f| f.data.to_vec()).collect()
    }

    #[test]
    fn test_back_to_back_frames_in_one_payload() {
        let mut r = AdtsFrameReassembler::new(false);
        let mut chunk = frame(20, 1);
        chunk.extend(frame(30, 2));
        let out = push(&mut r, &chunk, 180_000);
        assert_eq!(bodies(&out), vec![frame(20, 1), frame(30, 2)]);
        assert_eq!(out[0].timestamp, 2.0);
        assert_eq!(out[0].raw_data(), &[1u8; 11][..]);
        assert_eq!(out[1].pts, 180_000);
        assert_eq!(r.pending_len(), 0);
    }

    #[test]
    fn test_frame_spanning_payloads() {
        let mut r = AdtsFrameReassembler::new(false);
        let f = frame(100, 7);
        assert!(push(&mut r, &f[..40], 90_000).is_empty());
        assert_eq!(r.pending_len(), 40);
        assert!(push(&mut r, &f[40..70], 93_000).is_empty());
        let out = push(&mut r, &f[70..], 96_000);
        assert_eq!(bodies(&out), vec![f]);
        assert_eq!(out[0].pts, 90_000);
    }

    #[test]
    fn test_leading_garbage_skipped() {
        let mut r = AdtsFrameReassembler::new(false);
        let mut chunk = vec![0x00, 0x12, 0xFF, 0x00];
        chunk.extend(frame(12, 3));
        assert_eq!(bodies(&push(&mut r, &chunk, 0)), vec![frame(12, 3)]);
    }

    #[test]
    fn test_trailing_ff_held_as_fragment() {
        let mut r = AdtsFrameReassembler::new(false);
        let f = frame(16, 4);
        let mut first = vec![0x01, 0x02];
        first.push(f[0]);
        assert!(push(&mut r, &first, 0).is_empty());
        assert_eq!(r.pending_len(), 1);
        assert_eq!(bodies(&push(&mut r, &f[1..], 0)), vec![f]);
    }

    #[test]
    fn test_short_header_fragment_keeps_accumulating() {
        let mut r = AdtsFrameReassembler::new(false);
        let f = frame(16, 4);
        assert!(push(&mut r, &f[..3], 0).is_empty());
        assert!(push(&mut r, &f[3..5], 0).is_empty());
        assert_eq!(r.pending_len(), 5);
        assert_eq!(bodies(&push(&mut r, &f[5..], 0)), vec![f]);
    }

    #[test]
    fn test_fragment_without_sync_rescans_new_payload() {
        let mut r = AdtsFrameReassembler::new(false);
        // lone 0xFF that turns out not to be a sync word
        assert!(push(&mut r, &[0x00, 0xFF], 0).is_empty());
        let mut next = vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        next.extend(frame(10, 5));
        assert_eq!(bodies(&push(&mut r, &next, 0)), vec![frame(10, 5)]);
    }

    #[test]
    fn test_short_frame_length_skipped() {
        let mut r = AdtsFrameReassembler::new(false);
        let mut chunk = frame(7, 0);
        // declared length 3
        chunk[4] = 0x00;
        chunk[5] = 0x7F;
        chunk.extend(frame(9, 6));
        assert_eq!(bodies(&push(&mut r, &chunk, 0)), vec![frame(9, 6)]);
    }

    #[test]
    fn test_no_sync_dropped() {
        let mut r = AdtsFrameReassembler::new(false);
        assert!(push(&mut r, &[0x10, 0x20, 0x30], 0).is_empty());
        assert_eq!(r.pending_len(), 0);
    }

    #[test]
    fn test_pes_without_pts_skipped() {
        let mut r = AdtsFrameReassembler::new(false);
        let mut data = vec![0x00, 0x00, 0x01, 0xC0, 0x00, 0x00, 0x80, 0x00, 0x00];
        data.extend(frame(12, 1));
        assert!(r.process(PesPacket::new(0x101, Bytes::from(data))).is_empty());
    }

    #[quickcheck]
    fn prop_split_point_does_not_change_frames(lens: Vec<u8>, cut: usize) -> bool {
        let frames: Vec<Vec<u8>> = lens
            .iter()
            .enumerate()
            .map(|(i, &l)| frame(ADTS_HEADER_SIZE + l as usize, i as u8 & 0x7F))
            .collect();
        let stream = frames.concat();
        let cut = if stream.is_empty() { 0 } else { cut % stream.len() };

        let mut r = AdtsFrameReassembler::new(false);
        let mut out = push(&mut r, &stream[..cut], 0);
        out.extend(push(&mut r, &stream[cut..], 0));
        bodies(&out) == frames
    }
}
