use super::types::{TsPacket, TS_PACKET_SIZE, TS_SYNC_BYTE};
use crate::format::Transform;
use bytes::{Bytes, BytesMut};
use log::{debug, warn};

/// Recovers aligned 188-byte packets from arbitrarily chunked input.
///
/// Packets that lie wholly inside a chunk are zero-copy slices of it. A
/// packet split across chunks is rebuilt in an owned buffer, so nothing
/// here keeps a previous chunk alive.
///
/// A stray `0x47` inside garbage data can cause a false lock; the next
/// packet's sync byte is not checked before committing.
#[derive(Debug, Default)]
pub struct PacketSynchronizer {
    held: BytesMut,
}

impl PacketSynchronizer {
    /// Creates a synchronizer with nothing held.
    pub fn new() -> Self {
        Self {
            held: BytesMut::with_capacity(TS_PACKET_SIZE),
        }
    }

    /// Bytes of an incomplete packet carried over to the next chunk.
    pub fn held_len(&self) -> usize {
        self.held.len()
    }

    /// Drops the held partial packet; the next chunk is searched for a
    /// sync byte from its start.
    pub fn reset(&mut self) {
        self.held.clear();
    }

    fn emit(raw: Bytes, out: &mut Vec<TsPacket>) {
        match TsPacket::new(raw) {
            Ok(packet) => out.push(packet),
            Err(e) => warn!("dropping unaligned packet: {}", e),
        }
    }
}

impl Transform<Bytes> for PacketSynchronizer {
    type Output = TsPacket;

    fn transform(&mut self, chunk: Bytes, out: &mut Vec<TsPacket>) {
        let mut idx = 0;

        if !self.held.is_empty() {
            let need = TS_PACKET_SIZE - self.held.len();
            if chunk.len() < need {
                self.held.extend_from_slice(&chunk);
                return;
            }
            self.held.extend_from_slice(&chunk[..need]);
            Self::emit(self.held.split().freeze(), out);
            idx = need;
        }

        while idx < chunk.len() {
            let Some(pos) = chunk[idx..].iter().position(|&b| b == TS_SYNC_BYTE) else {
                debug!("no sync byte in {} trailing bytes, discarding", chunk.len() - idx);
                self.held.clear();
                return;
            };
            let start = idx + pos;
            if pos > 0 {
                debug!("skipped {} bytes looking for sync", pos);
            }
            if start + TS_PACKET_SIZE > chunk.len() {
                self.held.clear();
                self.held.extend_from_slice(&chunk[start..]);
                return;
            }
            Self::emit(chunk.slice(start..start + TS_PACKET_SIZE), out);
            idx = start + TS_PACKET_SIZE;
        }
    }
}
