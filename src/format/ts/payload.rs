use super::parser::CONTINUITY_COUNTER_MASK;
use super::types::*;
use crate::format::Transform;
use bytes::{Bytes, BytesMut};
use log::{debug, warn};
use std::collections::HashMap;

/// One complete PES payload unit, from its `payload_unit_start_indicator`
/// packet up to the packet before the next start on the same PID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PesPayload {
    /// PID the unit arrived on.
    pub pid: u16,
    /// Concatenated packet payloads, starting at the PES start code.
    pub data: Bytes,
}

/// Helper for assembling a payload unit from TS packet payloads.
#[derive(Debug, Default)]
struct PayloadBuilder {
    pieces: Vec<Bytes>,
    len: usize,
}

impl PayloadBuilder {
    fn push_data(&mut self, data: Bytes) {
        self.len += data.len();
        self.pieces.push(data);
    }

    /// Concatenates the pieces. A single piece is handed out as is.
    fn take_data(mut self) -> Bytes {
        if self.pieces.len() == 1 {
            return self.pieces.pop().unwrap_or_default();
        }
        let mut data = BytesMut::with_capacity(self.len);
        for piece in &self.pieces {
            data.extend_from_slice(piece);
        }
        data.freeze()
    }
}

#[derive(Debug, Default)]
struct StreamState {
    last_cc: Option<u8>,
    builder: Option<PayloadBuilder>,
}

/// Strips TS headers and reassembles PES payload units per PID.
///
/// A transport error or a continuity counter that does not advance by one
/// drops the unit being assembled; the packet that revealed the gap is
/// still used and may start the next unit. Packets arriving before the
/// first unit start on a PID are discarded. The unit in flight when input
/// stops is never emitted.
#[derive(Debug, Default)]
pub struct PayloadReassembler {
    streams: HashMap<u16, StreamState>,
}

impl PayloadReassembler {
    /// Creates a reassembler holding no state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently held for `pid`.
    pub fn pending_len(&self, pid: u16) -> usize {
        self.streams
            .get(&pid)
            .and_then(|s| s.builder.as_ref())
            .map_or(0, |b| b.len)
    }

    /// Forgets every unit in flight and every continuity counter.
    pub fn reset(&mut self) {
        self.streams.clear();
    }
}

impl Transform<TsPacket> for PayloadReassembler {
    type Output = PesPayload;

    fn transform(&mut self, packet: TsPacket, out: &mut Vec<PesPayload>) {
        let pid = packet.pid();
        let state = self.streams.entry(pid).or_default();

        if packet.transport_error_indicator() {
            debug!("transport error on PID {:#06x}, partial payload dropped", pid);
            state.builder = None;
            state.last_cc = None;
            return;
        }

        // counter only advances on packets carrying payload
        if !packet.adaptation_field_control().has_payload() {
            return;
        }

        let cc = packet.continuity_counter();
        if let Some(last) = state.last_cc {
            let expected = (last + 1) & CONTINUITY_COUNTER_MASK;
            if cc != expected {
                if matches!(packet.adaptation_field(), Ok(Some(af)) if af.discontinuity) {
                    debug!("signalled discontinuity on PID {:#06x}", pid);
                } else {
                    debug!(
                        "continuity error on PID {:#06x}: expected {} got {}",
                        pid, expected, cc
                    );
                }
                state.builder = None;
            }
        }
        state.last_cc = Some(cc);

        let Some(payload) = packet.payload() else {
            warn!(
                "adaptation field overflows packet on PID {:#06x}, dropped",
                pid
            );
            state.builder = None;
            return;
        };

        if packet.payload_unit_start_indicator() {
            if let Some(previous) = state.builder.take() {
                out.push(PesPayload {
                    pid,
                    data: previous.take_data(),
                });
            }
            let mut builder = PayloadBuilder::default();
            builder.push_data(payload);
            state.builder = Some(builder);
        } else if let Some(builder) = state.builder.as_mut() {
            builder.push_data(payload);
        }
    }
}
