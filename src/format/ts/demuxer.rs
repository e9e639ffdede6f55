use super::filter::PidFilter;
use super::payload::PayloadReassembler;
use super::pes::{PesHeaderDecoder, PesPacket};
use super::sync::PacketSynchronizer;
use super::tables::{ProgramAssociation, ProgramMapEntry, ProgramTableTracker, TableEvent};
use super::types::TsPacket;
use crate::codec::aac::{AdtsFrame, AdtsFrameReassembler};
use crate::config::{DemuxConfig, VideoOutput};
use crate::format::Transform;
use bytes::Bytes;
use log::{debug, trace};
use std::collections::HashMap;

/// Output of [`TsDemuxer`].
#[derive(Debug, Clone, PartialEq)]
pub enum DemuxEvent {
    /// The first PAT, or one whose program map changed.
    ProgramsUpdated(ProgramAssociation),
    /// A PMT whose stream list differs from the last one announced on its
    /// PID. Repetitions of an unchanged PMT are not reported.
    StreamsUpdated {
        /// PID the PMT arrived on.
        pmt_pid: u16,
        /// Program the PMT describes.
        program_number: u16,
        /// Elementary streams in PMT order.
        streams: Vec<ProgramMapEntry>,
    },
    /// A selected video packet, unchanged.
    VideoPacket(TsPacket),
    /// A reassembled video PES, when [`VideoOutput::Pes`] is configured.
    VideoPes(PesPacket),
    /// One complete ADTS frame from an audio PID.
    AudioFrame {
        /// Audio PID the frame was carried on.
        pid: u16,
        /// The frame, stamped with the PTS of the PES that started it.
        frame: AdtsFrame,
    },
}

impl From<TableEvent> for DemuxEvent {
    fn from(event: TableEvent) -> Self {
        match event {
            TableEvent::Pat(association) => DemuxEvent::ProgramsUpdated(association),
            TableEvent::Pmt {
                pmt_pid,
                program_number,
                streams,
            } => DemuxEvent::StreamsUpdated {
                pmt_pid,
                program_number,
                streams,
            },
        }
    }
}

/// MPEG Transport Stream demuxer for one stream session.
///
/// Chunks of any size go in, in arrival order; each chunk runs through
/// packet sync, table tracking, PID filtering, payload reassembly, PES
/// decoding and, for audio, ADTS framing. Nothing is flushed at end of
/// input: the payload units still being assembled are dropped.
pub struct TsDemuxer {
    config: DemuxConfig,
    sync: PacketSynchronizer,
    tables: ProgramTableTracker,
    filter: PidFilter,
    payloads: PayloadReassembler,
    pes: PesHeaderDecoder,
    /// One ADTS reassembler per audio PID.
    audio: HashMap<u16, AdtsFrameReassembler>,
    packets: Vec<TsPacket>,
}

impl TsDemuxer {
    /// Creates a demuxer with empty tables; nothing is selected until a PMT
    /// declares audio or video streams.
    pub fn new(config: DemuxConfig) -> Self {
        Self {
            sync: PacketSynchronizer::new(),
            tables: ProgramTableTracker::new(config.debug),
            filter: PidFilter::new(config.forward_video, config.forward_audio),
            payloads: PayloadReassembler::new(),
            pes: PesHeaderDecoder::new(config.debug),
            audio: HashMap::new(),
            packets: Vec::new(),
            config,
        }
    }

    /// Configuration the demuxer was built with.
    pub fn config(&self) -> &DemuxConfig {
        &self.config
    }

    /// Program tables seen so far.
    pub fn tables(&self) -> &ProgramTableTracker {
        &self.tables
    }

    /// Drops every partial packet, payload unit and ADTS frame, keeping the
    /// program tables. For resuming after the byte source was reconnected.
    pub fn reset(&mut self) {
        self.sync.reset();
        self.payloads.reset();
        self.audio.clear();
    }

    /// Feeds one chunk and returns the events it completed.
    pub fn push(&mut self, chunk: Bytes) -> Vec<DemuxEvent> {
        self.process(chunk)
    }

    fn handle_packet(&mut self, packet: TsPacket, out: &mut Vec<DemuxEvent>) {
        if self.config.debug {
            trace!("{}", packet);
        }
        let pid = packet.pid();

        if self.tables.is_table_pid(pid) {
            if let Some(event) = self.tables.feed(&packet) {
                out.push(event.into());
            }
            return;
        }

        let Some(packet) = self.filter.filter(&self.tables, packet) else {
            return;
        };
        if self.tables.is_video_pid(pid) && self.config.video_output == VideoOutput::Packets {
            out.push(DemuxEvent::VideoPacket(packet));
            return;
        }

        for payload in self.payloads.process(packet) {
            for pes in self.pes.process(payload) {
                self.handle_pes(pes, out);
            }
        }
    }

    fn handle_pes(&mut self, pes: PesPacket, out: &mut Vec<DemuxEvent>) {
        let pid = pes.pid();
        if !self.tables.is_audio_pid(pid) {
            out.push(DemuxEvent::VideoPes(pes));
            return;
        }

        let debug = self.config.debug;
        let reassembler = self.audio.entry(pid).or_insert_with(|| {
            debug!("ADTS reassembly started on PID {:#06x}", pid);
            AdtsFrameReassembler::new(debug)
        });
        out.extend(
            reassembler
                .process(pes)
                .into_iter()
                .map(|frame| DemuxEvent::AudioFrame { pid, frame }),
        );
    }
}

impl Default for TsDemuxer {
    fn default() -> Self {
        Self::new(DemuxConfig::default())
    }
}

impl Transform<Bytes> for TsDemuxer {
    type Output = DemuxEvent;

    fn transform(&mut self, chunk: Bytes, out: &mut Vec<DemuxEvent>) {
        let mut packets = std::mem::take(&mut self.packets);
        self.sync.transform(chunk, &mut packets);
        for packet in packets.drain(..) {
            self.handle_packet(packet, out);
        }
        self.packets = packets;
    }
}
