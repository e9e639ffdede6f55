//! # MPEG Transport Stream (TS) demultiplexing
//!
//! Stages, in pipeline order:
//!
//! - [`sync`]: byte chunks to aligned 188-byte [`TsPacket`]s
//! - [`tables`]: PAT/PMT tracking and PID classification
//! - [`filter`]: keeps the selected video/audio PIDs
//! - [`payload`]: PES payload reassembly per PID
//! - [`pes`]: PES header views
//!
//! [`TsDemuxer`] wires them together with the ADTS reassembler from
//! [`crate::codec::aac`]; [`TsStreamReader`] drives it from an async reader.
//!
//! ```rust
//! use bytes::Bytes;
//! use tslive::format::ts::{PacketSynchronizer, TS_PACKET_SIZE};
//! use tslive::format::Transform;
//!
//! let mut data = vec![0u8; 2 * TS_PACKET_SIZE];
//! data[0] = 0x47;
//! data[TS_PACKET_SIZE] = 0x47;
//!
//! let mut sync = PacketSynchronizer::new();
//! let mut packets = sync.process(Bytes::copy_from_slice(&data[..100]));
//! packets.extend(sync.process(Bytes::copy_from_slice(&data[100..])));
//! assert_eq!(packets.len(), 2);
//! ```

/// TS demuxer wiring all stages for one stream
pub mod demuxer;

/// PID selection
pub mod filter;

/// Low-level TS packet and section parsing
pub mod parser;

/// PES payload reassembly
pub mod payload;

/// PES header decoding
pub mod pes;

/// Async driver over a byte source
pub mod reader;

/// Packet synchronization
pub mod sync;

/// PAT/PMT tracking
pub mod tables;

/// Core TS types and constants
pub mod types;


pub use demuxer::{DemuxEvent, TsDemuxer};
pub use filter::PidFilter;
pub use payload::{PayloadReassembler, PesPayload};
pub use pes::{PesHeaderDecoder, PesPacket};
pub use reader::TsStreamReader;
pub use sync::PacketSynchronizer;
pub use tables::{ProgramAssociation, ProgramMapEntry, ProgramTableTracker, StreamKind, TableEvent};
pub use types::{
    AdaptationField,
    AdaptationFieldControl,
    TsHeader,
    TsPacket,
    PID_NULL,
    PID_PAT,
    STREAM_TYPE_AAC,
    STREAM_TYPE_MPEG2_VIDEO,
    TS_PACKET_SIZE,
};
