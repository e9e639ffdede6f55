#![doc(html_root_url = "https://docs.rs/tslive/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

//! # tslive - streaming MPEG-2 TS demultiplexer
//!
//! `tslive` turns a live MPEG-2 transport stream, delivered as byte chunks
//! of any size (an HTTP response body, a socket, a pipe), into the
//! selected video packets and complete ADTS/AAC audio frames ready for a
//! decoder.
//!
//! ## Pipeline
//!
//! Each stage consumes the previous stage's records in arrival order:
//!
//! - packet synchronization on the `0x47` sync byte
//! - PAT/PMT tracking and elementary stream classification
//! - PID filtering (video, audio or both)
//! - PES payload reassembly with transport error and continuity checks
//! - PES header decoding (PTS/DTS and the optional header fields)
//! - ADTS frame reassembly across PES boundaries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tslive::{DemuxConfig, DemuxEvent, TsStreamReader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = tokio::fs::File::open("broadcast.ts").await?;
//!     let mut reader = TsStreamReader::new(file, DemuxConfig::default().with_video(false));
//!
//!     while let Some(event) = reader.next_event().await? {
//!         if let DemuxEvent::AudioFrame { frame, .. } = event {
//!             println!("{:.3}s {} bytes", frame.timestamp, frame.data.len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The synchronous [`TsDemuxer`] can be driven directly when the caller
//! owns the I/O loop:
//!
//! ```rust
//! use bytes::Bytes;
//! use tslive::TsDemuxer;
//!
//! let mut demuxer = TsDemuxer::default();
//! let events = demuxer.push(Bytes::from_static(&[0x47, 0x1f, 0xff, 0x10]));
//! assert!(events.is_empty());
//! ```
//!
//! ## Error Handling
//!
//! Malformed input never surfaces as an error: every stage logs what it
//! drops through the [`log`] facade and carries on. Only I/O failures of
//! the byte source reach the caller, as [`TsError`].

/// Error types for the crate
pub mod error;

/// Demuxer configuration
pub mod config;

/// Utility functions and types
pub mod utils;

/// Container format handling
pub mod format;

/// Elementary stream codecs
pub mod codec;

pub use codec::aac::{AdtsFrame, AdtsHeader};
pub use config::{DemuxConfig, VideoOutput};
pub use error::{Result, TsError};
pub use format::ts::{DemuxEvent, TsDemuxer, TsPacket, TsStreamReader};
