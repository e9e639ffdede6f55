use super::demuxer::{DemuxEvent, TsDemuxer};
use crate::config::DemuxConfig;
use crate::error::Result;
use crate::format::{Demuxer, Transform};
use bytes::BytesMut;
use futures::Stream;
use log::debug;
use std::collections::VecDeque;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Drives a [`TsDemuxer`] from an async byte source.
///
/// Reads of up to `read_chunk_size` bytes are fed straight to the demuxer;
/// read boundaries carry no meaning. End of input ends the event stream
/// without flushing partial payloads.
pub struct TsStreamReader<R: AsyncRead + Unpin + Send> {
    reader: R,
    demuxer: TsDemuxer,
    pending: VecDeque<DemuxEvent>,
    chunk_size: usize,
    eof: bool,
}

impl<R: AsyncRead + Unpin + Send> TsStreamReader<R> {
    /// Wraps `reader`; nothing is read until the first event is requested.
    pub fn new(reader: R, config: DemuxConfig) -> Self {
        let chunk_size = config.read_chunk_size.max(1);
        Self {
            reader,
            demuxer: TsDemuxer::new(config),
            pending: VecDeque::new(),
            chunk_size,
            eof: false,
        }
    }

    /// The demuxer being driven.
    pub fn demuxer(&self) -> &TsDemuxer {
        &self.demuxer
    }

    /// Returns the next event, reading more input as needed.
    /// `Ok(None)` once the source is exhausted.
    pub async fn next_event(&mut self) -> Result<Option<DemuxEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if self.eof {
                return Ok(None);
            }

            let mut buf = BytesMut::with_capacity(self.chunk_size);
            let n = self.reader.read_buf(&mut buf).await?;
            if n == 0 {
                debug!("end of input, in-flight payloads dropped");
                self.eof = true;
                continue;
            }
            self.pending.extend(self.demuxer.process(buf.freeze()));
        }
    }

    /// Turns the reader into a stream of events. The stream ends after the
    /// first I/O error.
    pub fn into_stream(self) -> impl Stream<Item = Result<DemuxEvent>> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut reader = state?;
            match reader.next_event().await {
                Ok(Some(event)) => Some((Ok(event), Some(reader))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

#[async_trait::async_trait]
impl<R: AsyncRead + Unpin + Send> Demuxer for TsStreamReader<R> {
    type Event = DemuxEvent;

    async fn read_event(&mut self) -> Result<Option<DemuxEvent>> {
        self.next_event().await
    }
}
