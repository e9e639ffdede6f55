use crate::Result;

pub mod ts;

/// One stage of the demux pipeline.
///
/// A stage consumes one input record and appends zero or more output
/// records, carrying whatever partial state it needs across calls. Stages
/// are invoked synchronously, in arrival order, for a single stream.
pub trait Transform<I> {
    /// Record type emitted downstream.
    type Output;

    /// Feeds one input record, appending any completed outputs to `out`.
    fn transform(&mut self, input: I, out: &mut Vec<Self::Output>);

    /// Convenience wrapper around [`transform`](Transform::transform) that
    /// collects the outputs of a single input.
    fn process(&mut self, input: I) -> Vec<Self::Output> {
        let mut out = Vec::new();
        self.transform(input, &mut out);
        out
    }
}

/// Common trait for asynchronous demuxers driven by a byte source.
#[async_trait::async_trait]
pub trait Demuxer: Send {
    /// Record produced by the demuxer.
    type Event: Send;

    /// Returns the next event, or `None` once the source is exhausted.
    async fn read_event(&mut self) -> Result<Option<Self::Event>>;
}

pub use self::ts::{TsDemuxer, TsStreamReader};
