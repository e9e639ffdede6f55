use super::tables::ProgramTableTracker;
use super::types::TsPacket;

/// Selects the TS packets of classified video and/or audio PIDs.
///
/// Table PIDs are not forwarded here; the demuxer hands them to the
/// [`ProgramTableTracker`] before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidFilter {
    forward_video: bool,
    forward_audio: bool,
}

impl PidFilter {
    /// Creates a filter forwarding the enabled stream kinds.
    pub fn new(forward_video: bool, forward_audio: bool) -> Self {
        Self {
            forward_video,
            forward_audio,
        }
    }

    /// Whether packets on `pid` pass, given the current classification.
    pub fn accepts(&self, tables: &ProgramTableTracker, pid: u16) -> bool {
        (self.forward_video && tables.is_video_pid(pid))
            || (self.forward_audio && tables.is_audio_pid(pid))
    }

    /// Returns the packet if it belongs to a selected stream.
    pub fn filter(&self, tables: &ProgramTableTracker, packet: TsPacket) -> Option<TsPacket> {
        self.accepts(tables, packet.pid()).then_some(packet)
    }
}

impl Default for PidFilter {
    fn default() -> Self {
        Self::new(true, true)
    }
}
