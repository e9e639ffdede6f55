use crate::error::{Result, TsError};
use std::env;
use std::fs;
use std::path::Path;

/// Default number of bytes requested per read by the async driver.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// What the demuxer hands to the video path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoOutput {
    /// Selected video-PID TS packets, forwarded unchanged.
    #[default]
    Packets,
    /// Reassembled and header-decoded video PES packets.
    Pes,
}

impl std::str::FromStr for VideoOutput {
    type Err = TsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "packets" => Ok(VideoOutput::Packets),
            "pes" => Ok(VideoOutput::Pes),
            other => Err(TsError::Config(format!("unknown video output: {}", other))),
        }
    }
}

/// Construction-time options for one demux session.
#[derive(Debug, Clone)]
pub struct DemuxConfig {
    /// Forward packets of PIDs classified as video.
    pub forward_video: bool,
    /// Forward packets of PIDs classified as ADTS audio.
    pub forward_audio: bool,
    /// Verbose per-packet and per-table logging. Observability only.
    pub debug: bool,
    /// Shape of the video output.
    pub video_output: VideoOutput,
    /// Bytes requested per read by [`TsStreamReader`](crate::format::ts::TsStreamReader).
    pub read_chunk_size: usize,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            forward_video: true,
            forward_audio: true,
            debug: false,
            video_output: VideoOutput::Packets,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl DemuxConfig {
    /// Same as [`Default::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `forward_video`.
    pub fn with_video(mut self, forward: bool) -> Self {
        self.forward_video = forward;
        self
    }

    /// Sets `forward_audio`.
    pub fn with_audio(mut self, forward: bool) -> Self {
        self.forward_audio = forward;
        self
    }

    /// Sets `debug`.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets `video_output`.
    pub fn with_video_output(mut self, output: VideoOutput) -> Self {
        self.video_output = output;
        self
    }

    /// Sets `read_chunk_size`, at least one byte.
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Builds a config from the defaults overridden by `TSLIVE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        for key in KEYS {
            if let Ok(value) = env::var(format!("TSLIVE_{}", key.to_ascii_uppercase())) {
                config.set(key, &value)?;
            }
        }
        Ok(config)
    }

    /// Loads a `key = value` config file on top of the defaults.
    ///
    /// Blank lines, `#` comments and unknown keys are skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(TsError::Config(format!("malformed line: {}", line)));
            };
            let value = value.trim().trim_matches('"').trim_matches('\'');
            config.set(key.trim(), value)?;
        }
        Ok(config)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "forward_video" => self.forward_video = value.trim().parse()?,
            "forward_audio" => self.forward_audio = value.trim().parse()?,
            "debug" => self.debug = value.trim().parse()?,
            "video_output" => self.video_output = value.parse()?,
            "read_chunk_size" => {
                let size: usize = value.trim().parse()?;
                if size == 0 {
                    return Err(TsError::Config("read_chunk_size must be positive".into()));
                }
                self.read_chunk_size = size;
            }
            _ => {}
        }
        Ok(())
    }
}

const KEYS: [&str; 5] = [
    "forward_video",
    "forward_audio",
    "debug",
    "video_output",
    "read_chunk_size",
];
