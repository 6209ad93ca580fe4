//! Recording stream identity and per-stream completion reports

use std::fmt;
use std::path::{Path, PathBuf};

/// One of the two simultaneously recorded camera streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamId {
    Front,
    Back,
}

impl StreamId {
    pub const ALL: [StreamId; 2] = [StreamId::Front, StreamId::Back];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
        }
    }

    /// The other stream of the pair
    pub const fn peer(&self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal report from one recorder: it stopped writing `path`, with or
/// without an error. Either way the stream will produce nothing further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderEvent {
    pub stream: StreamId,
    pub path: PathBuf,
    pub error: Option<String>,
}

impl RecorderEvent {
    pub fn finished(stream: StreamId, path: impl Into<PathBuf>) -> Self {
        Self {
            stream,
            path: path.into(),
            error: None,
        }
    }

    pub fn failed(stream: StreamId, path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            stream,
            path: path.into(),
            error: Some(error.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
