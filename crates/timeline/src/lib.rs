use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod clip;
pub mod config;
pub mod demo;
pub mod edit;
pub mod engine;
pub mod events;
pub mod history;
pub mod keymap;
pub mod ledger;
pub mod media;
pub mod settings;
pub mod tool;
pub mod track;
pub mod transport;

pub use clip::{Clip, ClipId};
pub use config::TimelineConfig;
pub use edit::{apply_edit, Neighbors};
pub use engine::{TimelineEngine, TimelineSnapshot};
pub use events::{EngineEvent, EventBus, StopReason};
pub use history::CommandHistory;
pub use keymap::{Key, KeyAction, Modifiers};
pub use ledger::{ClipLedger, TimelineCommand};
pub use media::{MediaCatalog, MediaEntry, MediaId, MediaKind, NewMedia, Timecode};
pub use settings::{TimelineSetting, TimelineSettings};
pub use tool::{Tool, ToolMode};
pub use track::{Track, TrackId, TrackRegistry};
pub use transport::{Transport, TransportState};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("media not found: {0}")]
    MediaNotFound(MediaId),
    #[error("track not found: {0}")]
    TrackNotFound(TrackId),
    #[error("clip not found: {0}")]
    ClipNotFound(ClipId),
    #[error("track already exists: {0}")]
    DuplicateTrack(TrackId),
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error("invalid timecode: {0}")]
    InvalidTimecode(String),
    #[error("track is locked: {0}")]
    TrackLocked(TrackId),
    #[error("{media:?} media cannot be placed on a {track:?} track")]
    MediaKindMismatch { media: MediaKind, track: MediaKind },
}

impl TimelineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MediaNotFound(_) | Self::TrackNotFound(_) | Self::ClipNotFound(_))
    }
}

pub type Result<T, E = TimelineError> = std::result::Result<T, E>;

/// Timeline position in view units (20 units per second of media at zoom 1.0).
pub type Position = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32,
}

impl Fps {
    pub const fn new(num: u32, den: u32) -> Self { Self { num, den } }

    pub fn as_f64(&self) -> f64 { self.num as f64 / self.den.max(1) as f64 }

    /// Whole frames per second, as used by `HH:MM:SS:FF` timecode.
    pub fn nominal(&self) -> u32 { self.as_f64().round().max(1.0) as u32 }
}

impl Default for Fps {
    fn default() -> Self { Self::new(30, 1) }
}
