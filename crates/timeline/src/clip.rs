use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MediaId, Position, Result, TimelineError, TrackId};

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub Uuid);

impl ClipId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl Default for ClipId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// A placed reference to `[source_in, source_out)` of a media entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,
    pub media: MediaId,
    pub name: String,
    pub track_id: TrackId,
    pub start: Position,
    pub duration: Position,
    pub source_in: Position,
    pub source_out: Position,
}

impl Clip {
    pub fn end(&self) -> Position { self.start + self.duration }

    pub fn contains(&self, position: Position) -> bool { position > self.start && position < self.end() }

    /// Checks placement and source-range invariants against the media length.
    pub fn validate(&self, media_duration: Position) -> Result<()> {
        if !self.start.is_finite() || self.start < -EPSILON {
            return Err(TimelineError::InvalidRange(format!("start {} is negative", self.start)));
        }
        if !self.duration.is_finite() || self.duration <= EPSILON {
            return Err(TimelineError::InvalidRange(format!("duration {} must be positive", self.duration)));
        }
        if self.source_in < -EPSILON || self.source_in > self.source_out + EPSILON {
            return Err(TimelineError::InvalidRange(format!("in point {} is after out point {}", self.source_in, self.source_out)));
        }
        if self.source_out > media_duration + EPSILON {
            return Err(TimelineError::InvalidRange(format!("out point {} exceeds media length {}", self.source_out, media_duration)));
        }
        Ok(())
    }
}
