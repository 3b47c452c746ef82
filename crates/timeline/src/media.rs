use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Fps, Position, Result, TimelineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(pub Uuid);

impl MediaId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl Default for MediaId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// `HH:MM:SS:FF` source timecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timecode {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
}

impl Timecode {
    pub const fn new(hours: u32, minutes: u32, seconds: u32, frames: u32) -> Self {
        Self { hours, minutes, seconds, frames }
    }

    pub fn to_seconds(&self, fps: Fps) -> f64 {
        let whole = self.hours as f64 * 3600.0 + self.minutes as f64 * 60.0 + self.seconds as f64;
        whole + self.frames as f64 / fps.nominal() as f64
    }

    pub fn parse_with(s: &str, fps: Fps) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 4 {
            return Err(TimelineError::InvalidTimecode(s.to_string()));
        }
        let mut fields = [0u32; 4];
        for (slot, part) in fields.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| TimelineError::InvalidTimecode(s.to_string()))?;
        }
        let tc = Self::new(fields[0], fields[1], fields[2], fields[3]);
        if tc.minutes >= 60 || tc.seconds >= 60 || tc.frames >= fps.nominal() {
            return Err(TimelineError::InvalidTimecode(s.to_string()));
        }
        Ok(tc)
    }
}

impl FromStr for Timecode {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self> { Self::parse_with(s, Fps::default()) }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds, self.frames)
    }
}

impl Serialize for Timecode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timecode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub id: MediaId,
    pub display_name: String,
    pub source_timecode: Timecode,
    pub kind: MediaKind,
    pub has_proxy: bool,
}

/// Import request; the catalog assigns the handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMedia {
    pub display_name: String,
    pub source_timecode: Timecode,
    pub kind: MediaKind,
    #[serde(default)]
    pub has_proxy: bool,
}

impl NewMedia {
    pub fn new(display_name: impl Into<String>, source_timecode: Timecode, kind: MediaKind, has_proxy: bool) -> Self {
        Self { display_name: display_name.into(), source_timecode, kind, has_proxy }
    }
}

/// Insertion-ordered registry of imported media. Entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct MediaCatalog {
    entries: Vec<MediaEntry>,
}

impl MediaCatalog {
    pub fn new() -> Self { Self::default() }

    pub fn import(&mut self, media: NewMedia) -> MediaId {
        let id = MediaId::new();
        tracing::debug!(%id, name = %media.display_name, "media imported");
        self.entries.push(MediaEntry {
            id,
            display_name: media.display_name,
            source_timecode: media.source_timecode,
            kind: media.kind,
            has_proxy: media.has_proxy,
        });
        id
    }

    pub fn get(&self, id: MediaId) -> Result<&MediaEntry> {
        self.entries.iter().find(|m| m.id == id).ok_or(TimelineError::MediaNotFound(id))
    }

    pub fn list(&self) -> &[MediaEntry] { &self.entries }

    pub fn find_by_name(&self, needle: &str) -> Option<&MediaEntry> {
        self.entries.iter().find(|m| m.display_name.contains(needle))
    }

    /// Length of the media in view units.
    pub fn duration(&self, id: MediaId, fps: Fps, units_per_second: Position) -> Result<Position> {
        Ok(self.get(id)?.source_timecode.to_seconds(fps) * units_per_second)
    }
}
