use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MediaKind, Result, TimelineError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub display_name: String,
    pub kind: MediaKind,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub muted: bool,
}

impl Track {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, kind: MediaKind) -> Self {
        Self { id: TrackId::new(id), display_name: display_name.into(), kind, locked: false, muted: false }
    }
}

/// Tracks in creation order. Locking only flags the track; the ledger enforces it.
#[derive(Debug, Clone, Default)]
pub struct TrackRegistry {
    tracks: Vec<Track>,
}

impl TrackRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, track: Track) -> Result<()> {
        if self.tracks.iter().any(|t| t.id == track.id) {
            return Err(TimelineError::DuplicateTrack(track.id));
        }
        self.tracks.push(track);
        Ok(())
    }

    pub fn list(&self) -> &[Track] { &self.tracks }

    pub fn get(&self, id: &TrackId) -> Result<&Track> {
        self.tracks.iter().find(|t| &t.id == id).ok_or_else(|| TimelineError::TrackNotFound(id.clone()))
    }

    pub fn set_locked(&mut self, id: &TrackId, locked: bool) -> Result<&Track> {
        let track = self.get_mut(id)?;
        track.locked = locked;
        tracing::debug!(track = %id, locked, "track lock set");
        Ok(track)
    }

    pub fn set_muted(&mut self, id: &TrackId, muted: bool) -> Result<&Track> {
        let track = self.get_mut(id)?;
        track.muted = muted;
        tracing::debug!(track = %id, muted, "track mute set");
        Ok(track)
    }

    /// Fails with `TrackLocked` when the track refuses mutation.
    pub fn ensure_unlocked(&self, id: &TrackId) -> Result<&Track> {
        let track = self.get(id)?;
        if track.locked {
            return Err(TimelineError::TrackLocked(id.clone()));
        }
        Ok(track)
    }

    fn get_mut(&mut self, id: &TrackId) -> Result<&mut Track> {
        self.tracks.iter_mut().find(|t| &t.id == id).ok_or_else(|| TimelineError::TrackNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TrackRegistry {
        let mut reg = TrackRegistry::new();
        reg.add(Track::new("v1", "V1", MediaKind::Video)).unwrap();
        reg.add(Track::new("a1", "A1", MediaKind::Audio)).unwrap();
        reg
    }

    #[test]
    fn list_keeps_creation_order() {
        let reg = registry();
        let ids: Vec<&str> = reg.list().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "a1"]);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut reg = registry();
        let err = reg.add(Track::new("v1", "again", MediaKind::Video)).unwrap_err();
        assert_eq!(err, TimelineError::DuplicateTrack("v1".into()));
    }

    #[test]
    fn lock_and_mute_are_idempotent() {
        let mut reg = registry();
        let v1 = TrackId::from("v1");
        reg.set_locked(&v1, true).unwrap();
        reg.set_locked(&v1, true).unwrap();
        assert!(reg.get(&v1).unwrap().locked);
        assert_eq!(reg.ensure_unlocked(&v1).unwrap_err(), TimelineError::TrackLocked(v1.clone()));

        reg.set_muted(&v1, true).unwrap();
        reg.set_muted(&v1, false).unwrap();
        assert!(!reg.get(&v1).unwrap().muted);
    }

    #[test]
    fn unknown_track_is_not_found() {
        let mut reg = registry();
        let err = reg.set_muted(&"x9".into(), true).unwrap_err();
        assert!(err.is_not_found());
        assert!(reg.set_locked(&"x9".into(), false).is_err());
    }
}
