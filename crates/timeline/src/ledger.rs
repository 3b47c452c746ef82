use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::edit::{apply_edit, Neighbors};
use crate::{Clip, ClipId, MediaCatalog, MediaId, Position, Result, TimelineConfig, TimelineError, Tool, TrackId, TrackRegistry};

/// Invertible ledger mutation. Applying a command yields its inverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TimelineCommand {
    Insert { clip: Clip, index: Option<usize> },
    Remove { clip_id: ClipId },
    Update { clips: Vec<Clip> },
    Batch { commands: Vec<TimelineCommand> },
}

/// Read-only collaborators a mutation is validated against.
#[derive(Clone, Copy)]
pub struct LedgerScope<'a> {
    pub tracks: &'a TrackRegistry,
    pub catalog: &'a MediaCatalog,
    pub config: &'a TimelineConfig,
}

impl LedgerScope<'_> {
    fn media_len(&self, media: MediaId) -> Result<Position> {
        self.catalog.duration(media, self.config.fps, self.config.units_per_second)
    }
}

/// Clips per track, each lane in insertion order. A clip lives in exactly one lane.
#[derive(Debug, Clone, Default)]
pub struct ClipLedger {
    lanes: HashMap<TrackId, Vec<Clip>>,
}

impl ClipLedger {
    pub fn new() -> Self { Self::default() }

    pub fn add_lane(&mut self, track: TrackId) { self.lanes.entry(track).or_default(); }

    pub fn clips_on_track(&self, track: &TrackId) -> Result<&[Clip]> {
        self.lanes.get(track).map(|v| v.as_slice()).ok_or_else(|| TimelineError::TrackNotFound(track.clone()))
    }

    pub fn get(&self, id: ClipId) -> Result<&Clip> {
        self.lanes.values().flatten().find(|c| c.id == id).ok_or(TimelineError::ClipNotFound(id))
    }

    pub fn contains(&self, id: ClipId) -> bool { self.get(id).is_ok() }

    pub fn len(&self) -> usize { self.lanes.values().map(Vec::len).sum() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    // ---------------------------------------------------------------
    // Validated planning: every `prepare_*` checks invariants and locks
    // and returns the command to apply, leaving the ledger untouched.
    // ---------------------------------------------------------------

    pub fn prepare_place(&self, scope: LedgerScope<'_>, media: MediaId, track: &TrackId, start: Position, duration: Position) -> Result<TimelineCommand> {
        let lane_track = scope.tracks.get(track)?;
        let entry = scope.catalog.get(media)?;
        if lane_track.locked {
            return Err(TimelineError::TrackLocked(track.clone()));
        }
        if entry.kind != lane_track.kind {
            return Err(TimelineError::MediaKindMismatch { media: entry.kind, track: lane_track.kind });
        }
        let clip = Clip {
            id: ClipId::new(),
            media,
            name: entry.display_name.clone(),
            track_id: track.clone(),
            start,
            duration,
            source_in: 0.0,
            source_out: duration,
        };
        clip.validate(scope.media_len(media)?)?;
        Ok(TimelineCommand::Insert { clip, index: None })
    }

    pub fn prepare_move(&self, scope: LedgerScope<'_>, id: ClipId, new_start: Position) -> Result<TimelineCommand> {
        let current = self.get(id)?;
        scope.tracks.ensure_unlocked(&current.track_id)?;
        let mut moved = current.clone();
        moved.start = new_start;
        moved.validate(scope.media_len(moved.media)?)?;
        Ok(TimelineCommand::Update { clips: vec![moved] })
    }

    pub fn prepare_delete(&self, scope: LedgerScope<'_>, id: ClipId) -> Result<TimelineCommand> {
        let current = self.get(id)?;
        scope.tracks.ensure_unlocked(&current.track_id)?;
        Ok(TimelineCommand::Remove { clip_id: id })
    }

    /// Sets the source window, keeping the clip's start.
    pub fn prepare_trim(&self, scope: LedgerScope<'_>, id: ClipId, source_in: Position, source_out: Position) -> Result<TimelineCommand> {
        let current = self.get(id)?;
        scope.tracks.ensure_unlocked(&current.track_id)?;
        let mut trimmed = current.clone();
        trimmed.source_in = source_in;
        trimmed.source_out = source_out;
        trimmed.duration = source_out - source_in;
        trimmed.validate(scope.media_len(trimmed.media)?)?;
        Ok(TimelineCommand::Update { clips: vec![trimmed] })
    }

    /// Runs a tool edit. `None` when the tool does not mutate clips.
    pub fn prepare_edit(&self, scope: LedgerScope<'_>, tool: Tool, id: ClipId, amount: Position) -> Result<Option<TimelineCommand>> {
        let target = self.get(id)?;
        scope.tracks.ensure_unlocked(&target.track_id)?;
        let lane = self.clips_on_track(&target.track_id)?;
        let neighbors = Neighbors::of(target, lane);
        let mut changed = apply_edit(tool, target, &neighbors, amount, |c| scope.media_len(c.media))?;
        if changed.is_empty() {
            return Ok(None);
        }
        if tool == Tool::Blade {
            let right = changed.pop().ok_or_else(|| TimelineError::InvalidRange("blade produced no cut".into()))?;
            let index = lane.iter().position(|c| c.id == id).map(|i| i + 1);
            return Ok(Some(TimelineCommand::Batch { commands: vec![
                TimelineCommand::Update { clips: changed },
                TimelineCommand::Insert { clip: right, index },
            ] }));
        }
        Ok(Some(TimelineCommand::Update { clips: changed }))
    }

    /// Tracks a command would write to, resolved against the current ledger.
    pub fn touched_tracks(&self, command: &TimelineCommand) -> Vec<TrackId> {
        let mut out: Vec<TrackId> = Vec::new();
        self.collect_tracks(command, &mut out);
        out
    }

    fn collect_tracks(&self, command: &TimelineCommand, out: &mut Vec<TrackId>) {
        let found: Vec<TrackId> = match command {
            TimelineCommand::Insert { clip, .. } => vec![clip.track_id.clone()],
            TimelineCommand::Remove { clip_id } => self.get(*clip_id).map(|c| vec![c.track_id.clone()]).unwrap_or_default(),
            TimelineCommand::Update { clips } => clips.iter().map(|c| c.track_id.clone()).collect(),
            TimelineCommand::Batch { commands: cmds } => {
                for cmd in cmds {
                    self.collect_tracks(cmd, out);
                }
                return;
            }
        };
        for track in found {
            if !out.contains(&track) {
                out.push(track);
            }
        }
    }

    // ---------------------------------------------------------------
    // Raw application. Commands here are assumed validated.
    // ---------------------------------------------------------------

    pub fn apply(&mut self, command: TimelineCommand) -> Result<TimelineCommand> {
        match command {
            TimelineCommand::Insert { clip, index } => {
                let lane = self.lanes.get_mut(&clip.track_id).ok_or_else(|| TimelineError::TrackNotFound(clip.track_id.clone()))?;
                let id = clip.id;
                match index {
                    Some(i) if i <= lane.len() => lane.insert(i, clip),
                    _ => lane.push(clip),
                }
                Ok(TimelineCommand::Remove { clip_id: id })
            }
            TimelineCommand::Remove { clip_id } => {
                for lane in self.lanes.values_mut() {
                    if let Some(i) = lane.iter().position(|c| c.id == clip_id) {
                        let clip = lane.remove(i);
                        return Ok(TimelineCommand::Insert { clip, index: Some(i) });
                    }
                }
                Err(TimelineError::ClipNotFound(clip_id))
            }
            TimelineCommand::Update { clips } => {
                let mut previous = Vec::with_capacity(clips.len());
                for clip in &clips {
                    let old = self.get(clip.id)?;
                    if old.track_id != clip.track_id {
                        return Err(TimelineError::InvalidRange(format!("clip {} cannot change track", clip.id)));
                    }
                    previous.push(old.clone());
                }
                for clip in clips {
                    if let Some(slot) = self.lanes.get_mut(&clip.track_id).and_then(|l| l.iter_mut().find(|c| c.id == clip.id)) {
                        *slot = clip;
                    }
                }
                Ok(TimelineCommand::Update { clips: previous })
            }
            TimelineCommand::Batch { commands: cmds } => {
                let mut inverses = Vec::with_capacity(cmds.len());
                for cmd in cmds {
                    match self.apply(cmd) {
                        Ok(inv) => inverses.push(inv),
                        Err(err) => {
                            // unwind what already went in
                            while let Some(inv) = inverses.pop() {
                                let _ = self.apply(inv);
                            }
                            return Err(err);
                        }
                    }
                }
                inverses.reverse();
                Ok(TimelineCommand::Batch { commands: inverses })
            }
        }
    }
}
