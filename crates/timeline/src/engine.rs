//! Composition root for the timeline model.
//!
//! `TimelineEngine` owns every component and is the only place that mutates
//! them. Each public command validates against the track registry, routes clip
//! changes through the command history, and publishes `EngineEvent`s so that
//! observers never read shared mutable state directly.

use std::time::Duration;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

use crate::keymap::{action_for, Key, KeyAction, Modifiers};
use crate::ledger::LedgerScope;
use crate::{
    Clip, ClipId, ClipLedger, CommandHistory, EngineEvent, EventBus, MediaCatalog, MediaEntry, MediaId, NewMedia, Position, Result,
    StopReason, TimelineCommand, TimelineConfig, TimelineError, TimelineSetting, TimelineSettings, Tool, ToolMode, Track, TrackId,
    TrackRegistry, Transport, TransportState,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub track: Track,
    pub clips: Vec<Clip>,
}

/// Point-in-time copy of everything observers render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSnapshot {
    pub media: Vec<MediaEntry>,
    pub tracks: Vec<TrackSnapshot>,
    pub transport: TransportState,
    pub tool: Tool,
    pub selection: Option<ClipId>,
    pub settings: TimelineSettings,
    pub can_undo: bool,
    pub can_redo: bool,
}

pub struct TimelineEngine {
    config: TimelineConfig,
    catalog: MediaCatalog,
    tracks: TrackRegistry,
    ledger: ClipLedger,
    transport: Transport,
    tools: ToolMode,
    selection: Option<ClipId>,
    history: CommandHistory,
    settings: TimelineSettings,
    bus: EventBus,
}

impl Default for TimelineEngine {
    fn default() -> Self { Self::new(TimelineConfig::default()) }
}

impl TimelineEngine {
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            transport: Transport::new(config.clone()),
            history: CommandHistory::new(config.history_depth),
            config,
            catalog: MediaCatalog::new(),
            tracks: TrackRegistry::new(),
            ledger: ClipLedger::new(),
            tools: ToolMode::default(),
            selection: None,
            settings: TimelineSettings::default(),
            bus: EventBus::default(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<EngineEvent> { self.bus.subscribe() }

    // queries

    pub fn config(&self) -> &TimelineConfig { &self.config }

    pub fn tracks(&self) -> &[Track] { self.tracks.list() }

    pub fn track(&self, id: &TrackId) -> Result<&Track> { self.tracks.get(id) }

    pub fn clips_on_track(&self, id: &TrackId) -> Result<&[Clip]> { self.ledger.clips_on_track(id) }

    pub fn clip(&self, id: ClipId) -> Result<&Clip> { self.ledger.get(id) }

    pub fn media_catalog(&self) -> &[MediaEntry] { self.catalog.list() }

    pub fn media(&self, id: MediaId) -> Result<&MediaEntry> { self.catalog.get(id) }

    pub fn find_media(&self, needle: &str) -> Option<&MediaEntry> { self.catalog.find_by_name(needle) }

    pub fn transport_state(&self) -> &TransportState { self.transport.state() }

    pub fn active_tool(&self) -> Tool { self.tools.active() }

    pub fn selection(&self) -> Option<ClipId> { self.selection }

    pub fn settings(&self) -> &TimelineSettings { &self.settings }

    pub fn can_undo(&self) -> bool { self.history.can_undo() }

    pub fn can_redo(&self) -> bool { self.history.can_redo() }

    pub fn snapshot(&self) -> TimelineSnapshot {
        let tracks = self
            .tracks
            .list()
            .iter()
            .map(|t| TrackSnapshot { track: t.clone(), clips: self.ledger.clips_on_track(&t.id).map(<[Clip]>::to_vec).unwrap_or_default() })
            .collect();
        TimelineSnapshot {
            media: self.catalog.list().to_vec(),
            tracks,
            transport: self.transport.state().clone(),
            tool: self.tools.active(),
            selection: self.selection,
            settings: self.settings.clone(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }

    // session setup

    pub fn import_media(&mut self, media: NewMedia) -> MediaId { self.catalog.import(media) }

    pub fn add_track(&mut self, track: Track) -> Result<()> {
        let id = track.id.clone();
        self.tracks.add(track)?;
        self.ledger.add_lane(id);
        Ok(())
    }

    pub fn set_track_locked(&mut self, id: &TrackId, locked: bool) -> Result<()> {
        let track = self.tracks.set_locked(id, locked)?.clone();
        self.bus.publish(EngineEvent::TrackChanged { track });
        Ok(())
    }

    pub fn set_track_muted(&mut self, id: &TrackId, muted: bool) -> Result<()> {
        let track = self.tracks.set_muted(id, muted)?.clone();
        self.bus.publish(EngineEvent::TrackChanged { track });
        Ok(())
    }

    // clip operations

    /// Places `media` on `track`. Without a duration the configured default is used.
    pub fn place_clip(&mut self, media: MediaId, track: &TrackId, position: Position, duration: Option<Position>) -> Result<Clip> {
        let duration = duration.unwrap_or(self.config.default_clip_duration);
        let command = self.ledger.prepare_place(self.scope(), media, track, position, duration).inspect_err(|e| self.rejected("place", e))?;
        let TimelineCommand::Insert { clip, .. } = &command else {
            return Err(TimelineError::InvalidRange("placement did not produce an insert".into()));
        };
        let clip = clip.clone();
        self.run("Place clip", command)?;
        Ok(clip)
    }

    pub fn move_clip(&mut self, id: ClipId, new_start: Position) -> Result<Clip> {
        let command = self.ledger.prepare_move(self.scope(), id, new_start).inspect_err(|e| self.rejected("move", e))?;
        self.run("Move clip", command)?;
        Ok(self.ledger.get(id)?.clone())
    }

    pub fn delete_clip(&mut self, id: ClipId) -> Result<()> {
        let command = self.ledger.prepare_delete(self.scope(), id).inspect_err(|e| self.rejected("delete", e))?;
        self.run("Delete clip", command)
    }

    pub fn trim_clip(&mut self, id: ClipId, source_in: Position, source_out: Position) -> Result<Clip> {
        let command = self.ledger.prepare_trim(self.scope(), id, source_in, source_out).inspect_err(|e| self.rejected("trim", e))?;
        self.run("Trim clip", command)?;
        Ok(self.ledger.get(id)?.clone())
    }

    pub fn select_clip(&mut self, id: Option<ClipId>) -> Result<()> {
        if let Some(id) = id {
            self.ledger.get(id)?;
        }
        if self.selection != id {
            self.selection = id;
            self.bus.publish(EngineEvent::SelectionChanged { clip_id: id });
        }
        Ok(())
    }

    /// Applies the active tool to `id`. `Select` selects the clip; `Blade`
    /// cuts at absolute position `amount`; the trim tools treat `amount` as a
    /// signed offset. Returns the clips that changed.
    pub fn edit_clip(&mut self, id: ClipId, amount: Position) -> Result<Vec<Clip>> {
        let tool = self.tools.active();
        if tool == Tool::Select {
            self.select_clip(Some(id))?;
            return Ok(Vec::new());
        }
        let Some(command) = self.ledger.prepare_edit(self.scope(), tool, id, amount).inspect_err(|e| self.rejected(tool.name(), e))? else {
            return Ok(Vec::new());
        };
        let changed = changed_clips(&command);
        self.run(tool.name(), command)?;
        changed.into_iter().map(|cid| self.ledger.get(cid).cloned()).collect()
    }

    pub fn undo(&mut self) -> Result<Option<String>> {
        let events = self.history.peek_undo().map(|cmd| self.describe(cmd)).unwrap_or_default();
        let label = self.history.undo(&mut self.ledger, &self.tracks)?;
        if label.is_some() {
            self.after_ledger_change(events);
        }
        Ok(label)
    }

    pub fn redo(&mut self) -> Result<Option<String>> {
        let events = self.history.peek_redo().map(|cmd| self.describe(cmd)).unwrap_or_default();
        let label = self.history.redo(&mut self.ledger, &self.tracks)?;
        if label.is_some() {
            self.after_ledger_change(events);
        }
        Ok(label)
    }

    // transport

    pub fn toggle_play(&mut self) {
        let was_playing = self.transport.state().is_playing;
        self.transport.toggle_play();
        self.after_transport(was_playing, StopReason::User);
    }

    pub fn adjust_shuttle_speed(&mut self, delta: i32) {
        let was_playing = self.transport.state().is_playing;
        let glyph = self.transport.adjust_speed(delta);
        self.notice(glyph);
        self.after_transport(was_playing, StopReason::User);
    }

    pub fn shuttle(&mut self, delta: i32) {
        let was_playing = self.transport.state().is_playing;
        let glyph = self.transport.shuttle(delta);
        self.notice(glyph);
        self.after_transport(was_playing, StopReason::User);
    }

    pub fn stop(&mut self) {
        let was_playing = self.transport.state().is_playing;
        self.transport.stop();
        self.after_transport(was_playing, StopReason::User);
    }

    pub fn step_frame(&mut self, direction: i32) {
        let was_playing = self.transport.state().is_playing;
        self.transport.step_frame(direction);
        self.notice(if direction > 0 { "→ Frame" } else { "← Frame" });
        self.after_transport(was_playing, StopReason::User);
    }

    pub fn seek(&mut self, position: Position) {
        let was_playing = self.transport.state().is_playing;
        self.transport.seek(position);
        self.after_transport(was_playing, StopReason::User);
    }

    /// One fixed-cadence tick. Returns true when playback stopped at a bound.
    pub fn tick(&mut self) -> bool {
        let was_playing = self.transport.state().is_playing;
        if !was_playing {
            return false;
        }
        let stopped = self.transport.tick();
        self.after_transport(was_playing, StopReason::Bounds);
        stopped
    }

    pub fn advance(&mut self, elapsed: Duration) -> bool {
        let was_playing = self.transport.state().is_playing;
        if !was_playing {
            return false;
        }
        let stopped = self.transport.advance(elapsed);
        self.after_transport(was_playing, StopReason::Bounds);
        stopped
    }

    pub fn mark_in(&mut self) -> Position {
        let at = self.transport.mark_in();
        self.notice("◀ Mark In (I)");
        self.bus.publish(EngineEvent::Transport { state: self.transport.state().clone() });
        at
    }

    pub fn mark_out(&mut self) -> Position {
        let at = self.transport.mark_out();
        self.notice("▶ Mark Out (O)");
        self.bus.publish(EngineEvent::Transport { state: self.transport.state().clone() });
        at
    }

    pub fn clear_marks(&mut self) {
        self.transport.clear_marks();
        self.bus.publish(EngineEvent::Transport { state: self.transport.state().clone() });
    }

    // tools, settings, keys

    pub fn select_tool(&mut self, tool: Tool) {
        let confirmation = self.tools.select(tool);
        self.bus.publish(EngineEvent::ToolChanged { tool });
        self.notice(&confirmation);
    }

    pub fn adjust_zoom(&mut self, delta: f64) {
        let text = self.settings.adjust_zoom(delta);
        self.notice(&text);
    }

    pub fn toggle_setting(&mut self, setting: TimelineSetting) {
        let text = self.settings.toggle(setting);
        self.notice(&text);
    }

    pub fn handle_key(&mut self, key: Key, modifiers: Modifiers) -> Result<Option<KeyAction>> {
        let Some(action) = action_for(key, modifiers) else { return Ok(None) };
        match action {
            KeyAction::TogglePlay => self.toggle_play(),
            KeyAction::AdjustSpeed(delta) => self.adjust_shuttle_speed(delta),
            KeyAction::Stop => self.stop(),
            KeyAction::MarkIn => {
                self.mark_in();
            }
            KeyAction::MarkOut => {
                self.mark_out();
            }
            KeyAction::SelectTool(tool) => self.select_tool(tool),
            KeyAction::Undo => {
                self.notice("↶ Undo");
                self.undo()?;
            }
            KeyAction::Redo => {
                self.notice("↷ Redo");
                self.redo()?;
            }
        }
        Ok(Some(action))
    }

    pub fn notice(&mut self, text: &str) { self.bus.publish(EngineEvent::Notice { text: text.to_string() }); }

    // internals

    fn scope(&self) -> LedgerScope<'_> {
        LedgerScope { tracks: &self.tracks, catalog: &self.catalog, config: &self.config }
    }

    fn run(&mut self, label: &str, command: TimelineCommand) -> Result<()> {
        let events = self.describe(&command);
        self.history.apply(&mut self.ledger, label, command)?;
        self.after_ledger_change(events);
        Ok(())
    }

    fn rejected(&self, op: &str, err: &TimelineError) {
        tracing::warn!(op, error = %err, "timeline mutation rejected");
    }

    /// Events a command will produce, resolved before it is applied.
    fn describe(&self, command: &TimelineCommand) -> Vec<EngineEvent> {
        match command {
            TimelineCommand::Insert { clip, .. } => vec![EngineEvent::ClipPlaced { clip: clip.clone() }],
            TimelineCommand::Remove { clip_id } => match self.ledger.get(*clip_id) {
                Ok(clip) => vec![EngineEvent::ClipRemoved { clip_id: *clip_id, track_id: clip.track_id.clone() }],
                Err(_) => Vec::new(),
            },
            TimelineCommand::Update { clips } => vec![EngineEvent::ClipsChanged { clips: clips.clone() }],
            TimelineCommand::Batch { commands } => commands.iter().flat_map(|c| self.describe(c)).collect(),
        }
    }

    fn after_ledger_change(&mut self, events: Vec<EngineEvent>) {
        for event in events {
            self.bus.publish(event);
        }
        if let Some(selected) = self.selection {
            if !self.ledger.contains(selected) {
                self.selection = None;
                self.bus.publish(EngineEvent::SelectionChanged { clip_id: None });
            }
        }
        self.bus.publish(EngineEvent::HistoryChanged { can_undo: self.history.can_undo(), can_redo: self.history.can_redo() });
    }

    fn after_transport(&mut self, was_playing: bool, reason: StopReason) {
        let state = self.transport.state().clone();
        match (was_playing, state.is_playing) {
            (false, true) => self.bus.publish(EngineEvent::PlaybackStarted { speed: state.shuttle_speed }),
            (true, false) => self.bus.publish(EngineEvent::PlaybackStopped { reason }),
            _ => {}
        }
        self.bus.publish(EngineEvent::Transport { state });
    }
}

fn changed_clips(command: &TimelineCommand) -> Vec<ClipId> {
    match command {
        TimelineCommand::Insert { clip, .. } => vec![clip.id],
        TimelineCommand::Remove { .. } => Vec::new(),
        TimelineCommand::Update { clips } => clips.iter().map(|c| c.id).collect(),
        TimelineCommand::Batch { commands } => commands.iter().flat_map(changed_clips).collect(),
    }
}
