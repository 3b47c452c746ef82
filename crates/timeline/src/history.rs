use crate::{ClipLedger, Result, TimelineCommand, TrackRegistry};

#[derive(Debug, Clone)]
struct HistoryEntry {
    label: String,
    forward: TimelineCommand,
    inverse: TimelineCommand,
}

/// Undo/redo log of invertible ledger commands.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    max_depth: usize,
}

impl Default for CommandHistory {
    fn default() -> Self { Self::new(100) }
}

impl CommandHistory {
    pub fn new(max_depth: usize) -> Self { Self { undo: Vec::new(), redo: Vec::new(), max_depth: max_depth.max(1) } }

    pub fn can_undo(&self) -> bool { !self.undo.is_empty() }

    pub fn can_redo(&self) -> bool { !self.redo.is_empty() }

    pub fn undo_label(&self) -> Option<&str> { self.undo.last().map(|e| e.label.as_str()) }

    pub fn redo_label(&self) -> Option<&str> { self.redo.last().map(|e| e.label.as_str()) }

    /// The command the next `undo` would apply.
    pub fn peek_undo(&self) -> Option<&TimelineCommand> { self.undo.last().map(|e| &e.inverse) }

    pub fn peek_redo(&self) -> Option<&TimelineCommand> { self.redo.last().map(|e| &e.forward) }

    pub fn apply(&mut self, ledger: &mut ClipLedger, label: impl Into<String>, command: TimelineCommand) -> Result<()> {
        let inverse = ledger.apply(command.clone())?;
        self.redo.clear();
        self.undo.push(HistoryEntry { label: label.into(), forward: command, inverse });
        if self.undo.len() > self.max_depth {
            self.undo.remove(0);
        }
        tracing::debug!(depth = self.undo.len(), "history entry pushed");
        Ok(())
    }

    /// Reverts the latest entry. Locked tracks block the undo and leave both stacks as they were.
    pub fn undo(&mut self, ledger: &mut ClipLedger, tracks: &TrackRegistry) -> Result<Option<String>> {
        let Some(entry) = self.undo.last() else { return Ok(None) };
        for track in ledger.touched_tracks(&entry.inverse) {
            tracks.ensure_unlocked(&track)?;
        }
        let forward = ledger.apply(entry.inverse.clone())?;
        let Some(entry) = self.undo.pop() else { return Ok(None) };
        tracing::debug!(label = %entry.label, "undo");
        let label = entry.label.clone();
        self.redo.push(HistoryEntry { label: entry.label, forward, inverse: entry.inverse });
        Ok(Some(label))
    }

    pub fn redo(&mut self, ledger: &mut ClipLedger, tracks: &TrackRegistry) -> Result<Option<String>> {
        let Some(entry) = self.redo.last() else { return Ok(None) };
        for track in ledger.touched_tracks(&entry.forward) {
            tracks.ensure_unlocked(&track)?;
        }
        let inverse = ledger.apply(entry.forward.clone())?;
        let Some(entry) = self.redo.pop() else { return Ok(None) };
        tracing::debug!(label = %entry.label, "redo");
        let label = entry.label.clone();
        self.undo.push(HistoryEntry { label: entry.label, forward: entry.forward, inverse });
        Ok(Some(label))
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerScope;
    use crate::{MediaCatalog, MediaKind, NewMedia, Timecode, TimelineConfig, TimelineError, Track};

    fn setup() -> (TrackRegistry, MediaCatalog, ClipLedger, crate::MediaId) {
        let mut tracks = TrackRegistry::new();
        tracks.add(Track::new("v1", "V1", MediaKind::Video)).unwrap();
        let mut ledger = ClipLedger::new();
        ledger.add_lane("v1".into());
        let mut catalog = MediaCatalog::new();
        let media = catalog.import(NewMedia::new("clip.mp4", Timecode::new(0, 1, 0, 0), MediaKind::Video, false));
        (tracks, catalog, ledger, media)
    }

    #[test]
    fn undo_redo_place() {
        let (tracks, catalog, mut ledger, media) = setup();
        let config = TimelineConfig::default();
        let scope = LedgerScope { tracks: &tracks, catalog: &catalog, config: &config };
        let mut history = CommandHistory::default();

        let cmd = ledger.prepare_place(scope, media, &"v1".into(), 10.0, 100.0).unwrap();
        history.apply(&mut ledger, "Place clip", cmd).unwrap();
        assert_eq!(ledger.len(), 1);

        assert_eq!(history.undo(&mut ledger, &tracks).unwrap().as_deref(), Some("Place clip"));
        assert!(ledger.is_empty());
        assert!(history.can_redo());

        history.redo(&mut ledger, &tracks).unwrap();
        assert_eq!(ledger.len(), 1);
        assert!(!history.can_redo());
        assert_eq!(history.undo(&mut ledger, &tracks).unwrap().as_deref(), Some("Place clip"));
        assert_eq!(history.undo(&mut ledger, &tracks).unwrap(), None);
    }

    #[test]
    fn new_entry_clears_redo() {
        let (tracks, catalog, mut ledger, media) = setup();
        let config = TimelineConfig::default();
        let scope = LedgerScope { tracks: &tracks, catalog: &catalog, config: &config };
        let mut history = CommandHistory::default();
        let first = ledger.prepare_place(scope, media, &"v1".into(), 0.0, 50.0).unwrap();
        history.apply(&mut ledger, "a", first).unwrap();
        history.undo(&mut ledger, &tracks).unwrap();
        let second = ledger.prepare_place(scope, media, &"v1".into(), 0.0, 60.0).unwrap();
        history.apply(&mut ledger, "b", second).unwrap();
        assert!(!history.can_redo());
        assert_eq!(history.undo_label(), Some("b"));
    }

    #[test]
    fn depth_is_bounded() {
        let (tracks, catalog, mut ledger, media) = setup();
        let config = TimelineConfig::default();
        let mut history = CommandHistory::new(2);
        for i in 0..4 {
            let scope = LedgerScope { tracks: &tracks, catalog: &catalog, config: &config };
            let cmd = ledger.prepare_place(scope, media, &"v1".into(), i as f64, 10.0).unwrap();
            history.apply(&mut ledger, format!("place {i}"), cmd).unwrap();
        }
        assert!(history.undo(&mut ledger, &tracks).unwrap().is_some());
        assert!(history.undo(&mut ledger, &tracks).unwrap().is_some());
        assert!(history.undo(&mut ledger, &tracks).unwrap().is_none());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn locked_track_blocks_undo() {
        let (mut tracks, catalog, mut ledger, media) = setup();
        let config = TimelineConfig::default();
        let mut history = CommandHistory::default();
        let cmd = {
            let scope = LedgerScope { tracks: &tracks, catalog: &catalog, config: &config };
            ledger.prepare_place(scope, media, &"v1".into(), 0.0, 50.0).unwrap()
        };
        history.apply(&mut ledger, "place", cmd).unwrap();
        tracks.set_locked(&"v1".into(), true).unwrap();
        let err = history.undo(&mut ledger, &tracks).unwrap_err();
        assert_eq!(err, TimelineError::TrackLocked("v1".into()));
        assert_eq!(ledger.len(), 1);
        assert!(history.can_undo());
    }
}
