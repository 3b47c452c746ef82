use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::{Clip, ClipId, Tool, Track, TrackId, TransportState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    User,
    Bounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    ClipPlaced { clip: Clip },
    ClipsChanged { clips: Vec<Clip> },
    ClipRemoved { clip_id: ClipId, track_id: TrackId },
    SelectionChanged { clip_id: Option<ClipId> },
    TrackChanged { track: Track },
    ToolChanged { tool: Tool },
    Transport { state: TransportState },
    PlaybackStarted { speed: i32 },
    PlaybackStopped { reason: StopReason },
    HistoryChanged { can_undo: bool, can_redo: bool },
    Notice { text: String },
}

/// Fan-out of engine events to any number of subscribers. Dropped receivers are pruned on publish.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<EngineEvent>>,
}

impl EventBus {
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, event: EngineEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize { self.subscribers.len() }
}
