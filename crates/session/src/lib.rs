use crossbeam_channel::{bounded, never, unbounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};
use thiserror::Error;
use timeline::{
    ClipId, EngineEvent, Key, MediaId, Modifiers, Position, TimelineEngine, TimelineError, TimelineSetting, TimelineSnapshot, Tool, TrackId,
};

pub mod notice;

pub use notice::NoticeBoard;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session thread stopped")]
    Stopped,
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub notice_duration_ms: u64,
    /// Events buffered for `SessionHandle::rx_events`. Once full, new events are dropped.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self { Self { notice_duration_ms: 2000, event_capacity: 1024 } }
}

impl SessionConfig {
    pub fn notice_duration(&self) -> Duration { Duration::from_millis(self.notice_duration_ms) }
}

/// Every mutation the session thread accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum SessionCommand {
    Key { key: Key, #[serde(default)] modifiers: Modifiers },
    PlaceClip { media: MediaId, track: TrackId, position: Position, #[serde(default)] duration: Option<Position> },
    MoveClip { clip: ClipId, start: Position },
    DeleteClip { clip: ClipId },
    TrimClip { clip: ClipId, source_in: Position, source_out: Position },
    SelectClip { clip: Option<ClipId> },
    EditClip { clip: ClipId, amount: Position },
    SetTrackLocked { track: TrackId, locked: bool },
    SetTrackMuted { track: TrackId, muted: bool },
    TogglePlay,
    AdjustSpeed { delta: i32 },
    Shuttle { delta: i32 },
    Stop,
    StepFrame { direction: i32 },
    Seek { position: Position },
    MarkIn,
    MarkOut,
    ClearMarks,
    SelectTool { tool: Tool },
    Undo,
    Redo,
    AdjustZoom { delta: f64 },
    ToggleSetting { setting: TimelineSetting },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    Engine { event: EngineEvent },
    NoticeDismissed { text: String },
}

enum Request {
    Execute(SessionCommand, Sender<Result<TimelineSnapshot>>),
    Shutdown,
}

#[derive(Clone)]
pub struct SessionHandle {
    tx_requests: Sender<Request>,
    latest: Arc<Mutex<TimelineSnapshot>>,
    worker: Arc<Mutex<Option<thread::JoinHandle<()>>>>,
    /// Bounded; a holder that stops draining it misses events but never stalls the session.
    pub rx_events: Receiver<SessionEvent>,
}

pub struct SessionRuntime {
    engine: TimelineEngine,
    engine_events: Receiver<EngineEvent>,
    rx_requests: Receiver<Request>,
    tx_events: Sender<SessionEvent>,
    latest: Arc<Mutex<TimelineSnapshot>>,
    notices: NoticeBoard,
    tick_interval: Duration,
    ticker: Receiver<Instant>,
}

impl SessionRuntime {
    /// Moves `engine` onto a dedicated thread. All commands are applied there in arrival order.
    pub fn start(mut engine: TimelineEngine, config: SessionConfig) -> SessionHandle {
        let (tx_requests, rx_requests) = unbounded::<Request>();
        let (tx_events, rx_events) = bounded::<SessionEvent>(config.event_capacity.max(1));
        let engine_events = engine.subscribe();
        let latest = Arc::new(Mutex::new(engine.snapshot()));
        let tick_interval = engine.config().tick_interval();

        let mut runtime = SessionRuntime {
            engine,
            engine_events,
            rx_requests,
            tx_events,
            latest: latest.clone(),
            notices: NoticeBoard::new(config.notice_duration()),
            tick_interval,
            ticker: never(),
        };
        let worker = thread::spawn(move || runtime.run());

        SessionHandle { tx_requests, latest, worker: Arc::new(Mutex::new(Some(worker))), rx_events }
    }

    fn run(&mut self) {
        loop {
            let requests = self.rx_requests.clone();
            let ticker = self.ticker.clone();
            let dismissal = match self.notices.deadline() {
                Some(at) => crossbeam_channel::at(at),
                None => never(),
            };
            crossbeam_channel::select! {
                recv(requests) -> msg => match msg {
                    Ok(Request::Execute(command, reply)) => {
                        let result = dispatch(&mut self.engine, command.clone());
                        if let Err(err) = &result {
                            tracing::warn!(?command, error = %err, "session command rejected");
                        }
                        self.forward_events();
                        let _ = reply.send(result.map(|_| self.latest.lock().clone()).map_err(SessionError::from));
                    }
                    Ok(Request::Shutdown) | Err(_) => break,
                },
                recv(ticker) -> _ => {
                    self.engine.tick();
                    self.forward_events();
                }
                recv(dismissal) -> _ => {
                    if let Some(text) = self.notices.dismiss_due(Instant::now()) {
                        self.emit(SessionEvent::NoticeDismissed { text });
                    }
                }
            }
        }
        tracing::debug!("session thread exiting");
    }

    /// Drains engine events, feeds notices to the board, arms or disarms the
    /// ticker and refreshes the shared snapshot.
    fn forward_events(&mut self) {
        let mut started = false;
        for event in self.engine_events.try_iter() {
            match &event {
                EngineEvent::Notice { text } => self.notices.show(text.clone(), Instant::now()),
                EngineEvent::PlaybackStarted { .. } => started = true,
                _ => {}
            }
            self.emit(SessionEvent::Engine { event });
        }
        if !self.engine.transport_state().is_playing {
            self.ticker = never();
        } else if started {
            self.ticker = crossbeam_channel::tick(self.tick_interval);
            tracing::debug!(interval = ?self.tick_interval, "ticker armed");
        }
        *self.latest.lock() = self.engine.snapshot();
    }

    fn emit(&self, event: SessionEvent) {
        if let Err(TrySendError::Full(event)) = self.tx_events.try_send(event) {
            tracing::trace!(?event, "event buffer full, dropping");
        }
    }
}

fn dispatch(engine: &mut TimelineEngine, command: SessionCommand) -> timeline::Result<()> {
    match command {
        SessionCommand::Key { key, modifiers } => {
            engine.handle_key(key, modifiers)?;
        }
        SessionCommand::PlaceClip { media, track, position, duration } => {
            engine.place_clip(media, &track, position, duration)?;
        }
        SessionCommand::MoveClip { clip, start } => {
            engine.move_clip(clip, start)?;
        }
        SessionCommand::DeleteClip { clip } => engine.delete_clip(clip)?,
        SessionCommand::TrimClip { clip, source_in, source_out } => {
            engine.trim_clip(clip, source_in, source_out)?;
        }
        SessionCommand::SelectClip { clip } => engine.select_clip(clip)?,
        SessionCommand::EditClip { clip, amount } => {
            engine.edit_clip(clip, amount)?;
        }
        SessionCommand::SetTrackLocked { track, locked } => engine.set_track_locked(&track, locked)?,
        SessionCommand::SetTrackMuted { track, muted } => engine.set_track_muted(&track, muted)?,
        SessionCommand::TogglePlay => engine.toggle_play(),
        SessionCommand::AdjustSpeed { delta } => engine.adjust_shuttle_speed(delta),
        SessionCommand::Shuttle { delta } => engine.shuttle(delta),
        SessionCommand::Stop => engine.stop(),
        SessionCommand::StepFrame { direction } => engine.step_frame(direction),
        SessionCommand::Seek { position } => engine.seek(position),
        SessionCommand::MarkIn => {
            engine.mark_in();
        }
        SessionCommand::MarkOut => {
            engine.mark_out();
        }
        SessionCommand::ClearMarks => engine.clear_marks(),
        SessionCommand::SelectTool { tool } => engine.select_tool(tool),
        SessionCommand::Undo => {
            engine.undo()?;
        }
        SessionCommand::Redo => {
            engine.redo()?;
        }
        SessionCommand::AdjustZoom { delta } => engine.adjust_zoom(delta),
        SessionCommand::ToggleSetting { setting } => engine.toggle_setting(setting),
    }
    Ok(())
}

impl SessionHandle {
    /// Applies `command` on the session thread and returns the resulting snapshot.
    pub fn execute(&self, command: SessionCommand) -> Result<TimelineSnapshot> {
        let (tx, rx) = bounded(1);
        self.tx_requests.send(Request::Execute(command, tx)).map_err(|_| SessionError::Stopped)?;
        rx.recv().map_err(|_| SessionError::Stopped)?
    }

    /// Latest published state; never blocks on the session thread.
    pub fn snapshot(&self) -> TimelineSnapshot { self.latest.lock().clone() }

    pub fn shutdown(&self) {
        let _ = self.tx_requests.send(Request::Shutdown);
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}
