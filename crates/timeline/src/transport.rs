//! Playhead and J-K-L shuttle state machine.
//!
//! `Stopped` is `is_playing == false`; `Playing(speed)` carries a non-zero
//! speed in `[-4, 4]`. Adjusting the speed never starts playback by itself;
//! only `toggle_play` and `shuttle` do. Time advance is a pure function of the
//! state and the elapsed time so it can be driven without a real clock.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Position, TimelineConfig};

pub const MAX_SHUTTLE: i32 = 4;
const MULTIPLIERS: [f64; 4] = [1.0, 2.0, 4.0, 8.0];
const GLYPHS: [&str; 9] = ["<<<<", "<<<", "<<", "<", "||", ">", ">>", ">>>", ">>>>"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportState {
    pub playhead: Position,
    pub shuttle_speed: i32,
    pub is_playing: bool,
    pub mark_in: Option<Position>,
    pub mark_out: Option<Position>,
}

impl TransportState {
    pub fn at(playhead: Position) -> Self {
        Self { playhead, shuttle_speed: 0, is_playing: false, mark_in: None, mark_out: None }
    }

    pub fn shuttle_glyph(&self) -> &'static str { shuttle_glyph(self.shuttle_speed) }
}

/// Rate multiplier for a shuttle speed; `0` for a stopped shuttle.
pub fn multiplier(speed: i32) -> f64 {
    match speed.unsigned_abs().min(MAX_SHUTTLE as u32) {
        0 => 0.0,
        m => MULTIPLIERS[m as usize - 1],
    }
}

pub fn shuttle_glyph(speed: i32) -> &'static str {
    GLYPHS[(speed.clamp(-MAX_SHUTTLE, MAX_SHUTTLE) + MAX_SHUTTLE) as usize]
}

/// Advances `state` by `elapsed` of playback. Returns the new state and
/// whether this step hit a bound and stopped playback.
pub fn advance(state: &TransportState, elapsed: Duration, config: &TimelineConfig) -> (TransportState, bool) {
    let ticks = elapsed.as_secs_f64() * config.ticks_per_second as f64;
    step_ticks(state, ticks, config)
}

fn step_ticks(state: &TransportState, ticks: f64, config: &TimelineConfig) -> (TransportState, bool) {
    let mut next = state.clone();
    if !state.is_playing || state.shuttle_speed == 0 {
        return (next, false);
    }
    let direction = state.shuttle_speed.signum() as f64;
    next.playhead += direction * multiplier(state.shuttle_speed) * config.units_per_tick * ticks;
    // only the bound in the direction of travel can stop playback
    let hit_bound = if direction > 0.0 && next.playhead >= config.extent {
        next.playhead = config.extent;
        true
    } else if direction < 0.0 && next.playhead <= config.origin {
        next.playhead = config.origin;
        true
    } else {
        false
    };
    if hit_bound {
        next.is_playing = false;
        next.shuttle_speed = 0;
    }
    (next, hit_bound)
}

#[derive(Debug, Clone)]
pub struct Transport {
    state: TransportState,
    config: TimelineConfig,
}

impl Transport {
    pub fn new(config: TimelineConfig) -> Self {
        Self { state: TransportState::at(config.origin), config }
    }

    pub fn state(&self) -> &TransportState { &self.state }

    pub fn toggle_play(&mut self) {
        if self.state.is_playing {
            self.stop();
        } else {
            self.state.shuttle_speed = 1;
            self.state.is_playing = true;
            tracing::debug!(playhead = self.state.playhead, "playback started");
        }
    }

    pub fn stop(&mut self) {
        self.state.shuttle_speed = 0;
        self.state.is_playing = false;
        tracing::debug!(playhead = self.state.playhead, "playback stopped");
    }

    /// Clamps the speed into `[-4, 4]`. Stops playback if the speed lands on zero.
    pub fn adjust_speed(&mut self, delta: i32) -> &'static str {
        self.state.shuttle_speed = self.state.shuttle_speed.saturating_add(delta).clamp(-MAX_SHUTTLE, MAX_SHUTTLE);
        if self.state.shuttle_speed == 0 && self.state.is_playing {
            self.state.is_playing = false;
        }
        tracing::debug!(speed = self.state.shuttle_speed, playing = self.state.is_playing, "shuttle speed adjusted");
        self.state.shuttle_glyph()
    }

    /// Adjusts the speed and plays at the result.
    pub fn shuttle(&mut self, delta: i32) -> &'static str {
        let glyph = self.adjust_speed(delta);
        self.state.is_playing = self.state.shuttle_speed != 0;
        glyph
    }

    pub fn step_frame(&mut self, direction: i32) {
        let step = direction.signum() as f64 * self.config.frame_step;
        self.state.playhead = (self.state.playhead + step).clamp(self.config.origin, self.config.extent);
    }

    /// One fixed-cadence tick. Returns true when playback auto-stopped at a bound.
    pub fn tick(&mut self) -> bool {
        let (next, stopped) = step_ticks(&self.state, 1.0, &self.config);
        self.state = next;
        if stopped {
            tracing::debug!(playhead = self.state.playhead, "playback reached timeline bound");
        }
        stopped
    }

    pub fn advance(&mut self, elapsed: Duration) -> bool {
        let (next, stopped) = advance(&self.state, elapsed, &self.config);
        self.state = next;
        stopped
    }

    pub fn seek(&mut self, position: Position) {
        self.state.playhead = position.clamp(self.config.origin, self.config.extent);
    }

    pub fn mark_in(&mut self) -> Position {
        self.state.mark_in = Some(self.state.playhead);
        self.state.playhead
    }

    pub fn mark_out(&mut self) -> Position {
        self.state.mark_out = Some(self.state.playhead);
        self.state.playhead
    }

    pub fn clear_marks(&mut self) {
        self.state.mark_in = None;
        self.state.mark_out = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> Transport { Transport::new(TimelineConfig::default()) }

    #[test]
    fn starts_stopped_at_origin() {
        let t = transport();
        assert_eq!(t.state(), &TransportState::at(160.0));
    }

    #[test]
    fn toggle_play_cycles() {
        let mut t = transport();
        t.toggle_play();
        assert!(t.state().is_playing);
        assert_eq!(t.state().shuttle_speed, 1);
        t.toggle_play();
        assert!(!t.state().is_playing);
        assert_eq!(t.state().shuttle_speed, 0);
    }

    #[test]
    fn speed_clamps_at_four() {
        let mut t = transport();
        for _ in 0..4 {
            t.adjust_speed(1);
        }
        assert_eq!(t.state().shuttle_speed, 4);
        assert_eq!(t.adjust_speed(1), ">>>>");
        assert_eq!(t.state().shuttle_speed, 4);
        t.adjust_speed(i32::MIN);
        assert_eq!(t.state().shuttle_speed, -4);
        t.adjust_speed(i32::MAX);
        assert_eq!(t.state().shuttle_speed, 4);
    }

    #[test]
    fn adjusting_while_stopped_does_not_play() {
        let mut t = transport();
        t.adjust_speed(2);
        assert!(!t.state().is_playing);
        assert!(!t.tick());
        assert_eq!(t.state().playhead, 160.0);
    }

    #[test]
    fn shuttle_starts_and_stops_playback() {
        let mut t = transport();
        assert_eq!(t.shuttle(2), ">>");
        assert!(t.state().is_playing);
        t.shuttle(-2);
        assert!(!t.state().is_playing);
    }

    #[test]
    fn speed_to_zero_while_playing_stops() {
        let mut t = transport();
        t.toggle_play();
        assert_eq!(t.adjust_speed(-1), "||");
        assert!(!t.state().is_playing);
    }

    #[test]
    fn step_frame_leaves_shuttle_alone() {
        let mut t = transport();
        t.adjust_speed(3);
        t.step_frame(1);
        assert_eq!(t.state().playhead, 162.0);
        assert_eq!(t.state().shuttle_speed, 3);
        assert!(!t.state().is_playing);
        t.step_frame(-1);
        t.step_frame(-1);
        assert_eq!(t.state().playhead, 160.0);
    }

    #[test]
    fn tick_uses_multiplier_table() {
        let mut t = transport();
        t.shuttle(3);
        t.tick();
        assert_eq!(t.state().playhead, 162.0);
        assert_eq!(multiplier(4), 8.0);
        assert_eq!(multiplier(-2), 2.0);
        assert_eq!(multiplier(0), 0.0);
    }

    #[test]
    fn playback_stops_once_at_extent() {
        let mut t = transport();
        t.seek(2790.0);
        t.shuttle(4);
        let mut stops = 0;
        let mut last = t.state().playhead;
        for _ in 0..10 {
            if t.tick() {
                stops += 1;
            }
            assert!(t.state().playhead >= last);
            assert!(t.state().playhead <= 2800.0);
            last = t.state().playhead;
        }
        assert_eq!(stops, 1);
        assert_eq!(t.state().playhead, 2800.0);
        assert!(!t.state().is_playing);
        assert_eq!(t.state().shuttle_speed, 0);
    }

    #[test]
    fn reverse_playback_stops_at_origin() {
        let mut t = transport();
        t.seek(170.0);
        t.shuttle(-1);
        let mut ticks = 0;
        while t.state().is_playing {
            let before = t.state().playhead;
            t.tick();
            assert!(t.state().playhead < before);
            ticks += 1;
        }
        assert_eq!(ticks, 20);
        assert_eq!(t.state().playhead, 160.0);
    }

    #[test]
    fn advance_matches_tick_count() {
        let cfg = TimelineConfig::default();
        let mut state = TransportState::at(500.0);
        state.is_playing = true;
        state.shuttle_speed = 2;
        let (next, stopped) = advance(&state, Duration::from_secs(1), &cfg);
        assert!(!stopped);
        assert!((next.playhead - 530.0).abs() < 1e-9);
    }

    #[test]
    fn zero_advance_leaves_the_far_bound_alone() {
        let cfg = TimelineConfig::default();
        let mut forward = TransportState::at(cfg.origin);
        forward.is_playing = true;
        forward.shuttle_speed = 1;
        let (next, stopped) = advance(&forward, Duration::ZERO, &cfg);
        assert!(!stopped);
        assert_eq!(next, forward);

        let mut reverse = TransportState::at(cfg.extent);
        reverse.is_playing = true;
        reverse.shuttle_speed = -1;
        let (next, stopped) = advance(&reverse, Duration::ZERO, &cfg);
        assert!(!stopped);
        assert_eq!(next, reverse);
    }

    #[test]
    fn play_from_origin_survives_an_empty_advance() {
        let mut t = transport();
        t.toggle_play();
        assert!(!t.advance(Duration::ZERO));
        assert!(t.state().is_playing);
        assert_eq!(t.state().playhead, 160.0);
    }

    #[test]
    fn advance_clamps_when_crossing_a_bound() {
        let cfg = TimelineConfig::default();
        let mut state = TransportState::at(2790.0);
        state.is_playing = true;
        state.shuttle_speed = 4;
        let (next, stopped) = advance(&state, Duration::from_secs(1), &cfg);
        assert!(stopped);
        assert_eq!(next.playhead, 2800.0);
        assert!(!next.is_playing);
        assert_eq!(next.shuttle_speed, 0);

        state.playhead = 170.0;
        state.shuttle_speed = -3;
        let (next, stopped) = advance(&state, Duration::from_secs(1), &cfg);
        assert!(stopped);
        assert_eq!(next.playhead, 160.0);
    }

    #[test]
    fn marks_follow_playhead() {
        let mut t = transport();
        t.seek(300.0);
        assert_eq!(t.mark_in(), 300.0);
        t.seek(400.0);
        t.mark_out();
        assert_eq!((t.state().mark_in, t.state().mark_out), (Some(300.0), Some(400.0)));
        t.clear_marks();
        assert_eq!(t.state().mark_in, None);
    }

    #[test]
    fn glyph_table() {
        assert_eq!(shuttle_glyph(-4), "<<<<");
        assert_eq!(shuttle_glyph(0), "||");
        assert_eq!(shuttle_glyph(2), ">>");
    }
}
