use serde::{Deserialize, Serialize};

use crate::{Fps, Position};

/// Tunables for the timeline model. All positions are in view units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Lower playhead bound and the mark the playhead starts on.
    pub origin: Position,
    /// Upper playhead bound.
    pub extent: Position,
    /// Playhead distance covered by one tick at 1x.
    pub units_per_tick: Position,
    /// Distance of a single frame step.
    pub frame_step: Position,
    pub ticks_per_second: u32,
    pub default_clip_duration: Position,
    /// Conversion factor from media seconds to view units.
    pub units_per_second: Position,
    pub fps: Fps,
    pub history_depth: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            origin: 160.0,
            extent: 2800.0,
            units_per_tick: 0.5,
            frame_step: 2.0,
            ticks_per_second: 30,
            default_clip_duration: 220.0,
            units_per_second: 20.0,
            fps: Fps::new(30, 1),
            history_depth: 100,
        }
    }
}

impl TimelineConfig {
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.ticks_per_second.max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: TimelineConfig = serde_json::from_str(r#"{ "extent": 1000.0 }"#).unwrap();
        assert_eq!(cfg.extent, 1000.0);
        assert_eq!(cfg.origin, 160.0);
        assert_eq!(cfg.ticks_per_second, 30);
    }

    #[test]
    fn tick_interval_is_a_thirtieth() {
        let cfg = TimelineConfig::default();
        assert!((cfg.tick_interval().as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    }
}
