use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineSetting {
    Snap,
    Waveforms,
    Magnetic,
    Proxy,
}

/// View toggles. None of these affect clip data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSettings {
    pub zoom: f64,
    pub snap: bool,
    pub waveforms: bool,
    pub magnetic: bool,
    pub proxy: bool,
}

impl Default for TimelineSettings {
    fn default() -> Self { Self { zoom: 1.0, snap: true, waveforms: true, magnetic: false, proxy: true } }
}

impl TimelineSettings {
    pub fn adjust_zoom(&mut self, delta: f64) -> String {
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        format!("Zoom: {:.1}x", self.zoom)
    }

    pub fn toggle(&mut self, setting: TimelineSetting) -> String {
        let (label, flag) = match setting {
            TimelineSetting::Snap => ("Snap", &mut self.snap),
            TimelineSetting::Waveforms => ("Waveforms", &mut self.waveforms),
            TimelineSetting::Magnetic => ("Magnetic", &mut self.magnetic),
            TimelineSetting::Proxy => ("Proxies", &mut self.proxy),
        };
        *flag = !*flag;
        format!("{label} {}", if *flag { "ON" } else { "OFF" })
    }
}
