//! Sample project used by the CLI and integration tests.

use crate::{MediaKind, NewMedia, Result, Timecode, TimelineConfig, TimelineEngine, Track};

pub const LOADED_NOTICE: &str = "✓ Project loaded • Proxies enabled";

pub fn demo_media() -> Vec<NewMedia> {
    vec![
        NewMedia::new("A001_Interview.mp4", Timecode::new(0, 2, 34, 12), MediaKind::Video, true),
        NewMedia::new("B012_Broll_4K.mp4", Timecode::new(0, 1, 45, 8), MediaKind::Video, true),
        NewMedia::new("C004_Drone_8K.mp4", Timecode::new(0, 0, 58, 22), MediaKind::Video, true),
        NewMedia::new("Music_Track.wav", Timecode::new(0, 4, 20, 0), MediaKind::Audio, false),
        NewMedia::new("VO_Main.wav", Timecode::new(0, 2, 15, 10), MediaKind::Audio, false),
        NewMedia::new("SFX_Ambient.wav", Timecode::new(0, 3, 0, 0), MediaKind::Audio, false),
    ]
}

pub fn demo_tracks() -> Vec<Track> {
    vec![
        Track::new("v1", "V1", MediaKind::Video),
        Track::new("v2", "V2", MediaKind::Video),
        Track::new("a1", "A1", MediaKind::Audio),
        Track::new("a2", "A2", MediaKind::Audio),
    ]
}

/// Builds an engine holding the sample media, the four standard tracks and
/// an interview clip over a music bed.
pub fn demo_engine(config: TimelineConfig) -> Result<TimelineEngine> {
    let mut engine = TimelineEngine::new(config);
    for track in demo_tracks() {
        engine.add_track(track)?;
    }
    let ids: Vec<_> = demo_media().into_iter().map(|m| engine.import_media(m)).collect();
    engine.place_clip(ids[0], &"v1".into(), 20.0, None)?;
    engine.place_clip(ids[3], &"a1".into(), 20.0, Some(450.0))?;
    engine.notice(LOADED_NOTICE);
    tracing::info!(media = ids.len(), tracks = engine.tracks().len(), "demo project loaded");
    Ok(engine)
}
