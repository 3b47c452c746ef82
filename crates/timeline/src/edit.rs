//! Per-tool clip transformations.
//!
//! Each edit is a pure function of the target clip, its neighbours on the same
//! track and a signed amount. The result is the set of clips that changed; the
//! ledger turns it into an invertible command.

use crate::{Clip, ClipId, Position, Result, TimelineError, Tool};

const EPSILON: f64 = 1e-9;

/// Clips around the target, ordered by start position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Neighbors {
    pub before: Option<Clip>,
    pub after: Option<Clip>,
    /// Every other clip starting at or after the target's end.
    pub following: Vec<Clip>,
}

impl Neighbors {
    pub fn of(target: &Clip, lane: &[Clip]) -> Self {
        let mut ordered: Vec<&Clip> = lane.iter().collect();
        // stable sort keeps insertion order for clips sharing a start
        ordered.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));
        let Some(pos) = ordered.iter().position(|c| c.id == target.id) else {
            return Self::default();
        };
        let before = pos.checked_sub(1).and_then(|i| ordered.get(i)).map(|c| (*c).clone());
        let after = ordered.get(pos + 1).map(|c| (*c).clone());
        let following = ordered
            .iter()
            .filter(|c| c.id != target.id && c.start >= target.end() - EPSILON)
            .map(|c| (*c).clone())
            .collect();
        Self { before, after, following }
    }
}

/// Applies `tool` to `target`. For `Blade`, `amount` is the absolute cut
/// position; for every other tool it is a signed offset.
pub fn apply_edit<F>(tool: Tool, target: &Clip, neighbors: &Neighbors, amount: Position, media_len: F) -> Result<Vec<Clip>>
where
    F: Fn(&Clip) -> Result<Position>,
{
    if !amount.is_finite() {
        return Err(TimelineError::InvalidRange(format!("edit amount {amount} is not finite")));
    }
    let changed = match tool {
        Tool::Select => Vec::new(),
        Tool::Ripple => ripple(target, neighbors, amount),
        Tool::Roll => roll(target, neighbors, amount)?,
        Tool::Slip => vec![slip(target, amount)],
        Tool::Slide => slide(target, neighbors, amount),
        Tool::Blade => blade(target, amount)?,
    };
    for clip in &changed {
        clip.validate(media_len(clip)?)?;
    }
    Ok(changed)
}

fn ripple(target: &Clip, neighbors: &Neighbors, amount: Position) -> Vec<Clip> {
    let mut out = Vec::with_capacity(neighbors.following.len() + 1);
    out.push(trim_tail(target, amount));
    for clip in &neighbors.following {
        let mut shifted = clip.clone();
        shifted.start += amount;
        out.push(shifted);
    }
    out
}

fn roll(target: &Clip, neighbors: &Neighbors, amount: Position) -> Result<Vec<Clip>> {
    let next = neighbors
        .after
        .as_ref()
        .filter(|next| touches(target, next))
        .ok_or_else(|| TimelineError::InvalidRange("roll needs a clip butting the target's end".into()))?;
    Ok(vec![trim_tail(target, amount), trim_head(next, amount)])
}

fn slip(target: &Clip, amount: Position) -> Clip {
    let mut clip = target.clone();
    clip.source_in += amount;
    clip.source_out += amount;
    clip
}

fn slide(target: &Clip, neighbors: &Neighbors, amount: Position) -> Vec<Clip> {
    let mut moved = target.clone();
    moved.start += amount;
    let mut out = vec![moved];
    if let Some(prev) = neighbors.before.as_ref().filter(|prev| touches(prev, target)) {
        out.push(trim_tail(prev, amount));
    }
    if let Some(next) = neighbors.after.as_ref().filter(|next| touches(target, next)) {
        out.push(trim_head(next, amount));
    }
    out
}

/// True when `right` starts where `left` ends.
fn touches(left: &Clip, right: &Clip) -> bool { (right.start - left.end()).abs() <= EPSILON }

fn blade(target: &Clip, at: Position) -> Result<Vec<Clip>> {
    if !target.contains(at) {
        return Err(TimelineError::InvalidRange(format!(
            "cut at {at} is outside clip [{}, {}]",
            target.start,
            target.end()
        )));
    }
    let left_duration = at - target.start;
    let mut left = target.clone();
    left.duration = left_duration;
    left.source_out = target.source_in + left_duration;

    let mut right = target.clone();
    right.id = ClipId::new();
    right.start = at;
    right.duration = target.end() - at;
    right.source_in = left.source_out;
    Ok(vec![left, right])
}

fn trim_tail(clip: &Clip, amount: Position) -> Clip {
    let mut c = clip.clone();
    c.duration += amount;
    c.source_out += amount;
    c
}

fn trim_head(clip: &Clip, amount: Position) -> Clip {
    let mut c = clip.clone();
    c.start += amount;
    c.duration -= amount;
    c.source_in += amount;
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MediaId;

    fn clip(start: f64, duration: f64) -> Clip {
        Clip {
            id: ClipId::new(),
            media: MediaId::new(),
            name: "c".into(),
            track_id: "v1".into(),
            start,
            duration,
            source_in: 50.0,
            source_out: 50.0 + duration,
        }
    }

    fn long_media(_: &Clip) -> Result<Position> { Ok(1000.0) }

    fn lane() -> Vec<Clip> { vec![clip(0.0, 100.0), clip(100.0, 100.0), clip(200.0, 100.0)] }

    fn gapped_lane() -> Vec<Clip> { vec![clip(0.0, 100.0), clip(500.0, 100.0), clip(1000.0, 100.0)] }

    #[test]
    fn roll_rejects_gap_to_next_clip() {
        let lane = gapped_lane();
        let err = apply_edit(Tool::Roll, &lane[0], &Neighbors::of(&lane[0], &lane), 30.0, long_media).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidRange(_)));
    }

    #[test]
    fn slide_leaves_distant_neighbours_alone() {
        let lane = gapped_lane();
        let out = apply_edit(Tool::Slide, &lane[1], &Neighbors::of(&lane[1], &lane), 10.0, long_media).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, lane[1].id);
        assert_eq!(out[0].start, 510.0);
    }

    #[test]
    fn slide_adjusts_only_the_touching_side() {
        let lane = vec![clip(0.0, 100.0), clip(100.0, 100.0), clip(400.0, 100.0)];
        let out = apply_edit(Tool::Slide, &lane[1], &Neighbors::of(&lane[1], &lane), 10.0, long_media).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].id, lane[0].id);
        assert_eq!(out[1].duration, 110.0);
    }

    #[test]
    fn neighbors_follow_start_order() {
        let lane = lane();
        let n = Neighbors::of(&lane[1], &lane);
        assert_eq!(n.before.as_ref().map(|c| c.id), Some(lane[0].id));
        assert_eq!(n.after.as_ref().map(|c| c.id), Some(lane[2].id));
        assert_eq!(n.following.len(), 1);
    }

    #[test]
    fn select_changes_nothing() {
        let lane = lane();
        let out = apply_edit(Tool::Select, &lane[0], &Neighbors::of(&lane[0], &lane), 10.0, long_media).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn ripple_shifts_everything_after() {
        let lane = lane();
        let out = apply_edit(Tool::Ripple, &lane[0], &Neighbors::of(&lane[0], &lane), -20.0, long_media).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].duration, 80.0);
        assert_eq!(out[0].source_out, 130.0);
        assert_eq!(out[1].start, 80.0);
        assert_eq!(out[2].start, 180.0);
    }

    #[test]
    fn roll_keeps_track_span() {
        let lane = lane();
        let out = apply_edit(Tool::Roll, &lane[0], &Neighbors::of(&lane[0], &lane), 30.0, long_media).unwrap();
        assert_eq!(out[0].duration, 130.0);
        assert_eq!(out[1].start, 130.0);
        assert_eq!(out[1].duration, 70.0);
        assert_eq!(out[1].source_in, 80.0);
        assert_eq!(out[0].duration + out[1].duration, 200.0);
    }

    #[test]
    fn roll_without_next_clip_fails() {
        let lane = lane();
        let err = apply_edit(Tool::Roll, &lane[2], &Neighbors::of(&lane[2], &lane), 5.0, long_media).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidRange(_)));
    }

    #[test]
    fn slip_moves_source_window_only() {
        let lane = lane();
        let out = apply_edit(Tool::Slip, &lane[1], &Neighbors::of(&lane[1], &lane), 25.0, long_media).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start, 100.0);
        assert_eq!(out[0].duration, 100.0);
        assert_eq!((out[0].source_in, out[0].source_out), (75.0, 175.0));
    }

    #[test]
    fn slip_past_media_start_is_rejected() {
        let lane = lane();
        let err = apply_edit(Tool::Slip, &lane[1], &Neighbors::of(&lane[1], &lane), -60.0, long_media).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidRange(_)));
        let short = |_: &Clip| Ok(160.0);
        assert!(apply_edit(Tool::Slip, &lane[1], &Neighbors::of(&lane[1], &lane), 20.0, short).is_err());
    }

    #[test]
    fn slide_adjusts_both_neighbours() {
        let lane = lane();
        let out = apply_edit(Tool::Slide, &lane[1], &Neighbors::of(&lane[1], &lane), 10.0, long_media).unwrap();
        let moved = &out[0];
        let prev = out.iter().find(|c| c.id == lane[0].id).unwrap();
        let next = out.iter().find(|c| c.id == lane[2].id).unwrap();
        assert_eq!(moved.start, 110.0);
        assert_eq!(moved.source_in, 50.0);
        assert_eq!(prev.duration, 110.0);
        assert_eq!(next.start, 210.0);
        assert_eq!(next.duration, 90.0);
    }

    #[test]
    fn blade_splits_in_two() {
        let lane = lane();
        let out = apply_edit(Tool::Blade, &lane[1], &Neighbors::of(&lane[1], &lane), 140.0, long_media).unwrap();
        let (left, right) = (&out[0], &out[1]);
        assert_eq!(left.id, lane[1].id);
        assert_ne!(right.id, lane[1].id);
        assert_eq!(left.duration + right.duration, 100.0);
        assert_eq!(left.end(), right.start);
        assert_eq!(left.source_out, right.source_in);
        assert_eq!(right.source_out, lane[1].source_out);
    }

    #[test]
    fn blade_outside_clip_fails() {
        let lane = lane();
        let n = Neighbors::of(&lane[1], &lane);
        assert!(apply_edit(Tool::Blade, &lane[1], &n, 100.0, long_media).is_err());
        assert!(apply_edit(Tool::Blade, &lane[1], &n, 250.0, long_media).is_err());
    }
}
