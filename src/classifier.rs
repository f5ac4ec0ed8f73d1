//! Gesture classification: turns touch samples into control signals.

use serde::{Deserialize, Serialize};

use crate::config::Profile;
use crate::tracker::{MAX_CONTACTS, Phase, Session, TouchPoint, TouchSample};

/// Display mode of the scene, owned by the consumer and passed in on every
/// classify call. `Scattered` stands for every non-formed display: a
/// one-finger drag pans there instead of rotating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Formed,
    Scattered,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    fn normalize(&self, p: TouchPoint) -> (f32, f32) {
        (
            (p.x / self.width).clamp(0.0, 1.0),
            (p.y / self.height).clamp(0.0, 1.0),
        )
    }
}

/// The consumer-owned accumulators. The classifier reads them, never
/// stores them: each update carries the new clamped values back out.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ControlState {
    pub rotation: f32,
    pub pan: (f32, f32),
    pub zoom: f32,
}

impl ControlState {
    pub fn apply(&mut self, update: &ControlUpdate) {
        if let Some(r) = update.rotation {
            self.rotation = r;
        }
        if let Some(p) = update.pan {
            self.pan = p;
        }
        if let Some(z) = update.zoom {
            self.zoom = z;
        }
    }
}

/// Signals derived from one sample. Absent fields mean "no change".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlUpdate {
    pub rotation: Option<f32>,
    pub pan: Option<(f32, f32)>,
    pub zoom: Option<f32>,
    pub pointer: Option<(f32, f32)>,
    pub tap_at_ms: Option<u64>,
}

impl ControlUpdate {
    pub fn is_empty(&self) -> bool {
        self.rotation.is_none()
            && self.pan.is_none()
            && self.zoom.is_none()
            && self.pointer.is_none()
            && self.tap_at_ms.is_none()
    }
}

#[derive(Debug)]
pub struct Classifier {
    profile: Profile,
    session: Session,
}

impl Classifier {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            session: Session::new(),
        }
    }

    /// One classify step per host sample. Synchronous, never blocks,
    /// never fails: unsupported contact counts degrade to the first two
    /// contacts, stale pinch state is guarded by the two-and-two check.
    pub fn classify(
        &mut self,
        sample: &TouchSample,
        mode: DisplayMode,
        viewport: Viewport,
        state: &ControlState,
    ) -> ControlUpdate {
        match sample.phase {
            Phase::Start => {
                self.session.begin(&sample.points, sample.t_ms);
                ControlUpdate::default()
            }
            Phase::Move => {
                if !self.session.is_active() {
                    // move without a preceding start; adopt it as the start
                    self.session.begin(&sample.points, sample.t_ms);
                    return ControlUpdate::default();
                }
                if sample.points.len().min(MAX_CONTACTS) != self.session.contact_count() {
                    // finger count changed mid-flight: restart the session
                    // instead of bridging, so the landing/lifting finger
                    // never reads as a giant swipe
                    self.session.begin(&sample.points, sample.t_ms);
                    return ControlUpdate::default();
                }
                let prev = self.session.update(&sample.points);
                let cur = self.session.points().to_vec();
                match (cur.as_slice(), prev.as_slice()) {
                    ([c], [l]) => self.single_pointer(*c, *l, mode, viewport, state),
                    ([a, b], [_, _]) => self.two_pointer(*a, *b, state),
                    _ => ControlUpdate::default(),
                }
            }
            Phase::End => {
                let mut update = ControlUpdate::default();
                if !self.session.is_active() {
                    return update;
                }
                if self.session.end(&sample.points) {
                    update.tap_at_ms = self.evaluate_tap(sample.t_ms);
                    self.session.reset();
                } else {
                    // e.g. two fingers lifted to one; restart with the rest
                    self.session.begin(&sample.points, sample.t_ms);
                }
                update
            }
        }
    }

    fn single_pointer(
        &mut self,
        cur: TouchPoint,
        last: TouchPoint,
        mode: DisplayMode,
        viewport: Viewport,
        state: &ControlState,
    ) -> ControlUpdate {
        let dx = cur.x - last.x;
        let dy = cur.y - last.y;
        let th = &self.profile.thresholds;
        if dx.abs() > th.drag_detect_px || dy.abs() > th.drag_detect_px {
            self.session.mark_dragging();
        }

        let sens = &self.profile.sensitivity;
        let lim = &self.profile.limits;
        let mut update = ControlUpdate::default();
        match mode {
            DisplayMode::Formed => {
                // inverted so the visual rotation follows the swipe
                update.rotation = Some(
                    (state.rotation - dx * sens.rotation).clamp(lim.rotation_min, lim.rotation_max),
                );
            }
            DisplayMode::Scattered => {
                // screen-down drag moves scene content up in world space
                update.pan = Some((state.pan.0 + dx * sens.pan, state.pan.1 - dy * sens.pan));
            }
        }
        // pointer stays live in both modes, dragging or not
        update.pointer = Some(viewport.normalize(cur));
        update
    }

    fn two_pointer(&mut self, a: TouchPoint, b: TouchPoint, state: &ControlState) -> ControlUpdate {
        // two fingers can never resolve to a tap
        self.session.mark_dragging();

        let mut update = ControlUpdate::default();
        let dist = a.distance(&b);
        if let Some(last) = self.session.last_pinch_dist() {
            let delta = dist - last;
            let lim = &self.profile.limits;
            // spreading fingers zooms in, i.e. lowers the accumulator
            update.zoom = Some(
                (state.zoom - delta * self.profile.sensitivity.zoom)
                    .clamp(lim.zoom_min, lim.zoom_max),
            );
        }
        self.session.set_last_pinch_dist(dist);
        update
    }

    fn evaluate_tap(&self, t_ms: u64) -> Option<u64> {
        if self.session.is_dragging() || self.session.peak_contacts() > 1 {
            return None;
        }
        let elapsed = t_ms.saturating_sub(self.session.start_ms());
        if elapsed >= self.profile.thresholds.tap_max_ms {
            return None;
        }
        let start = self.session.start_pos()?;
        let last = match self.session.points() {
            [p] => *p,
            _ => return None,
        };
        if start.distance(&last) > self.profile.thresholds.tap_slop_px {
            return None;
        }
        Some(t_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VP: Viewport = Viewport {
        width: 1000.0,
        height: 1000.0,
    };

    fn pt(x: f32, y: f32) -> TouchPoint {
        TouchPoint { x, y }
    }

    fn sample(t_ms: u64, phase: Phase, points: &[TouchPoint]) -> TouchSample {
        TouchSample {
            t_ms,
            phase,
            points: points.to_vec(),
        }
    }

    fn classifier() -> Classifier {
        Classifier::new(Profile::default())
    }

    #[test]
    fn quick_touch_at_same_pixel_is_a_tap() {
        let mut c = classifier();
        let state = ControlState::default();
        let up = c.classify(
            &sample(0, Phase::Start, &[pt(500.0, 500.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        assert!(up.is_empty());
        let up = c.classify(&sample(50, Phase::End, &[]), DisplayMode::Formed, VP, &state);
        assert_eq!(up.tap_at_ms, Some(50));
        assert_eq!(up.rotation, None);
        assert_eq!(up.pan, None);
    }

    #[test]
    fn slow_release_is_not_a_tap() {
        let mut c = classifier();
        let state = ControlState::default();
        c.classify(
            &sample(0, Phase::Start, &[pt(10.0, 10.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        let up = c.classify(
            &sample(300, Phase::End, &[]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        assert_eq!(up.tap_at_ms, None);
    }

    #[test]
    fn scattered_mode_drag_pans_with_inverted_y_and_no_tap() {
        // viewport 1000x1000, down at (500,500), move to (520,480), lift
        let mut c = classifier();
        let mut state = ControlState::default();
        c.classify(
            &sample(0, Phase::Start, &[pt(500.0, 500.0)]),
            DisplayMode::Scattered,
            VP,
            &state,
        );
        let up = c.classify(
            &sample(100, Phase::Move, &[pt(520.0, 480.0)]),
            DisplayMode::Scattered,
            VP,
            &state,
        );
        let pan = up.pan.expect("pan emitted in scattered mode");
        assert!((pan.0 - 1.0).abs() < 1e-5);
        assert!((pan.1 - 1.0).abs() < 1e-5);
        assert_eq!(up.rotation, None);
        assert_eq!(up.pointer, Some((0.52, 0.48)));
        state.apply(&up);

        let up = c.classify(
            &sample(150, Phase::End, &[]),
            DisplayMode::Scattered,
            VP,
            &state,
        );
        assert_eq!(up.tap_at_ms, None, "drag must suppress the tap");
    }

    #[test]
    fn formed_mode_drag_rotates_against_horizontal_delta() {
        let mut c = classifier();
        let state = ControlState::default();
        c.classify(
            &sample(0, Phase::Start, &[pt(100.0, 100.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        let up = c.classify(
            &sample(16, Phase::Move, &[pt(120.0, 100.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        // dx = +20 at sensitivity 0.025
        assert_eq!(up.rotation, Some(-0.5));
        assert_eq!(up.pan, None);
    }

    #[test]
    fn rotation_accumulator_stays_clamped() {
        let mut c = classifier();
        let mut state = ControlState::default();
        c.classify(
            &sample(0, Phase::Start, &[pt(0.0, 500.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        let mut x = 0.0;
        for i in 1..=10 {
            x += 100.0;
            let up = c.classify(
                &sample(i * 16, Phase::Move, &[pt(x, 500.0)]),
                DisplayMode::Formed,
                VP,
                &state,
            );
            state.apply(&up);
            assert!((-3.0..=3.0).contains(&state.rotation));
        }
        assert_eq!(state.rotation, -3.0);
    }

    #[test]
    fn returning_to_start_after_a_drag_is_still_not_a_tap() {
        let mut c = classifier();
        let state = ControlState::default();
        c.classify(
            &sample(0, Phase::Start, &[pt(100.0, 100.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        c.classify(
            &sample(50, Phase::Move, &[pt(150.0, 100.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        c.classify(
            &sample(100, Phase::Move, &[pt(100.0, 100.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        let up = c.classify(
            &sample(150, Phase::End, &[]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        assert_eq!(up.tap_at_ms, None);
    }

    #[test]
    fn sub_threshold_jitter_keeps_the_tap() {
        let mut c = classifier();
        let state = ControlState::default();
        c.classify(
            &sample(0, Phase::Start, &[pt(300.0, 300.0)]),
            DisplayMode::Scattered,
            VP,
            &state,
        );
        c.classify(
            &sample(40, Phase::Move, &[pt(301.0, 299.0)]),
            DisplayMode::Scattered,
            VP,
            &state,
        );
        let up = c.classify(
            &sample(90, Phase::End, &[]),
            DisplayMode::Scattered,
            VP,
            &state,
        );
        assert_eq!(up.tap_at_ms, Some(90));
    }

    #[test]
    fn slow_drift_past_the_slop_is_not_a_tap() {
        // 1.5 px steps never trip the drag threshold, but the finger ends
        // 15 px from where it started
        let mut c = classifier();
        let state = ControlState::default();
        c.classify(
            &sample(0, Phase::Start, &[pt(200.0, 200.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        for i in 1..=10u64 {
            c.classify(
                &sample(
                    i * 10,
                    Phase::Move,
                    &[pt(200.0 + i as f32 * 1.5, 200.0)],
                ),
                DisplayMode::Formed,
                VP,
                &state,
            );
        }
        let up = c.classify(
            &sample(120, Phase::End, &[]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        assert_eq!(up.tap_at_ms, None);
    }

    #[test]
    fn pinch_out_lowers_the_zoom_accumulator() {
        // distance 100 -> 140 at sensitivity 0.05 lowers zoom by 2.0
        let mut c = classifier();
        let mut state = ControlState {
            zoom: 5.0,
            ..ControlState::default()
        };
        c.classify(
            &sample(0, Phase::Start, &[pt(0.0, 0.0), pt(100.0, 0.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        let up = c.classify(
            &sample(16, Phase::Move, &[pt(0.0, 0.0), pt(140.0, 0.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        assert_eq!(up.zoom, Some(3.0));
        state.apply(&up);
        assert_eq!(state.zoom, 3.0);
    }

    #[test]
    fn pinch_in_raises_the_zoom_accumulator() {
        let mut c = classifier();
        let state = ControlState::default();
        c.classify(
            &sample(0, Phase::Start, &[pt(0.0, 0.0), pt(200.0, 0.0)]),
            DisplayMode::Scattered,
            VP,
            &state,
        );
        let up = c.classify(
            &sample(16, Phase::Move, &[pt(0.0, 0.0), pt(160.0, 0.0)]),
            DisplayMode::Scattered,
            VP,
            &state,
        );
        assert_eq!(up.zoom, Some(2.0));
    }

    #[test]
    fn zoom_accumulator_stays_clamped() {
        let mut c = classifier();
        let mut state = ControlState::default();
        c.classify(
            &sample(0, Phase::Start, &[pt(0.0, 0.0), pt(10.0, 0.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        // massive pinch-out, then massive pinch-in
        let up = c.classify(
            &sample(16, Phase::Move, &[pt(0.0, 0.0), pt(5000.0, 0.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        assert_eq!(up.zoom, Some(-20.0));
        state.apply(&up);
        let up = c.classify(
            &sample(32, Phase::Move, &[pt(0.0, 0.0), pt(10.0, 0.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        assert_eq!(up.zoom, Some(40.0));
    }

    #[test]
    fn two_finger_contact_never_taps_even_after_lifting_to_one() {
        let mut c = classifier();
        let state = ControlState::default();
        c.classify(
            &sample(0, Phase::Start, &[pt(0.0, 0.0), pt(50.0, 0.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        // one finger lifts almost immediately, the other follows
        c.classify(
            &sample(30, Phase::End, &[pt(0.0, 0.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        let up = c.classify(&sample(60, Phase::End, &[]), DisplayMode::Formed, VP, &state);
        assert_eq!(up.tap_at_ms, None);
    }

    #[test]
    fn finger_count_change_discards_the_inflight_delta() {
        let mut c = classifier();
        let state = ControlState::default();
        c.classify(
            &sample(0, Phase::Start, &[pt(100.0, 100.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        // second finger lands far away; must not read as a giant swipe
        let up = c.classify(
            &sample(16, Phase::Move, &[pt(100.0, 100.0), pt(600.0, 100.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        assert!(up.is_empty());
        // the next two-finger sample pinches normally from the new baseline
        let up = c.classify(
            &sample(32, Phase::Move, &[pt(100.0, 100.0), pt(620.0, 100.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        assert_eq!(up.zoom, Some(-1.0));
    }

    #[test]
    fn extra_contacts_degrade_to_the_first_two() {
        let mut c = classifier();
        let state = ControlState::default();
        c.classify(
            &sample(
                0,
                Phase::Start,
                &[pt(0.0, 0.0), pt(100.0, 0.0), pt(300.0, 300.0)],
            ),
            DisplayMode::Formed,
            VP,
            &state,
        );
        let up = c.classify(
            &sample(
                16,
                Phase::Move,
                &[pt(0.0, 0.0), pt(140.0, 0.0), pt(300.0, 300.0)],
            ),
            DisplayMode::Formed,
            VP,
            &state,
        );
        assert_eq!(up.zoom, Some(-2.0));
    }

    #[test]
    fn pointer_output_is_idempotent_for_identical_samples() {
        let mut c = classifier();
        let state = ControlState::default();
        c.classify(
            &sample(0, Phase::Start, &[pt(250.0, 750.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        let a = c.classify(
            &sample(16, Phase::Move, &[pt(250.0, 750.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        let b = c.classify(
            &sample(32, Phase::Move, &[pt(250.0, 750.0)]),
            DisplayMode::Formed,
            VP,
            &state,
        );
        assert_eq!(a.pointer, Some((0.25, 0.75)));
        assert_eq!(a.pointer, b.pointer);
    }

    #[test]
    fn pointer_tracks_in_both_modes_without_dragging() {
        let mut c = classifier();
        let state = ControlState::default();
        c.classify(
            &sample(0, Phase::Start, &[pt(500.0, 500.0)]),
            DisplayMode::Scattered,
            VP,
            &state,
        );
        let up = c.classify(
            &sample(16, Phase::Move, &[pt(501.0, 500.0)]),
            DisplayMode::Scattered,
            VP,
            &state,
        );
        assert!(up.pointer.is_some());
    }

    #[test]
    fn end_without_a_session_is_ignored() {
        let mut c = classifier();
        let state = ControlState::default();
        let up = c.classify(&sample(10, Phase::End, &[]), DisplayMode::Formed, VP, &state);
        assert!(up.is_empty());
    }
}
