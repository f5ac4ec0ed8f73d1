//! Touch input types and per-interaction session state.

use serde::{Deserialize, Serialize};

/// Supported gestures cover one and two fingers; extra contacts are ignored.
pub const MAX_CONTACTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn distance(&self, other: &TouchPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Start,
    Move,
    End,
}

/// One host-delivered sample: the full set of currently active contacts
/// plus a monotonic timestamp. On `End`, `points` holds the contacts that
/// remain down after the lift (empty when the last finger leaves).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchSample {
    pub t_ms: u64,
    pub phase: Phase,
    #[serde(default)]
    pub points: Vec<TouchPoint>,
}

/// State for one continuous interaction, first finger down to all fingers
/// up. Pure container: the classifier decides drag/tap status, the session
/// only records it.
///
/// Contact index 0/1 is assumed to map to the same physical finger across
/// consecutive samples while the contact count is unchanged; any count
/// change goes through `begin` again, which discards the in-flight delta.
#[derive(Debug, Clone, Default)]
pub struct Session {
    points: Vec<TouchPoint>,
    start_ms: u64,
    start_pos: Option<TouchPoint>,
    dragging: bool,
    last_pinch_dist: Option<f32>,
    peak_contacts: usize,
    active: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart, on a finger-count change) tracking with the
    /// given contact set. Keeps `peak_contacts` so a two-finger episode
    /// keeps blocking tap recognition until the interaction fully ends.
    pub fn begin(&mut self, points: &[TouchPoint], t_ms: u64) {
        let points = trim(points);
        self.points = points.to_vec();
        self.start_ms = t_ms;
        self.dragging = false;
        self.start_pos = match points {
            [p] => Some(*p),
            _ => None,
        };
        self.last_pinch_dist = match points {
            [a, b] => Some(a.distance(b)),
            _ => None,
        };
        self.peak_contacts = self.peak_contacts.max(points.len());
        self.active = true;
    }

    /// Replace the active contact set with a fresh sample and hand back
    /// the previous one for delta computation. Caller guarantees the
    /// contact count is unchanged.
    pub fn update(&mut self, points: &[TouchPoint]) -> Vec<TouchPoint> {
        let points = trim(points);
        self.peak_contacts = self.peak_contacts.max(points.len());
        std::mem::replace(&mut self.points, points.to_vec())
    }

    /// Note a lift. Returns true when the interaction is fully over (no
    /// contacts remain); the caller then evaluates tap recognition against
    /// the session state and calls `reset`. With contacts remaining the
    /// caller re-begins with them instead.
    pub fn end(&mut self, remaining: &[TouchPoint]) -> bool {
        if remaining.is_empty() {
            self.last_pinch_dist = None;
            true
        } else {
            false
        }
    }

    /// Clear everything, including `peak_contacts`. Only called once the
    /// last finger has lifted and release evaluation is done.
    pub fn reset(&mut self) {
        *self = Session::default();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn contact_count(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[TouchPoint] {
        &self.points
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn start_pos(&self) -> Option<TouchPoint> {
        self.start_pos
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn mark_dragging(&mut self) {
        self.dragging = true;
    }

    pub fn last_pinch_dist(&self) -> Option<f32> {
        self.last_pinch_dist
    }

    pub fn set_last_pinch_dist(&mut self, dist: f32) {
        self.last_pinch_dist = Some(dist);
    }

    pub fn peak_contacts(&self) -> usize {
        self.peak_contacts
    }
}

fn trim(points: &[TouchPoint]) -> &[TouchPoint] {
    &points[..points.len().min(MAX_CONTACTS)]
}
