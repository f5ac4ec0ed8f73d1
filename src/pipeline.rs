//! Replay driver: runs a captured trace through the classifier.

use log::{debug, info};
use serde::Serialize;

use crate::classifier::{Classifier, ControlState};
use crate::config::Profile;
use crate::trace::Trace;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayOutcome {
    pub samples: usize,
    pub taps: Vec<u64>,
    pub pointer: Option<(f32, f32)>,
    pub state: ControlState,
}

/// Feed every sample through the classifier in order, applying updates to
/// a fresh `ControlState` the way the live sink would.
pub fn run_trace(trace: &Trace, profile: Profile) -> ReplayOutcome {
    let mut classifier = Classifier::new(profile);
    let mut state = ControlState::default();
    let mut taps = Vec::new();
    let mut pointer = None;
    let mut mode = trace.mode;

    for ts in &trace.samples {
        if let Some(m) = ts.mode {
            mode = m;
        }
        let update = classifier.classify(&ts.sample, mode, trace.viewport, &state);

        let t = ts.sample.t_ms;
        if let Some(r) = update.rotation {
            debug!("t={t}ms rotation -> {r:.3}");
        }
        if let Some((px, py)) = update.pan {
            debug!("t={t}ms pan -> ({px:.3}, {py:.3})");
        }
        if let Some(z) = update.zoom {
            debug!("t={t}ms zoom -> {z:.3}");
        }
        if let Some(p) = update.pointer {
            pointer = Some(p);
        }
        if let Some(at) = update.tap_at_ms {
            info!("tap at {at}ms");
            taps.push(at);
        }
        state.apply(&update);
    }

    info!(
        "replayed {} samples: {} tap(s), rotation {:.3}, pan ({:.3}, {:.3}), zoom {:.3}",
        trace.samples.len(),
        taps.len(),
        state.rotation,
        state.pan.0,
        state.pan.1,
        state.zoom,
    );

    ReplayOutcome {
        samples: trace.samples.len(),
        taps,
        pointer,
        state,
    }
}
