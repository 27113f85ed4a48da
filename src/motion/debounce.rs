// Hysteresis between the movement state and newly computed candidates
//
// Joystick hardware jitters by a few units per sample. Without this filter every
// sample would re-drive the wheels and re-publish an equivalent state.

use std::time::{Duration, Instant};

use super::mapper::Motion;
use super::state::MovementState;
use crate::config::{ANGLE_THRESHOLD_DEG, MAGNITUDE_THRESHOLD, MIN_UPDATE_INTERVAL};

/// Outcome of evaluating a candidate against the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Moving -> stopped, always taken immediately
    AcceptStop,
    /// Stopped -> moving
    AcceptStart,
    /// Switch between joystick steering and a named direction
    AcceptSteering,
    /// Angle or magnitude moved enough, and enough time passed
    AcceptChange,
    /// Already stopped, nothing to do
    RejectAlreadyStopped,
    /// Change below both thresholds
    RejectInsignificant,
    /// Significant change, but within MIN_UPDATE_INTERVAL of the last update
    RejectTooSoon,
}

impl Verdict {
    pub fn accepted(self) -> bool {
        matches!(
            self,
            Verdict::AcceptStop
                | Verdict::AcceptStart
                | Verdict::AcceptSteering
                | Verdict::AcceptChange
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebounceFilter {
    pub angle_threshold: f32,
    pub magnitude_threshold: f32,
    pub min_interval: Duration,
}

impl Default for DebounceFilter {
    fn default() -> Self {
        Self {
            angle_threshold: ANGLE_THRESHOLD_DEG,
            magnitude_threshold: MAGNITUDE_THRESHOLD,
            min_interval: MIN_UPDATE_INTERVAL,
        }
    }
}

impl DebounceFilter {
    pub fn evaluate(&self, previous: &MovementState, candidate: &Motion, now: Instant) -> Verdict {
        match (previous.is_stopped(), candidate.is_stop()) {
            (true, true) => return Verdict::RejectAlreadyStopped,
            (false, true) => return Verdict::AcceptStop,
            (true, false) => return Verdict::AcceptStart,
            (false, false) => {}
        }

        let prev = &previous.motion;
        // Same stick position can mean different wheel speeds under the other mapper
        if prev.steering != candidate.steering {
            return Verdict::AcceptSteering;
        }

        let angle_delta = angle_delta(prev.angle, candidate.angle);
        let magnitude_delta = (prev.magnitude - candidate.magnitude).abs();

        if angle_delta < self.angle_threshold && magnitude_delta < self.magnitude_threshold {
            return Verdict::RejectInsignificant;
        }
        if now.saturating_duration_since(previous.updated_at) < self.min_interval {
            return Verdict::RejectTooSoon;
        }
        Verdict::AcceptChange
    }
}

/// Smallest absolute difference between two angles in degrees, in [0, 180]
pub fn angle_delta(a: f32, b: f32) -> f32 {
    ((a - b + 180.0).rem_euclid(360.0) - 180.0).abs()
}
