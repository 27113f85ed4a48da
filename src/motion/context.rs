// Owned motion context: governor + movement state + debounce filter
// Every change to the movement state goes through `propose`.

use std::time::Instant;

use tracing::{debug, info};

use super::debounce::DebounceFilter;
use super::direction::Direction;
use super::governor::{SpeedGovernor, SpeedRequest};
use super::mapper::{compute_motion, compute_named, Motion};
use super::state::MovementState;

/// How a candidate reaches the movement state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// Subject to the debounce filter
    Sampled,
    /// Bypasses the filter (stop, start, speed re-application, shutdown)
    Forced,
}

/// Result of a speed request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedUpdate {
    /// New governed speed, None if the request was within the hysteresis band
    pub speed: Option<u8>,
    /// In-flight motion re-computed at the new speed
    pub motion: Option<Motion>,
}

#[derive(Debug)]
pub struct MotionContext {
    governor: SpeedGovernor,
    state: MovementState,
    filter: DebounceFilter,
}

impl MotionContext {
    pub fn new(now: Instant) -> Self {
        Self::with_filter(SpeedGovernor::default(), DebounceFilter::default(), now)
    }

    pub fn with_filter(governor: SpeedGovernor, filter: DebounceFilter, now: Instant) -> Self {
        Self {
            governor,
            state: MovementState::stopped(now),
            filter,
        }
    }

    pub fn state(&self) -> &MovementState {
        &self.state
    }

    pub fn speed(&self) -> u8 {
        self.governor.current()
    }

    /// Continuous joystick sample. Returns the motion if it was accepted.
    pub fn joystick(&mut self, x: i32, y: i32, now: Instant) -> Option<Motion> {
        let candidate = compute_motion(x, y, self.governor.current());
        self.propose(candidate, Transition::Sampled, now)
    }

    /// Named direction. Returns the motion if it was accepted.
    pub fn named(&mut self, direction: Direction, now: Instant) -> Option<Motion> {
        let candidate = compute_named(direction, self.governor.current());
        self.propose(candidate, Transition::Sampled, now)
    }

    /// Unconditional stop, regardless of debounce state
    pub fn halt(&mut self, now: Instant) -> Motion {
        let stop = Motion::stop();
        self.propose(stop, Transition::Forced, now);
        stop
    }

    /// Change the governed speed and re-run the current motion against it
    pub fn set_speed(&mut self, request: SpeedRequest, now: Instant) -> SpeedUpdate {
        let Some(speed) = self.governor.request(request) else {
            debug!("Speed request {:?} within hysteresis, ignored", request);
            return SpeedUpdate {
                speed: None,
                motion: None,
            };
        };
        info!("Speed set to {}%", speed);

        let motion = if self.state.is_stopped() {
            None
        } else {
            let rescaled = self.state.motion.rescaled(speed);
            self.propose(rescaled, Transition::Forced, now)
        };

        SpeedUpdate {
            speed: Some(speed),
            motion,
        }
    }

    fn propose(&mut self, candidate: Motion, transition: Transition, now: Instant) -> Option<Motion> {
        if transition == Transition::Sampled {
            let verdict = self.filter.evaluate(&self.state, &candidate, now);
            if !verdict.accepted() {
                debug!(
                    "Debounced {} (x={}, y={}): {:?}",
                    candidate.direction, candidate.x, candidate.y, verdict
                );
                return None;
            }
        }

        self.state = MovementState {
            motion: candidate,
            updated_at: now,
        };
        Some(candidate)
    }
}
