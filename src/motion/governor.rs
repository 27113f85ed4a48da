// Base speed selection with clamping and hysteresis

use crate::config::{DEFAULT_SPEED, MAX_SPEED, MIN_SPEED, SPEED_CHANGE_THRESHOLD};

/// A requested base speed, either numeric or one of the legacy presets
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedRequest {
    Percent(f64),
    Full, // "full_speed"
    Low,  // "low_speed"
}

impl SpeedRequest {
    /// Target speed, clamped into [MIN_SPEED, MAX_SPEED]
    pub fn target(self) -> u8 {
        match self {
            SpeedRequest::Full => MAX_SPEED,
            SpeedRequest::Low => MIN_SPEED,
            SpeedRequest::Percent(p) if p.is_nan() => MIN_SPEED,
            SpeedRequest::Percent(p) => p.clamp(MIN_SPEED as f64, MAX_SPEED as f64) as u8,
        }
    }
}

/// Holds the user-selected base speed every motion scales against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedGovernor {
    current: u8,
}

impl SpeedGovernor {
    pub fn new(speed: u8) -> Self {
        Self {
            current: speed.clamp(MIN_SPEED, MAX_SPEED),
        }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    /// Apply a speed request
    ///
    /// Returns the new speed if it moved by at least SPEED_CHANGE_THRESHOLD,
    /// otherwise leaves the governor untouched and returns None.
    pub fn request(&mut self, request: SpeedRequest) -> Option<u8> {
        let target = request.target();
        if self.current.abs_diff(target) < SPEED_CHANGE_THRESHOLD {
            return None;
        }
        self.current = target;
        Some(target)
    }
}

impl Default for SpeedGovernor {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED)
    }
}
