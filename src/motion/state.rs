use std::time::Instant;

use super::mapper::Motion;
use crate::messages::MovementSnapshot;

/// The single authoritative record of what the chair is currently doing
#[derive(Debug, Clone, Copy)]
pub struct MovementState {
    pub motion: Motion,
    pub updated_at: Instant,
}

impl MovementState {
    pub fn stopped(now: Instant) -> Self {
        Self {
            motion: Motion::stop(),
            updated_at: now,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.motion.is_stop()
    }

    pub fn snapshot(&self) -> MovementSnapshot {
        MovementSnapshot::from(&self.motion)
    }
}
