// Command dispatcher: decoded commands -> motion context -> wheels + state patches
//
// Actuation always happens before a patch is handed back for publishing, so a
// failed publish can never undo or delay a motion decision.

use std::time::Instant;

use serde_json::Value;
use tracing::{info, warn};

use crate::messages::{ChairStatus, Command, CommandError, MovementSnapshot, StatePatch};
use crate::motion::{Direction, Motion, MotionContext, MovementState};
use crate::motor::{ActuationError, ActuationSink, MotorDriver};

pub struct Dispatcher<S: ActuationSink> {
    motion: MotionContext,
    driver: MotorDriver<S>,
    status: ChairStatus,
}

impl<S: ActuationSink> Dispatcher<S> {
    pub fn new(sink: S, now: Instant) -> Self {
        Self::with_context(sink, MotionContext::new(now))
    }

    pub fn with_context(sink: S, motion: MotionContext) -> Self {
        Self {
            motion,
            driver: MotorDriver::new(sink),
            status: ChairStatus::Online,
        }
    }

    pub fn state(&self) -> &MovementState {
        self.motion.state()
    }

    pub fn speed(&self) -> u8 {
        self.motion.speed()
    }

    pub fn status(&self) -> ChairStatus {
        self.status
    }

    pub fn driver(&self) -> &MotorDriver<S> {
        &self.driver
    }

    /// Full state, published once at startup
    pub fn initial_patch(&self) -> StatePatch {
        StatePatch {
            status: Some(self.status),
            current_speed: Some(self.motion.speed()),
            movement_state: Some(self.motion.state().snapshot()),
        }
    }

    /// Handle one raw command
    ///
    /// Invalid commands are logged and dropped, except an unknown direction
    /// label which forces a stop. Only actuation failures are returned as errors.
    pub fn handle(
        &mut self,
        name: &str,
        value: Option<&Value>,
        now: Instant,
    ) -> Result<Option<StatePatch>, ActuationError> {
        match Command::parse(name, value) {
            Ok(command) => self.execute(command, now),
            Err(CommandError::UnknownDirection(label)) => {
                warn!("Unknown direction: {}, stopping", label);
                self.force_stop(now).map(Some)
            }
            Err(e) => {
                warn!("Dropping command: {}", e);
                Ok(None)
            }
        }
    }

    pub fn execute(
        &mut self,
        command: Command,
        now: Instant,
    ) -> Result<Option<StatePatch>, ActuationError> {
        match command {
            Command::Forward => self.steer(Direction::Forward, now),
            Command::Backward => self.steer(Direction::Backward, now),
            Command::Left => self.steer(Direction::Left, now),
            Command::Right => self.steer(Direction::Right, now),
            Command::Direction(Direction::Stop) | Command::Stop => self.force_stop(now).map(Some),
            Command::Direction(direction) => self.steer(direction, now),
            Command::Joystick { x, y } => {
                let accepted = self.motion.joystick(x, y, now);
                self.apply(accepted)
            }
            Command::Speed(request) => {
                let update = self.motion.set_speed(request, now);
                let Some(speed) = update.speed else {
                    return Ok(None);
                };
                let mut patch = match update.motion {
                    Some(motion) => self.actuate(&motion)?,
                    None => StatePatch::default(),
                };
                patch.current_speed = Some(speed);
                Ok(Some(patch))
            }
            Command::Start => {
                let patch = self.force_stop(now)?;
                info!("Chair initialized and ready to move");
                Ok(Some(patch))
            }
        }
    }

    /// Forced stop for process teardown
    pub fn shutdown(&mut self, now: Instant) -> Result<StatePatch, ActuationError> {
        info!("Shutting down, forcing stop");
        self.force_stop(now)
    }

    fn steer(&mut self, direction: Direction, now: Instant) -> Result<Option<StatePatch>, ActuationError> {
        let accepted = self.motion.named(direction, now);
        self.apply(accepted)
    }

    fn apply(&mut self, accepted: Option<Motion>) -> Result<Option<StatePatch>, ActuationError> {
        match accepted {
            Some(motion) => self.actuate(&motion).map(Some),
            None => Ok(None),
        }
    }

    fn force_stop(&mut self, now: Instant) -> Result<StatePatch, ActuationError> {
        let stop = self.motion.halt(now);
        self.driver.stop()?;
        Ok(self.patch_for(&stop))
    }

    fn actuate(&mut self, motion: &Motion) -> Result<StatePatch, ActuationError> {
        self.driver.drive(motion)?;
        if motion.is_stop() {
            info!("Motors stopped");
        } else {
            info!(
                "Moving {} (x={}, y={}): L:{:.1}, R:{:.1}",
                motion.direction, motion.x, motion.y, motion.left_speed, motion.right_speed
            );
        }
        Ok(self.patch_for(motion))
    }

    fn patch_for(&mut self, motion: &Motion) -> StatePatch {
        let status = if motion.is_stop() {
            ChairStatus::Ready
        } else {
            ChairStatus::Moving
        };
        let changed = status != self.status;
        self.status = status;

        StatePatch {
            status: changed.then_some(status),
            current_speed: None,
            movement_state: Some(MovementSnapshot::from(motion)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MIN_SPEED, MIN_UPDATE_INTERVAL};
    use crate::motion::{Rotation, Steering};
    use crate::motor::{RecordingSink, Wheel};
    use serde_json::json;

    fn dispatcher() -> (Dispatcher<RecordingSink>, Instant) {
        let now = Instant::now();
        (Dispatcher::new(RecordingSink::default(), now), now)
    }

    fn frames(d: &Dispatcher<RecordingSink>) -> usize {
        d.driver().sink().frames.len()
    }

    #[test]
    fn test_initial_patch_is_full_stop_state() {
        let (d, _) = dispatcher();
        let patch = d.initial_patch();
        assert_eq!(patch.status, Some(ChairStatus::Online));
        assert_eq!(patch.current_speed, Some(50));
        assert_eq!(patch.movement_state.unwrap().direction, Direction::Stop);
    }

    #[test]
    fn test_joystick_drives_and_reports() {
        let (mut d, t0) = dispatcher();
        let patch = d
            .handle("joystick", Some(&json!({"x": 0, "y": 100})), t0)
            .unwrap()
            .expect("first motion is accepted");

        assert_eq!(patch.status, Some(ChairStatus::Moving));
        let snap = patch.movement_state.unwrap();
        assert_eq!(snap.direction, Direction::Forward);
        assert_eq!((snap.left_speed, snap.right_speed), (50.0, 50.0));
        assert_eq!(frames(&d), 2);
    }

    #[test]
    fn test_repeated_joystick_is_debounced() {
        let (mut d, t0) = dispatcher();
        let v = json!({"x": 30, "y": 70});
        assert!(d.handle("joystick", Some(&v), t0).unwrap().is_some());
        assert!(d.handle("joystick", Some(&v), t0).unwrap().is_none());
        assert_eq!(frames(&d), 2, "rejected sample must not actuate");
    }

    #[test]
    fn test_stop_bypasses_debounce() {
        let (mut d, t0) = dispatcher();
        d.handle("forward", None, t0).unwrap();
        let patch = d.handle("stop", None, t0).unwrap().unwrap();
        assert_eq!(patch.status, Some(ChairStatus::Ready));
        assert!(d.state().is_stopped());

        let last = d.driver().sink().frames.iter().rev().take(2).all(|f| f.duty == 0.0);
        assert!(last);
    }

    #[test]
    fn test_stop_while_stopped_still_writes_zero() {
        let (mut d, t0) = dispatcher();
        d.handle("stop", None, t0).unwrap();
        d.handle("stop", None, t0).unwrap();
        assert_eq!(frames(&d), 4);
    }

    #[test]
    fn test_unknown_command_is_dropped() {
        let (mut d, t0) = dispatcher();
        d.handle("forward", None, t0).unwrap();
        let before = *d.state();
        assert_eq!(d.handle("teleport", None, t0).unwrap(), None);
        assert_eq!(d.state().motion, before.motion);
    }

    #[test]
    fn test_malformed_joystick_preserves_state() {
        let (mut d, t0) = dispatcher();
        d.handle("left", None, t0).unwrap();
        let before = *d.state();
        assert_eq!(d.handle("joystick", Some(&json!({"x": 5})), t0).unwrap(), None);
        assert_eq!(d.state().motion, before.motion);
    }

    #[test]
    fn test_unknown_direction_forces_stop() {
        let (mut d, t0) = dispatcher();
        d.handle("forward", None, t0).unwrap();
        let patch = d.handle("direction", Some(&json!("diagonal")), t0).unwrap();
        assert!(patch.is_some());
        assert!(d.state().is_stopped());
    }

    #[test]
    fn test_named_direction_pivot() {
        let (mut d, t0) = dispatcher();
        let patch = d
            .handle("direction", Some(&json!("forward-right")), t0)
            .unwrap()
            .unwrap();
        let snap = patch.movement_state.unwrap();
        assert!((snap.left_speed - 15.0).abs() < 1e-3);
        assert!((snap.right_speed - 50.0).abs() < 1e-3);
        assert_eq!((snap.x, snap.y), (70, 70));
    }

    #[test]
    fn test_direction_stop_label_stops() {
        let (mut d, t0) = dispatcher();
        d.handle("backward", None, t0).unwrap();
        d.handle("direction", Some(&json!("stop")), t0).unwrap();
        assert!(d.state().is_stopped());
    }

    #[test]
    fn test_speed_change_redrives_current_motion() {
        let (mut d, t0) = dispatcher();
        d.handle("joystick", Some(&json!({"x": 0, "y": -100})), t0).unwrap();
        let patch = d.handle("speed", Some(&json!(90)), t0).unwrap().unwrap();

        assert_eq!(patch.current_speed, Some(90));
        let snap = patch.movement_state.unwrap();
        assert!((snap.left_speed - 90.0).abs() < 1e-3);

        let last = d.driver().sink().frames.last().copied().unwrap();
        assert_eq!(last.wheel, Wheel::Right);
        assert_eq!(last.rotation, Rotation::Reverse);
        assert!((last.duty - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_speed_clamp_and_hysteresis() {
        let (mut d, t0) = dispatcher();
        let patch = d.handle("speed", Some(&json!(15)), t0).unwrap().unwrap();
        assert_eq!(patch.current_speed, Some(MIN_SPEED));
        assert!(patch.movement_state.is_none(), "stopped chair is not re-driven");
        assert_eq!(d.handle("speed", Some(&json!(15)), t0).unwrap(), None);
        assert_eq!(d.speed(), MIN_SPEED);
    }

    #[test]
    fn test_invalid_speed_is_ignored() {
        let (mut d, t0) = dispatcher();
        assert_eq!(d.handle("speed", Some(&json!("turbo")), t0).unwrap(), None);
        assert_eq!(d.speed(), 50);
    }

    #[test]
    fn test_legacy_speed_aliases() {
        let (mut d, t0) = dispatcher();
        d.handle("full_speed", None, t0).unwrap();
        assert_eq!(d.speed(), 100);
        d.handle("low_speed", None, t0).unwrap();
        assert_eq!(d.speed(), MIN_SPEED);
    }

    #[test]
    fn test_start_resets_to_ready_stop() {
        let (mut d, t0) = dispatcher();
        d.handle("right", None, t0).unwrap();
        let patch = d.handle("start", None, t0 + MIN_UPDATE_INTERVAL).unwrap().unwrap();
        assert_eq!(patch.status, Some(ChairStatus::Ready));
        assert!(d.state().is_stopped());
        assert_eq!(d.status(), ChairStatus::Ready);
    }

    #[test]
    fn test_status_only_reported_on_change() {
        let (mut d, t0) = dispatcher();
        let first = d.handle("forward", None, t0).unwrap().unwrap();
        assert_eq!(first.status, Some(ChairStatus::Moving));
        let second = d
            .handle("direction", Some(&json!("forward-left")), t0 + MIN_UPDATE_INTERVAL)
            .unwrap()
            .unwrap();
        assert_eq!(second.status, None);
    }

    #[test]
    fn test_named_direction_after_matching_joystick_pivots() {
        let (mut d, t0) = dispatcher();
        d.handle("joystick", Some(&json!({"x": 70, "y": 70})), t0).unwrap();
        let later = t0 + std::time::Duration::from_millis(400);
        let patch = d
            .handle("direction", Some(&json!("forward-right")), later)
            .unwrap()
            .expect("named direction replaces proportional steering");

        let snap = patch.movement_state.unwrap();
        assert!((snap.left_speed - 15.0).abs() < 1e-3, "left={}", snap.left_speed);
        assert!((snap.right_speed - 50.0).abs() < 1e-3, "right={}", snap.right_speed);
        assert_eq!(d.state().motion.steering, Steering::Pivot);
    }

    #[test]
    fn test_right_shortcut_after_full_right_joystick_pivots() {
        let (mut d, t0) = dispatcher();
        d.handle("joystick", Some(&json!({"x": 100, "y": 0})), t0).unwrap();
        let later = t0 + std::time::Duration::from_millis(200);
        assert!(d.handle("right", None, later).unwrap().is_some());
        let m = d.state().motion;
        assert!((m.left_speed - 15.0).abs() < 1e-3);
        assert!((m.right_speed - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_deadzone_sample_stops_like_a_stop() {
        let (mut d, t0) = dispatcher();
        d.handle("joystick", Some(&json!({"x": 0, "y": 80})), t0).unwrap();
        let patch = d
            .handle("joystick", Some(&json!({"x": 2, "y": -3})), t0)
            .unwrap()
            .expect("stop is never debounced");

        assert_eq!(patch.status, Some(ChairStatus::Ready));
        assert_eq!(patch.movement_state.unwrap().direction, Direction::Stop);
        assert!(d.state().is_stopped());
        let frames = &d.driver().sink().frames;
        assert_eq!(frames.len(), 4);
        assert!(frames[2..].iter().all(|f| f.duty == 0.0));
    }

    #[test]
    fn test_shutdown_forces_stop() {
        let (mut d, t0) = dispatcher();
        d.handle("forward", None, t0).unwrap();
        let patch = d.shutdown(t0).unwrap();

        assert!(d.state().is_stopped());
        assert_eq!(patch.status, Some(ChairStatus::Ready));
        assert_eq!(patch.movement_state.unwrap().direction, Direction::Stop);
        let frames = &d.driver().sink().frames;
        assert!(frames.iter().rev().take(2).all(|f| f.duty == 0.0));
        assert_eq!(frames.len(), 4);
    }

    #[tokio::test]
    async fn test_shutdown_releases_bridge() {
        let (bridge, mut rx) = crate::motor::bridge();
        let t0 = Instant::now();
        let mut d = Dispatcher::new(bridge, t0);
        d.handle("forward", None, t0).unwrap();
        d.shutdown(t0).unwrap();
        drop(d);

        let mut frames = Vec::new();
        while let Some(frame) = rx.recv().await {
            frames.push(frame);
        }
        // drive, forced stop, stop on drop
        assert_eq!(frames.len(), 6);
        assert!(frames[2..].iter().all(|f| f.duty == 0.0));
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_actuation_loss_is_fatal() {
        let (mut d, t0) = dispatcher();
        d.driver.sink_mut().closed = true;
        assert!(d.handle("forward", None, t0).is_err());
    }
}
