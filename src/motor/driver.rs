// High-level motor driver for the chair base
//
// Turns accepted motions into one duty-cycle write per wheel. The PWM/GPIO
// layer lives in a separate hardware process fed by `WheelBridge`.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::motion::{Motion, Rotation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wheel {
    Left,
    Right,
}

/// One duty-cycle write, as sent to the hardware process
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelFrame {
    pub wheel: Wheel,
    pub rotation: Rotation,
    pub duty: f32, // percent, 0..=100
}

/// Error types for actuation. Any of these is fatal for the runtime.
#[derive(Debug, thiserror::Error)]
pub enum ActuationError {
    #[error("Actuation channel closed")]
    ChannelClosed,
}

/// Accepts duty-cycle writes. Calls must not block and must tolerate repeats.
pub trait ActuationSink {
    fn set_wheel_duty_cycle(
        &mut self,
        wheel: Wheel,
        rotation: Rotation,
        percent: f32,
    ) -> Result<(), ActuationError>;
}

/// Non-blocking sink that queues frames for a forwarding task
#[derive(Debug, Clone)]
pub struct WheelBridge {
    tx: mpsc::UnboundedSender<WheelFrame>,
}

/// Create a bridge and the receiving end the forwarding task drains
pub fn bridge() -> (WheelBridge, mpsc::UnboundedReceiver<WheelFrame>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (WheelBridge { tx }, rx)
}

impl ActuationSink for WheelBridge {
    fn set_wheel_duty_cycle(
        &mut self,
        wheel: Wheel,
        rotation: Rotation,
        percent: f32,
    ) -> Result<(), ActuationError> {
        self.tx
            .send(WheelFrame {
                wheel,
                rotation,
                duty: percent,
            })
            .map_err(|_| ActuationError::ChannelClosed)
    }
}

/// High-level motor driver for the left/right wheel pair
pub struct MotorDriver<S: ActuationSink> {
    sink: S,
}

impl<S: ActuationSink> MotorDriver<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Drive both wheels for an accepted motion
    pub fn drive(&mut self, motion: &Motion) -> Result<(), ActuationError> {
        debug!(
            "Setting duty cycles: left={:.1}, right={:.1}, rotation={:?}",
            motion.left_speed, motion.right_speed, motion.rotation
        );
        self.write(Wheel::Left, motion.rotation, motion.left_speed)?;
        self.write(Wheel::Right, motion.rotation, motion.right_speed)
    }

    /// Zero duty cycle on both wheels
    pub fn stop(&mut self) -> Result<(), ActuationError> {
        info!("Stopping both motors");
        self.write(Wheel::Left, Rotation::Forward, 0.0)?;
        self.write(Wheel::Right, Rotation::Forward, 0.0)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[cfg(test)]
    pub(crate) fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn write(&mut self, wheel: Wheel, rotation: Rotation, percent: f32) -> Result<(), ActuationError> {
        self.sink
            .set_wheel_duty_cycle(wheel, rotation, percent.clamp(0.0, 100.0))
    }
}

impl<S: ActuationSink> Drop for MotorDriver<S> {
    fn drop(&mut self) {
        // Leave the wheels at zero whenever the driver goes away
        if let Err(e) = self.stop() {
            warn!("Failed to stop motors on drop: {}", e);
        }
    }
}

/// Sink that records every write, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub frames: Vec<WheelFrame>,
    pub closed: bool,
}

#[cfg(test)]
impl ActuationSink for RecordingSink {
    fn set_wheel_duty_cycle(
        &mut self,
        wheel: Wheel,
        rotation: Rotation,
        percent: f32,
    ) -> Result<(), ActuationError> {
        if self.closed {
            return Err(ActuationError::ChannelClosed);
        }
        self.frames.push(WheelFrame {
            wheel,
            rotation,
            duty: percent,
        });
        Ok(())
    }
}
