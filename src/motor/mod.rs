// Motor actuation for the two-wheel chair base
//
// Provides:
// - The actuation sink contract (per-wheel duty cycle + rotation sense)
// - A channel bridge that forwards wheel frames to the hardware process
// - High-level motor driver API

mod driver;

pub use driver::{
    bridge, ActuationError, ActuationSink, MotorDriver, Wheel, WheelBridge, WheelFrame,
};

#[cfg(test)]
pub(crate) use driver::RecordingSink;
