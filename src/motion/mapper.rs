// Differential-drive mapping for the chair base
// Converts joystick coordinates or a named direction into left/right duty cycles.

use super::direction::{Direction, Rotation, Steering};
use crate::config::{AXIS_LIMIT, DEADZONE, MIN_SPEED, PIVOT_RATIO};

/// A fully computed motion: what the wheels should do and how it looks from outside
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub left_speed: f32,  // duty cycle percent, sign carried by `rotation`
    pub right_speed: f32, // duty cycle percent
    pub rotation: Rotation,
    pub angle: f32,     // degrees in [0, 360), 0 = full right, 90 = full forward
    pub magnitude: f32, // [0, 100]
    pub steering: Steering,
}

impl Motion {
    pub fn stop() -> Self {
        Self {
            x: 0,
            y: 0,
            direction: Direction::Stop,
            left_speed: 0.0,
            right_speed: 0.0,
            rotation: Rotation::Forward,
            angle: 0.0,
            magnitude: 0.0,
            steering: Steering::Proportional,
        }
    }

    pub fn is_stop(&self) -> bool {
        self.direction.is_stop()
    }

    /// Re-run the mapper that produced this motion against a new base speed
    pub fn rescaled(&self, base_speed: u8) -> Motion {
        match self.steering {
            Steering::Proportional => compute_motion(self.x, self.y, base_speed),
            Steering::Pivot => compute_named(self.direction, base_speed),
        }
    }
}

impl Default for Motion {
    fn default() -> Self {
        Self::stop()
    }
}

fn in_deadzone(x: i32, y: i32) -> bool {
    x.abs() < DEADZONE && y.abs() < DEADZONE
}

/// Polar angle (degrees, [0, 360)) and clamped radial distance of (x, y)
fn polar(x: i32, y: i32) -> (f32, f32) {
    let (xf, yf) = (x as f32, y as f32);

    let mut angle = yf.atan2(xf).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }
    // -0.00001 + 360 rounds to 360 in f32
    if angle >= 360.0 {
        angle = 0.0;
    }

    let magnitude = xf.hypot(yf).min(100.0);
    (angle, magnitude)
}

/// Convert a joystick sample to wheel duty cycles (proportional steering)
///
/// # Arguments
/// * `x` - Lateral axis, -100 (full left) to 100 (full right)
/// * `y` - Longitudinal axis, -100 (full backward) to 100 (full forward)
/// * `base_speed` - Governed speed in percent, expected in [MIN_SPEED, MAX_SPEED]
///
/// Out-of-range axes are clamped. Samples inside the deadzone map to Stop.
pub fn compute_motion(x: i32, y: i32, base_speed: u8) -> Motion {
    let x = x.clamp(-AXIS_LIMIT, AXIS_LIMIT);
    let y = y.clamp(-AXIS_LIMIT, AXIS_LIMIT);

    if in_deadzone(x, y) {
        return Motion::stop();
    }

    let (angle, magnitude) = polar(x, y);

    // Motors stall below MIN_SPEED, so any deflection gets at least that much
    let mut motor_speed = base_speed as f32 * (magnitude / 100.0);
    if magnitude > 0.0 && motor_speed < MIN_SPEED as f32 {
        motor_speed = MIN_SPEED as f32;
    }

    // Slow the wheel on the inside of the turn in proportion to |x|
    let turn_factor = x.unsigned_abs() as f32 / 100.0;
    let (left_speed, right_speed) = match x.signum() {
        -1 => (motor_speed * (1.0 - turn_factor), motor_speed),
        1 => (motor_speed, motor_speed * (1.0 - turn_factor)),
        _ => (motor_speed, motor_speed),
    };

    Motion {
        x,
        y,
        direction: Direction::from_signs(x, y),
        left_speed,
        right_speed,
        rotation: Rotation::from_y(y),
        angle,
        magnitude,
        steering: Steering::Proportional,
    }
}

/// Convert a named direction to wheel duty cycles (fixed-ratio pivot)
///
/// Labels with a rightward component run the left wheel at PIVOT_RATIO of the
/// base speed, leftward labels slow the right wheel. Forward/backward run both
/// wheels at the base speed.
pub fn compute_named(direction: Direction, base_speed: u8) -> Motion {
    if direction.is_stop() {
        return Motion::stop();
    }

    let (x, y) = direction.coordinates();
    let (angle, magnitude) = polar(x, y);

    let speed = base_speed as f32;
    let pivot = speed * PIVOT_RATIO;
    let (left_speed, right_speed) = match x.signum() {
        1 => (pivot, speed),
        -1 => (speed, pivot),
        _ => (speed, speed),
    };

    Motion {
        x,
        y,
        direction,
        left_speed,
        right_speed,
        rotation: Rotation::from_y(y),
        angle,
        magnitude,
        steering: Steering::Pivot,
    }
}
