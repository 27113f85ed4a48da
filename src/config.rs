// Speed limits, debounce thresholds, topics, identity storage
use std::time::Duration;

// Governed base speed (duty cycle percent)
pub const MIN_SPEED: u8 = 20;
pub const MAX_SPEED: u8 = 100;
pub const DEFAULT_SPEED: u8 = 50;

// Speed requests closer than this to the current speed are ignored
pub const SPEED_CHANGE_THRESHOLD: u8 = 5;

// Joystick axes are clamped to [-AXIS_LIMIT, AXIS_LIMIT]
pub const AXIS_LIMIT: i32 = 100;

// |x| and |y| both below this count as "no input"
pub const DEADZONE: i32 = 5;

// Coordinate used for both axes of the diagonal named directions
pub const DIAGONAL_COORD: i32 = 70;

// Turning-side wheel speed relative to the straight side for named directions
pub const PIVOT_RATIO: f32 = 0.3;

// Debounce filter
pub const ANGLE_THRESHOLD_DEG: f32 = 10.0;
pub const MAGNITUDE_THRESHOLD: f32 = 5.0;
pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_millis(50);

// Local identity record
pub const IDENTITY_PATH: &str = "chair_info.json";
pub const CHAIR_CODE_LEN: usize = 8;

// Zenoh topics, all rooted under the chair id
pub const TOPIC_ROOT: &str = "chair";

pub fn topic_commands(chair_id: &str) -> String {
    format!("{TOPIC_ROOT}/{chair_id}/commands") // inbound command envelopes
}

pub fn topic_state(chair_id: &str) -> String {
    format!("{TOPIC_ROOT}/{chair_id}/state") // state patches for remote observers
}

pub fn topic_wheels(chair_id: &str) -> String {
    format!("{TOPIC_ROOT}/{chair_id}/rt/wheels") // duty cycles for the hardware process
}
