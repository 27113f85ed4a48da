// Define message types for the runtime

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::motion::{Direction, Motion, SpeedRequest};

// Command from the remote app -> runtime
// `value` shape depends on the command: number, string, or {x, y}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub command: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub timestamp: f64,
}

impl CommandEnvelope {
    pub fn new(command: impl Into<String>, value: Option<Value>, timestamp: f64) -> Self {
        Self {
            command: command.into(),
            value,
            timestamp,
        }
    }
}

/// Errors from decoding a command. All of them drop the command and are only reported.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("Malformed command envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command '{0}' requires a value")]
    MissingValue(&'static str),

    #[error("Invalid joystick value {0}, expected {{x: number, y: number}}")]
    MalformedJoystick(String),

    #[error("Invalid direction value {0}, expected a direction label string")]
    MalformedDirection(String),

    #[error("Unknown direction: {0}")]
    UnknownDirection(String),

    #[error("Invalid speed value: {0}")]
    InvalidSpeed(String),
}

/// Decoded command, one variant per command name
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    Joystick { x: i32, y: i32 },
    Speed(SpeedRequest),
    Direction(Direction),
    Start,
    Stop,
}

#[derive(Deserialize)]
struct JoystickValue {
    x: f64,
    y: f64,
}

impl Command {
    /// Decode a command name and its optional value
    pub fn parse(name: &str, value: Option<&Value>) -> Result<Command, CommandError> {
        let value = value.filter(|v| !v.is_null());
        match name {
            "forward" => Ok(Command::Forward),
            "backward" => Ok(Command::Backward),
            "left" => Ok(Command::Left),
            "right" => Ok(Command::Right),
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            "full_speed" => Ok(Command::Speed(SpeedRequest::Full)),
            "low_speed" => Ok(Command::Speed(SpeedRequest::Low)),
            "speed" => {
                let value = value.ok_or(CommandError::MissingValue("speed"))?;
                parse_speed(value).map(Command::Speed)
            }
            "joystick" => {
                let value = value.ok_or(CommandError::MissingValue("joystick"))?;
                let stick = JoystickValue::deserialize(value)
                    .map_err(|_| CommandError::MalformedJoystick(value.to_string()))?;
                if !stick.x.is_finite() || !stick.y.is_finite() {
                    return Err(CommandError::MalformedJoystick(value.to_string()));
                }
                // Range is clamped by the mapper, `as` saturates huge floats
                Ok(Command::Joystick {
                    x: stick.x.round() as i32,
                    y: stick.y.round() as i32,
                })
            }
            "direction" => {
                let value = value.ok_or(CommandError::MissingValue("direction"))?;
                let label = value
                    .as_str()
                    .ok_or_else(|| CommandError::MalformedDirection(value.to_string()))?;
                label
                    .parse::<Direction>()
                    .map(Command::Direction)
                    .map_err(CommandError::UnknownDirection)
            }
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_speed(value: &Value) -> Result<SpeedRequest, CommandError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(SpeedRequest::Percent)
            .ok_or_else(|| CommandError::InvalidSpeed(n.to_string())),
        Value::String(s) if s == "full_speed" => Ok(SpeedRequest::Full),
        Value::String(s) if s == "low_speed" => Ok(SpeedRequest::Low),
        other => Err(CommandError::InvalidSpeed(other.to_string())),
    }
}

/// Coarse chair status shown to remote observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChairStatus {
    Online,
    Ready,
    Moving,
}

/// Movement state as published to observers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementSnapshot {
    pub direction: Direction,
    pub x: i32,
    pub y: i32,
    pub left_speed: f32,
    pub right_speed: f32,
    pub angle: f32,
    pub magnitude: f32,
}

impl From<&Motion> for MovementSnapshot {
    fn from(m: &Motion) -> Self {
        Self {
            direction: m.direction,
            x: m.x,
            y: m.y,
            left_speed: m.left_speed,
            right_speed: m.right_speed,
            angle: m.angle,
            magnitude: m.magnitude,
        }
    }
}

// Partial update for the remote state store, only the keys that changed are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ChairStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_speed: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement_state: Option<MovementSnapshot>,
}

impl StatePatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.current_speed.is_none() && self.movement_state.is_none()
    }
}
