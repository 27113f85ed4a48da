// Closed set of direction labels and the sign conventions shared by both mappers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{AXIS_LIMIT, DIAGONAL_COORD};

/// Canonical movement label, serialized in kebab-case ("forward-left")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Stop,
    Forward,
    Backward,
    Left,
    Right,
    ForwardLeft,
    ForwardRight,
    BackwardLeft,
    BackwardRight,
}

impl Direction {
    pub const ALL: [Direction; 9] = [
        Direction::Stop,
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
        Direction::ForwardLeft,
        Direction::ForwardRight,
        Direction::BackwardLeft,
        Direction::BackwardRight,
    ];

    /// Label for a joystick sign pattern. (0, 0) is Stop.
    pub fn from_signs(x: i32, y: i32) -> Self {
        match (x.signum(), y.signum()) {
            (0, 0) => Direction::Stop,
            (0, 1) => Direction::Forward,
            (0, _) => Direction::Backward,
            (-1, 0) => Direction::Left,
            (_, 0) => Direction::Right,
            (-1, 1) => Direction::ForwardLeft,
            (-1, _) => Direction::BackwardLeft,
            (_, 1) => Direction::ForwardRight,
            (_, _) => Direction::BackwardRight,
        }
    }

    /// Representative joystick coordinates for this label
    pub fn coordinates(self) -> (i32, i32) {
        let d = DIAGONAL_COORD;
        match self {
            Direction::Stop => (0, 0),
            Direction::Forward => (0, AXIS_LIMIT),
            Direction::Backward => (0, -AXIS_LIMIT),
            Direction::Left => (-AXIS_LIMIT, 0),
            Direction::Right => (AXIS_LIMIT, 0),
            Direction::ForwardLeft => (-d, d),
            Direction::ForwardRight => (d, d),
            Direction::BackwardLeft => (-d, -d),
            Direction::BackwardRight => (d, -d),
        }
    }

    pub fn is_stop(self) -> bool {
        self == Direction::Stop
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Stop => "stop",
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::ForwardLeft => "forward-left",
            Direction::ForwardRight => "forward-right",
            Direction::BackwardLeft => "backward-left",
            Direction::BackwardRight => "backward-right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Rotation sense applied to both wheels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    #[default]
    Forward,
    Reverse,
}

impl Rotation {
    /// y >= 0 rolls forward, y < 0 rolls in reverse
    pub fn from_y(y: i32) -> Self {
        if y < 0 {
            Rotation::Reverse
        } else {
            Rotation::Forward
        }
    }
}

/// Which mapper produced a motion, so a speed change can re-run the same one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Steering {
    /// Continuous joystick input, differential scales with |x|
    #[default]
    Proportional,
    /// Named direction, fixed-ratio turn
    Pivot,
}
