// Motion core for the differential-drive chair
//
// Provides:
// - Direction labels and rotation sense
// - Motion mapping (joystick or named direction -> per-wheel duty cycles)
// - Speed governor with hysteresis
// - Debounce filter guarding the single movement state

mod context;
pub mod debounce;
pub mod direction;
pub mod governor;
pub mod mapper;
mod state;

pub use context::{MotionContext, SpeedUpdate};
pub use debounce::{DebounceFilter, Verdict};
pub use direction::{Direction, Rotation, Steering};
pub use governor::{SpeedGovernor, SpeedRequest};
pub use mapper::{compute_motion, compute_named, Motion};
pub use state::MovementState;
