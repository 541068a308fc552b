//! Frame driver: advances camera controls and runs the composer once per
//! display refresh until shutdown is requested.

mod frame_driver;
mod shutdown;

pub use frame_driver::{DriverState, FrameDriver, Stage, StepOutcome};
pub use shutdown::ShutdownToken;
