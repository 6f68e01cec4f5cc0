//! The orrery viewer: window, event loop and per-frame orchestration.

pub mod controls;
pub mod fly_camera;
pub mod frame_clock;
pub mod platform;
pub mod setup;
pub mod sim;
pub mod window;

pub use controls::{ControlAction, Controls, RawKeyEvent};
pub use fly_camera::FlyCamera;
pub use frame_clock::FrameClock;
pub use platform::{PlatformDirs, PlatformError};
pub use setup::{Scene, SceneAssets, SetupError};
pub use sim::{OrrerySim, SimSettings};
pub use window::{AppState, run};
