//! Configuration for the orrery viewer.
//!
//! Settings persist to disk as a RON file, accept CLI overrides via clap and
//! are checked for internal consistency before the scene is built.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AnimationConfig, CameraConfig, Config, DebugConfig, RenderConfig, SceneConfig, WindowConfig,
};
pub use error::ConfigError;
