//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Rendering and shadow settings.
    pub render: RenderConfig,
    /// Speed-driven animation constants.
    pub animation: AnimationConfig,
    /// Scene content and asset locations.
    pub scene: SceneConfig,
    /// Free-fly camera settings.
    pub camera: CameraConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Edge length in texels of every shadow cubemap face.
    pub shadow_resolution: u32,
    /// Number of depth cubemaps allocated at startup.
    pub max_shadow_casters: u32,
    /// Near plane of the shadow projections.
    pub shadow_near: f32,
    /// Depth bias applied to the normalised light distance when comparing.
    pub shadow_depth_bias: f32,
    /// Constant ambient term for the central body.
    pub ambient: f32,
    /// Glow intensity reached at full reflect strength.
    pub glow_max: f32,
}

/// Speed bands, smoothing rates and guards of the animation controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimationConfig {
    pub speed_floor: f32,
    pub speed_ceiling: f32,
    /// Change applied by one increase/decrease command.
    pub speed_step: f32,
    pub initial_speed: f32,
    /// Speed at which the target radius reaches the minimum radius.
    pub contraction_speed: f32,
    /// Absorption is entered at or above this speed.
    pub absorb_enter_speed: f32,
    /// Absorption is left at or below this speed. Must be below the enter speed.
    pub absorb_exit_speed: f32,
    /// Speed at which the target radius reaches zero.
    pub collapse_end_speed: f32,
    /// Absorption radius threshold as a fraction of the minimum radius.
    pub absorb_epsilon_fraction: f32,
    pub radius_rate: f32,
    pub omega_rate: f32,
    pub reflect_rate: f32,
    pub tilt_gain: f32,
    pub tilt_speed_floor: f32,
    pub tilt_speed_ceiling: f32,
    pub rotation_speed_floor: f32,
    pub rotation_speed_ceiling: f32,
    /// Peak angular velocity of the central body in rad/s.
    pub max_omega: f32,
    pub min_dt: f32,
    pub max_dt: f32,
    /// Ratio of the widest orbit to the minimum radius.
    pub max_radius_factor: f32,
}

/// Scene content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Root directory that every other asset path is relative to.
    pub asset_root: PathBuf,
    pub central_mesh: PathBuf,
    pub central_texture: PathBuf,
    /// Texture swapped in while absorbed.
    pub central_absorbed_texture: PathBuf,
    pub satellite_mesh: PathBuf,
    pub satellite_texture: PathBuf,
    /// Folder holding the six skybox faces (`px`, `nx`, `py`, `ny`, `pz`, `nz`).
    pub skybox_dir: PathBuf,
    pub satellite_count: u32,
    /// Longest edge of the central body after scaling.
    pub central_target_size: f32,
    /// Longest edge of each satellite after scaling.
    pub satellite_target_size: f32,
    /// Base orbital angular-speed multiplier.
    pub orbit_frequency: f32,
    /// Extra multiplier spread across satellites so they drift apart.
    pub orbit_frequency_spread: f32,
    /// Base self-spin rate in rad/s.
    pub spin_frequency: f32,
}

/// Free-fly camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub start_position: [f32; 3],
    /// Initial yaw in degrees; -90 looks down -Z.
    pub start_yaw_deg: f32,
    pub start_pitch_deg: f32,
    /// Movement speed in units per second.
    pub move_speed: f32,
    /// Degrees of rotation per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log the full animation state at debug every frame.
    pub trace_speed: bool,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shadow_resolution: 1024,
            max_shadow_casters: 8,
            shadow_near: 0.05,
            shadow_depth_bias: 0.015,
            ambient: 0.08,
            glow_max: 1.5,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            speed_floor: 0.0,
            speed_ceiling: 10.0,
            speed_step: 0.25,
            initial_speed: 1.0,
            contraction_speed: 3.0,
            absorb_enter_speed: 5.0,
            absorb_exit_speed: 4.5,
            collapse_end_speed: 6.0,
            absorb_epsilon_fraction: 0.02,
            radius_rate: 2.5,
            omega_rate: 1.5,
            reflect_rate: 1.2,
            tilt_gain: 0.35,
            tilt_speed_floor: 1.0,
            tilt_speed_ceiling: 4.0,
            rotation_speed_floor: 0.5,
            rotation_speed_ceiling: 6.0,
            max_omega: 3.0,
            min_dt: 1e-4,
            max_dt: 0.25,
            max_radius_factor: 5.0,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            central_mesh: PathBuf::from("models/central.obj"),
            central_texture: PathBuf::from("textures/central.png"),
            central_absorbed_texture: PathBuf::from("textures/central_absorbed.png"),
            satellite_mesh: PathBuf::from("models/satellite.obj"),
            satellite_texture: PathBuf::from("textures/satellite.png"),
            skybox_dir: PathBuf::from("skybox"),
            satellite_count: 8,
            central_target_size: 2.0,
            satellite_target_size: 0.45,
            orbit_frequency: 0.6,
            orbit_frequency_spread: 0.35,
            spin_frequency: 1.2,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start_position: [0.0, 1.5, 14.0],
            start_yaw_deg: -90.0,
            start_pitch_deg: -5.0,
            move_speed: 2.5,
            mouse_sensitivity: 0.1,
            fov_y_deg: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            trace_speed: false,
        }
    }
}

// --- Derived paths ---

impl SceneConfig {
    /// Join an asset path onto [`SceneConfig::asset_root`]. Absolute paths pass through.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.asset_root.join(relative)
    }
}

// --- Validation ---

impl AnimationConfig {
    fn float_fields(&self) -> [(&'static str, f32); 21] {
        [
            ("animation.speed_floor", self.speed_floor),
            ("animation.speed_ceiling", self.speed_ceiling),
            ("animation.speed_step", self.speed_step),
            ("animation.initial_speed", self.initial_speed),
            ("animation.contraction_speed", self.contraction_speed),
            ("animation.absorb_enter_speed", self.absorb_enter_speed),
            ("animation.absorb_exit_speed", self.absorb_exit_speed),
            ("animation.collapse_end_speed", self.collapse_end_speed),
            ("animation.absorb_epsilon_fraction", self.absorb_epsilon_fraction),
            ("animation.radius_rate", self.radius_rate),
            ("animation.omega_rate", self.omega_rate),
            ("animation.reflect_rate", self.reflect_rate),
            ("animation.tilt_gain", self.tilt_gain),
            ("animation.tilt_speed_floor", self.tilt_speed_floor),
            ("animation.tilt_speed_ceiling", self.tilt_speed_ceiling),
            ("animation.rotation_speed_floor", self.rotation_speed_floor),
            ("animation.rotation_speed_ceiling", self.rotation_speed_ceiling),
            ("animation.max_omega", self.max_omega),
            ("animation.min_dt", self.min_dt),
            ("animation.max_dt", self.max_dt),
            ("animation.max_radius_factor", self.max_radius_factor),
        ]
    }
}

impl Config {
    /// Check ranges and the ordering of the speed bands.
    ///
    /// Caps that depend on GPU-side layouts are checked by the caller.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.animation;

        for (field, value) in a.float_fields() {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, format!("{value} is not finite")));
            }
        }
        if a.speed_floor >= a.speed_ceiling {
            return Err(ConfigError::invalid(
                "animation.speed_ceiling",
                format!("{} must exceed speed_floor {}", a.speed_ceiling, a.speed_floor),
            ));
        }
        if a.speed_step <= 0.0 {
            return Err(ConfigError::invalid("animation.speed_step", "must be positive"));
        }
        let bands = [
            ("animation.contraction_speed", a.speed_floor, a.contraction_speed),
            ("animation.absorb_enter_speed", a.contraction_speed, a.absorb_enter_speed),
        ];
        for (field, lower, value) in bands {
            if value <= lower {
                return Err(ConfigError::invalid(
                    field,
                    format!("{value} must exceed {lower}"),
                ));
            }
        }
        if a.collapse_end_speed < a.absorb_enter_speed || a.collapse_end_speed > a.speed_ceiling {
            return Err(ConfigError::invalid(
                "animation.collapse_end_speed",
                format!(
                    "{} must lie in [{}, {}]",
                    a.collapse_end_speed, a.absorb_enter_speed, a.speed_ceiling
                ),
            ));
        }
        if a.absorb_exit_speed >= a.absorb_enter_speed {
            return Err(ConfigError::invalid(
                "animation.absorb_exit_speed",
                format!(
                    "{} must be below absorb_enter_speed {}",
                    a.absorb_exit_speed, a.absorb_enter_speed
                ),
            ));
        }
        if a.tilt_speed_ceiling < a.tilt_speed_floor {
            return Err(ConfigError::invalid(
                "animation.tilt_speed_ceiling",
                "must not be below tilt_speed_floor",
            ));
        }
        if a.rotation_speed_ceiling < a.rotation_speed_floor {
            return Err(ConfigError::invalid(
                "animation.rotation_speed_ceiling",
                "must not be below rotation_speed_floor",
            ));
        }
        let non_negative = [
            ("animation.max_omega", a.max_omega),
            ("animation.tilt_gain", a.tilt_gain),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(ConfigError::invalid(field, format!("{value} must not be negative")));
            }
        }
        let positive = [
            ("animation.absorb_epsilon_fraction", a.absorb_epsilon_fraction),
            ("animation.radius_rate", a.radius_rate),
            ("animation.omega_rate", a.omega_rate),
            ("animation.reflect_rate", a.reflect_rate),
            ("animation.min_dt", a.min_dt),
            ("animation.max_radius_factor", a.max_radius_factor),
            ("scene.central_target_size", self.scene.central_target_size),
            ("scene.satellite_target_size", self.scene.satellite_target_size),
            ("render.shadow_near", self.render.shadow_near),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::invalid(field, format!("{value} must be positive")));
            }
        }
        if a.max_dt < a.min_dt {
            return Err(ConfigError::invalid("animation.max_dt", "must not be below min_dt"));
        }
        if a.max_radius_factor < 1.0 {
            return Err(ConfigError::invalid(
                "animation.max_radius_factor",
                "the widest orbit cannot be inside the minimum radius",
            ));
        }
        if self.render.shadow_resolution == 0 {
            return Err(ConfigError::invalid("render.shadow_resolution", "must be positive"));
        }
        if self.scene.satellite_count == 0 {
            return Err(ConfigError::invalid("scene.satellite_count", "must be positive"));
        }
        if self.render.max_shadow_casters == 0 {
            return Err(ConfigError::invalid("render.max_shadow_casters", "must be positive"));
        }
        Ok(())
    }
}

// --- Load / Save ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(config_dir.join("config.ron"), serialized).map_err(ConfigError::WriteError)
    }
}
