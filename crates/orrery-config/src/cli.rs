//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Orrery command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "orrery", about = "Speed-driven orbital scene with point-light shadows")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Number of orbiting satellites.
    #[arg(long)]
    pub satellites: Option<u32>,

    /// Number of shadow-casting lights.
    #[arg(long)]
    pub max_shadow_casters: Option<u32>,

    /// Shadow cubemap face resolution.
    #[arg(long)]
    pub shadow_resolution: Option<u32>,

    /// Asset root directory.
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(n) = args.satellites {
            self.scene.satellite_count = n;
        }
        if let Some(n) = args.max_shadow_casters {
            self.render.max_shadow_casters = n;
        }
        if let Some(res) = args.shadow_resolution {
            self.render.shadow_resolution = res;
        }
        if let Some(ref root) = args.assets {
            self.scene.asset_root = root.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(1920),
            satellites: Some(5),
            assets: Some(PathBuf::from("/data/orrery")),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.scene.satellite_count, 5);
        assert_eq!(config.scene.asset_root, PathBuf::from("/data/orrery"));
        // Non-overridden fields retain defaults
        assert_eq!(config.window.height, 720);
        assert_eq!(config.render.max_shadow_casters, 8);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "orrery",
            "--shadow-resolution",
            "512",
            "--max-shadow-casters",
            "4",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.shadow_resolution, Some(512));
        assert_eq!(args.max_shadow_casters, Some(4));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.width.is_none());
    }
}
