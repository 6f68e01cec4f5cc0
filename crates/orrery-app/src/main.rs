//! `orrery` binary entry point.

use clap::Parser;
use orrery_app::PlatformDirs;
use orrery_app::setup::check_caps;
use orrery_config::{CliArgs, Config};

fn main() {
    let args = CliArgs::parse();

    let dirs = match &args.config {
        Some(dir) => Ok(PlatformDirs::with_config_dir(dir)),
        None => PlatformDirs::resolve(),
    };
    let dirs = match dirs.and_then(|d| d.create_dirs().map(|()| d)) {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Failed to initialize platform directories: {e}");
            std::process::exit(1);
        }
    };

    // Logging is not up yet; a broken config file is reported on stderr.
    let mut config = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", dirs.config_dir.display());
            std::process::exit(1);
        }
    };
    config.apply_cli_overrides(&args);

    orrery_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    tracing::info!(
        config_dir = %dirs.config_dir.display(),
        log_dir = %dirs.log_dir.display(),
        "Orrery starting"
    );

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {e}");
        std::process::exit(1);
    }
    if let Err(e) = check_caps(&config) {
        tracing::error!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    if let Err(e) = orrery_app::run(config) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
