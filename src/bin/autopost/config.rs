use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use autopost::config::{read_config, Config};
use autopost::logger::default_log_location;

use crate::CFG_FILE_NAME;

fn get_config_path() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()));
    let candidates = [
        exe_dir,
        env::current_dir().ok(),
        dirs::config_dir(),
    ];

    candidates.into_iter()
        .flatten()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}

/// Reads the config file if there is one, applies `WP_*` overrides and
/// checks the result.
pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<Config> {
    let mut config = match cfg_path.or_else(get_config_path) {
        Some(config_path) => {
            println!("Reading config from {}", config_path.display());
            read_config(&config_path)?
        }
        None => {
            println!("No {} found. Using defaults and environment", CFG_FILE_NAME);
            Config::default()
        }
    };

    config.apply_env(|key| env::var(key).ok());
    config.validate().context("Invalid configuration")?;

    if let Some(mut log) = config.log {
        let location = log.location.unwrap_or_else(default_log_location);
        println!("Log enabled. Files will be written in {}", location.display());
        log.location = Some(location);
        config.log = Some(log);
    } else {
        println!("Log disabled. Using stdout");
    }

    Ok(config)
}
