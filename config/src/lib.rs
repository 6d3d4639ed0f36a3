//! Layered environment loading for fractal.
//!
//! The engine and its clients read settings only from the process environment.
//! [`load_and_apply`] fills in variables that are not already set, with
//! priority **existing env > project `.env` > user `config.toml`**.

mod config_file;
mod dotenv;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use config_file::config_path;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("config directory: {0}")]
    ConfigDir(String),
    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config.toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("engine.{key} must be a string, number or boolean, got {kind}")]
    NotScalar { key: String, kind: &'static str },
    #[error("read .env: {0}")]
    Dotenv(std::io::Error),
}

/// Merged view of `.env` and `config.toml`, `.env` first. Does not touch the process env.
pub fn collect(
    app_name: &str,
    dotenv_dir: Option<&Path>,
) -> Result<HashMap<String, String>, LoadError> {
    let mut merged = config_file::load_env_map(app_name)?;
    merged.extend(dotenv::load_env_map(dotenv_dir).map_err(LoadError::Dotenv)?);
    Ok(merged)
}

/// Sets every collected variable that is not already present in the process env.
///
/// * `app_name`: directory under the config home, and prefix for `[engine]` keys.
/// * `dotenv_dir`: where to look for `.env`; the current directory when `None`.
///
/// Returns the names of the variables that were set.
pub fn load_and_apply(app_name: &str, dotenv_dir: Option<&Path>) -> Result<Vec<String>, LoadError> {
    let mut applied = Vec::new();
    for (key, value) in collect(app_name, dotenv_dir)? {
        if std::env::var_os(&key).is_some() {
            continue;
        }
        std::env::set_var(&key, value);
        applied.push(key);
    }
    applied.sort();
    Ok(applied)
}
