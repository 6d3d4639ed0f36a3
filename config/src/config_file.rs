//! User config file: `$XDG_CONFIG_HOME/<app>/config.toml` (or the platform config dir).
//!
//! Two tables are read:
//!
//! ```toml
//! [env]
//! GROQ_API_KEY = "gsk-..."
//!
//! [engine]
//! max_depth = 4
//! branch_factor = 2
//! tie_break = "last_created"
//! ```
//!
//! `[env]` entries are taken verbatim. `[engine]` keys are mapped to
//! `<APP>_<KEY>` variables (`max_depth` becomes `FRACTAL_MAX_DEPTH`), so the
//! engine keeps reading a single source of truth: the process environment.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::LoadError;

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    engine: HashMap<String, toml::Value>,
}

/// Base config directory. `XDG_CONFIG_HOME` wins on every platform.
fn config_home() -> Result<PathBuf, LoadError> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir().ok_or_else(|| LoadError::ConfigDir("no home directory".to_string()))
}

/// Location of `config.toml` for `app_name`, whether or not it exists.
pub fn config_path(app_name: &str) -> Result<PathBuf, LoadError> {
    Ok(config_home()?.join(app_name).join("config.toml"))
}

fn engine_var(app_name: &str, key: &str) -> String {
    format!("{}_{}", app_name, key).to_ascii_uppercase().replace('-', "_")
}

fn scalar_text(key: &str, value: toml::Value) -> Result<String, LoadError> {
    match value {
        toml::Value::String(s) => Ok(s),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        other => Err(LoadError::NotScalar {
            key: key.to_string(),
            kind: other.type_str(),
        }),
    }
}

/// Variables contributed by the config file. Missing file yields an empty map.
///
/// On a key present in both tables, `[env]` wins.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let path = config_path(app_name)?;
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(&path).map_err(|source| LoadError::Read {
        path: path.clone(),
        source,
    })?;
    let file: ConfigFile = toml::from_str(&content)?;

    let mut out = HashMap::with_capacity(file.env.len() + file.engine.len());
    for (key, value) in file.engine {
        let text = scalar_text(&key, value)?;
        out.insert(engine_var(app_name, &key), text);
    }
    out.extend(file.env);
    Ok(out)
}
