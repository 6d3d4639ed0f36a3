//! Project `.env` reader. Values are collected into a map; applying them is up to the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn dotenv_file(dir: Option<&Path>) -> Option<PathBuf> {
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return value[1..value.len() - 1].replace("\\\"", "\"");
    }
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return value[1..value.len() - 1].to_string();
    }
    value.to_string()
}

/// One `KEY=VALUE` per line.
///
/// Blank lines and `#` comment lines are skipped, as are lines without `=` or
/// with an empty key. An optional leading `export ` is ignored. Double quotes
/// allow `\"`; single quotes are taken literally.
pub(crate) fn parse(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), unquote(value.trim()));
    }
    vars
}

/// Reads `.env` from `dir` (current directory when `None`). Missing file is an empty map.
pub fn load_env_map(dir: Option<&Path>) -> std::io::Result<HashMap<String, String>> {
    match dotenv_file(dir) {
        Some(path) => Ok(parse(&std::fs::read_to_string(path)?)),
        None => Ok(HashMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(m: &'a HashMap<String, String>, k: &str) -> Option<&'a str> {
        m.get(k).map(String::as_str)
    }

    #[test]
    fn reads_pairs_and_skips_noise() {
        let m = parse("\n# provider\nGROQ_API_KEY=gsk-1\n  \nNO_EQUALS\n=orphan\nFRACTAL_MODEL = llama\n");
        assert_eq!(m.len(), 2);
        assert_eq!(get(&m, "GROQ_API_KEY"), Some("gsk-1"));
        assert_eq!(get(&m, "FRACTAL_MODEL"), Some("llama"));
    }

    #[test]
    fn quotes_are_stripped() {
        let m = parse(
            "A=\"two words\"\nB='literal \\\"'\nC=\"say \\\"hi\\\"\"\nD=\"\"\nE=\n",
        );
        assert_eq!(get(&m, "A"), Some("two words"));
        assert_eq!(get(&m, "B"), Some("literal \\\""));
        assert_eq!(get(&m, "C"), Some("say \"hi\""));
        assert_eq!(get(&m, "D"), Some(""));
        assert_eq!(get(&m, "E"), Some(""));
    }

    #[test]
    fn hash_inside_value_is_kept() {
        let m = parse("FRACTAL_CRITIC_INSTRUCTION=rate #1 priority\n");
        assert_eq!(get(&m, "FRACTAL_CRITIC_INSTRUCTION"), Some("rate #1 priority"));
    }

    #[test]
    fn export_prefix_is_ignored() {
        let m = parse("export FRACTAL_MAX_DEPTH=2\n");
        assert_eq!(get(&m, "FRACTAL_MAX_DEPTH"), Some("2"));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_map(Some(dir.path())).unwrap().is_empty());
    }

    #[test]
    fn reads_file_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "A=1\nB=2\n").unwrap();
        let m = load_env_map(Some(dir.path())).unwrap();
        assert_eq!(get(&m, "A"), Some("1"));
        assert_eq!(get(&m, "B"), Some("2"));
    }
}
