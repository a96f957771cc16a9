#![forbid(unsafe_code)]

//! Runtime configuration for the playtrack binaries.
//!
//! Values are resolved from explicit overrides first, then process
//! environment variables, then a `.env` file next to the working directory.
//! Everything has a default except the YouTube API key, which is optional:
//! without it the structured playlist lookup tier is simply skipped.

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_DATA_ROOT: &str = ".playtrack";
pub const DEFAULT_PROXY_BASE: &str = "https://api.allorigins.win/raw?url=";

const STORAGE_FILE: &str = "playlists.json";
const NOTES_SUBDIR: &str = "notes";

/// Everything the store, the notes directory and the fetcher need to run.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub data_root: PathBuf,
    pub storage_file: PathBuf,
    pub notes_dir: PathBuf,
    pub youtube_api_key: Option<String>,
    pub proxy_base: String,
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub data_root: Option<PathBuf>,
    pub youtube_api_key: Option<String>,
    pub proxy_base: Option<String>,
    pub env_path: Option<PathBuf>,
}

pub fn load_runtime_paths() -> Result<RuntimePaths> {
    resolve_runtime_paths(RuntimeOverrides::default())
}

pub fn resolve_runtime_paths(overrides: RuntimeOverrides) -> Result<RuntimePaths> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    Ok(build_runtime_paths(&file_vars, env_var_string, overrides))
}

fn build_runtime_paths(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: RuntimeOverrides,
) -> RuntimePaths {
    let data_root = overrides
        .data_root
        .map(|path| path.to_string_lossy().into_owned())
        .or_else(|| lookup_value("PLAYTRACK_DATA_ROOT", file_vars, &env_lookup))
        .unwrap_or_else(|| DEFAULT_DATA_ROOT.to_string());
    let youtube_api_key = overrides
        .youtube_api_key
        .and_then(non_empty)
        .or_else(|| lookup_value("YOUTUBE_API_KEY", file_vars, &env_lookup));
    let proxy_base = overrides
        .proxy_base
        .and_then(non_empty)
        .or_else(|| lookup_value("PLAYTRACK_PROXY_BASE", file_vars, &env_lookup))
        .unwrap_or_else(|| DEFAULT_PROXY_BASE.to_string());

    let data_root = PathBuf::from(data_root);
    RuntimePaths {
        storage_file: data_root.join(STORAGE_FILE),
        notes_dir: data_root.join(NOTES_SUBDIR),
        data_root,
        youtube_api_key,
        proxy_base,
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok().and_then(non_empty)
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key).or_else(|| file_vars.get(key).cloned())
}

pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value_raw.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
            .or_else(|| {
                value
                    .strip_prefix('\'')
                    .and_then(|value| value.strip_suffix('\''))
            })
            .unwrap_or(value);
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}

/// Updates or appends a single env var inside the target file while preserving
/// unrelated lines and comments. Used by `playtrack config set-key`.
pub fn upsert_env_value(path: &Path, key: &str, value: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Creating {}", parent.display()))?;
    }

    let raw = fs::read_to_string(path).unwrap_or_default();
    let mut lines = Vec::new();
    let mut updated = false;
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");

    for line in raw.lines() {
        let trimmed = line.trim_start();
        let indent_len = line.len() - trimmed.len();
        let indent = &line[..indent_len];
        let (prefix, rest) = if let Some(stripped) = trimmed.strip_prefix("export ") {
            ("export ", stripped)
        } else {
            ("", trimmed)
        };
        let Some((candidate, _)) = rest.split_once('=') else {
            lines.push(line.to_string());
            continue;
        };
        if candidate.trim() == key {
            lines.push(format!("{indent}{prefix}{key}=\"{escaped}\""));
            updated = true;
        } else {
            lines.push(line.to_string());
        }
    }

    if !updated {
        lines.push(format!("{key}=\"{escaped}\""));
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, lines.join("\n") + "\n")?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
