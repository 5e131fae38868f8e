use crate::model::{validate_config, AppConfig};
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_DIR_ENV: &str = "MODEL_FORMS_CONFIG_DIR";
pub const CONFIG_FILE: &str = "forms.yaml";

/// Truthy env flag: `1`, `true` or `yes` (case-insensitive).
pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
        .unwrap_or(false)
}

pub fn parse_config(s: &str) -> Result<AppConfig> {
    let cfg: AppConfig = serde_yaml::from_str(s)?;
    validate_config(&cfg).map_err(|e| anyhow!(e))?;
    Ok(cfg)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let s = fs::read_to_string(path).with_context(|| format!("reading config: {path:?}"))?;
    parse_config(&s).with_context(|| format!("parsing config: {path:?}"))
}

/// Candidate locations, in lookup order, for a search rooted at `cwd`.
pub(crate) fn candidate_paths(cwd: &Path) -> Vec<PathBuf> {
    let mut out = vec![
        cwd.join(CONFIG_FILE),
        cwd.join(".forms").join(CONFIG_FILE),
    ];
    let mut cur = cwd;
    while let Some(parent) = cur.parent() {
        out.push(parent.join(".forms").join(CONFIG_FILE));
        cur = parent;
    }
    out
}

pub fn load_config() -> Result<AppConfig> {
    // 1) Explicit directory wins
    if let Ok(base) = std::env::var(CONFIG_DIR_ENV) {
        let entry = PathBuf::from(&base).join(CONFIG_FILE);
        return load_config_from(&entry);
    }
    // 2) CWD, CWD/.forms, then ancestors' .forms
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    for p in candidate_paths(&cwd) {
        if p.exists() {
            tracing::debug!(path = ?p, "using config");
            return load_config_from(&p);
        }
    }
    Err(anyhow!(
        "No config found. Set {CONFIG_DIR_ENV}=<dir with {CONFIG_FILE}> or place {CONFIG_FILE} in CWD, CWD/.forms or an ancestor's .forms"
    ))
}

#[cfg(test)]
mod config_tests;
