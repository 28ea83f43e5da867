//! Load `.handoff.toml` (CLI only). The library takes everything through `PipelineOpts`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::cli::RunSettings;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct HandoffToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsSection {
    items: Option<usize>,
    capacity: Option<usize>,
    producers: Option<usize>,
    consumers: Option<usize>,
    production_delay_ms: Option<u64>,
    consumption_delay_ms: Option<u64>,
    put_timeout_ms: Option<u64>,
    get_timeout_ms: Option<u64>,
    verbose: Option<bool>,
    json: Option<bool>,
}

/// Where to look for the config: explicit path, then `$HANDOFF_CONFIG`, then `.handoff.toml` in `dir`.
pub fn config_path(explicit: Option<&Path>, dir: &Path) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let paths = PackagePaths::get();
    match std::env::var(paths.config_env_var()) {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p.trim()),
        _ => dir.join(paths.config_filename()),
    }
}

/// Load the config at `path`. `Ok(None)` when the file does not exist; `Err` when it cannot be read or parsed.
pub fn load_handoff_toml(path: &Path) -> Result<Option<HandoffToml>> {
    if !path.is_file() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let parsed = parse_handoff_toml(&s).with_context(|| format!("load {}", path.display()))?;
    Ok(Some(parsed))
}

/// Overwrite settings field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $target:expr, $sec_field:ident => $target_field:ident as millis) => {
        if let Some(ms) = $sec.$sec_field {
            $target.$target_field = Duration::from_millis(ms);
        }
    };
    ($sec:expr, $target:expr, $sec_field:ident => $target_field:ident) => {
        if let Some(v) = $sec.$sec_field {
            $target.$target_field = v;
        }
    };
}

/// Apply file config to settings (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_settings(file: &HandoffToml, settings: &mut RunSettings) {
    let sec = &file.settings;
    apply_file_opt!(sec, settings, items => items);
    apply_file_opt!(sec, settings, verbose => verbose);
    apply_file_opt!(sec, settings, json => json);
    let opts = &mut settings.opts;
    apply_file_opt!(sec, opts, capacity => queue_capacity);
    apply_file_opt!(sec, opts, producers => num_producers);
    apply_file_opt!(sec, opts, consumers => num_consumers);
    apply_file_opt!(sec, opts, production_delay_ms => production_delay as millis);
    apply_file_opt!(sec, opts, consumption_delay_ms => consumption_delay as millis);
    apply_file_opt!(sec, opts, put_timeout_ms => put_timeout as millis);
    apply_file_opt!(sec, opts, get_timeout_ms => get_timeout as millis);
}

/// Parse a config from a string (same rules as the file loader).
pub fn parse_handoff_toml(s: &str) -> Result<HandoffToml> {
    toml::from_str(s).context("parse handoff config")
}
