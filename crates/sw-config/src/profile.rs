use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Serialize;
use sw_core::{EngineConfig, MAX_LEVEL_SPAN};

use crate::error::{ConfigError, Result};

/// File looked up in the base directory when nothing else names a config.
pub const CONFIG_FILE_NAME: &str = "statwheel.toml";

/// Default base directory: `SW_HOME`, else `~/.statwheel`.
pub fn default_base_dir() -> PathBuf {
    base_dir_from(
        env::var_os("SW_HOME"),
        env::var_os("HOME").or_else(|| env::var_os("USERPROFILE")),
    )
}

/// A resolved configuration and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub engine: EngineConfig,
    /// File the settings were read from; `None` when defaults were used.
    pub source: Option<PathBuf>,
    pub profile: Option<String>,
}

// ---------------------------------------------------------------------------
// Pure helpers (no I/O, fully unit-testable)
// ---------------------------------------------------------------------------

/// Base directory from the `SW_HOME` and home-directory values.
fn base_dir_from(sw_home: Option<OsString>, home: Option<OsString>) -> PathBuf {
    match sw_home.filter(|h| !h.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => home
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".statwheel"),
    }
}

/// Pick the config file: explicit path, then `env_path`, then the default file
/// under `base_dir`. The flag reports whether the file must exist.
pub fn resolve_path(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    base_dir: &Path,
) -> (PathBuf, bool) {
    if let Some(path) = explicit {
        return (path.to_path_buf(), true);
    }
    if let Some(path) = env_path.filter(|p| !p.as_os_str().is_empty()) {
        return (path, true);
    }
    (base_dir.join(CONFIG_FILE_NAME), false)
}

/// Overlay `overlay` onto `base`, descending into nested tables.
fn merge_tables(base: &mut toml::Table, overlay: &toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Parse a config document: `[engine]` settings with an optional
/// `[profiles.<name>]` layered on top.
pub fn parse(content: &str, profile: Option<&str>) -> Result<EngineConfig> {
    let doc: toml::Table = content.parse()?;

    let mut merged = match doc.get("engine") {
        Some(toml::Value::Table(t)) => t.clone(),
        Some(_) => return Err(ConfigError::Invalid("[engine] must be a table".into())),
        None => toml::Table::new(),
    };

    if let Some(name) = profile {
        let overlay = doc
            .get("profiles")
            .and_then(|p| p.get(name))
            .and_then(toml::Value::as_table)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))?;
        merge_tables(&mut merged, overlay);
    }

    let config: EngineConfig = toml::Value::Table(merged).try_into()?;
    validate(&config)?;
    Ok(config)
}

/// Reject configurations that clamping cannot make meaningful.
pub fn validate(config: &EngineConfig) -> Result<()> {
    let invalid = |msg: String| Err(ConfigError::Invalid(msg));

    if config.axes == 0 {
        return invalid("axes must be at least 1".into());
    }
    if config.max_level <= config.min_level {
        return invalid(format!(
            "max_level ({}) must exceed min_level ({})",
            config.max_level, config.min_level
        ));
    }
    if config.max_level - config.min_level > MAX_LEVEL_SPAN {
        return invalid(format!(
            "level range {}..={} is wider than {MAX_LEVEL_SPAN} levels",
            config.min_level, config.max_level
        ));
    }
    let numbers = [
        ("visual_max", config.visual_max),
        ("geometry.min_radius", config.geometry.min_radius),
        ("geometry.max_radius", config.geometry.max_radius),
        ("follow_speed", config.follow_speed),
        ("tension_spread", config.tension_spread),
        ("thin_coupling", config.thin_coupling),
        ("recede_speed", config.recede_speed),
        ("magnetism.strength", config.magnetism.strength),
        ("magnetism.threshold", config.magnetism.threshold),
    ];
    if let Some((name, _)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
        return invalid(format!("{name} must be a finite number"));
    }
    if config.visual_max < config.max_level as f64 {
        return invalid(format!(
            "visual_max ({}) must be at least max_level ({})",
            config.visual_max, config.max_level
        ));
    }
    if config.geometry.min_radius < 0.0 || config.geometry.min_radius >= config.geometry.max_radius {
        return invalid("geometry radii must satisfy 0 <= min_radius < max_radius".into());
    }
    if !(config.follow_speed > 0.0 && config.follow_speed <= 1.0) {
        return invalid("follow_speed must be in (0, 1]".into());
    }
    for (name, v) in [
        ("tension_spread", config.tension_spread),
        ("thin_coupling", config.thin_coupling),
        ("magnetism.strength", config.magnetism.strength),
    ] {
        if !(0.0..=1.0).contains(&v) {
            return invalid(format!("{name} must be in [0, 1]"));
        }
    }
    if !(0.0..=0.5).contains(&config.magnetism.threshold) {
        return invalid("magnetism.threshold must be in [0, 0.5]".into());
    }
    if config.recede_speed < 0.0 {
        return invalid("recede_speed must not be negative".into());
    }
    if config.geometry.level_scale.iter().any(|s| !(s.scale.is_finite() && s.scale > 0.0)) {
        return invalid("geometry.level_scale entries need a positive scale".into());
    }
    if config.geometry.rest_pad.iter().any(|p| !(p.is_finite() && *p >= 0.0)) {
        return invalid("geometry.rest_pad entries must be non-negative".into());
    }
    if !config.axis_keys.is_empty() {
        if config.axis_keys.len() != config.axes {
            return invalid(format!(
                "{} axis_keys given for {} axes",
                config.axis_keys.len(),
                config.axes
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = config.axis_keys.iter().find(|k| !seen.insert(k.as_str())) {
            return invalid(format!("duplicate axis key '{dup}'"));
        }
    }
    Ok(())
}

/// Render a configuration as a config document with a single `[engine]` table.
pub fn to_toml(config: &EngineConfig) -> Result<String> {
    #[derive(Serialize)]
    struct Document<'a> {
        engine: &'a EngineConfig,
    }
    Ok(toml::to_string(&Document { engine: config })?)
}

// ---------------------------------------------------------------------------
// I/O wrappers (thin shells around pure logic)
// ---------------------------------------------------------------------------

/// Resolve, read and parse the configuration.
///
/// A missing default file yields the built-in defaults; a missing file that
/// was named explicitly (flag or `SW_CONFIG`) is an error.
pub fn load(explicit: Option<&Path>, profile: Option<&str>) -> Result<LoadedConfig> {
    let env_path = env::var_os("SW_CONFIG").map(PathBuf::from);
    let (path, required) = resolve_path(explicit, env_path, &default_base_dir());
    tracing::debug!("config path: {} (required: {required})", path.display());

    if !required && !path.exists() {
        if let Some(name) = profile {
            return Err(ConfigError::UnknownProfile(name.to_string()));
        }
        tracing::debug!("no config file, using defaults");
        return Ok(LoadedConfig {
            engine: EngineConfig::default(),
            source: None,
            profile: None,
        });
    }

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let engine = parse(&content, profile)?;
    tracing::info!(
        "loaded config from {} (profile: {}, mode: {})",
        path.display(),
        profile.unwrap_or("none"),
        engine.mode
    );
    Ok(LoadedConfig {
        engine,
        source: Some(path),
        profile: profile.map(str::to_string),
    })
}
