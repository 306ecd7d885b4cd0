use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Looked up in the current directory when no `--config` is given.
pub const CONFIG_FILE: &str = "attoconf.toml";

/// Contents of `attoconf.toml`.
///
/// ```toml
/// builddir = "build"
///
/// [vars]
/// CC = "clang"
/// CFLAGS = "-O2 -Wall"
/// ```
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AttoConfig {
    pub builddir: Option<PathBuf>,
    /// Option values, written exactly as they would be on the command line.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

/// Loads `path`, or `attoconf.toml` if it exists when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<AttoConfig> {
    let path = match path {
        Some(p) => p,
        None if Path::new(CONFIG_FILE).exists() => Path::new(CONFIG_FILE),
        None => return Ok(AttoConfig::default()),
    };
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_config(&config_str).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_config(config_str: &str) -> Result<AttoConfig> {
    Ok(toml::from_str(config_str)?)
}

/// Splits a `NAME=value` command-line assignment.
pub fn parse_assignment(arg: &str) -> Option<(&str, &str)> {
    let (name, value) = arg.split_once('=')?;
    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    valid_name.then_some((name, value))
}

/// Layers command-line assignments over `vars`; later assignments win.
pub fn apply_assignments(vars: &mut BTreeMap<String, String>, args: &[String]) -> Result<()> {
    for arg in args {
        let (name, value) = parse_assignment(arg).with_context(|| {
            format!("Invalid assignment '{}': expected NAME=value, e.g. CFLAGS=-O2", arg)
        })?;
        vars.insert(name.to_string(), value.to_string());
    }
    Ok(())
}
