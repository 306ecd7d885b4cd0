//! Rendering of the validated options for downstream build files.

use crate::options::join;
use crate::store::OptionStore;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

pub const MAKE_FILE: &str = "config.make";

/// Renders `vars` as make(1) variable assignments.
///
/// Values are shell-quoted since make hands them to the shell; `$` and `#`
/// are escaped for make itself. A token containing a line break cannot be
/// expressed in a single-line assignment and is rejected.
pub fn render_make(vars: &OptionStore) -> Result<String> {
    let mut out = String::from("# Generated by attoconf. Do not edit.\n");
    for (name, tokens) in vars.iter() {
        if let Some(token) = tokens.iter().find(|t| t.contains(['\n', '\r'])) {
            bail!(
                "{} cannot be written to {}: {:?} contains a line break",
                name,
                MAKE_FILE,
                token
            );
        }
        let value = join(tokens).replace('$', "$$").replace('#', "\\#");
        if value.is_empty() {
            out.push_str(&format!("{} =\n", name));
        } else {
            out.push_str(&format!("{} = {}\n", name, value));
        }
    }
    Ok(out)
}

pub fn render_json(vars: &OptionStore) -> Result<String> {
    Ok(serde_json::to_string_pretty(vars)?)
}

/// Writes `config.make` into `builddir` and returns its path.
pub fn write_make(builddir: &Path, vars: &OptionStore) -> Result<PathBuf> {
    let path = builddir.join(MAKE_FILE);
    fs::write(&path, render_make(vars)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::tokens;

    fn store() -> OptionStore {
        let mut vars = OptionStore::new();
        vars.set("CC", tokens(&["gcc"]));
        vars.set("CFLAGS", tokens(&["-O2", "-DNAME=a b"]));
        vars.set("LDLIBS", Vec::new());
        vars
    }

    #[test]
    fn test_render_make() {
        let text = render_make(&store()).unwrap();
        let lines: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "CC = gcc");
        let cflags = lines[1].strip_prefix("CFLAGS = ").unwrap();
        assert_eq!(crate::options::shell(cflags).unwrap(), ["-O2", "-DNAME=a b"]);
        assert_eq!(lines[2], "LDLIBS =");
    }

    #[test]
    fn test_render_make_escapes_make_metacharacters() {
        let mut vars = OptionStore::new();
        vars.set("LDFLAGS", tokens(&["-Wl,-rpath,$ORIGIN"]));
        vars.set("CPPFLAGS", tokens(&["-DTAG=#1"]));
        let text = render_make(&vars).unwrap();
        assert!(text.contains("$$ORIGIN"));
        assert!(text.contains("\\#1"));
    }

    #[test]
    fn test_render_make_rejects_line_breaks() {
        let mut vars = OptionStore::new();
        vars.set("CPPFLAGS", tokens(&["-DA=1\n-DB=2"]));
        let err = render_make(&vars).unwrap_err();
        assert!(err.to_string().contains("CPPFLAGS"), "{err}");

        vars.set("CPPFLAGS", tokens(&["-DA=1\r"]));
        assert!(render_make(&vars).is_err());
    }

    #[test]
    fn test_write_make_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut vars = store();
        vars.set("LDFLAGS", tokens(&["-L/a\nb"]));
        assert!(write_make(dir.path(), &vars).is_err());
        assert!(!dir.path().join(MAKE_FILE).exists());
    }

    #[test]
    fn test_render_json() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&store()).unwrap()).unwrap();
        assert_eq!(json["CFLAGS"][1], "-DNAME=a b");
        assert_eq!(json["LDLIBS"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_write_make() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_make(dir.path(), &store()).unwrap();
        assert_eq!(path, dir.path().join(MAKE_FILE));
        assert!(fs::read_to_string(path).unwrap().contains("CC = gcc"));
    }
}
