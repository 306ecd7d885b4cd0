//! Test doubles shared by the unit tests.

use crate::error::{ProbeError, Result};
use crate::process::{ProcessOutput, Runner};
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;

pub fn tokens(s: &[&str]) -> Vec<String> {
    s.iter().map(|s| s.to_string()).collect()
}

/// Sorted names of the files currently in `dir`.
pub fn leftover_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[derive(Debug, Clone)]
pub struct Call {
    pub args: Vec<String>,
    /// Files present in the working directory when the command started.
    pub files: Vec<String>,
    /// Contents of the probe source, if one was present.
    pub source: Option<String>,
}

/// Records every command and pretends to be a compiler that writes its `-o` output.
#[derive(Debug, Clone, Default)]
pub struct FakeRunner {
    calls: Rc<RefCell<Vec<Call>>>,
    fail_at: Option<usize>,
    not_found: bool,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `n`th command (zero-based) exit with status 1.
    pub fn failing_at(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Self::default()
        }
    }

    /// Makes every command fail to launch.
    pub fn launch_failure() -> Self {
        Self {
            not_found: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl Runner for FakeRunner {
    fn run(&self, args: &[String], cwd: &Path) -> Result<ProcessOutput> {
        let files = leftover_files(cwd);
        let source = files
            .iter()
            .find(|f| f.ends_with(".c") || f.ends_with(".cxx"))
            .map(|f| fs::read_to_string(cwd.join(f)).unwrap());
        let index = {
            let mut calls = self.calls.borrow_mut();
            calls.push(Call {
                args: args.to_vec(),
                files,
                source,
            });
            calls.len() - 1
        };

        if self.not_found {
            return Err(ProbeError::Launch {
                program: args[0].clone(),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }
        if self.fail_at == Some(index) {
            return Ok(ProcessOutput {
                code: 1,
                output: "atto-test.c:1:1: error: expected declaration\n".to_string(),
            });
        }
        if let Some(pos) = args.iter().position(|a| a == "-o") {
            fs::write(cwd.join(&args[pos + 1]), b"").unwrap();
        }
        Ok(ProcessOutput {
            code: 0,
            output: String::new(),
        })
    }
}
