//! Synchronous process execution with merged output capture.

use crate::error::{ProbeError, Result};
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Exit status and combined stdout/stderr of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `-1` when the process was terminated by a signal.
    pub code: i32,
    pub output: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Converts a nonzero exit into [`ProbeError::Failed`] carrying the captured output.
    pub fn into_result(self) -> Result<String> {
        if self.success() {
            Ok(self.output)
        } else {
            Err(ProbeError::Failed {
                output: self.output,
            })
        }
    }
}

/// Executes toolchain commands on behalf of the probes.
pub trait Runner {
    /// Runs `args[0]` with the remaining arguments inside `cwd`.
    ///
    /// A nonzero exit is a normal result; only a failure to start the
    /// process is an error.
    fn run(&self, args: &[String], cwd: &Path) -> Result<ProcessOutput>;
}

/// Runs commands on the host system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, args: &[String], cwd: &Path) -> Result<ProcessOutput> {
        run_command(args, cwd)
    }
}

pub fn run_command(args: &[String], cwd: &Path) -> Result<ProcessOutput> {
    let Some((program, rest)) = args.split_first() else {
        return Err(ProbeError::Launch {
            program: String::new(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
        });
    };
    let launch_err = |source: io::Error| ProbeError::Launch {
        program: program.clone(),
        source,
    };

    debug!(cwd = %cwd.display(), "exec: {}", args.join(" "));

    // stdout and stderr share one pipe so diagnostics keep their original interleaving.
    let (mut reader, writer) = io::pipe().map_err(launch_err)?;
    let mut child = {
        let mut cmd = Command::new(program);
        cmd.args(rest)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(writer.try_clone().map_err(launch_err)?)
            .stderr(writer);
        cmd.spawn().map_err(launch_err)?
        // `cmd` drops here, closing the parent's copies of the write end.
    };

    // Empty input: the child sees EOF immediately.
    drop(child.stdin.take());

    let mut buf = Vec::new();
    let read = reader.read_to_end(&mut buf);
    drop(reader);
    // Reap the child even when reading failed, so no zombie is left behind.
    let status = child.wait();
    let io_err = |source: io::Error| ProbeError::Io {
        program: program.clone(),
        source,
    };
    read.map_err(io_err)?;
    let status = status.map_err(io_err)?;
    let code = status.code().unwrap_or(-1);

    debug!(program = %program, code, "exit");

    Ok(ProcessOutput {
        code,
        output: String::from_utf8_lossy(&buf).into_owned(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let dir = std::env::temp_dir();
        let out = run_command(&sh("exit 3"), &dir).unwrap();
        assert_eq!(out.code, 3);
        assert!(!out.success());
    }

    #[test]
    fn test_stdout_and_stderr_are_merged() {
        let dir = std::env::temp_dir();
        let out = run_command(&sh("echo first; echo second >&2; echo third"), &dir).unwrap();
        assert!(out.success());
        assert_eq!(out.output, "first\nsecond\nthird\n");
    }

    #[test]
    fn test_stdin_is_empty() {
        let dir = std::env::temp_dir();
        let out = run_command(&sh("cat; echo done"), &dir).unwrap();
        assert_eq!(out.output, "done\n");
    }

    #[test]
    fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_command(&sh("pwd"), dir.path()).unwrap();
        let expected = dir.path().canonicalize().unwrap();
        let reported = std::path::PathBuf::from(out.output.trim())
            .canonicalize()
            .unwrap();
        assert_eq!(reported, expected);
    }

    #[test]
    fn test_missing_program_is_launch_failure() {
        let dir = std::env::temp_dir();
        let args = vec!["nonexistent-compiler-xyz".to_string()];
        let err = run_command(&args, &dir).unwrap_err();
        assert!(err.is_launch_failure());
    }

    #[test]
    fn test_empty_command_is_launch_failure() {
        let err = run_command(&[], &std::env::temp_dir()).unwrap_err();
        assert!(err.is_launch_failure());
    }

    #[test]
    fn test_waits_for_child_after_output_closes() {
        let dir = std::env::temp_dir();
        let out = run_command(&sh("echo early; exec >&- 2>&-; sleep 0.2; exit 4"), &dir).unwrap();
        assert_eq!(out.code, 4);
        assert_eq!(out.output, "early\n");
    }

    #[test]
    fn test_io_error_is_not_launch_failure() {
        let err = ProbeError::Io {
            program: "cc".into(),
            source: io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"),
        };
        assert!(!err.is_launch_failure());
        assert!(!err.is_probe_failure());
        assert_eq!(err.to_string(), "I/O error while running 'cc': pipe closed");
    }

    #[test]
    fn test_into_result() {
        let ok = ProcessOutput {
            code: 0,
            output: "fine".into(),
        };
        assert_eq!(ok.into_result().unwrap(), "fine");

        let failed = ProcessOutput {
            code: 1,
            output: "error: boom".into(),
        };
        let err = failed.into_result().unwrap_err();
        assert!(err.is_probe_failure());
        assert_eq!(err.to_string(), "error: boom");
    }
}
