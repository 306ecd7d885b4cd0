//! Toolchain probes.
//!
//! Each probe writes a small program into the build directory, runs the
//! configured compiler (and linker) on it and removes every file it touched,
//! whether or not the toolchain accepted the input. Probe file names are
//! fixed, so probes must not run concurrently in one build directory.

use crate::error::Result;
use crate::process::{ProcessOutput, Runner, SystemRunner};
use crate::store::OptionStore;
use crate::temp_file::TempFile;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Object file produced by compile-only probes and the first stage of two-step probes.
pub const OBJECT_NAME: &str = "atto-test.o";

/// Executable produced by linking probes.
pub const EXECUTABLE_NAME: &str = "atto-test";

/// A program every working toolchain accepts.
pub const TRIVIAL_PROGRAM: &str = "int main() {}\n";

/// Source language a probe is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    C,
    Cxx,
}

impl Dialect {
    /// Option holding the compiler command.
    pub fn compiler_var(self) -> &'static str {
        match self {
            Dialect::C => "CC",
            Dialect::Cxx => "CXX",
        }
    }

    /// Option holding compiler-proper flags.
    pub fn flags_var(self) -> &'static str {
        match self {
            Dialect::C => "CFLAGS",
            Dialect::Cxx => "CXXFLAGS",
        }
    }

    pub fn source_name(self) -> &'static str {
        match self {
            Dialect::C => "atto-test.c",
            Dialect::Cxx => "atto-test.cxx",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::C => write!(f, "C"),
            Dialect::Cxx => write!(f, "C++"),
        }
    }
}

/// Flags appended after the configured value of each category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraFlags {
    /// Appended to `CFLAGS` / `CXXFLAGS`.
    pub compile: Vec<String>,
    /// Appended to `CPPFLAGS`.
    pub preprocess: Vec<String>,
    /// Appended to `LDFLAGS`.
    pub link: Vec<String>,
    /// Appended to `LDLIBS`.
    pub libs: Vec<String>,
}

/// One probe attempt: a program body in a dialect plus any extra flags.
#[derive(Debug, Clone)]
pub struct ProbeRequest<'a> {
    pub dialect: Dialect,
    pub body: &'a str,
    pub extra: ExtraFlags,
}

impl<'a> ProbeRequest<'a> {
    pub fn new(dialect: Dialect, body: &'a str) -> Self {
        Self {
            dialect,
            body,
            extra: ExtraFlags::default(),
        }
    }

    pub fn with_extra(mut self, extra: ExtraFlags) -> Self {
        self.extra = extra;
        self
    }
}

/// Everything a probe or option check needs: where to run, the options, and how to run.
pub struct ProbeContext {
    builddir: PathBuf,
    pub vars: OptionStore,
    runner: Box<dyn Runner>,
}

impl ProbeContext {
    /// Context that runs the real toolchain inside `builddir`.
    pub fn new(builddir: impl Into<PathBuf>) -> Self {
        Self::with_runner(builddir, SystemRunner)
    }

    pub fn with_runner(builddir: impl Into<PathBuf>, runner: impl Runner + 'static) -> Self {
        Self {
            builddir: builddir.into(),
            vars: OptionStore::new(),
            runner: Box::new(runner),
        }
    }

    pub fn builddir(&self) -> &Path {
        &self.builddir
    }

    fn exec(&self, args: &[String]) -> Result<ProcessOutput> {
        self.runner.run(args, &self.builddir)
    }
}

fn group(vars: &OptionStore, name: &str, extra: &[String]) -> Result<Vec<String>> {
    let mut tokens = vars.get(name)?.to_vec();
    tokens.extend_from_slice(extra);
    Ok(tokens)
}

/// `CC CFLAGS CPPFLAGS -c -o atto-test.o atto-test.c`
pub fn compile_args(vars: &OptionStore, req: &ProbeRequest<'_>) -> Result<Vec<String>> {
    let d = req.dialect;
    let mut args = vars.get(d.compiler_var())?.to_vec();
    args.extend(group(vars, d.flags_var(), &req.extra.compile)?);
    args.extend(group(vars, "CPPFLAGS", &req.extra.preprocess)?);
    args.extend(
        ["-c", "-o", OBJECT_NAME, d.source_name()]
            .iter()
            .map(|s| s.to_string()),
    );
    Ok(args)
}

/// `CC CFLAGS CPPFLAGS LDFLAGS atto-test.c LDLIBS -o atto-test`
pub fn compile_link_args(vars: &OptionStore, req: &ProbeRequest<'_>) -> Result<Vec<String>> {
    let d = req.dialect;
    let mut args = vars.get(d.compiler_var())?.to_vec();
    args.extend(group(vars, d.flags_var(), &req.extra.compile)?);
    args.extend(group(vars, "CPPFLAGS", &req.extra.preprocess)?);
    args.extend(group(vars, "LDFLAGS", &req.extra.link)?);
    args.push(d.source_name().to_string());
    args.extend(group(vars, "LDLIBS", &req.extra.libs)?);
    args.push("-o".to_string());
    args.push(EXECUTABLE_NAME.to_string());
    Ok(args)
}

/// `CC LDFLAGS <inputs> LDLIBS -o atto-test`
pub fn link_args(
    vars: &OptionStore,
    dialect: Dialect,
    inputs: &[String],
    extra: &ExtraFlags,
) -> Result<Vec<String>> {
    let mut args = vars.get(dialect.compiler_var())?.to_vec();
    args.extend(group(vars, "LDFLAGS", &extra.link)?);
    args.extend_from_slice(inputs);
    args.extend(group(vars, "LDLIBS", &extra.libs)?);
    args.push("-o".to_string());
    args.push(EXECUTABLE_NAME.to_string());
    Ok(args)
}

/// Compiles `req.body` to an object file without linking.
pub fn try_compile(ctx: &ProbeContext, req: &ProbeRequest<'_>) -> Result<()> {
    debug!(dialect = %req.dialect, "probe: compile");
    let args = compile_args(&ctx.vars, req)?;
    let dir = ctx.builddir();
    let output = TempFile::scope(dir.join(req.dialect.source_name()), Some(req.body), |_| {
        TempFile::scope(dir.join(OBJECT_NAME), None, |_| ctx.exec(&args))
    })?;
    output.into_result()?;
    Ok(())
}

/// Compiles and links `req.body` into an executable with a single driver invocation.
pub fn try_compile_link(ctx: &ProbeContext, req: &ProbeRequest<'_>) -> Result<()> {
    debug!(dialect = %req.dialect, "probe: compile+link");
    let args = compile_link_args(&ctx.vars, req)?;
    let dir = ctx.builddir();
    let output = TempFile::scope(dir.join(req.dialect.source_name()), Some(req.body), |_| {
        TempFile::scope(dir.join(EXECUTABLE_NAME), None, |_| ctx.exec(&args))
    })?;
    output.into_result()?;
    Ok(())
}

/// Compiles `req.body` to an object file, then links that object in a second invocation.
///
/// The object file outlives both steps and is removed even if linking fails.
pub fn try_compile_link2(ctx: &ProbeContext, req: &ProbeRequest<'_>) -> Result<()> {
    debug!(dialect = %req.dialect, "probe: compile, then link");
    let compile = compile_args(&ctx.vars, req)?;
    let link = link_args(
        &ctx.vars,
        req.dialect,
        &[OBJECT_NAME.to_string()],
        &req.extra,
    )?;
    let dir = ctx.builddir();

    TempFile::scope(dir.join(OBJECT_NAME), None, |_| {
        TempFile::scope(dir.join(req.dialect.source_name()), Some(req.body), |_| {
            ctx.exec(&compile)
        })?
        .into_result()?;
        run_link(ctx, &link)
    })
}

/// Links existing `inputs` (relative to the build directory) into an executable.
pub fn try_link_only(
    ctx: &ProbeContext,
    dialect: Dialect,
    inputs: &[String],
    extra: &ExtraFlags,
) -> Result<()> {
    debug!(%dialect, "probe: link");
    let args = link_args(&ctx.vars, dialect, inputs, extra)?;
    run_link(ctx, &args)
}

fn run_link(ctx: &ProbeContext, args: &[String]) -> Result<()> {
    TempFile::scope(ctx.builddir().join(EXECUTABLE_NAME), None, |_| {
        ctx.exec(args)
    })?
    .into_result()?;
    Ok(())
}

/// Runs every probe variant for `dialect` against [`TRIVIAL_PROGRAM`], stopping at the first failure.
pub fn check_toolchain(ctx: &ProbeContext, dialect: Dialect) -> Result<()> {
    let req = ProbeRequest::new(dialect, TRIVIAL_PROGRAM);
    try_compile(ctx, &req)?;
    try_compile_link(ctx, &req)?;
    try_compile_link2(ctx, &req)
}
