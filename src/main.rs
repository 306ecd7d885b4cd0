//! # attoconf CLI Entry Point
//!
//! Parses `VAR=value` assignments and flags with clap, checks every option
//! against the host toolchain, and writes `config.make` into the build
//! directory.
//!
//! Option values come from, in increasing priority:
//! - built-in defaults (`CC=gcc`, `CXX=g++`, empty flag lists)
//! - the `[vars]` table of `attoconf.toml`
//! - assignments on the command line

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use attoconf::config;
use attoconf::options::Registry;
use attoconf::output;
use attoconf::ui;
use attoconf::{Dialect, ProbeContext};

#[derive(Parser)]
#[command(name = "attoconf")]
#[command(about = "Check C/C++ toolchain flags and write config.make", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct Cli {
    /// Option assignments, e.g. CC=clang "CFLAGS=-O2 -g"
    #[arg(value_name = "VAR=VALUE")]
    assignments: Vec<String>,
    /// Directory to run probes in and write config.make to [default: .]
    #[arg(short = 'B', long)]
    builddir: Option<PathBuf>,
    /// Configuration file [default: attoconf.toml if present]
    #[arg(long)]
    config: Option<PathBuf>,
    /// Languages to check
    #[arg(long, value_enum, default_value_t = Lang::Both)]
    lang: Lang,
    /// List the available variables and exit
    #[arg(long)]
    list_vars: bool,
    /// Print the checked variables as JSON instead of writing config.make
    #[arg(long)]
    json: bool,
    /// Show every toolchain command
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Lang {
    C,
    Cxx,
    Both,
}

impl Lang {
    fn dialects(self) -> &'static [Dialect] {
        match self {
            Lang::C => &[Dialect::C],
            Lang::Cxx => &[Dialect::Cxx],
            Lang::Both => &[Dialect::C, Dialect::Cxx],
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "attoconf=debug"
    } else {
        "attoconf=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let registry = Registry::for_dialects(cli.lang.dialects());

    if cli.list_vars {
        ui::options_table(&registry).print();
        return Ok(());
    }

    let config = config::load_config(cli.config.as_deref())?;
    let builddir = cli
        .builddir
        .or(config.builddir)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&builddir)
        .with_context(|| format!("Failed to create {}", builddir.display()))?;

    let mut values = config.vars;
    config::apply_assignments(&mut values, &cli.assignments)?;

    let quiet = cli.json;
    if !quiet {
        println!(
            "{} Checking toolchain in {}",
            "🔧".cyan(),
            builddir.display()
        );
    }

    let mut ctx = ProbeContext::new(&builddir);
    let checked = registry.finalize_with(&mut ctx, &values, |option| {
        if !quiet {
            println!("   {} {}", "✓".green(), option.name);
        }
    });
    if let Err(e) = checked {
        eprintln!("{} {} rejected:", "x".red(), e.option().bold());
        eprintln!("{}", e.to_string().trim_end());
        return Err(anyhow::anyhow!("Configuration failed"));
    }

    if cli.json {
        println!("{}", output::render_json(&ctx.vars)?);
    } else {
        let path = output::write_make(&builddir, &ctx.vars)?;
        println!("{} Wrote {}", "✓".green(), path.display());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
