//! # Cli
//!
//! This module contains everything needed for parsing the CLI arguments
//! for Betsy.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Struct containing the CLI configuration for Betsy.
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Specify the log level of the toolchain.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

/// Enum for specifying the log level of Betsy.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// Also log warnings.
    #[value(alias("1"))]
    Warn,

    /// Also log information about the general state of the toolchain,
    /// e.g., which stage is currently running.
    #[value(alias("2"))]
    Info,

    /// Log everything which happens internally in the toolchain.
    #[value(alias("3"))]
    Debug,

    /// Log extra information. This can include more precise debug
    /// output or even non-important errors.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Simulate the program.
    Sim(RunArgs),

    /// Compile the program to 'out.c' in the current directory.
    Com(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// The path to the betsy source file.
    #[arg(index = 1)]
    pub file: std::path::PathBuf,

    /// Whether to dump the parsed program (for debugging).
    #[arg(long)]
    pub dump_parsed: bool,
}
