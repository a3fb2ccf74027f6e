// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

//==============================================================================
// Defaults
//==============================================================================

const DEFAULT_POOL_SIZE: usize = 25;
const DEFAULT_FILE_TIME_SECS: u64 = 3600;
const DEFAULT_FILE_PATH: &str = "dat/";

//==============================================================================
// Config
//==============================================================================

/// Command-line surface for the collector: a required port followed by
/// pool size, rotation interval, and output path overrides.
///
/// `clap` handles "print usage, exit 1" on misuse without any hand-rolled
/// argument parsing.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "speccollect",
    about = "Collects compressed RTL-SDR spectrum-sensing records over TCP and stores them as CSV."
)]
pub struct Cli {
    /// TCP port to listen on.
    pub portnumber: u16,

    /// Maximal number of simultaneous connections.
    #[arg(short = 'p', long = "pool-size", default_value_t = DEFAULT_POOL_SIZE)]
    pub pool_size: usize,

    /// Time in seconds after which to split files.
    #[arg(short = 't', long = "file-time", default_value_t = DEFAULT_FILE_TIME_SECS)]
    pub file_time_secs: u64,

    /// Path to the folder where collected data is stored.
    #[arg(short = 'f', long = "file-path", default_value = DEFAULT_FILE_PATH)]
    pub file_path: PathBuf,

    /// Increase log verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

/// Parsed, immutable configuration threaded into the acceptor at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub pool_size: usize,
    pub file_time: Duration,
    pub file_path: PathBuf,
    pub verbosity: u8,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            port: cli.portnumber,
            pool_size: cli.pool_size,
            file_time: Duration::from_secs(cli.file_time_secs),
            file_path: cli.file_path,
            verbosity: cli.verbosity,
        }
    }
}

impl Config {
    /// Parses `std::env::args()`, exiting with status 1 and a usage
    /// message on misuse.
    ///
    /// `Cli::parse()` would do this itself, but it exits with clap's own
    /// default status (2); SPEC_FULL.md requires 1 for argument misuse, so
    /// parsing is done with `try_parse_from` and the exit is handled here
    /// explicitly instead of delegating to clap's built-in exit path.
    pub fn from_args() -> Self {
        match Cli::try_parse_from(std::env::args()) {
            Ok(cli) => cli.into(),
            Err(err) => {
                eprint!("{}", err);
                process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    /// Only the port is required; the remaining three carry the documented
    /// defaults.
    #[test]
    fn defaults_applied_when_only_port_given() {
        let cli = Cli::parse_from(["speccollect", "9000"]);
        let config: Config = cli.into();
        assert_eq!(config.port, 9000);
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.file_time, Duration::from_secs(DEFAULT_FILE_TIME_SECS));
        assert_eq!(config.file_path, PathBuf::from(DEFAULT_FILE_PATH));
    }

    /// Explicit options override every default independently.
    #[test]
    fn explicit_options_override_defaults() {
        let cli = Cli::parse_from(["speccollect", "9000", "-p", "2", "-t", "10", "-f", "out/"]);
        let config: Config = cli.into();
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.file_time, Duration::from_secs(10));
        assert_eq!(config.file_path, PathBuf::from("out/"));
    }

    /// A missing positional port is a usage error, not a panic.
    #[test]
    fn missing_port_is_a_usage_error() {
        let result = Cli::try_parse_from(["speccollect"]);
        assert!(result.is_err());
    }

    /// A non-numeric pool size is a usage error.
    #[test]
    fn non_numeric_pool_size_is_a_usage_error() {
        let result = Cli::try_parse_from(["speccollect", "9000", "-p", "not-a-number"]);
        assert!(result.is_err());
    }
}
