//! Command-line interface definitions.
//!
//! Uses `clap` derive macros for declarative argument parsing. Settings from
//! the config file fill in anything not given on the command line.

mod run;

pub use run::execute;

use crate::config::{AppSettings, EngineConfig};
use crate::error::{ConfigError, ConfigResult};
use crate::expander::ExpandOptions;
use crate::output::{OutputFormat, ReportOptions};
use crate::types::{read_lines, InputSource, PortSpec};
use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Interlace - fan command templates out across hosts and ports.
///
/// Every command template is run once per target and port, with
/// placeholders such as `_target_`, `_port_` and `_output_` substituted.
#[derive(Parser, Debug)]
#[command(name = "interlace")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run command templates across many targets with bounded concurrency", long_about = None)]
#[command(group(ArgGroup::new("targets").required(true).args(["target", "target_list"])))]
#[command(group(ArgGroup::new("commands").required(true).args(["command", "command_list"])))]
pub struct Cli {
    /// Target spec: host, IP, CIDR, dash range, glob or comma list
    #[arg(short = 't', long, value_name = "SPEC", conflicts_with = "target_list")]
    pub target: Option<String>,

    /// File with one target spec per line
    #[arg(long = "target-list", value_name = "FILE")]
    pub target_list: Option<PathBuf>,

    /// Targets to leave out, in the same syntax as --target
    #[arg(short = 'e', long, value_name = "SPEC", conflicts_with = "exclusion_list")]
    pub exclusion: Option<String>,

    /// File with one exclusion spec per line
    #[arg(long = "exclusion-list", value_name = "FILE")]
    pub exclusion_list: Option<PathBuf>,

    /// Command template to run
    #[arg(short = 'c', long, value_name = "TEMPLATE", conflicts_with = "command_list")]
    pub command: Option<String>,

    /// File with one command template per line
    #[arg(long = "command-list", value_name = "FILE")]
    pub command_list: Option<PathBuf>,

    /// Number of commands run at once [default: 5]
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Per-command timeout in seconds [default: 600]
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// File with one proxy per line, rotated through _proxy_
    #[arg(long = "proxy-list", value_name = "FILE")]
    pub proxy_list: Option<PathBuf>,

    /// Output directory, substituted for _output_
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Ports: single, comma list or range (e.g. "80,443" or "8000-8010")
    #[arg(short = 'p', long, value_name = "PORTS")]
    pub port: Option<String>,

    /// Protocol, substituted for _proto_
    #[arg(long, value_name = "PROTO")]
    pub proto: Option<String>,

    /// Real ports paired one-to-one with --port, substituted for _realport_
    #[arg(long, value_name = "PORTS")]
    pub realport: Option<String>,

    /// Directory whose files are drawn at random for _random_
    #[arg(long, value_name = "DIR")]
    pub random: Option<PathBuf>,

    /// Treat CIDR notation as a literal target
    #[arg(long = "no-cidr")]
    pub no_cidr: bool,

    /// Strip colours from command output
    #[arg(long = "no-colour", alias = "no-color")]
    pub no_colour: bool,

    /// Hide the progress bar
    #[arg(long = "no-bar")]
    pub no_bar: bool,

    /// Result format
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Largest number of hosts one spec may expand to, 0 for no limit
    #[arg(long = "max-hosts", value_name = "N")]
    pub max_hosts: Option<u64>,

    /// Path to a settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only print command output
    #[arg(short, long, conflicts_with = "verbose")]
    pub silent: bool,

    /// Show commands and debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Load settings from `--config` or the default location.
    pub fn settings(&self) -> ConfigResult<AppSettings> {
        match &self.config {
            Some(path) => AppSettings::load_from(path),
            None => match AppSettings::load() {
                Err(ConfigError::DirectoryNotFound) => {
                    warn!("no configuration directory, using built-in defaults");
                    Ok(AppSettings::default())
                }
                other => other,
            },
        }
    }

    /// Build the run configuration, flags taking precedence over settings.
    pub fn engine_config(&self, settings: &AppSettings) -> ConfigResult<EngineConfig> {
        let max_hosts = self.max_hosts.unwrap_or(settings.max_hosts);
        let expand = ExpandOptions {
            no_cidr: self.no_cidr,
            max_hosts: (max_hosts > 0).then_some(max_hosts),
        };

        let mut config = EngineConfig::new()
            .with_threads(self.threads.unwrap_or(settings.threads))
            .with_timeout(Duration::from_secs(
                self.timeout.unwrap_or(settings.timeout_secs),
            ))
            .with_expand_options(expand);

        if let Some(path) = &self.proxy_list {
            config = config.with_proxies(read_lines(path)?);
        }
        if let Some(dir) = &self.output {
            config = config.with_output_dir(dir);
        }
        if let Some(dir) = &self.random {
            config = config.with_random_dir(dir);
        }
        if let Some(proto) = &self.proto {
            config = config.with_proto(proto);
        }

        config.validate()?;
        Ok(config)
    }

    /// Presentation options, flags taking precedence over settings.
    pub fn report_options(&self, settings: &AppSettings) -> ConfigResult<ReportOptions> {
        let format = match self.format {
            Some(format) => format,
            None => OutputFormat::from_str(&settings.format, true).map_err(|_| {
                ConfigError::InvalidFormat(format!("unknown format '{}'", settings.format))
            })?,
        };

        Ok(ReportOptions {
            format,
            silent: self.silent,
            verbose: self.verbose,
            no_colour: self.no_colour || settings.no_colour,
            no_bar: self.no_bar || settings.no_bar,
        })
    }

    pub fn target_source(&self) -> ConfigResult<InputSource> {
        InputSource::require(self.target.clone(), self.target_list.clone(), "target")
    }

    pub fn exclusion_source(&self) -> Option<InputSource> {
        InputSource::from_args(self.exclusion.clone(), self.exclusion_list.clone())
    }

    pub fn command_source(&self) -> ConfigResult<InputSource> {
        InputSource::require(self.command.clone(), self.command_list.clone(), "command")
    }

    /// Expanded `--port`, empty when not given.
    pub fn ports(&self) -> crate::Result<PortSpec> {
        Ok(self.port.as_deref().unwrap_or("").parse()?)
    }

    /// Expanded `--realport`, empty when not given.
    pub fn real_ports(&self) -> crate::Result<PortSpec> {
        Ok(self.realport.as_deref().unwrap_or("").parse()?)
    }
}
