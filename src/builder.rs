//! Task queue construction.
//!
//! Builds one [`Task`] per command × target × port combination and
//! substitutes the recognized placeholders into each command template.
//!
//! | placeholder      | value                                              |
//! |------------------|----------------------------------------------------|
//! | `_target_`       | current target                                     |
//! | `_host_`         | current target                                     |
//! | `_cleantarget_`  | target with scheme removed, `/` and `:` as `-`     |
//! | `_port_`         | current port                                       |
//! | `_realport_`     | real port at the same position as the port         |
//! | `_output_`       | output directory, no trailing `/`                  |
//! | `_proto_`        | protocol string                                    |
//! | `_random_`       | a file from the random directory, drawn per task   |
//! | `_proxy_`        | next proxy in round-robin order                    |
//!
//! Placeholders without a value, and any other token, are left verbatim.

use crate::config::EngineConfig;
use crate::error::{ConfigError, ConfigResult, Result};
use crate::types::{PortSpec, Task};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const TARGET: &str = "_target_";
pub const HOST: &str = "_host_";
pub const CLEAN_TARGET: &str = "_cleantarget_";
pub const PORT: &str = "_port_";
pub const REAL_PORT: &str = "_realport_";
pub const OUTPUT: &str = "_output_";
pub const PROTO: &str = "_proto_";
pub const RANDOM: &str = "_random_";
pub const PROXY: &str = "_proxy_";

/// Expands command templates into the task queue.
pub struct TaskBuilder<'a> {
    config: &'a EngineConfig,
    random_files: Vec<String>,
}

impl<'a> TaskBuilder<'a> {
    /// Create a builder, listing the random directory if one is configured.
    pub fn new(config: &'a EngineConfig) -> ConfigResult<Self> {
        let random_files = match &config.random_dir {
            Some(dir) => list_random_files(dir)?,
            None => Vec::new(),
        };

        Ok(Self {
            config,
            random_files,
        })
    }

    /// Replace the `_random_` candidates.
    pub fn with_random_files(mut self, files: Vec<String>) -> Self {
        self.random_files = files;
        self
    }

    /// Build the queue, drawing `_random_` values from the thread RNG.
    pub fn build(
        &self,
        targets: &[String],
        ports: &PortSpec,
        real_ports: &PortSpec,
        commands: &[String],
    ) -> Result<Vec<Task>> {
        self.build_with_rng(targets, ports, real_ports, commands, &mut rand::thread_rng())
    }

    /// Build the queue with an explicit RNG.
    ///
    /// Tasks are ordered command-major, then by target, then by port, and
    /// numbered from 0 in that order.
    pub fn build_with_rng<R: Rng + ?Sized>(
        &self,
        targets: &[String],
        ports: &PortSpec,
        real_ports: &PortSpec,
        commands: &[String],
        rng: &mut R,
    ) -> Result<Vec<Task>> {
        if commands.is_empty() {
            return Err(ConfigError::EmptyTaskProduct("no command templates".to_string()).into());
        }
        if targets.is_empty() {
            return Err(ConfigError::EmptyTaskProduct(
                "no targets left after exclusions".to_string(),
            )
            .into());
        }
        if !real_ports.is_empty() && real_ports.len() != ports.len() {
            return Err(ConfigError::RealPortMismatch {
                ports: ports.len(),
                real_ports: real_ports.len(),
            }
            .into());
        }

        let slots: Vec<Option<usize>> = if ports.is_empty() {
            vec![None]
        } else {
            (0..ports.len()).map(Some).collect()
        };

        let output = self.config.output_placeholder();
        let mut tasks = Vec::with_capacity(commands.len() * targets.len() * slots.len());

        for template in commands {
            for target in targets {
                let clean = clean_target(target);
                for slot in &slots {
                    let id = tasks.len();
                    let port = slot.and_then(|i| ports.get(i));
                    let real_port = slot.and_then(|i| real_ports.get(i));
                    let proxy = self.proxy_for(id);
                    let random = self.random_files.choose(rng).map(String::as_str);

                    let command = substitute(
                        template,
                        &[
                            (TARGET, Some(target.as_str())),
                            (HOST, Some(target.as_str())),
                            (CLEAN_TARGET, Some(clean.as_str())),
                            (PORT, port),
                            (REAL_PORT, real_port),
                            (OUTPUT, output.as_deref()),
                            (PROTO, self.config.proto.as_deref()),
                            (RANDOM, random),
                            (PROXY, proxy),
                        ],
                    );

                    let task = Task::new(id, command, target.clone(), self.config.timeout)
                        .with_port(port.map(str::to_string))
                        .with_real_port(real_port.map(str::to_string))
                        .with_proxy(proxy.map(str::to_string))
                        .with_output_file(self.output_file(id, &clean, port));
                    tasks.push(task);
                }
            }
        }

        info!(
            tasks = tasks.len(),
            commands = commands.len(),
            targets = targets.len(),
            ports = ports.len(),
            "built task queue"
        );
        Ok(tasks)
    }

    fn proxy_for(&self, id: usize) -> Option<&str> {
        let proxies = &self.config.proxies;
        (!proxies.is_empty()).then(|| proxies[id % proxies.len()].as_str())
    }

    /// `<output>/<id>_<cleantarget>[_<port>].log`; the id keeps names unique.
    fn output_file(&self, id: usize, clean: &str, port: Option<&str>) -> Option<PathBuf> {
        self.config.output_dir.as_ref().map(|dir| {
            let name = match port {
                Some(port) => format!("{id}_{clean}_{}.log", clean_target(port)),
                None => format!("{id}_{clean}.log"),
            };
            dir.join(name)
        })
    }
}

/// Replace every occurrence of each token that has a value, in one pass
/// over the template. Inserted values are never scanned again, so a target
/// that happens to contain `_port_` comes through as written.
pub fn substitute(template: &str, vars: &[(&str, Option<&str>)]) -> String {
    let mut command = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(c) = rest.chars().next() {
        let hit = vars.iter().find_map(|&(token, value)| {
            let value = value?;
            rest.strip_prefix(token).map(|tail| (value, tail))
        });
        match hit {
            Some((value, tail)) => {
                command.push_str(value);
                rest = tail;
            }
            None => {
                command.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    command
}

/// Make a target safe for file names: drop a `scheme://` prefix and turn
/// `/` and `:` into `-`.
pub fn clean_target(target: &str) -> String {
    let bare = target
        .split_once("://")
        .map_or(target, |(_, rest)| rest);
    bare.trim_end_matches('/').replace(['/', ':'], "-")
}

fn list_random_files(dir: &Path) -> ConfigResult<Vec<String>> {
    let read_failed = |source| ConfigError::ReadFailed {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_failed)? {
        let path = entry.map_err(read_failed)?.path();
        if path.is_file() {
            files.push(path.to_string_lossy().into_owned());
        }
    }

    if files.is_empty() {
        return Err(ConfigError::EmptySpec("random directory"));
    }
    files.sort();
    debug!(dir = %dir.display(), files = files.len(), "loaded random files");
    Ok(files)
}
