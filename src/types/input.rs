//! Literal-or-file inputs.
//!
//! Targets, exclusions and commands are each given either as a literal value
//! or as a path to a file holding one entry per line. In string form a file
//! reference carries a two-backtick prefix; that prefix therefore can never
//! start a literal value.

use crate::error::{ConfigError, ConfigResult};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix marking a string as "path to read" rather than a literal value.
pub const FILE_SENTINEL: &str = "``";

/// Where the entries of an input come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// The value itself is the single entry.
    Literal(String),
    /// One entry per non-blank line of this file.
    File(PathBuf),
}

impl InputSource {
    /// Pick the literal form if present, the file form otherwise. A literal
    /// may itself carry the file sentinel.
    pub fn from_args(literal: Option<String>, file: Option<PathBuf>) -> Option<Self> {
        literal
            .map(|value| Self::decode(&value))
            .or_else(|| file.map(Self::File))
    }

    /// Like [`InputSource::from_args`] for inputs that must be provided.
    pub fn require(
        literal: Option<String>,
        file: Option<PathBuf>,
        what: &'static str,
    ) -> ConfigResult<Self> {
        Self::from_args(literal, file).ok_or(ConfigError::MissingInput(what))
    }

    /// Decode the string form, honouring the file sentinel.
    pub fn decode(raw: &str) -> Self {
        match raw.strip_prefix(FILE_SENTINEL) {
            Some(path) => Self::File(PathBuf::from(path)),
            None => Self::Literal(raw.to_string()),
        }
    }

    /// Encode into the string form, prefixing file references.
    pub fn encode(&self) -> String {
        match self {
            Self::Literal(value) => value.clone(),
            Self::File(path) => format!("{FILE_SENTINEL}{}", path.display()),
        }
    }

    /// Read the entries of this input.
    ///
    /// A literal must not be blank. A file may legitimately be empty; the
    /// caller decides whether that leaves anything to do.
    pub fn entries(&self, what: &'static str) -> ConfigResult<Vec<String>> {
        match self {
            Self::Literal(value) => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(ConfigError::EmptySpec(what));
                }
                Ok(vec![value.to_string()])
            }
            Self::File(path) => read_lines(path),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// Read a plain-text list: lines trimmed, blank lines skipped.
pub fn read_lines(path: &Path) -> ConfigResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
