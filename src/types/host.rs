//! Host specification tokens.
//!
//! A raw host argument may hold several comma-joined specifications. Each
//! piece is classified once into a [`HostSpec`], which the range expander
//! then dispatches on:
//! - Hostnames (example.com, localhost)
//! - CIDR blocks (192.168.1.0/24)
//! - Dash ranges (10.0.0.1-254, 10.0.0.1-10.0.3.5)
//! - Globs (10.0.*.1)
//! - Anything else, kept as a literal

use std::fmt;

/// One classified host specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostSpec {
    /// Last dot-segment starts with a letter; never range-expanded.
    Hostname(String),
    /// `a.b.c.d/n` block.
    Cidr(String),
    /// `a.b.c.d-e` or `a.b.c.d-e.f.g.h`.
    DashRange(String),
    /// Pattern containing `*`.
    Glob(String),
    /// Single value passed through unchanged.
    Literal(String),
}

impl HostSpec {
    /// Remove spaces from a raw argument and split it into individual specs.
    ///
    /// Empty pieces (`"a,,b"`, trailing commas) are dropped.
    pub fn split(raw: &str) -> Vec<String> {
        let compact: String = raw.chars().filter(|c| *c != ' ').collect();
        compact
            .split(',')
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Classify a single (already split) token.
    ///
    /// With `no_cidr` set, a token containing `/` is not treated as a block
    /// and falls through to the remaining rules.
    pub fn classify(token: &str, no_cidr: bool) -> Self {
        let token = token.to_string();

        if looks_like_hostname(&token) {
            Self::Hostname(token)
        } else if !no_cidr && token.contains('/') {
            Self::Cidr(token)
        } else if token.contains('-') {
            Self::DashRange(token)
        } else if token.contains('*') {
            Self::Glob(token)
        } else {
            Self::Literal(token)
        }
    }

    /// Classify a token with CIDR expansion enabled.
    pub fn parse(token: &str) -> Self {
        Self::classify(token, false)
    }

    /// The raw token this spec was built from.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Hostname(s)
            | Self::Cidr(s)
            | Self::DashRange(s)
            | Self::Glob(s)
            | Self::Literal(s) => s,
        }
    }

    /// Short name of the variant, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hostname(_) => "hostname",
            Self::Cidr(_) => "cidr",
            Self::DashRange(_) => "range",
            Self::Glob(_) => "glob",
            Self::Literal(_) => "literal",
        }
    }
}

impl fmt::Display for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// True when the last dot-separated segment starts with a letter.
fn looks_like_hostname(token: &str) -> bool {
    token
        .rsplit('.')
        .next()
        .and_then(|segment| segment.chars().next())
        .is_some_and(|c| c.is_alphabetic())
}
