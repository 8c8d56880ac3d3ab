//! Host range expansion.
//!
//! [`RangeExpander`] splits a raw host argument into individual
//! [`HostSpec`]s and dispatches each one to an [`Expander`] strategy:
//! - [`CidrExpander`] for `a.b.c.d/n` blocks
//! - [`DashRangeExpander`] for `a.b.c.d-e` and `a.b.c.d-e.f.g.h`
//! - a glob strategy, [`OctetGlobExpander`] by default
//!
//! Hostnames and literals are returned unchanged. Results keep discovery
//! order; deduplication happens in the resolver.

mod cidr;
mod dash;
mod glob;

pub use cidr::CidrExpander;
pub use dash::DashRangeExpander;
pub use glob::{wildcard_match, HostListGlobExpander, OctetGlobExpander};

use crate::error::{RangeError, RangeResult};
use crate::types::HostSpec;
use tracing::trace;

/// Default cap on the number of hosts a single spec may expand to (a /16).
pub const DEFAULT_MAX_HOSTS: u64 = 65_536;

/// Options that influence expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Leave `/` tokens unexpanded.
    pub no_cidr: bool,
    /// Largest expansion accepted for one spec; `None` disables the check.
    pub max_hosts: Option<u64>,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            no_cidr: false,
            max_hosts: Some(DEFAULT_MAX_HOSTS),
        }
    }
}

impl ExpandOptions {
    /// Reject expansions above `max_hosts`.
    pub fn check_size(&self, spec: &str, count: u64) -> RangeResult<()> {
        match self.max_hosts {
            Some(max) if count > max => Err(RangeError::TooLarge {
                spec: spec.to_string(),
                count,
                max,
            }),
            _ => Ok(()),
        }
    }
}

/// A strategy turning one spec of a given shape into concrete hosts.
pub trait Expander: Send + Sync {
    /// Expand `spec`. Either the whole spec expands or an error is returned.
    fn expand(&self, spec: &str, options: &ExpandOptions) -> RangeResult<Vec<String>>;
}

/// Dispatches host specs to the matching expansion strategy.
pub struct RangeExpander {
    options: ExpandOptions,
    cidr: Box<dyn Expander>,
    range: Box<dyn Expander>,
    glob: Box<dyn Expander>,
}

impl RangeExpander {
    /// Create an expander with the built-in strategies.
    pub fn new(options: ExpandOptions) -> Self {
        Self {
            options,
            cidr: Box::new(CidrExpander),
            range: Box::new(DashRangeExpander),
            glob: Box::new(OctetGlobExpander),
        }
    }

    /// Replace the glob strategy.
    pub fn with_glob(mut self, glob: impl Expander + 'static) -> Self {
        self.glob = Box::new(glob);
        self
    }

    /// Expand a raw, possibly comma-joined, host argument.
    pub fn expand(&self, raw: &str) -> RangeResult<Vec<String>> {
        let mut hosts = Vec::new();

        for token in HostSpec::split(raw) {
            let spec = HostSpec::classify(&token, self.options.no_cidr);
            let expanded = self.expand_spec(&spec)?;
            trace!(spec = %spec, kind = spec.kind(), hosts = expanded.len(), "expanded host spec");
            hosts.extend(expanded);
        }

        Ok(hosts)
    }

    /// Expand one classified spec.
    pub fn expand_spec(&self, spec: &HostSpec) -> RangeResult<Vec<String>> {
        match spec {
            HostSpec::Hostname(value) | HostSpec::Literal(value) => Ok(vec![value.clone()]),
            HostSpec::Cidr(value) => self.cidr.expand(value, &self.options),
            HostSpec::DashRange(value) => self.range.expand(value, &self.options),
            HostSpec::Glob(value) => self.glob.expand(value, &self.options),
        }
    }
}

impl Default for RangeExpander {
    fn default() -> Self {
        Self::new(ExpandOptions::default())
    }
}

/// Parse a dotted quad into its four octets.
pub(crate) fn parse_octets(raw: &str) -> RangeResult<[u8; 4]> {
    let parts: Vec<&str> = raw.split('.').collect();
    if parts.len() != 4 {
        return Err(RangeError::InvalidRange(raw.to_string()));
    }

    let mut octets = [0u8; 4];
    for (octet, part) in octets.iter_mut().zip(parts) {
        *octet = parse_octet(part)?;
    }
    Ok(octets)
}

/// Parse a single decimal octet.
pub(crate) fn parse_octet(raw: &str) -> RangeResult<u8> {
    raw.parse()
        .map_err(|_| RangeError::InvalidNumber(raw.to_string()))
}
