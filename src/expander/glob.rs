//! Glob expansion strategies.
//!
//! `*` matches any run of characters, including none. Two sources of
//! candidates are provided: the IPv4 space, matched octet by octet, and a
//! fixed list of known hosts.

use super::{ExpandOptions, Expander};
use crate::error::{RangeError, RangeResult};

/// Matches each of the four octet patterns against `0..=255`.
///
/// `10.0.*.1` yields 256 hosts, `10.0.0.1*` yields `10.0.0.1`,
/// `10.0.0.10..=19` and `10.0.0.100..=199`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OctetGlobExpander;

impl Expander for OctetGlobExpander {
    fn expand(&self, spec: &str, options: &ExpandOptions) -> RangeResult<Vec<String>> {
        let patterns: Vec<&str> = spec.split('.').collect();
        if patterns.len() != 4
            || patterns.iter().any(|p| {
                p.is_empty() || !p.chars().all(|c| c.is_ascii_digit() || c == '*')
            })
        {
            return Err(RangeError::InvalidGlob(spec.to_string()));
        }

        let candidates: Vec<Vec<u8>> = patterns
            .iter()
            .map(|pattern| {
                (0..=u8::MAX)
                    .filter(|octet| wildcard_match(pattern, &octet.to_string()))
                    .collect()
            })
            .collect();

        let count: u64 = candidates.iter().map(|c| c.len() as u64).product();
        options.check_size(spec, count)?;

        let mut hosts = Vec::with_capacity(count as usize);
        for a in &candidates[0] {
            for b in &candidates[1] {
                for c in &candidates[2] {
                    for d in &candidates[3] {
                        hosts.push(format!("{a}.{b}.{c}.{d}"));
                    }
                }
            }
        }
        Ok(hosts)
    }
}

/// Matches the pattern against a caller-supplied host list.
#[derive(Debug, Clone, Default)]
pub struct HostListGlobExpander {
    hosts: Vec<String>,
}

impl HostListGlobExpander {
    /// Create a strategy over `hosts`, matched in the given order.
    pub fn new(hosts: Vec<String>) -> Self {
        Self { hosts }
    }
}

impl Expander for HostListGlobExpander {
    fn expand(&self, spec: &str, options: &ExpandOptions) -> RangeResult<Vec<String>> {
        let hosts: Vec<String> = self
            .hosts
            .iter()
            .filter(|host| wildcard_match(spec, host))
            .cloned()
            .collect();
        options.check_size(spec, hosts.len() as u64)?;
        Ok(hosts)
    }
}

/// Match `candidate` against `pattern`, where `*` matches any run.
pub fn wildcard_match(pattern: &str, candidate: &str) -> bool {
    let (p, c) = (pattern.as_bytes(), candidate.as_bytes());
    let (mut pi, mut ci) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ci < c.len() {
        if pi < p.len() && p[pi] == b'*' {
            backtrack = Some((pi, ci));
            pi += 1;
        } else if pi < p.len() && p[pi] == c[ci] {
            pi += 1;
            ci += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ci = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&b| b == b'*')
}
