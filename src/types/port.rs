//! Port specifications.
//!
//! Ports are kept as strings: a port token may be protocol-qualified or
//! otherwise non-numeric, and only the dash form is interpreted. The same
//! expansion serves both `_port_` and `_realport_`.
//!
//! Supports formats like:
//! - Single token: "80", "tcp/80"
//! - Comma-separated: "80,443,8080" (split only, no further interpretation)
//! - Range: "1-1000"

use crate::error::{RangeError, RangeResult};
use std::fmt;
use std::str::FromStr;

/// Expand a port specification into an ordered list of port strings.
///
/// An empty (or all-whitespace) spec yields an empty list, meaning no port
/// substitution takes place.
pub fn expand_ports(spec: &str) -> RangeResult<Vec<String>> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Ok(Vec::new());
    }

    if spec.contains(',') {
        return Ok(spec
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect());
    }

    if let Some((start, end)) = spec.split_once('-') {
        let start = parse_bound(start)?;
        let end = parse_bound(end)?;
        if start >= end {
            return Err(RangeError::PortOrder { start, end });
        }
        return Ok((start..=end).map(|port| port.to_string()).collect());
    }

    Ok(vec![spec.to_string()])
}

fn parse_bound(raw: &str) -> RangeResult<i64> {
    let raw = raw.trim();
    raw.parse()
        .map_err(|_| RangeError::InvalidNumber(raw.to_string()))
}

/// An expanded, ordered port list.
///
/// Order matters: `_realport_` values are paired with ports by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSpec {
    ports: Vec<String>,
}

impl PortSpec {
    /// Create an empty port specification.
    pub const fn new() -> Self {
        Self { ports: Vec::new() }
    }

    /// Number of expanded ports.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// True when no port substitution applies.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Port at a position, used for positional pairing.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.ports.get(index).map(String::as_str)
    }
}

impl From<Vec<String>> for PortSpec {
    fn from(ports: Vec<String>) -> Self {
        Self { ports }
    }
}

impl FromStr for PortSpec {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        expand_ports(s).map(Self::from)
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ports.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_range() {
        assert_eq!(expand_ports("20-22").unwrap(), vec!["20", "21", "22"]);
    }

    #[test]
    fn test_reversed_and_equal_ranges_fail() {
        assert_eq!(
            expand_ports("22-20"),
            Err(RangeError::PortOrder { start: 22, end: 20 })
        );
        assert!(matches!(
            expand_ports("80-80"),
            Err(RangeError::PortOrder { .. })
        ));
    }

    #[test]
    fn test_non_numeric_range_fails() {
        assert!(matches!(
            expand_ports("a-20"),
            Err(RangeError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_comma_list_is_not_interpreted() {
        assert_eq!(
            expand_ports("80, 443,100-102").unwrap(),
            vec!["80", "443", "100-102"]
        );
    }

    #[test]
    fn test_single_token_unchanged() {
        assert_eq!(expand_ports("tcp/80").unwrap(), vec!["tcp/80"]);
        assert_eq!(expand_ports("8080").unwrap(), vec!["8080"]);
    }

    #[test]
    fn test_empty_spec() {
        assert!(expand_ports("").unwrap().is_empty());
        let spec: PortSpec = "  ".parse().unwrap();
        assert!(spec.is_empty());
    }

    #[test]
    fn test_port_spec_positional_access() {
        let spec: PortSpec = "8000-8002".parse().unwrap();
        assert_eq!(spec.len(), 3);
        assert_eq!(spec.get(1), Some("8001"));
        assert_eq!(spec.to_string(), "8000,8001,8002");
    }
}
