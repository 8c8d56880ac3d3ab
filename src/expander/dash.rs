//! Dash range expansion.

use super::{parse_octet, parse_octets, ExpandOptions, Expander};
use crate::error::{RangeError, RangeResult};

/// Expands `a.b.c.d-e` and `a.b.c.d-w.x.y.z`.
///
/// A bare right-hand side replaces only the last octet of the start address.
/// Each octet is iterated independently, so the result is the cross product
/// of the four octet ranges rather than a walk through the address space:
/// `10.0.1.5-10.0.2.6` yields `10.0.1.5, 10.0.1.6, 10.0.2.5, 10.0.2.6`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashRangeExpander;

impl Expander for DashRangeExpander {
    fn expand(&self, spec: &str, options: &ExpandOptions) -> RangeResult<Vec<String>> {
        let (left, right) = spec
            .split_once('-')
            .ok_or_else(|| RangeError::InvalidRange(spec.to_string()))?;

        let start = parse_octets(left)?;
        let end = if right.contains('.') {
            parse_octets(right)?
        } else {
            [start[0], start[1], start[2], parse_octet(right)?]
        };

        if start.iter().zip(&end).any(|(s, e)| s > e) {
            return Err(RangeError::InvalidRange(spec.to_string()));
        }

        let count: u64 = start
            .iter()
            .zip(&end)
            .map(|(s, e)| u64::from(e - s) + 1)
            .product();
        options.check_size(spec, count)?;

        let mut hosts = Vec::with_capacity(count as usize);
        for a in start[0]..=end[0] {
            for b in start[1]..=end[1] {
                for c in start[2]..=end[2] {
                    for d in start[3]..=end[3] {
                        hosts.push(format!("{a}.{b}.{c}.{d}"));
                    }
                }
            }
        }
        Ok(hosts)
    }
}
