//! CIDR block expansion.

use super::{ExpandOptions, Expander};
use crate::error::{RangeError, RangeResult};
use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;

/// Expands `a.b.c.d/n` into every address of the block.
///
/// The block spans `ip & mask ..= ip | !mask` with
/// `mask = 0xFFFFFFFF << (32 - n)`, so host bits in the input are ignored:
/// `10.0.0.7/30` yields `10.0.0.4..=10.0.0.7`. Network and broadcast
/// addresses are included.
#[derive(Debug, Clone, Copy, Default)]
pub struct CidrExpander;

impl Expander for CidrExpander {
    fn expand(&self, spec: &str, options: &ExpandOptions) -> RangeResult<Vec<String>> {
        let invalid = || RangeError::InvalidCidr(spec.to_string());

        let (addr, prefix) = spec.split_once('/').ok_or_else(invalid)?;
        let addr: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
        let network = Ipv4Network::new(addr, prefix).map_err(|_| invalid())?;

        let start = u32::from(network.network());
        let end = u32::from(network.broadcast());
        options.check_size(spec, u64::from(end - start) + 1)?;

        Ok((start..=end)
            .map(|ip| Ipv4Addr::from(ip).to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(spec: &str) -> RangeResult<Vec<String>> {
        CidrExpander.expand(spec, &ExpandOptions::default())
    }

    #[test]
    fn test_block_is_ascending() {
        assert_eq!(
            expand("10.0.0.0/30").unwrap(),
            vec!["10.0.0.0", "10.0.0.1", "10.0.0.2", "10.0.0.3"]
        );
    }

    #[test]
    fn test_host_bits_are_masked() {
        assert_eq!(
            expand("10.0.0.7/30").unwrap(),
            vec!["10.0.0.4", "10.0.0.5", "10.0.0.6", "10.0.0.7"]
        );
    }

    #[test]
    fn test_single_address_block() {
        assert_eq!(expand("10.0.0.5/32").unwrap(), vec!["10.0.0.5"]);
    }

    #[test]
    fn test_block_crossing_octets() {
        let hosts = expand("10.0.0.0/23").unwrap();
        assert_eq!(hosts.len(), 512);
        assert_eq!(hosts[255], "10.0.0.255");
        assert_eq!(hosts[256], "10.0.1.0");
    }

    #[test]
    fn test_zero_prefix_is_guarded() {
        assert!(matches!(
            expand("0.0.0.0/0"),
            Err(RangeError::TooLarge { count: 4_294_967_296, .. })
        ));
    }

    #[test]
    fn test_invalid_blocks() {
        assert!(matches!(expand("10.0.0.0/33"), Err(RangeError::InvalidCidr(_))));
        assert!(matches!(expand("10.0.0/24"), Err(RangeError::InvalidCidr(_))));
        assert!(matches!(expand("10.0.0.0/x"), Err(RangeError::InvalidCidr(_))));
    }
}
