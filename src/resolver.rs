//! Target resolution.
//!
//! Reads target and exclusion inputs, expands every entry and subtracts the
//! expanded exclusions from the expanded targets. Subtraction is by exact
//! string equality: excluding `10.0.0.0/30` removes `10.0.0.1`, but
//! excluding `example.com` does not remove its addresses.

use crate::error::Result;
use crate::expander::{ExpandOptions, RangeExpander};
use crate::types::InputSource;
use std::collections::HashSet;
use tracing::{debug, info};

/// Turns target and exclusion inputs into the effective target set.
pub struct TargetResolver {
    expander: RangeExpander,
}

impl TargetResolver {
    /// Create a resolver with the built-in expansion strategies.
    pub fn new(options: ExpandOptions) -> Self {
        Self {
            expander: RangeExpander::new(options),
        }
    }

    /// Create a resolver around a customised expander.
    pub fn with_expander(expander: RangeExpander) -> Self {
        Self { expander }
    }

    /// Compute `expand(targets) - expand(exclusions)`.
    ///
    /// Duplicates are collapsed; the first occurrence fixes a host's
    /// position so the task queue built from it is deterministic.
    pub fn resolve(
        &self,
        targets: &InputSource,
        exclusions: Option<&InputSource>,
    ) -> Result<Vec<String>> {
        let candidates = self.expand_input(targets, "target")?;
        let excluded: HashSet<String> = match exclusions {
            Some(source) => self.expand_input(source, "exclusion")?.into_iter().collect(),
            None => HashSet::new(),
        };

        let mut seen = HashSet::with_capacity(candidates.len());
        let resolved: Vec<String> = candidates
            .into_iter()
            .filter(|host| !excluded.contains(host))
            .filter(|host| seen.insert(host.clone()))
            .collect();

        info!(
            targets = resolved.len(),
            excluded = excluded.len(),
            "resolved target set"
        );
        Ok(resolved)
    }

    fn expand_input(&self, source: &InputSource, what: &'static str) -> Result<Vec<String>> {
        let entries = source.entries(what)?;
        debug!(input = %source, entries = entries.len(), "expanding {what} input");

        let mut hosts = Vec::new();
        for entry in &entries {
            hosts.extend(self.expander.expand(entry)?);
        }
        Ok(hosts)
    }
}

impl Default for TargetResolver {
    fn default() -> Self {
        Self::new(ExpandOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error, RangeError};
    use crate::expander::HostListGlobExpander;
    use std::io::Write;
    use std::path::PathBuf;

    fn literal(value: &str) -> InputSource {
        InputSource::Literal(value.to_string())
    }

    #[test]
    fn test_resolve_without_exclusions() {
        let resolver = TargetResolver::default();
        let hosts = resolver.resolve(&literal("10.0.0.0/30"), None).unwrap();
        assert_eq!(hosts, vec!["10.0.0.0", "10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    }

    #[test]
    fn test_exclusions_are_subtracted() {
        let resolver = TargetResolver::default();
        let exclusions = literal("10.0.0.1-2");
        let hosts = resolver
            .resolve(&literal("10.0.0.0/29"), Some(&exclusions))
            .unwrap();

        let excluded = RangeExpander::default().expand("10.0.0.1-2").unwrap();
        let expanded = RangeExpander::default().expand("10.0.0.0/29").unwrap();
        assert_eq!(hosts.len(), 6);
        assert!(hosts.iter().all(|h| !excluded.contains(h)));
        assert!(hosts.iter().all(|h| expanded.contains(h)));
    }

    #[test]
    fn test_duplicates_collapsed() {
        let resolver = TargetResolver::default();
        let hosts = resolver
            .resolve(&literal("10.0.0.1,10.0.0.0/31,10.0.0.1-2"), None)
            .unwrap();
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.0", "10.0.0.2"]);
    }

    #[test]
    fn test_target_and_exclusion_files() {
        let mut targets = tempfile::NamedTempFile::new().unwrap();
        writeln!(targets, "10.0.0.0/30").unwrap();
        writeln!(targets).unwrap();
        writeln!(targets, "  example.com ").unwrap();
        let mut exclusions = tempfile::NamedTempFile::new().unwrap();
        writeln!(exclusions, "10.0.0.0").unwrap();
        writeln!(exclusions, "example.com").unwrap();

        let resolver = TargetResolver::default();
        let hosts = resolver
            .resolve(
                &InputSource::File(targets.path().to_path_buf()),
                Some(&InputSource::File(exclusions.path().to_path_buf())),
            )
            .unwrap();
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    }

    #[test]
    fn test_everything_excluded_yields_empty_set() {
        let resolver = TargetResolver::default();
        let hosts = resolver
            .resolve(&literal("10.0.0.1"), Some(&literal("10.0.0.0/24")))
            .unwrap();
        assert!(hosts.is_empty());
    }

    #[test]
    fn test_unreadable_exclusion_file() {
        let resolver = TargetResolver::default();
        let missing = InputSource::File(PathBuf::from("/no/such/exclusions.txt"));
        assert!(matches!(
            resolver.resolve(&literal("10.0.0.1"), Some(&missing)),
            Err(Error::Config(ConfigError::ReadFailed { .. }))
        ));
    }

    #[test]
    fn test_range_error_surfaces() {
        let resolver = TargetResolver::default();
        assert!(matches!(
            resolver.resolve(&literal("10.0.0.9-1"), None),
            Err(Error::Range(RangeError::InvalidRange(_)))
        ));
    }

    #[test]
    fn test_custom_glob_strategy() {
        let known = vec![
            "10.0.1.5".to_string(),
            "10.0.2.5".to_string(),
            "10.0.2.6".to_string(),
            "10.0.3.5".to_string(),
        ];
        let resolver = TargetResolver::with_expander(
            RangeExpander::default().with_glob(HostListGlobExpander::new(known)),
        );

        let hosts = resolver
            .resolve(&literal("10.0.*.5"), Some(&literal("10.0.2.5")))
            .unwrap();
        assert_eq!(hosts, vec!["10.0.1.5", "10.0.3.5"]);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let resolver = TargetResolver::default();
        let exclusions = literal("10.0.0.3");
        let first = resolver
            .resolve(&literal("10.0.0.0/29,10.0.1.1-4"), Some(&exclusions))
            .unwrap();
        let second = resolver
            .resolve(&literal("10.0.0.0/29,10.0.1.1-4"), Some(&exclusions))
            .unwrap();
        assert_eq!(first, second);
    }
}
