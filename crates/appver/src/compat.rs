// SPDX-License-Identifier: CC-BY-NC-ND-4.0

//! Version and OS compatibility rules
//!
//! Version ids and OS versions are compared as plain strings by default. That
//! is only correct when every string uses the same width for its numeric parts
//! ("Android-09" vs "Android-10"); "Android-9" sorts after "Android-10". The
//! [`VersionOrdering::Natural`] ordering compares digit runs by value instead
//! and has to be enabled explicitly.

use crate::registry::{Registry, VersionRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How version ids and OS version strings are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionOrdering {
    /// Byte-wise string comparison
    #[default]
    Lexicographic,
    /// Digit runs compared numerically, everything else byte-wise
    Natural,
}

impl VersionOrdering {
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Lexicographic => a.cmp(b),
            Self::Natural => natural_cmp(a, b),
        }
    }
}

/// Split into alternating runs of ASCII digits and non-digits
fn segments(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digit)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(head)
    })
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Compare two digit runs by value without parsing, so any length works
fn numeric_cmp(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = segments(a);
    let mut right = segments(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = if is_digits(x) && is_digits(y) {
                    numeric_cmp(x, y)
                } else {
                    x.cmp(y)
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Decides which registered versions a device can install or update to
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityEvaluator {
    ordering: VersionOrdering,
}

impl CompatibilityEvaluator {
    pub fn new(ordering: VersionOrdering) -> Self {
        Self { ordering }
    }

    pub fn ordering(&self) -> VersionOrdering {
        self.ordering
    }

    /// True if the device OS is at or above the version's minimum OS
    pub fn is_compatible(&self, version: &VersionRecord, device_os: &str) -> bool {
        self.ordering.compare(&version.min_os_version, device_os) != Ordering::Greater
    }

    /// Greatest compatible version id of `app_name`, if any
    pub fn latest_compatible<'a>(
        &self,
        registry: &'a Registry,
        app_name: &str,
        device_os: &str,
    ) -> Option<&'a str> {
        self.greatest(
            registry
                .list_versions(app_name)
                .filter(|v| self.is_compatible(v, device_os)),
        )
    }

    /// Greatest compatible version id that sorts strictly after `current`
    pub fn newer_compatible<'a>(
        &self,
        registry: &'a Registry,
        app_name: &str,
        current: &str,
        device_os: &str,
    ) -> Option<&'a str> {
        self.greatest(registry.list_versions(app_name).filter(|v| {
            self.ordering.compare(&v.version_id, current) == Ordering::Greater
                && self.is_compatible(v, device_os)
        }))
    }

    fn greatest<'a>(&self, versions: impl Iterator<Item = &'a VersionRecord>) -> Option<&'a str> {
        versions
            .map(|v| v.version_id.as_str())
            .max_by(|a, b| self.ordering.compare(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(version_id: &str, min_os: &str) -> VersionRecord {
        VersionRecord {
            version_id: version_id.to_owned(),
            min_os_version: min_os.to_owned(),
            content: Vec::new(),
            is_beta: false,
            released_devices: Vec::new(),
            uploaded_at: chrono::Utc::now(),
        }
    }

    fn registry(versions: &[(&str, &str)]) -> Registry {
        let mut registry = Registry::new();
        for (id, min_os) in versions {
            registry
                .upload_version("PhonePe", id, min_os, Vec::new(), false)
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_is_compatible_lexicographic() {
        let eval = CompatibilityEvaluator::default();
        let v = record("v2.0", "Android-10");

        assert!(eval.is_compatible(&v, "Android-10"));
        assert!(eval.is_compatible(&v, "Android-11"));
        assert!(!eval.is_compatible(&v, "Android-1"));
        // Plain string comparison: "Android-9" > "Android-10"
        assert!(eval.is_compatible(&v, "Android-9"));
    }

    #[test]
    fn test_is_compatible_natural() {
        let eval = CompatibilityEvaluator::new(VersionOrdering::Natural);
        let v = record("v2.0", "Android-10");

        assert!(eval.is_compatible(&v, "Android-10"));
        assert!(eval.is_compatible(&v, "Android-12"));
        assert!(!eval.is_compatible(&v, "Android-9"));
    }

    #[test]
    fn test_compatibility_is_monotonic() {
        let eval = CompatibilityEvaluator::default();
        let v = record("v1.0", "Android-2");
        let mut os_versions = vec!["Android-10", "Android-11", "Android-2", "Android-9", "B"];
        os_versions.sort_unstable();

        let first = os_versions
            .iter()
            .position(|os| eval.is_compatible(&v, os))
            .unwrap();
        assert!(os_versions[first..].iter().all(|os| eval.is_compatible(&v, os)));
        assert!(os_versions[..first].iter().all(|os| !eval.is_compatible(&v, os)));
    }

    #[test]
    fn test_natural_ordering() {
        let n = VersionOrdering::Natural;
        assert_eq!(n.compare("Android-9", "Android-10"), Ordering::Less);
        assert_eq!(n.compare("v2.0", "v10.0"), Ordering::Less);
        assert_eq!(n.compare("v1.0", "v1.0"), Ordering::Equal);
        assert_eq!(n.compare("v1.0", "v1.0.1"), Ordering::Less);
        assert_eq!(n.compare("v1.10", "v1.9"), Ordering::Greater);
        assert_eq!(n.compare("beta", "alpha"), Ordering::Greater);
        // Same value, different padding still has a stable order
        assert_ne!(n.compare("v01", "v1"), Ordering::Equal);
    }

    #[test]
    fn test_lexicographic_ordering() {
        let l = VersionOrdering::Lexicographic;
        assert_eq!(l.compare("v2.0", "v10.0"), Ordering::Greater);
        assert_eq!(l.compare("v1.0", "v2.0"), Ordering::Less);
    }

    #[test]
    fn test_latest_compatible() {
        let registry = registry(&[
            ("v1.0", "Android-08"),
            ("v2.0", "Android-10"),
            ("v3.0", "Android-12"),
        ]);
        let eval = CompatibilityEvaluator::default();

        assert_eq!(
            eval.latest_compatible(&registry, "PhonePe", "Android-11"),
            Some("v2.0")
        );
        assert_eq!(
            eval.latest_compatible(&registry, "PhonePe", "Android-12"),
            Some("v3.0")
        );
        assert_eq!(eval.latest_compatible(&registry, "PhonePe", "Android-07"), None);
        assert_eq!(eval.latest_compatible(&registry, "Unknown", "Android-12"), None);
    }

    #[test]
    fn test_newer_compatible() {
        let registry = registry(&[
            ("v1.0", "Android-08"),
            ("v2.0", "Android-10"),
            ("v3.0", "Android-12"),
        ]);
        let eval = CompatibilityEvaluator::default();

        assert_eq!(
            eval.newer_compatible(&registry, "PhonePe", "v1.0", "Android-10"),
            Some("v2.0")
        );
        assert_eq!(
            eval.newer_compatible(&registry, "PhonePe", "v3.0", "Android-12"),
            None
        );
        assert_eq!(
            eval.newer_compatible(&registry, "PhonePe", "v2.0", "Android-11"),
            None
        );
    }

    #[test]
    fn test_newer_compatible_respects_ordering() {
        let registry = registry(&[("v9.0", "A"), ("v10.0", "A")]);

        let lexicographic = CompatibilityEvaluator::default();
        assert_eq!(
            lexicographic.newer_compatible(&registry, "PhonePe", "v9.0", "A"),
            None
        );

        let natural = CompatibilityEvaluator::new(VersionOrdering::Natural);
        assert_eq!(
            natural.newer_compatible(&registry, "PhonePe", "v9.0", "A"),
            Some("v10.0")
        );
    }
}
