//! API version identifiers and the version catalog
//!
//! Copyright (c) 2025 Versa Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A published API revision
///
/// Variants are declared in rank order, so the derived ordering agrees with
/// [`ApiVersion::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    /// Every version this build knows about, ascending by rank
    pub const ALL: [ApiVersion; 2] = [ApiVersion::V1, ApiVersion::V2];

    /// Integer rank, the `N` of `vN`
    pub fn rank(self) -> u32 {
        match self {
            ApiVersion::V1 => 1,
            ApiVersion::V2 => 2,
        }
    }

    /// Look up a version by rank
    pub fn from_rank(rank: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.rank() == rank)
    }

    /// Canonical text form (`"v1"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }

    /// Parse `vN` (case-insensitive, surrounding whitespace ignored)
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let rank = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u32>().ok());

        rank.and_then(Self::from_rank).ok_or_else(|| Error::UnknownVersion {
            input: input.to_string(),
        })
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Lifecycle metadata for one registered version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMetadata {
    pub version: ApiVersion,
    pub rank: u32,
    pub supported: bool,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunset_at: Option<DateTime<Utc>>,
}

impl VersionMetadata {
    /// A supported, current version
    pub fn new(version: ApiVersion) -> Self {
        Self {
            version,
            rank: version.rank(),
            supported: true,
            deprecated: false,
            deprecated_at: None,
            sunset_at: None,
        }
    }

    /// Mark the version deprecated with its deprecation window
    pub fn deprecated(
        mut self,
        deprecated_at: Option<DateTime<Utc>>,
        sunset_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.deprecated = true;
        self.deprecated_at = deprecated_at;
        self.sunset_at = sunset_at;
        self
    }

    /// Mark the version as no longer served
    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    /// Whether the sunset date has passed at `now`
    pub fn is_sunset_at(&self, now: DateTime<Utc>) -> bool {
        self.sunset_at.is_some_and(|sunset| now >= sunset)
    }

    /// Client-facing deprecation notice, if the version is deprecated
    pub fn deprecation_info(&self) -> Option<DeprecationInfo> {
        self.deprecated.then(|| DeprecationInfo {
            version: self.version,
            deprecated_at: self.deprecated_at,
            sunset_at: self.sunset_at,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.rank != self.version.rank() {
            return Err(Error::invalid_registry(format!(
                "{} registered with rank {} (expected {})",
                self.version,
                self.rank,
                self.version.rank()
            )));
        }

        if let (Some(deprecated_at), Some(sunset_at)) = (self.deprecated_at, self.sunset_at) {
            if deprecated_at >= sunset_at {
                return Err(Error::invalid_registry(format!(
                    "{} deprecated at {} but sunset at {}; deprecation must come first",
                    self.version, deprecated_at, sunset_at
                )));
            }
        }

        if !self.deprecated && (self.deprecated_at.is_some() || self.sunset_at.is_some()) {
            return Err(Error::invalid_registry(format!(
                "{} has deprecation dates but is not marked deprecated",
                self.version
            )));
        }

        Ok(())
    }
}

/// Deprecation metadata exposed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecationInfo {
    pub version: ApiVersion,
    pub deprecated_at: Option<DateTime<Utc>>,
    pub sunset_at: Option<DateTime<Utc>>,
}

/// Immutable catalog of registered versions, ascending by rank
#[derive(Debug, Clone, Default)]
pub struct VersionRegistry {
    entries: Vec<VersionMetadata>,
}

impl VersionRegistry {
    /// Seal a list of entries, checking rank order and deprecation windows
    pub(crate) fn from_entries(entries: Vec<VersionMetadata>) -> Result<Self> {
        for entry in &entries {
            entry.validate()?;
        }

        for pair in entries.windows(2) {
            if pair[0].version == pair[1].version {
                return Err(Error::invalid_registry(format!(
                    "{} registered more than once",
                    pair[0].version
                )));
            }
            if pair[1].rank <= pair[0].rank {
                return Err(Error::invalid_registry(format!(
                    "{} (rank {}) registered after {} (rank {}); ranks must increase",
                    pair[1].version, pair[1].rank, pair[0].version, pair[0].rank
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Metadata for a version, if registered
    pub fn get(&self, version: ApiVersion) -> Option<&VersionMetadata> {
        self.entries.iter().find(|entry| entry.version == version)
    }

    pub fn is_registered(&self, version: ApiVersion) -> bool {
        self.get(version).is_some()
    }

    /// Registered and still served
    pub fn is_supported(&self, version: ApiVersion) -> bool {
        self.get(version).is_some_and(|entry| entry.supported)
    }

    pub fn is_version_deprecated(&self, version: ApiVersion) -> bool {
        self.get(version).is_some_and(|entry| entry.deprecated)
    }

    /// Deprecation window for a deprecated version, `None` otherwise
    pub fn get_deprecation_info(&self, version: ApiVersion) -> Option<DeprecationInfo> {
        self.get(version).and_then(VersionMetadata::deprecation_info)
    }

    /// Served versions in rank order, deprecated ones included
    pub fn supported_versions(&self) -> Vec<ApiVersion> {
        self.entries
            .iter()
            .filter(|entry| entry.supported)
            .map(|entry| entry.version)
            .collect()
    }

    /// Served versions that are flagged for retirement
    pub fn deprecated_versions(&self) -> Vec<ApiVersion> {
        self.entries
            .iter()
            .filter(|entry| entry.supported && entry.deprecated)
            .map(|entry| entry.version)
            .collect()
    }

    /// Latest supported version
    pub fn current(&self) -> Option<ApiVersion> {
        self.supported_versions().last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionMetadata> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!(ApiVersion::parse("v1").unwrap(), ApiVersion::V1);
        assert_eq!(ApiVersion::parse(" V2 ").unwrap(), ApiVersion::V2);
        assert_eq!("v2".parse::<ApiVersion>().unwrap(), ApiVersion::V2);

        for bad in ["v3", "v0", "2", "v", "v1.0", "", "version1", "v-1"] {
            assert!(ApiVersion::parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_rank_ordering() {
        assert!(ApiVersion::V1 < ApiVersion::V2);
        assert_eq!(ApiVersion::from_rank(2), Some(ApiVersion::V2));
        assert_eq!(ApiVersion::from_rank(0), None);
        assert_eq!(ApiVersion::from_rank(3), None);
        for version in ApiVersion::ALL {
            assert_eq!(ApiVersion::from_rank(version.rank()), Some(version));
            assert_eq!(version.to_string(), version.as_str());
        }
    }

    #[test]
    fn test_serde_uses_text_form() {
        assert_eq!(serde_json::to_string(&ApiVersion::V1).unwrap(), "\"v1\"");
        let parsed: ApiVersion = serde_json::from_str("\"v2\"").unwrap();
        assert_eq!(parsed, ApiVersion::V2);
    }

    #[test]
    fn test_registry_queries() {
        let registry = VersionRegistry::from_entries(vec![
            VersionMetadata::new(ApiVersion::V1)
                .deprecated(Some(date(2024, 6, 1)), Some(date(2025, 6, 1))),
            VersionMetadata::new(ApiVersion::V2),
        ])
        .unwrap();

        assert!(registry.is_version_deprecated(ApiVersion::V1));
        assert!(!registry.is_version_deprecated(ApiVersion::V2));
        assert_eq!(registry.supported_versions(), vec![ApiVersion::V1, ApiVersion::V2]);
        assert_eq!(registry.deprecated_versions(), vec![ApiVersion::V1]);
        assert_eq!(registry.current(), Some(ApiVersion::V2));

        let info = registry.get_deprecation_info(ApiVersion::V1).unwrap();
        assert!(info.deprecated_at.unwrap() < info.sunset_at.unwrap());
        assert!(registry.get_deprecation_info(ApiVersion::V2).is_none());
    }

    #[test]
    fn test_deprecation_info_serializes_camel_case() {
        let info = VersionMetadata::new(ApiVersion::V1)
            .deprecated(Some(date(2024, 6, 1)), Some(date(2025, 6, 1)))
            .deprecation_info()
            .unwrap();
        let value = serde_json::to_value(&info).unwrap();

        assert_eq!(value["version"], "v1");
        assert_eq!(value["deprecatedAt"], "2024-06-01T00:00:00Z");
        assert_eq!(value["sunsetAt"], "2025-06-01T00:00:00Z");
    }

    #[test]
    fn test_rejects_inverted_deprecation_window() {
        let result = VersionRegistry::from_entries(vec![VersionMetadata::new(ApiVersion::V1)
            .deprecated(Some(date(2025, 6, 1)), Some(date(2024, 6, 1)))]);
        assert!(matches!(result, Err(Error::InvalidRegistry { .. })));
    }

    #[test]
    fn test_rejects_out_of_order_registration() {
        let result = VersionRegistry::from_entries(vec![
            VersionMetadata::new(ApiVersion::V2),
            VersionMetadata::new(ApiVersion::V1),
        ]);
        assert!(matches!(result, Err(Error::InvalidRegistry { .. })));

        let result = VersionRegistry::from_entries(vec![
            VersionMetadata::new(ApiVersion::V1),
            VersionMetadata::new(ApiVersion::V1),
        ]);
        assert!(matches!(result, Err(Error::InvalidRegistry { .. })));
    }

    #[test]
    fn test_unsupported_version_is_not_listed() {
        let registry = VersionRegistry::from_entries(vec![
            VersionMetadata::new(ApiVersion::V1).unsupported(),
            VersionMetadata::new(ApiVersion::V2),
        ])
        .unwrap();

        assert!(registry.is_registered(ApiVersion::V1));
        assert!(!registry.is_supported(ApiVersion::V1));
        assert_eq!(registry.supported_versions(), vec![ApiVersion::V2]);
    }

    #[test]
    fn test_sunset_check() {
        let meta = VersionMetadata::new(ApiVersion::V1)
            .deprecated(Some(date(2024, 6, 1)), Some(date(2025, 6, 1)));
        assert!(!meta.is_sunset_at(date(2025, 1, 1)));
        assert!(meta.is_sunset_at(date(2025, 6, 1)));
        assert!(!VersionMetadata::new(ApiVersion::V2).is_sunset_at(date(2030, 1, 1)));
    }
}
