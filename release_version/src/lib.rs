//! Release version types shared by the Dockerfile generator and the image table generator.
//!
//! Versions are plain `MAJOR.MINOR.PATCH` triples of unsigned integers. Pre-release and build
//! metadata are not supported, a tag like `v1.18.0-beta` is not a release.
//!
//! ```text
//! version      := number "." number "." number
//! release-tag  := "v" version
//! filter       := number "." number [ "." number ]
//! number       := /[0-9]+/
//! ```

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

const SEPARATOR: char = '.';
const TAG_PREFIX: char = 'v';

#[derive(Debug, PartialEq, Eq)]
pub struct ParseVersionError(String);

impl std::error::Error for ParseVersionError {}

impl fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version: {:?}", self.0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseFilterError(String);

impl std::error::Error for ParseFilterError {}

impl fmt::Display for ParseFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid version filter {:?}, expected MAJOR.MINOR or MAJOR.MINOR.PATCH",
            self.0
        )
    }
}

fn parse_component(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// A `MAJOR.MINOR.PATCH` triple. Ordered by major, then minor, then patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses the version that the input starts with. Anything after the patch number is ignored,
    /// so `1.18.2-rc1` yields `1.18.2`.
    pub fn parse_prefix(input: &str) -> Result<Self, ParseVersionError> {
        static PREFIX: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^([0-9]+)\.([0-9]+)\.([0-9]+)").unwrap());

        let error = || ParseVersionError(input.to_owned());
        let captures = PREFIX.captures(input).ok_or_else(error)?;
        let component = |index: usize| parse_component(&captures[index]).ok_or_else(error);

        Ok(Self {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }

    pub const fn as_tuple(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseVersionError(s.to_owned());

        let mut parts = s.split(SEPARATOR);
        let mut next = || parts.next().and_then(parse_component).ok_or_else(error);
        let version = Self {
            major: next()?,
            minor: next()?,
            patch: next()?,
        };
        match parts.next() {
            None => Ok(version),
            Some(_) => Err(error()),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A source repository tag of the form `vMAJOR.MINOR.PATCH`.
///
/// The raw tag is kept as-is since it appears in file names and download URLs, while the stripped
/// [`Version`] is what images get tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseTag {
    raw: String,
    version: Version,
}

impl ReleaseTag {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

impl FromStr for ReleaseTag {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version = s
            .strip_prefix(TAG_PREFIX)
            .ok_or_else(|| ParseVersionError(s.to_owned()))?
            .parse()
            .map_err(|_| ParseVersionError(s.to_owned()))?;

        Ok(Self {
            raw: s.to_owned(),
            version,
        })
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Selects releases by `MAJOR.MINOR` or `MAJOR.MINOR.PATCH`. A filter without a patch component
/// matches every patch release of that minor line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionFilter {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl VersionFilter {
    pub fn matches(&self, version: Version) -> bool {
        let patch = self.patch.unwrap_or(version.patch);
        self.major == version.major && self.minor == version.minor && patch == version.patch
    }
}

impl FromStr for VersionFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseFilterError(s.to_owned());

        let parts = s
            .split(SEPARATOR)
            .map(parse_component)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(error)?;

        match parts[..] {
            [major, minor] => Ok(Self {
                major,
                minor,
                patch: None,
            }),
            [major, minor, patch] => Ok(Self {
                major,
                minor,
                patch: Some(patch),
            }),
            _ => Err(error()),
        }
    }
}

impl fmt::Display for VersionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_from_str_works() {
        assert_eq!("1.16.0".parse(), Ok(Version::new(1, 16, 0)));
        assert_eq!("0.0.0".parse(), Ok(Version::new(0, 0, 0)));
        assert_eq!("1.18.26".parse(), Ok(Version::new(1, 18, 26)));

        for input in [
            "",
            "latest",
            "1",
            "1.16",
            "1.16.",
            "1..0",
            "1.16.0.1",
            "1.16.0-beta",
            "v1.16.0",
            "+1.16.0",
            " 1.16.0",
            "1.16.99999999999",
        ] {
            assert_eq!(
                input.parse::<Version>(),
                Err(ParseVersionError(input.to_owned())),
                "{input:?}"
            );
        }
    }

    #[test]
    fn version_parse_prefix_ignores_suffix() {
        assert_eq!(Version::parse_prefix("1.16.0"), Ok(Version::new(1, 16, 0)));
        assert_eq!(
            Version::parse_prefix("2.1.0-amd64"),
            Ok(Version::new(2, 1, 0))
        );
        assert_eq!(
            Version::parse_prefix("1.18.20.1"),
            Ok(Version::new(1, 18, 20))
        );
        assert!(Version::parse_prefix("latest").is_err());
        assert!(Version::parse_prefix("v1.16.0").is_err());
        assert!(Version::parse_prefix("1.16").is_err());
        assert!(Version::parse_prefix("sha256:1.2.3").is_err());
    }

    #[test]
    fn version_order_is_numeric() {
        let mut versions = [
            Version::new(1, 18, 10),
            Version::new(2, 0, 0),
            Version::new(1, 18, 9),
            Version::new(1, 9, 30),
        ];
        versions.sort();
        assert_eq!(
            versions,
            [
                Version::new(1, 9, 30),
                Version::new(1, 18, 9),
                Version::new(1, 18, 10),
                Version::new(2, 0, 0),
            ]
        );
    }

    #[test]
    fn release_tag_keeps_raw_tag() {
        let tag: ReleaseTag = "v1.17.3".parse().unwrap();
        assert_eq!(tag.as_str(), "v1.17.3");
        assert_eq!(tag.to_string(), "v1.17.3");
        assert_eq!(tag.version(), Version::new(1, 17, 3));
        assert_eq!(tag.version().to_string(), "1.17.3");

        assert!("1.17.3".parse::<ReleaseTag>().is_err());
        assert!("vv1.17.3".parse::<ReleaseTag>().is_err());
        assert!("v1.17.3^{}".parse::<ReleaseTag>().is_err());
        assert!("v1.17".parse::<ReleaseTag>().is_err());
    }

    #[test]
    fn filter_without_patch_matches_minor_line() {
        let filter: VersionFilter = "1.16".parse().unwrap();
        assert_eq!(filter.patch, None);
        assert!(filter.matches(Version::new(1, 16, 0)));
        assert!(filter.matches(Version::new(1, 16, 7)));
        assert!(!filter.matches(Version::new(1, 17, 7)));
        assert!(!filter.matches(Version::new(2, 16, 7)));
    }

    #[test]
    fn filter_with_patch_matches_exactly() {
        let filter: VersionFilter = "1.16.7".parse().unwrap();
        assert!(filter.matches(Version::new(1, 16, 7)));
        assert!(!filter.matches(Version::new(1, 16, 6)));
        assert_eq!(filter.to_string(), "1.16.7");
    }

    #[test]
    fn filter_rejects_other_shapes() {
        for input in ["", "1", "1.16.7.0", "1.x", "v1.16", "1.16."] {
            assert_eq!(
                input.parse::<VersionFilter>(),
                Err(ParseFilterError(input.to_owned())),
                "{input:?}"
            );
        }
    }
}
