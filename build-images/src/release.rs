use log::{debug, warn};
use release_version::{ReleaseTag, Version};

use crate::Result;

/// Release `v1.14.0` was never supported.
const EXCLUDED_TAG: &str = "v1.14.0";

/// The lowest supported minor version of the 1.x line.
const MIN_MINOR: u32 = 14;

/// The 1.15 line was never released to mainnet and is skipped entirely.
const EXCLUDED_MINOR: u32 = 15;

/// The 1.14 line predates `rust-toolchain.toml` pinning a usable channel.
pub const LEGACY_TOOLCHAIN: &str = "1.68.0";

/// Where release tags and per-release toolchain manifests come from.
pub trait SourceHost {
    /// Returns the output of `git ls-remote --tags`.
    fn list_tag_refs(&self) -> Result<String>;

    /// Returns the `rust-toolchain.toml` of the given release, or `None` when the host answered with
    /// a non-success status.
    fn toolchain_manifest(&self, tag: &ReleaseTag) -> Result<Option<String>>;
}

/// Yields the tag names in `git ls-remote --tags` output, in listing order. Lines without a
/// `hash\tref` shape are ignored.
pub fn tag_names(listing: &str) -> impl Iterator<Item = &str> {
    listing.lines().filter_map(|line| {
        let (_hash, reference) = line.split_once('\t')?;
        reference.rsplit('/').next()
    })
}

/// Parses the tag and returns it when it names a supported release.
pub fn accept(tag: &str) -> Option<ReleaseTag> {
    if tag == EXCLUDED_TAG {
        return None;
    }
    let release: ReleaseTag = tag.parse().ok()?;
    let Version { major, minor, .. } = release.version();
    (major >= 1 && minor >= MIN_MINOR && minor != EXCLUDED_MINOR).then_some(release)
}

/// Lists the supported releases in the order the source host returns them.
pub fn enumerate(host: &dyn SourceHost) -> Result<Vec<ReleaseTag>> {
    let listing = host.list_tag_refs()?;
    let releases: Vec<_> = tag_names(&listing).filter_map(accept).collect();
    debug!("found {} supported releases", releases.len());
    Ok(releases)
}

#[derive(serde::Deserialize)]
struct ToolchainFile {
    toolchain: ToolchainSection,
}

#[derive(serde::Deserialize)]
struct ToolchainSection {
    channel: String,
}

pub fn parse_toolchain_manifest(text: &str) -> Result<String> {
    let file: ToolchainFile = toml::from_str(text)?;
    Ok(file.toolchain.channel)
}

fn is_legacy(tag: &ReleaseTag) -> bool {
    let Version { major, minor, .. } = tag.version();
    major == 1 && minor == 14
}

/// Returns the Rust toolchain version the release has to be built with. Failures are logged and
/// yield `None`, the release should then be skipped.
pub fn resolve_toolchain(host: &dyn SourceHost, tag: &ReleaseTag) -> Option<String> {
    if is_legacy(tag) {
        return Some(LEGACY_TOOLCHAIN.to_owned());
    }

    let manifest = match host.toolchain_manifest(tag) {
        Ok(Some(manifest)) => manifest,
        Ok(None) => {
            warn!("Failed to fetch rust-toolchain.toml for {tag}");
            return None;
        }
        Err(error) => {
            warn!("Failed to fetch rust-toolchain.toml for {tag}: {error}");
            return None;
        }
    };

    match parse_toolchain_manifest(&manifest) {
        Ok(channel) => Some(channel),
        Err(error) => {
            warn!("Failed to read the toolchain channel from rust-toolchain.toml for {tag}: {error}");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, collections::HashMap};

    use super::*;

    /// In-memory [`SourceHost`] keyed by raw tag. Tags without a manifest answer with a non-success
    /// status.
    #[derive(Default)]
    pub struct FakeSourceHost {
        pub tags: Vec<&'static str>,
        pub manifests: HashMap<&'static str, &'static str>,
        pub requested: RefCell<Vec<String>>,
    }

    impl FakeSourceHost {
        pub fn with_channel(mut self, tag: &'static str, manifest: &'static str) -> Self {
            self.tags.push(tag);
            self.manifests.insert(tag, manifest);
            self
        }
    }

    impl SourceHost for FakeSourceHost {
        fn list_tag_refs(&self) -> Result<String> {
            Ok(self
                .tags
                .iter()
                .enumerate()
                .map(|(index, tag)| format!("{index:040x}\trefs/tags/{tag}\n"))
                .collect())
        }

        fn toolchain_manifest(&self, tag: &ReleaseTag) -> Result<Option<String>> {
            self.requested.borrow_mut().push(tag.to_string());
            Ok(self.manifests.get(tag.as_str()).map(|text| text.to_string()))
        }
    }

    struct FailingSourceHost;

    impl SourceHost for FailingSourceHost {
        fn list_tag_refs(&self) -> Result<String> {
            Err("connection refused".into())
        }

        fn toolchain_manifest(&self, _tag: &ReleaseTag) -> Result<Option<String>> {
            Err("connection refused".into())
        }
    }

    fn tag(value: &str) -> ReleaseTag {
        value.parse().unwrap()
    }

    #[test]
    fn tag_names_follow_listing_order() {
        let listing = "\
0b1e2f\trefs/tags/v1.16.0
a9c3d1\trefs/tags/v1.14.18
ffffff\trefs/tags/v1.14.18^{}

malformed line
";
        assert_eq!(
            tag_names(listing).collect::<Vec<_>>(),
            ["v1.16.0", "v1.14.18", "v1.14.18^{}"]
        );
    }

    #[test]
    fn accept_works() {
        for accepted in ["v1.14.1", "v1.14.18", "v1.16.0", "v1.17.34", "v2.14.0", "v3.16.2"] {
            assert!(accept(accepted).is_some(), "{accepted:?}");
        }
        for rejected in [
            "v1.14.0",
            "v1.15.0",
            "v1.15.9",
            "v1.13.7",
            "v0.23.0",
            "v2.0.0",
            "v2.0.0-beta",
            "v1.16.0^{}",
            "1.16.0",
            "v1.16",
            "latest",
            "",
        ] {
            assert!(accept(rejected).is_none(), "{rejected:?}");
        }
    }

    #[test]
    fn enumerate_keeps_supported_releases_in_order() {
        let host = FakeSourceHost {
            tags: vec!["v1.14.0", "v1.14.18", "v1.15.0", "v1.16.0"],
            ..Default::default()
        };
        let releases = enumerate(&host).unwrap();
        assert_eq!(
            releases.iter().map(ReleaseTag::as_str).collect::<Vec<_>>(),
            ["v1.14.18", "v1.16.0"]
        );
    }

    #[test]
    fn enumerate_propagates_listing_failure() {
        assert!(enumerate(&FailingSourceHost).is_err());
    }

    #[test]
    fn legacy_releases_use_fixed_toolchain() {
        let host = FakeSourceHost::default();
        assert_eq!(
            resolve_toolchain(&host, &tag("v1.14.18")).as_deref(),
            Some(LEGACY_TOOLCHAIN)
        );
        assert!(host.requested.borrow().is_empty());
    }

    #[test]
    fn toolchain_is_read_from_manifest() {
        let host = FakeSourceHost::default().with_channel(
            "v1.17.3",
            "[toolchain]\nchannel = \"1.75.0\"\ncomponents = [\"clippy\"]\n",
        );
        assert_eq!(
            resolve_toolchain(&host, &tag("v1.17.3")).as_deref(),
            Some("1.75.0")
        );
        assert_eq!(*host.requested.borrow(), ["v1.17.3"]);
    }

    #[test]
    fn unresolvable_toolchains_are_skipped() {
        let host = FakeSourceHost::default()
            .with_channel("v1.18.0", "[toolchain]\nprofile = \"minimal\"\n")
            .with_channel("v1.18.1", "not toml at all [");
        assert_eq!(resolve_toolchain(&host, &tag("v1.17.0")), None);
        assert_eq!(resolve_toolchain(&host, &tag("v1.18.0")), None);
        assert_eq!(resolve_toolchain(&host, &tag("v1.18.1")), None);
        assert_eq!(resolve_toolchain(&FailingSourceHost, &tag("v1.18.2")), None);
    }
}
