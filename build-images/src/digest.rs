use std::collections::HashMap;

use log::{debug, warn};

use crate::docker_hub::{ImageRegistry, Repository};

/// The architecture of the base images, Dockerfiles pin `--platform=linux/amd64`.
pub const TARGET_ARCHITECTURE: &str = "amd64";

/// Known base image digests by Rust toolchain version.
const SEED: &[(&str, &str)] = &[(
    crate::release::LEGACY_TOOLCHAIN,
    "sha256:79892de83d1af9109c47a4566a24a0b240348bb8c088f1bccc52645c4c70ec39",
)];

/// Maps Rust toolchain versions to the digest of the `rust` base image for
/// [`TARGET_ARCHITECTURE`]. Grows as toolchains are resolved during a run.
#[derive(Debug, Clone)]
pub struct DigestMap(HashMap<String, String>);

impl Default for DigestMap {
    fn default() -> Self {
        Self(
            SEED.iter()
                .map(|&(toolchain, digest)| (toolchain.to_owned(), digest.to_owned()))
                .collect(),
        )
    }
}

impl DigestMap {
    pub fn get(&self, toolchain: &str) -> Option<&str> {
        self.0.get(toolchain).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(toolchain, digest)| (toolchain.as_str(), digest.as_str()))
    }

    /// Returns the base image digest for the toolchain, querying the registry when it is not known
    /// yet. Failures are logged and yield `None`.
    pub fn resolve(&mut self, registry: &dyn ImageRegistry, toolchain: &str) -> Option<&str> {
        if !self.0.contains_key(toolchain) {
            let digest = lookup(registry, toolchain)?;
            debug!("resolved rust:{toolchain} to {digest}");
            self.0.insert(toolchain.to_owned(), digest);
        }
        self.get(toolchain)
    }
}

fn lookup(registry: &dyn ImageRegistry, toolchain: &str) -> Option<String> {
    let details = match registry.tag_details(Repository::RUST, toolchain) {
        Ok(Some(details)) => details,
        Ok(None) => {
            warn!("Failed to fetch rust image for {toolchain}");
            return None;
        }
        Err(error) => {
            warn!("Failed to fetch rust image for {toolchain}: {error}");
            return None;
        }
    };

    let digest = details
        .images
        .into_iter()
        .find(|image| image.architecture == TARGET_ARCHITECTURE)
        .and_then(|image| image.digest);

    if digest.is_none() {
        warn!("Failed to fetch rust image for {toolchain}: no {TARGET_ARCHITECTURE} image");
    }
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker_hub::tests::FakeRegistry;

    #[test]
    fn seeded_toolchain_needs_no_lookup() {
        let registry = FakeRegistry::default();
        let mut map = DigestMap::default();
        assert_eq!(
            map.resolve(&registry, "1.68.0"),
            Some("sha256:79892de83d1af9109c47a4566a24a0b240348bb8c088f1bccc52645c4c70ec39")
        );
        assert!(registry.detail_requests.borrow().is_empty());
    }

    #[test]
    fn picks_target_architecture_and_caches_it() {
        let registry = FakeRegistry::default()
            .with_rust_image("1.75.0", "arm64", "sha256:arm")
            .with_rust_image("1.75.0", "amd64", "sha256:amd");
        let mut map = DigestMap::default();
        assert_eq!(map.resolve(&registry, "1.75.0"), Some("sha256:amd"));
        assert_eq!(map.resolve(&registry, "1.75.0"), Some("sha256:amd"));
        assert_eq!(*registry.detail_requests.borrow(), ["1.75.0"]);
        assert_eq!(map.get("1.75.0"), Some("sha256:amd"));
    }

    #[test]
    fn unresolved_toolchains_are_not_recorded() {
        let registry = FakeRegistry::default().with_rust_image("1.76.0", "arm64", "sha256:arm");
        let mut map = DigestMap::default();
        assert_eq!(map.resolve(&registry, "1.76.0"), None);
        assert_eq!(map.resolve(&registry, "1.77.0"), None);
        assert_eq!(map.get("1.76.0"), None);
        assert_eq!(map.iter().count(), 1);

        let unavailable = FakeRegistry {
            unavailable: true,
            ..Default::default()
        };
        assert_eq!(map.resolve(&unavailable, "1.78.0"), None);
    }
}
