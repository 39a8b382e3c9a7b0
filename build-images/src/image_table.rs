//! Generates the Rust source file that maps Solana versions to build image digests.
//!
//! The table is regenerated from scratch on every run. Entries are keyed by version, so when
//! several sources publish an image for the same version the source applied last wins.

use std::{collections::BTreeMap, fs, path::Path};

use log::debug;
use release_version::Version;

use crate::{
    docker_hub::{ImageRegistry, Repository, Tag},
    github::{PackageRegistry, PackageVersion},
    publish::LATEST,
    Result,
};

pub const DEFAULT_OUTPUT: &str = "src/image_config.rs";

/// Docker Hub repositories in the order they are applied.
pub const DOCKER_HUB_SOURCES: [Repository; 2] = [
    Repository::SOLANA_FOUNDATION_VERIFIED_BUILD,
    Repository::ELLIPSIS_LABS_SOLANA,
];

pub type DigestTable = BTreeMap<Version, String>;

/// Where to read the published images from.
pub enum Source<'a> {
    /// The repositories in [`DOCKER_HUB_SOURCES`].
    DockerHub(&'a dyn ImageRegistry),
    /// The GitHub container registry package.
    Ghcr(&'a dyn PackageRegistry),
}

/// Records the digest of every Docker Hub tag named `MAJOR.MINOR.PATCH`.
pub fn apply_tags(table: &mut DigestTable, tags: impl IntoIterator<Item = Tag>) {
    for Tag { name, digest } in tags {
        if name == LATEST {
            continue;
        }
        let version = match name.parse::<Version>() {
            Ok(version) => version,
            Err(error) => {
                debug!("ignoring tag: {error}");
                continue;
            }
        };
        let Some(digest) = digest else {
            debug!("ignoring tag {name}: no digest");
            continue;
        };
        table.insert(version, digest);
    }
}

/// Records the digest of every package version with a tag starting with `MAJOR.MINOR.PATCH`. Only
/// the first such tag of a package version is used.
pub fn apply_package_versions(
    table: &mut DigestTable,
    versions: impl IntoIterator<Item = PackageVersion>,
) {
    for PackageVersion { name, metadata } in versions {
        let version = metadata
            .container
            .tags
            .iter()
            .find_map(|tag| Version::parse_prefix(tag).ok());
        match version {
            Some(version) => {
                table.insert(version, name);
            }
            None => debug!("ignoring package version {name}: no versioned tag"),
        }
    }
}

pub fn collect(source: Source) -> Result<DigestTable> {
    let mut table = DigestTable::new();
    match source {
        Source::DockerHub(registry) => {
            // Fetch everything before applying anything, a failing source aborts the run.
            let pages = DOCKER_HUB_SOURCES
                .iter()
                .map(|&repository| registry.tags(repository))
                .collect::<Result<Vec<_>>>()?;
            for tags in pages {
                apply_tags(&mut table, tags);
            }
        }
        Source::Ghcr(registry) => {
            apply_package_versions(&mut table, registry.package_versions()?);
        }
    }
    Ok(table)
}

/// Renders the table as Rust source. The output only depends on the table contents.
pub fn render(table: &DigestTable) -> String {
    let mappings = table
        .iter()
        .map(|(version, digest)| {
            let (major, minor, patch) = version.as_tuple();
            format!("        m.insert(({major}, {minor}, {patch}), \"{digest}\");")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"/// THIS FILE IS AUTOGENERATED. DO NOT MODIFY
use lazy_static::lazy_static;
use std::collections::BTreeMap;

lazy_static! {{
    pub static ref IMAGE_MAP: BTreeMap<(u32, u32, u32), &'static str> = {{
        let mut m = BTreeMap::new();
{mappings}
        m
    }};
}}
"#
    )
}

/// Writes the rendered table to `path`, replacing any previous contents.
pub fn write(path: &Path, table: &DigestTable) -> Result<()> {
    let code = render(table);
    debug!("generated {path:?}:\n{code}");
    fs::write(path, code).map_err(|error| format!("failed to write {path:?}: {error}"))?;
    Ok(())
}
