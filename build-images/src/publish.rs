use std::{
    collections::{HashMap, HashSet},
    fmt,
    path::PathBuf,
};

use log::{debug, info, warn};
use release_version::{ReleaseTag, Version, VersionFilter};

use crate::{
    docker::ImageTool,
    docker_hub::{ImageRegistry, Repository},
    Result,
};

/// Images are built under this local name before being tagged for [`Repository::ELLIPSIS_LABS_SOLANA`].
const LOCAL_REPOSITORY: &str = "solana";

/// The placeholder tag Docker Hub lists next to the versioned tags.
pub const LATEST: &str = "latest";

pub fn local_image(version: Version) -> String {
    format!("{LOCAL_REPOSITORY}:{version}")
}

pub fn published_image(version: Version) -> String {
    format!("{}:{version}", Repository::ELLIPSIS_LABS_SOLANA)
}

/// Returns the versions that already have an image in [`Repository::ELLIPSIS_LABS_SOLANA`].
pub fn fetch_published(registry: &dyn ImageRegistry) -> Result<HashSet<Version>> {
    let tags = registry.tags(Repository::ELLIPSIS_LABS_SOLANA)?;
    Ok(tags
        .into_iter()
        .filter(|tag| tag.name != LATEST)
        .filter_map(|tag| match tag.name.parse::<Version>() {
            Ok(version) => Some(version),
            Err(error) => {
                debug!("ignoring published tag: {error}");
                None
            }
        })
        .collect())
}

/// A release whose Dockerfile has been written to disk.
#[derive(Debug, Clone)]
pub struct RenderedRelease {
    pub tag: ReleaseTag,
    pub dockerfile: PathBuf,
}

pub struct PublishArgs<'a> {
    pub releases: &'a [RenderedRelease],
    pub dirty: &'a HashSet<Version>,
    pub published: &'a HashSet<Version>,
    pub filter: Option<VersionFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    FilteredOut,
    AlreadyPublished,
    BuildFailed,
    TagFailed,
    PushFailed,
    Pushed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::FilteredOut => "filtered out",
            Outcome::AlreadyPublished => "already published",
            Outcome::BuildFailed => "build failed",
            Outcome::TagFailed => "tag failed",
            Outcome::PushFailed => "push failed",
            Outcome::Pushed => "pushed",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Skip(Outcome),
    Build { forced: bool },
}

/// Decides whether the image for `version` has to be built.
///
/// With a filter, exactly the matching releases are built. Without one, a release is built unless
/// it has been published already and its Dockerfile did not change.
pub fn decide(
    version: Version,
    filter: Option<VersionFilter>,
    published: &HashSet<Version>,
    dirty: &HashSet<Version>,
) -> Decision {
    match filter {
        Some(filter) if !filter.matches(version) => Decision::Skip(Outcome::FilteredOut),
        Some(_) => Decision::Build { forced: true },
        None if published.contains(&version) && !dirty.contains(&version) => {
            Decision::Skip(Outcome::AlreadyPublished)
        }
        None => Decision::Build { forced: false },
    }
}

/// Builds, tags and pushes the images of the releases that need it. Failures only affect the
/// release they occur for.
pub fn publish(tool: &dyn ImageTool, args: PublishArgs) -> HashMap<Version, Outcome> {
    let PublishArgs {
        releases,
        dirty,
        published,
        filter,
    } = args;

    let mut outcomes = HashMap::with_capacity(releases.len());
    for release in releases {
        let version = release.tag.version();
        let outcome = match decide(version, filter, published, dirty) {
            Decision::Skip(outcome) => {
                match outcome {
                    Outcome::FilteredOut => debug!("Skipping {version}"),
                    _ => info!("Already built image for {version}, skipping"),
                }
                outcome
            }
            Decision::Build { forced } => {
                if forced {
                    info!("Forcing a rebuild of {version}");
                } else if dirty.contains(&version) {
                    info!("Dockerfile for {version} needs to be modified");
                }
                build_and_push(tool, version, release)
            }
        };
        outcomes.insert(version, outcome);
    }
    outcomes
}

fn build_and_push(tool: &dyn ImageTool, version: Version, release: &RenderedRelease) -> Outcome {
    let local = local_image(version);
    let remote = published_image(version);

    info!("Building {local}");
    if let Err(error) = tool.build(&local, &release.dockerfile) {
        warn!("Failed to build {local}: {error}");
        return Outcome::BuildFailed;
    }

    if let Err(error) = tool.tag(&local, &remote) {
        warn!("Failed to tag {local} as {remote}: {error}");
        return Outcome::TagFailed;
    }

    info!("Pushing {remote}");
    if let Err(error) = tool.push(&remote) {
        warn!("Failed to push {remote}: {error}");
        return Outcome::PushFailed;
    }

    Outcome::Pushed
}
