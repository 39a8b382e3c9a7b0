use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use clap::Args;
use log::{debug, info, warn};
use release_version::{ReleaseTag, Version, VersionFilter};

use crate::{
    digest::DigestMap,
    docker::{DockerCli, ImageTool},
    docker_hub::{DockerHub, ImageRegistry},
    dockerfile,
    github::GitHub,
    publish::{self, PublishArgs, RenderedRelease},
    release::{self, SourceHost},
    summary::{self, ReleaseReport, ReleaseStatus},
    Result,
};

#[derive(Debug, Args)]
pub struct DockerfilesArgs {
    /// Build and push the images of new and changed Dockerfiles.
    #[arg(long = "upload", default_value_t)]
    pub upload: bool,

    /// Do not fetch the tags that have already been published. Every release is rebuilt on upload.
    #[arg(long = "skip-cache", alias = "skip_cache", default_value_t)]
    pub skip_cache: bool,

    /// Only build the releases matching MAJOR.MINOR or MAJOR.MINOR.PATCH, even when they have been
    /// published already and their Dockerfile did not change.
    #[arg(long = "version", value_name = "VERSION")]
    pub version: Option<VersionFilter>,

    /// The directory the Dockerfiles are written to.
    #[arg(long = "dockerfile-dir", default_value = dockerfile::DEFAULT_DIR)]
    pub dockerfile_dir: PathBuf,
}

pub fn dockerfiles(args: DockerfilesArgs) -> Result<()> {
    let client = super::http_client()?;
    let reports = run(
        &GitHub::new(&client, None),
        &DockerHub::new(&client),
        &DockerCli,
        &args,
    )?;
    println!("{}", summary::table(&reports));
    Ok(())
}

fn report(tag: ReleaseTag, status: ReleaseStatus) -> ReleaseReport {
    ReleaseReport {
        tag,
        toolchain: None,
        rust_digest: None,
        status,
        published: None,
        outcome: None,
    }
}

struct Generated {
    releases: Vec<RenderedRelease>,
    dirty: HashSet<Version>,
    reports: Vec<ReleaseReport>,
}

/// Writes the Dockerfile of every supported release whose toolchain and base image can be
/// resolved.
fn generate(
    source: &dyn SourceHost,
    registry: &dyn ImageRegistry,
    dir: &Path,
) -> Result<Generated> {
    let tags = release::enumerate(source)?;

    fs::create_dir_all(dir).map_err(|error| format!("failed to create {dir:?}: {error}"))?;

    let mut digests = DigestMap::default();
    let mut generated = Generated {
        releases: Vec::with_capacity(tags.len()),
        dirty: HashSet::new(),
        reports: Vec::with_capacity(tags.len()),
    };

    for tag in tags {
        let Some(toolchain) = release::resolve_toolchain(source, &tag) else {
            warn!("Failed to fetch rust version for {tag}");
            generated
                .reports
                .push(report(tag, ReleaseStatus::ToolchainUnresolved));
            continue;
        };
        info!("Generating Dockerfile for {tag}, rust version {toolchain}");

        let Some(rust_digest) = digests.resolve(registry, &toolchain).map(str::to_owned) else {
            warn!("Skipping {tag}, no rust image for {toolchain}");
            generated.reports.push(ReleaseReport {
                toolchain: Some(toolchain),
                ..report(tag, ReleaseStatus::DigestUnresolved)
            });
            continue;
        };

        let path = dockerfile::path(dir, &tag);
        let status = dockerfile::write(&path, &dockerfile::render(&tag, &rust_digest))?;
        match status {
            dockerfile::Status::New => info!("{tag} is new and needs to be created"),
            dockerfile::Status::Changed => info!("{tag} needs to be updated"),
            dockerfile::Status::Unchanged => debug!("{tag} is up to date"),
        }
        if status.is_dirty() {
            generated.dirty.insert(tag.version());
        }

        generated.releases.push(RenderedRelease {
            tag: tag.clone(),
            dockerfile: path,
        });
        generated.reports.push(ReleaseReport {
            toolchain: Some(toolchain),
            rust_digest: Some(rust_digest),
            ..report(tag, ReleaseStatus::Rendered(status))
        });
    }

    for (toolchain, digest) in digests.iter() {
        debug!("rust {toolchain}: {digest}");
    }

    Ok(generated)
}

pub(crate) fn run(
    source: &dyn SourceHost,
    registry: &dyn ImageRegistry,
    tool: &dyn ImageTool,
    args: &DockerfilesArgs,
) -> Result<Vec<ReleaseReport>> {
    let Generated {
        releases,
        dirty,
        mut reports,
    } = generate(source, registry, &args.dockerfile_dir)?;

    let published = if args.skip_cache {
        HashSet::new()
    } else {
        info!("Fetching existing images");
        let published = publish::fetch_published(registry)?;
        for report in &mut reports {
            if let ReleaseStatus::Rendered(_) = report.status {
                report.published = Some(published.contains(&report.tag.version()));
            }
        }
        published
    };

    if args.upload {
        info!("Uploading all Dockerfiles");
        let outcomes = publish::publish(
            tool,
            PublishArgs {
                releases: &releases,
                dirty: &dirty,
                published: &published,
                filter: args.version,
            },
        );
        for report in &mut reports {
            report.outcome = outcomes.get(&report.tag.version()).copied();
        }
    }

    Ok(reports)
}
