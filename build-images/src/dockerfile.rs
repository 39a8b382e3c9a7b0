use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use release_version::ReleaseTag;

use crate::Result;

pub const DEFAULT_DIR: &str = "docker";

const EXTENSION: &str = "Dockerfile";

/// Renders the Dockerfile of a release. The base image is pinned by digest so that rebuilding an
/// image for the same release is reproducible.
pub fn render(tag: &ReleaseTag, rust_digest: &str) -> String {
    format!(
        r#"FROM --platform=linux/amd64 rust@{rust_digest}

RUN apt-get update && apt-get install -qy git gnutls-bin
RUN sh -c "$(curl -sSfL https://release.solana.com/{tag}/install)"
ENV PATH="/root/.local/share/solana/install/active_release/bin:$PATH"
WORKDIR /build

CMD /bin/bash
"#
    )
}

pub fn path(dir: &Path, tag: &ReleaseTag) -> PathBuf {
    dir.join(format!("{tag}.{EXTENSION}"))
}

/// How a freshly rendered Dockerfile compares to the one on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    New,
    Changed,
    Unchanged,
}

impl Status {
    pub fn is_dirty(self) -> bool {
        !matches!(self, Status::Unchanged)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::New => "new",
            Status::Changed => "changed",
            Status::Unchanged => "unchanged",
        })
    }
}

/// Compares `contents` against the file at `path` and then overwrites the file, regardless of the
/// outcome.
pub fn write(path: &Path, contents: &str) -> Result<Status> {
    let status = match fs::read(path) {
        Ok(previous) if previous == contents.as_bytes() => Status::Unchanged,
        Ok(_) => Status::Changed,
        Err(error) if error.kind() == io::ErrorKind::NotFound => Status::New,
        Err(error) => {
            log::warn!("Failed to read {path:?}, treating it as changed: {error}");
            Status::Changed
        }
    };

    fs::write(path, contents).map_err(|error| format!("failed to write {path:?}: {error}"))?;

    Ok(status)
}
