use std::{fs::File, path::Path};

use crate::{process, Result};

/// Builds, tags and pushes images. Each operation blocks until the underlying tool exits.
pub trait ImageTool {
    /// Builds the Dockerfile at `dockerfile` without a build context and tags the result `image`.
    fn build(&self, image: &str, dockerfile: &Path) -> Result<()>;

    fn tag(&self, source: &str, target: &str) -> Result<()>;

    fn push(&self, image: &str) -> Result<()>;
}

/// [`ImageTool`] backed by the `docker` command line interface.
pub struct DockerCli;

impl ImageTool for DockerCli {
    fn build(&self, image: &str, dockerfile: &Path) -> Result<()> {
        let dockerfile = File::open(dockerfile)
            .map_err(|error| format!("failed to open {dockerfile:?}: {error}"))?;

        // `-` reads the Dockerfile from stdin, the images do not need a build context.
        process::command!("docker", "build", "--tag", image, "-").status_with_stdin(dockerfile)?;
        Ok(())
    }

    fn tag(&self, source: &str, target: &str) -> Result<()> {
        process::command!("docker", "tag", source, target).status()?;
        Ok(())
    }

    fn push(&self, image: &str) -> Result<()> {
        process::command!("docker", "push", image).status()?;
        Ok(())
    }
}
