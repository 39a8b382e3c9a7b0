mod dockerfiles;
mod image_table;

use clap::{Parser, Subcommand};
use constcat::concat;

use crate::Result;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a Dockerfile for every supported Solana release and optionally build and push the
    /// images
    Dockerfiles(dockerfiles::DockerfilesArgs),

    /// Regenerate the source file that maps Solana versions to published image digests
    ImageTable(image_table::ImageTableArgs),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Dockerfiles(args) => {
                dockerfiles::dockerfiles(args)?;
            }
            Commands::ImageTable(args) => {
                image_table::image_table(args)?;
            }
        }

        Ok(())
    }
}

fn http_client() -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .build()?)
}
