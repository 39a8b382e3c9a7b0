use std::{convert::Infallible, path::PathBuf};

use clap::Args;
use log::info;

use crate::{
    docker_hub::DockerHub,
    github::GitHub,
    image_table::{self, Source},
    Result,
};

#[derive(Debug, Args)]
pub struct ImageTableArgs {
    /// Read the image digests from the GitHub container registry instead of Docker Hub. Only a
    /// case-insensitive `true` enables it through the environment.
    #[arg(long = "use-ghcr", env = "USE_GHCR", value_parser = is_true)]
    pub use_ghcr: bool,

    /// The token used to authenticate against the GitHub API.
    #[arg(long = "github-token", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// The generated source file.
    #[arg(long = "output", default_value = image_table::DEFAULT_OUTPUT)]
    pub output: PathBuf,
}

/// Every value other than `true` disables the flag, including the empty string.
fn is_true(value: &str) -> Result<bool, Infallible> {
    Ok(value.eq_ignore_ascii_case("true"))
}

pub fn image_table(args: ImageTableArgs) -> Result<()> {
    let ImageTableArgs {
        use_ghcr,
        github_token,
        output,
    } = args;

    let client = super::http_client()?;
    let github = GitHub::new(&client, github_token.as_deref());
    let docker_hub = DockerHub::new(&client);

    let source = if use_ghcr {
        Source::Ghcr(&github)
    } else {
        Source::DockerHub(&docker_hub)
    };

    let table = image_table::collect(source)?;
    image_table::write(&output, &table)?;
    info!(
        "Wrote {count} image digests to {output}",
        count = table.len(),
        output = output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ImageTableArgs,
    }

    #[test]
    fn use_ghcr_is_read_from_flag_and_environment() {
        std::env::remove_var("USE_GHCR");
        let parse = |args: &[&str]| Wrapper::try_parse_from(args).map(|wrapper| wrapper.args);

        assert!(!parse(&["image-table"]).unwrap().use_ghcr);
        assert!(parse(&["image-table", "--use-ghcr"]).unwrap().use_ghcr);

        for (value, expected) in [
            ("true", true),
            ("TRUE", true),
            ("True", true),
            ("", false),
            ("1", false),
            ("yes", false),
            ("garbage", false),
            ("false", false),
        ] {
            std::env::set_var("USE_GHCR", value);
            assert_eq!(parse(&["image-table"]).unwrap().use_ghcr, expected, "{value:?}");
        }
        std::env::set_var("USE_GHCR", "false");
        assert!(parse(&["image-table", "--use-ghcr"]).unwrap().use_ghcr);
        std::env::remove_var("USE_GHCR");
    }
}
