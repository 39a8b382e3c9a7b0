use constcat::concat;
use log::debug;
use release_version::ReleaseTag;
use serde::Deserialize;

use crate::{process, release::SourceHost, Result};

/// The upstream Solana repository, `owner/name`.
const SOLANA_REPOSITORY: &str = "solana-labs/solana";

pub const SOLANA_REPOSITORY_URL: &str = concat!("https://github.com/", SOLANA_REPOSITORY);

const RAW_CONTENT_URL: &str = concat!("https://raw.githubusercontent.com/", SOLANA_REPOSITORY);

const API_URL: &str = "https://api.github.com";

/// Container package that mirrors the build images on the GitHub container registry.
const PACKAGE_USER: &str = "ngundotra";
const PACKAGE_NAME: &str = "solana";

const PACKAGE_VERSIONS_URL: &str = concat!(
    API_URL,
    "/users/",
    PACKAGE_USER,
    "/packages/container/",
    PACKAGE_NAME,
    "/versions"
);

/// The maximum page size accepted by the GitHub REST API.
const PER_PAGE: u32 = 100;

const TOOLCHAIN_FILE: &str = "rust-toolchain.toml";

/// Partial implementation of a package version as returned by
/// `GET /users/{username}/packages/container/{package_name}/versions`. For container packages, the
/// `name` is the image digest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageVersion {
    pub name: String,
    #[serde(default)]
    pub metadata: PackageMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageMetadata {
    #[serde(default)]
    pub container: ContainerMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Lists the versions of the container package holding the build images.
pub trait PackageRegistry {
    /// Returns the first page of package versions. A non-success status is an error.
    fn package_versions(&self) -> Result<Vec<PackageVersion>>;
}

pub struct GitHub<'a> {
    client: &'a reqwest::blocking::Client,
    token: Option<&'a str>,
}

impl<'a> GitHub<'a> {
    pub fn new(client: &'a reqwest::blocking::Client, token: Option<&'a str>) -> Self {
        Self { client, token }
    }
}

impl SourceHost for GitHub<'_> {
    fn list_tag_refs(&self) -> Result<String> {
        let output =
            process::command!("git", "ls-remote", "--tags", SOLANA_REPOSITORY_URL).output()?;
        Ok(std::str::from_utf8(&output.stdout)?.to_owned())
    }

    fn toolchain_manifest(&self, tag: &ReleaseTag) -> Result<Option<String>> {
        let url = format!("{RAW_CONTENT_URL}/{tag}/{TOOLCHAIN_FILE}");
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3.raw")
            .send()?;

        if !response.status().is_success() {
            debug!("GET {url} returned {status}", status = response.status());
            return Ok(None);
        }
        Ok(Some(response.text()?))
    }
}

impl PackageRegistry for GitHub<'_> {
    fn package_versions(&self) -> Result<Vec<PackageVersion>> {
        let token = self.token.ok_or(
            "a GitHub token is required to list container package versions, set GITHUB_TOKEN",
        )?;
        debug!("GET {PACKAGE_VERSIONS_URL}?per_page={PER_PAGE}");

        let response = self
            .client
            .get(PACKAGE_VERSIONS_URL)
            .query(&[("per_page", PER_PAGE)])
            .bearer_auth(token)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(format!(
                "failed to list the versions of package {PACKAGE_USER}/{PACKAGE_NAME}: {status} {body}"
            )
            .into());
        }

        Ok(serde_json::from_str(&response.text()?)?)
    }
}
