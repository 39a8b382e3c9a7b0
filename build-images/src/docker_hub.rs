use constcat::concat;
use log::debug;
use serde::Deserialize;

use crate::Result;

pub const DOCKER_HUB_URL: &str = "https://hub.docker.com";

const NAMESPACES_URL: &str = concat!(DOCKER_HUB_URL, "/v2/namespaces");

/// The maximum page size accepted by the Docker Hub tag listing.
const PAGE_SIZE: u32 = 1000;

/// A repository on Docker Hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repository {
    pub namespace: &'static str,
    pub name: &'static str,
}

impl Repository {
    /// Official Rust images, used as the base image of every build image.
    pub const RUST: Self = Self {
        namespace: "library",
        name: "rust",
    };

    /// Where the build images are published.
    pub const ELLIPSIS_LABS_SOLANA: Self = Self {
        namespace: "ellipsislabs",
        name: "solana",
    };

    /// Build images published by the Solana Foundation.
    pub const SOLANA_FOUNDATION_VERIFIED_BUILD: Self = Self {
        namespace: "solanafoundation",
        name: "solana-verified-build",
    };

    fn tags_url(&self) -> String {
        format!(
            "{NAMESPACES_URL}/{namespace}/repositories/{name}/tags",
            namespace = self.namespace,
            name = self.name,
        )
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Partial implementation of a single tag as returned by
/// `GET /v2/namespaces/{namespace}/repositories/{repository}/tags/{tag}`.
#[derive(Debug, Deserialize)]
pub struct TagDetails {
    #[serde(default)]
    pub images: Vec<Image>,
}

/// A platform specific image behind a tag.
#[derive(Debug, Deserialize)]
pub struct Image {
    pub architecture: String,
    #[serde(default)]
    pub digest: Option<String>,
}

/// Partial implementation of the page returned by
/// `GET /v2/namespaces/{namespace}/repositories/{repository}/tags`.
#[derive(Debug, Deserialize)]
struct TagPage {
    results: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub digest: Option<String>,
}

/// Read access to a container image registry.
pub trait ImageRegistry {
    /// Returns the platform specific images of a tag, or `None` when the registry answered with a
    /// non-success status.
    fn tag_details(&self, repository: Repository, tag: &str) -> Result<Option<TagDetails>>;

    /// Returns the first page of tags of a repository. A non-success status is an error.
    fn tags(&self, repository: Repository) -> Result<Vec<Tag>>;
}

pub struct DockerHub<'a> {
    client: &'a reqwest::blocking::Client,
}

impl<'a> DockerHub<'a> {
    pub fn new(client: &'a reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl ImageRegistry for DockerHub<'_> {
    fn tag_details(&self, repository: Repository, tag: &str) -> Result<Option<TagDetails>> {
        let url = format!("{tags_url}/{tag}", tags_url = repository.tags_url());
        debug!("GET {url}");

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            debug!("GET {url} returned {status}", status = response.status());
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&response.text()?)?))
    }

    fn tags(&self, repository: Repository) -> Result<Vec<Tag>> {
        let url = repository.tags_url();
        debug!("GET {url}?page_size={PAGE_SIZE}");

        let response = self
            .client
            .get(&url)
            .query(&[("page_size", PAGE_SIZE)])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(format!("failed to list the tags of {repository}: {status} {body}").into());
        }

        Ok(serde_json::from_str::<TagPage>(&response.text()?)?.results)
    }
}
