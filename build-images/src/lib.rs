pub(crate) mod digest;
pub(crate) mod docker;
pub(crate) mod docker_hub;
pub(crate) mod dockerfile;
pub(crate) mod github;
pub(crate) mod image_table;
pub(crate) mod process;
pub(crate) mod publish;
pub(crate) mod release;
pub(crate) mod summary;

pub mod cli;

pub(crate) type Result<T, E = Box<dyn std::error::Error + Send + Sync + 'static>> =
    std::result::Result<T, E>;
