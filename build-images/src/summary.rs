use std::fmt;

use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use release_version::ReleaseTag;

use crate::{dockerfile, publish::Outcome};

/// What happened to a single release during a run.
#[derive(Debug, Clone)]
pub struct ReleaseReport {
    pub tag: ReleaseTag,
    pub toolchain: Option<String>,
    pub rust_digest: Option<String>,
    pub status: ReleaseStatus,
    pub published: Option<bool>,
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStatus {
    ToolchainUnresolved,
    DigestUnresolved,
    Rendered(dockerfile::Status),
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseStatus::ToolchainUnresolved => f.write_str("skipped: unknown toolchain"),
            ReleaseStatus::DigestUnresolved => f.write_str("skipped: unknown base image"),
            ReleaseStatus::Rendered(status) => fmt::Display::fmt(status, f),
        }
    }
}

/// Digests are long, the algorithm prefix and the first 12 hex characters identify them well
/// enough in a terminal.
fn short_digest(digest: &str) -> &str {
    const LEN: usize = "sha256:".len() + 12;
    digest.get(..LEN).unwrap_or(digest)
}

pub fn table(reports: &[ReleaseReport]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["release", "toolchain", "base image", "Dockerfile", "published", "upload"]
                .into_iter()
                .map(|name| Cell::new(name).add_attribute(Attribute::Bold)),
        );

    for report in reports {
        table.add_row([
            report.tag.to_string(),
            report.toolchain.clone().unwrap_or_default(),
            report
                .rust_digest
                .as_deref()
                .map(short_digest)
                .unwrap_or_default()
                .to_owned(),
            report.status.to_string(),
            match report.published {
                Some(true) => "yes".to_owned(),
                Some(false) => "no".to_owned(),
                None => String::new(),
            },
            report
                .outcome
                .map(|outcome| outcome.to_string())
                .unwrap_or_default(),
        ]);
    }

    table
}
