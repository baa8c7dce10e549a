//! Implementation of `bootstage buildinfo`.
//!
//! Writes a Go source file recording the version, build time and commit of
//! the working tree. Every git query degrades to a placeholder on failure;
//! only writing the file can fail the operation.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use git2::{Oid, Repository};
use tracing::{info, warn};

use crate::builder::errors::BuildError;
use crate::util::process::write_atomic;

/// Name of the generated file, at the project root.
pub const BUILDINFO_FILE: &str = "buildinfo.go";

/// Version reported when no tag can be found.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Build metadata embedded in `buildinfo.go`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    /// UTC, `%Y-%m-%dT%H:%M:%S`
    pub build_time: String,
    /// HEAD commit id, empty if unknown
    pub commit: String,
    /// Whether HEAD is covered by a tag
    pub is_tagged: bool,
}

impl BuildInfo {
    /// Query the repository containing `root`.
    pub fn collect(root: &Path, now: DateTime<Utc>) -> Self {
        let mut info = BuildInfo {
            version: UNKNOWN_VERSION.to_string(),
            build_time: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
            commit: String::new(),
            is_tagged: false,
        };

        let repo = match Repository::discover(root) {
            Ok(repo) => repo,
            Err(e) => {
                warn!("buildinfo: {}", e.message());
                return info;
            }
        };

        let head = match repo.head().and_then(|h| h.peel_to_commit()) {
            Ok(commit) => commit.id(),
            Err(e) => {
                warn!("buildinfo: {}", e.message());
                return info;
            }
        };
        info.commit = head.to_string();

        match tagged_commits(&repo) {
            Ok(tags) => {
                if let Some(tag) = containing_tag(&repo, &tags, head) {
                    info.version = tag;
                    info.is_tagged = true;
                } else if let Some(tag) = latest_merged_tag(&repo, &tags, head) {
                    info.version = tag;
                }
            }
            Err(e) => warn!("buildinfo: {}", e.message()),
        }

        info
    }

    /// The Go source for this metadata.
    pub fn render(&self) -> String {
        format!(
            "// Code Generated by \"bootstage buildinfo\"  DO NOT EDIT.\n\
             package main\n\
             \n\
             const (VERSION=\"{}\";BUILDTIME=\"{}\";COMMIT=\"{}\";IS_TAGGED={})\n",
            self.version, self.build_time, self.commit, self.is_tagged
        )
    }
}

/// Write `buildinfo.go` under `root`.
pub fn buildinfo(root: &Path) -> Result<(BuildInfo, PathBuf), BuildError> {
    let info = BuildInfo::collect(root, Utc::now());
    let path = root.join(BUILDINFO_FILE);
    write_atomic(&path, info.render().as_bytes())?;
    info!(
        "buildinfo: version {} commit {} tagged {}",
        info.version, info.commit, info.is_tagged
    );
    Ok((info, path))
}

/// Every tag with the commit it points at, sorted by name.
fn tagged_commits(repo: &Repository) -> Result<Vec<(String, Oid)>, git2::Error> {
    let names = repo.tag_names(None)?;
    let mut tags = Vec::new();
    for name in names.iter().flatten() {
        let commit = repo
            .revparse_single(&format!("refs/tags/{}", name))
            .and_then(|obj| obj.peel_to_commit());
        match commit {
            Ok(commit) => tags.push((name.to_string(), commit.id())),
            Err(e) => warn!("buildinfo: tag {}: {}", name, e.message()),
        }
    }
    tags.sort();
    Ok(tags)
}

/// First tag whose commit is HEAD or a descendant of it.
fn containing_tag(repo: &Repository, tags: &[(String, Oid)], head: Oid) -> Option<String> {
    tags.iter()
        .find(|(_, oid)| *oid == head || is_descendant(repo, *oid, head))
        .map(|(name, _)| name.clone())
}

/// Highest tag, in version order, whose commit is an ancestor of HEAD.
fn latest_merged_tag(repo: &Repository, tags: &[(String, Oid)], head: Oid) -> Option<String> {
    tags.iter()
        .filter(|(_, oid)| *oid == head || is_descendant(repo, head, *oid))
        .map(|(name, _)| name.as_str())
        .max_by(|a, b| compare_versions(a, b))
        .map(str::to_string)
}

fn is_descendant(repo: &Repository, commit: Oid, ancestor: Oid) -> bool {
    repo.graph_descendant_of(commit, ancestor).unwrap_or_else(|e| {
        warn!("buildinfo: {}", e.message());
        false
    })
}

fn parse_version(tag: &str) -> Option<semver::Version> {
    semver::Version::parse(tag.strip_prefix('v').unwrap_or(tag)).ok()
}

/// Order tag names as versions where they parse; names that do not parse
/// sort before those that do, and among themselves by name.
fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}
