//! Target path computation and local source expansion
//!
//! A target ending in `/` is a folder: matched items land inside it, keeping
//! their hierarchy below the pattern's static prefix unless `flat` is set.
//! Any other target is the exact destination path.

use camino::{Utf8Path, Utf8PathBuf};
use globset::GlobBuilder;
use regex::Regex;
use walkdir::WalkDir;

use crate::aql::Pattern;
use crate::error::{ArtifactoryError, Result};
use crate::types::ResultItem;

/// Destination `repo/path` for a remote item copied from `pattern`
pub fn copy_destination(pattern: &Pattern, item: &ResultItem, target: &str, flat: bool) -> String {
    if !target.ends_with('/') {
        return target.to_string();
    }
    if flat {
        return format!("{}{}", target, item.name);
    }

    let base = pattern.static_dir();
    let relative = item.repo_relative_path();
    let relative = if base.is_empty() {
        relative.as_str()
    } else {
        relative
            .strip_prefix(&format!("{}/", base))
            .unwrap_or(relative.as_str())
    };
    format!("{}{}", target, relative)
}

/// Destination `repo/path` for a local file found under `base`
pub fn upload_destination(base: &Utf8Path, file: &Utf8Path, target: &str, flat: bool) -> String {
    if !target.ends_with('/') {
        return target.to_string();
    }

    let name = file.file_name().unwrap_or(file.as_str());
    if flat {
        return format!("{}{}", target, name);
    }

    let relative = file.strip_prefix(base).unwrap_or(file);
    let relative = relative.as_str().replace('\\', "/");
    format!("{}{}", target, relative.trim_start_matches('/'))
}

/// A local file or folder selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSource {
    pub path: Utf8PathBuf,
    pub is_dir: bool,
}

/// Local files matched by an upload pattern, plus the folder they are
/// relative to
#[derive(Debug, Clone, Default)]
pub struct LocalMatches {
    pub base: Utf8PathBuf,
    pub sources: Vec<LocalSource>,
}

/// Longest leading run of path segments without glob metacharacters
fn static_prefix(pattern: &str) -> Utf8PathBuf {
    let mut base = Utf8PathBuf::new();
    let segments: Vec<&str> = pattern.split('/').collect();
    // The last segment names files, never the base folder
    for segment in &segments[..segments.len().saturating_sub(1)] {
        if segment.contains(['*', '?', '[', '{', '(', '\\', '^', '$', '+', '|']) {
            break;
        }
        if segment.is_empty() && base.as_str().is_empty() {
            base.push("/");
            continue;
        }
        base.push(segment);
    }
    if base.as_str().is_empty() {
        Utf8PathBuf::from(".")
    } else {
        base
    }
}

/// Expand a local upload pattern
///
/// Globs use `*` within one folder level when `recursive` is false and across
/// levels when it is true. With `regexp`, the pattern is a regular expression
/// matched against the whole path.
pub fn expand_local(
    pattern: &str,
    recursive: bool,
    regexp: bool,
    include_dirs: bool,
) -> Result<LocalMatches> {
    let literal = Utf8Path::new(pattern);
    if !regexp && literal.is_file() {
        let base = literal
            .parent()
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|| Utf8PathBuf::from("."));
        return Ok(LocalMatches {
            base,
            sources: vec![LocalSource {
                path: literal.to_path_buf(),
                is_dir: false,
            }],
        });
    }

    let base = static_prefix(pattern);
    let matcher: Box<dyn Fn(&str) -> bool> = if regexp {
        let re = Regex::new(&format!("^(?:{})$", pattern))
            .map_err(|e| ArtifactoryError::InvalidPattern(format!("{}: {}", pattern, e)))?;
        Box::new(move |candidate| re.is_match(candidate))
    } else {
        let glob = GlobBuilder::new(pattern.trim_start_matches("./"))
            .literal_separator(!recursive)
            .build()
            .map_err(|e| ArtifactoryError::InvalidPattern(format!("{}: {}", pattern, e)))?
            .compile_matcher();
        Box::new(move |candidate| glob.is_match(candidate.trim_start_matches("./")))
    };

    if !base.exists() {
        tracing::debug!(base = %base, "upload base folder does not exist");
        return Ok(LocalMatches {
            base,
            sources: Vec::new(),
        });
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(&base).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            ArtifactoryError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walk loop detected")),
            )
        })?;

        let Some(path) = Utf8Path::from_path(entry.path()) else {
            tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 path");
            continue;
        };

        let is_dir = entry.file_type().is_dir();
        if is_dir && !include_dirs {
            continue;
        }
        if matcher(path.as_str()) {
            sources.push(LocalSource {
                path: path.to_path_buf(),
                is_dir,
            });
        }
    }

    Ok(LocalMatches { base, sources })
}
