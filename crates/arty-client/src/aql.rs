//! Translate `repo/path/name` patterns into AQL item queries
//!
//! Only the subset needed for pattern search is produced: a repository, a
//! folder match, a name match, and an optional type filter.

use serde_json::{json, Value};

use crate::error::{ArtifactoryError, Result};

/// A search pattern split into its AQL parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub repo: String,
    /// Folder part, `.` for the repository root
    pub dir: String,
    pub name: String,
    /// The pattern named a folder explicitly (trailing `/`)
    pub folder: bool,
}

impl Pattern {
    /// Parse `repo`, `repo/name`, `repo/dir/name`, or `repo/dir/`
    pub fn parse(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim().trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(ArtifactoryError::InvalidPattern(
                "empty search pattern".to_string(),
            ));
        }

        let folder = trimmed.ends_with('/');
        let trimmed = trimmed.trim_end_matches('/');

        let (repo, rest) = match trimmed.split_once('/') {
            Some((repo, rest)) => (repo, rest),
            None => (trimmed, "*"),
        };

        if repo.is_empty() || repo.contains(['*', '?']) {
            return Err(ArtifactoryError::InvalidPattern(format!(
                "pattern must start with a repository key: {}",
                pattern
            )));
        }

        let (dir, name) = match rest.rsplit_once('/') {
            Some((dir, name)) => (dir.to_string(), name.to_string()),
            None => (".".to_string(), rest.to_string()),
        };

        Ok(Self {
            repo: repo.to_string(),
            dir,
            name,
            folder,
        })
    }

    /// Leading folder segments free of wildcards
    pub fn static_dir(&self) -> &str {
        if self.dir == "." {
            return "";
        }
        let end = self
            .dir
            .split('/')
            .take_while(|segment| !segment.contains(['*', '?']))
            .map(|segment| segment.len() + 1)
            .sum::<usize>();
        self.dir[..end.saturating_sub(1).min(self.dir.len())].trim_end_matches('/')
    }
}

/// Build an AQL `items.find` query for a pattern
pub fn build_query(pattern: &str, recursive: bool, include_dirs: bool) -> Result<String> {
    let parsed = Pattern::parse(pattern)?;

    let mut alternatives: Vec<Value> = vec![json!({
        "path": { "$match": &parsed.dir },
        "name": { "$match": &parsed.name },
    })];

    if recursive && !parsed.folder {
        let nested = if parsed.dir == "." {
            "*".to_string()
        } else {
            format!("{}/*", parsed.dir)
        };
        alternatives.push(json!({
            "path": { "$match": nested },
            "name": { "$match": &parsed.name },
        }));
    }

    let mut clauses = vec![json!({ "repo": &parsed.repo }), json!({ "$or": alternatives })];
    if !include_dirs && !parsed.folder {
        clauses.push(json!({ "type": "file" }));
    } else {
        clauses.push(json!({ "type": "any" }));
    }

    let criteria = json!({ "$and": clauses });
    Ok(format!(
        r#"items.find({}).include("repo","path","name","type")"#,
        criteria
    ))
}
