//! Parameter and result types for client operations

use serde::{Deserialize, Serialize};

/// One artifact or folder returned by a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    pub repo: String,
    /// Folder inside the repository, `.` for the repository root
    pub path: String,
    pub name: String,
    #[serde(rename = "type", default = "default_item_type")]
    pub item_type: String,
}

fn default_item_type() -> String {
    "file".to_string()
}

impl ResultItem {
    pub fn new(repo: impl Into<String>, path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            path: path.into(),
            name: name.into(),
            item_type: default_item_type(),
        }
    }

    /// Path inside the repository, without the repository key
    pub fn repo_relative_path(&self) -> String {
        if self.path.is_empty() || self.path == "." {
            self.name.clone()
        } else {
            format!("{}/{}", self.path, self.name)
        }
    }

    /// `repo/path/name`
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.repo, self.repo_relative_path())
    }

    pub fn is_folder(&self) -> bool {
        self.item_type == "folder"
    }
}

/// Items matched by a search, in server order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    items: Vec<ResultItem>,
}

impl ResultSet {
    pub fn new(items: Vec<ResultItem>) -> Self {
        Self { items }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[ResultItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Vec<ResultItem>> for ResultSet {
    fn from(items: Vec<ResultItem>) -> Self {
        Self::new(items)
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultItem;
    type IntoIter = std::vec::IntoIter<ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ResultItem;
    type IntoIter = std::slice::Iter<'a, ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Outcome of a batch transfer (copy or upload)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl TransferSummary {
    pub fn new(succeeded: usize, failed: usize) -> Self {
        Self { succeeded, failed }
    }

    /// No item failed
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Search by pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    /// `repo/path/name`, `*` and `?` wildcards allowed
    pub pattern: String,
    pub recursive: bool,
    /// Match folders as well as files
    pub include_dirs: bool,
}

impl SearchParams {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn include_dirs(mut self, include_dirs: bool) -> Self {
        self.include_dirs = include_dirs;
        self
    }
}

/// Copy every artifact matching `pattern` to `target`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyParams {
    pub pattern: String,
    /// `repo/path`; a trailing `/` means "into this folder"
    pub target: String,
    pub recursive: bool,
    /// Drop the source folder hierarchy
    pub flat: bool,
}

/// Resolve artifacts to delete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteParams {
    /// A trailing `/` deletes the folder itself
    pub pattern: String,
    pub recursive: bool,
}

/// Upload local files matching `pattern`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadParams {
    /// Local glob, or a regular expression when `regexp` is set
    pub pattern: String,
    /// `repo/path`; a trailing `/` means "into this folder"
    pub target: String,
    pub flat: bool,
    pub include_dirs: bool,
    pub recursive: bool,
    pub regexp: bool,
    /// `key=value;key2=value2` attached to every uploaded file
    pub build_props: Option<String>,
}

/// Body of a Docker image promotion
///
/// `source_repo` only selects the endpoint and is not part of the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePromotion {
    #[serde(skip)]
    pub source_repo: String,
    pub target_repo: String,
    pub docker_repository: String,
    pub target_docker_repository: String,
    pub tag: String,
    pub target_tag: String,
    /// Copy instead of move
    pub copy: bool,
}
