//! Tree and repository-related DTOs.
//!
//! - `TreeEntry`: Single child of a directory listing
//! - `FullTreeEntry`: Recursive tree node, no commit metadata
//! - `RepositoryInfo`: Repo metadata
//! - `DirectoryInfo`: Recursive directory aggregate
//! - `CommitInfo`: Abbreviated commit (last commit of an entry, branch heads)
//! - `ContributorInfo`: Author with commit count

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub path: String,
    pub entry_type: EntryType,
    /// Blob size, files and symlinks only.
    pub size: Option<u64>,
    /// Immediate children, directories only.
    pub child_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<CommitInfo>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
    Symlink,
    Submodule,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitInfo {
    pub oid: String,
    pub message: String,
    pub author: String,
    pub timestamp: i64,
    pub relative_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullTreeEntry {
    pub name: String,
    pub path: String,
    pub entry_type: EntryType,
    pub children: Option<Vec<FullTreeEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub path: String,
    pub head_branch: Option<String>,
    pub head_commit: Option<CommitInfo>,
    pub is_bare: bool,
    pub is_empty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryInfo {
    pub path: String,
    pub file_count: usize,
    pub directory_count: usize,
    pub total_size: u64,
    pub contributors: Vec<ContributorInfo>,
    pub first_commit: Option<CommitInfo>,
    pub latest_commit: Option<CommitInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContributorInfo {
    pub name: String,
    pub email: String,
    pub commit_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    pub is_current: bool,
    pub is_remote: bool,
    pub last_commit: Option<CommitInfo>,
}
