use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetail {
    pub oid: String,
    pub message: String,
    pub author: AuthorInfo,
    pub committer: AuthorInfo,
    pub timestamp: i64,
    pub relative_time: String,
    pub parent_count: usize,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AuthorInfo {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitListResponse {
    pub commits: Vec<CommitDetail>,
    /// Every commit touching the path, ignoring the author filter.
    pub total: usize,
    pub filtered_total: usize,
    pub has_more: bool,
    /// Full author roster for the path, so a filter UI can always offer everyone.
    pub contributors: Vec<AuthorInfo>,
    /// The applied author filter as an exclusion list against `contributors`, sorted.
    pub excluded_authors: Vec<String>,
}
