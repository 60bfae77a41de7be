//! Git operations module - the version-control data engine on top of libgit2.
//!
//! Submodules:
//! - `repository`: Repository handle, revision resolution, branches, exclusive access
//! - `walk`: Deterministic, cancellable newest-first ancestry traversal
//! - `filter`: Include/Exclude author filter
//! - `tree`: Directory listing, full tree, directory aggregate, file content
//! - `history`: Path-scoped paginated commit history and last-commit lookup
//! - `diff`: Two-revision and working-tree diffs with per-file authorship
//! - `blame`: Per-line attribution following renames

pub mod blame;
pub mod diff;
pub mod filter;
pub mod history;
pub mod repository;
pub mod tree;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_support;

pub use filter::AuthorFilter;
pub use repository::{GitRepository, RepoHandle, SharedRepo};

/// Repository-relative path with surrounding slashes removed; the root
/// (`None`, `""`, `"/"`) becomes `None`.
pub(crate) fn normalize_path(path: Option<&str>) -> Option<&str> {
    path.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty())
}

/// Whether `changed` is `target`, lies beneath it, or is an ancestor of it
/// (a file replaced by a directory of the same name).
pub(crate) fn path_overlaps(changed: &str, target: &str) -> bool {
    fn is_under(path: &str, dir: &str) -> bool {
        path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/'
    }
    changed == target || is_under(changed, target) || is_under(target, changed)
}
