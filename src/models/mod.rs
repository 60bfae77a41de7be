//! Data transfer objects (DTOs) for engine results.
//!
//! These structs are what the engine returns and what the HTTP layer
//! serializes to JSON.
//! - `tree`: TreeEntry, FullTreeEntry, RepositoryInfo, DirectoryInfo, CommitInfo
//! - `commit`: CommitDetail, CommitListResponse, AuthorInfo
//! - `diff`: DiffResponse, FileDiff, DiffHunk, DiffLine
//! - `blame`: BlameResponse, BlameLine for per-line author attribution

pub mod blame;
pub mod commit;
pub mod diff;
pub mod tree;

pub use blame::*;
pub use commit::*;
pub use diff::*;
pub use tree::*;
