//! Repository handle and exclusive access.
//!
//! `GitRepository` owns the single libgit2 `Repository` connection plus the
//! engine settings; every query lives in an `impl GitRepository` block in the
//! sibling modules. `RepoHandle` wraps it in a mutex: libgit2 repositories are
//! not safe to share between threads, so every operation holds the lock for
//! its whole duration, and a repository switch swaps the handle under the same
//! lock.
//!
//! Used by: All route handlers via `SharedRepo` (Arc<RepoHandle>)

use git2::{BranchType, ErrorCode, Oid, Repository};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::error::{AppError, Result};
use crate::git::walk::AncestryWalk;
use crate::models::{AuthorInfo, BranchInfo, CommitDetail, CommitInfo, RepositoryInfo};

pub struct GitRepository {
    repo: Repository,
    pub path: String,
    pub config: EngineConfig,
    /// Token of the request currently holding the lock.
    cancel: CancellationToken,
}

impl GitRepository {
    /// Open the repository containing `path`, searching parent directories
    /// until a repository is found.
    pub fn open<P: AsRef<Path>>(path: P, config: EngineConfig) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let repo = Repository::discover(&path).map_err(|_| AppError::RepoNotFound(path_str))?;

        let root = repo.workdir().unwrap_or_else(|| repo.path());
        let path = root
            .to_string_lossy()
            .trim_end_matches(['/', '\\'])
            .to_string();

        tracing::info!("Opened repository at {} (bare: {})", path, repo.is_bare());

        Ok(Self {
            repo,
            path,
            config,
            cancel: CancellationToken::new(),
        })
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Fail with `Cancelled` once the requesting client has gone away.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            tracing::warn!("Repository operation cancelled");
            return Err(AppError::Cancelled);
        }
        Ok(())
    }

    /// Newest-first walk over every commit reachable from `start`.
    pub fn walk_from(&self, start: Oid) -> Result<AncestryWalk<'_>> {
        AncestryWalk::new(&self.repo, &self.cancel, start)
    }

    /// Resolve a revision (hash, branch, tag, any rev-parse expression) to a
    /// commit id. `None` means `HEAD`.
    pub fn resolve(&self, revision: Option<&str>) -> Result<Oid> {
        let spec = match revision.map(str::trim) {
            None => "HEAD",
            Some("") => return Err(AppError::Parse("empty revision".to_string())),
            Some(spec) => spec,
        };

        let object = self
            .repo
            .revparse_single(spec)
            .map_err(|e| revision_error(spec, e))?;

        let commit = object
            .peel_to_commit()
            .map_err(|_| AppError::RevisionNotFound(spec.to_string()))?;

        Ok(commit.id())
    }

    pub fn resolve_commit(&self, revision: Option<&str>) -> Result<git2::Commit<'_>> {
        let oid = self.resolve(revision)?;
        Ok(self.repo.find_commit(oid)?)
    }

    /// Raw bytes of the blob with the given full hex id.
    pub fn read_blob(&self, object_id: &str) -> Result<Vec<u8>> {
        let object_id = object_id.trim();
        if object_id.len() != 40 || !object_id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppError::Parse(format!("malformed object id: {}", object_id)));
        }
        let oid = Oid::from_str(object_id).map_err(|e| AppError::Parse(e.message().to_string()))?;

        match self.repo.find_blob(oid) {
            Ok(blob) => Ok(blob.content().to_vec()),
            Err(e) if e.code() == ErrorCode::NotFound => {
                Err(AppError::ObjectNotFound(object_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Working directory, or `UnsupportedForBareRepository` for bare repositories.
    pub fn require_workdir(&self, operation: &str) -> Result<&Path> {
        self.repo
            .workdir()
            .ok_or_else(|| AppError::UnsupportedForBareRepository(operation.to_string()))
    }

    pub fn info(&self) -> Result<RepositoryInfo> {
        let repo = &self.repo;

        let name = Path::new(&self.path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let head_branch = repo.head().ok().and_then(|h| {
            if h.is_branch() {
                h.shorthand().map(|s| s.to_string())
            } else {
                None
            }
        });

        let head_commit = repo.head().ok().and_then(|h| {
            h.peel_to_commit().ok().map(|c| commit_to_info(&c))
        });

        Ok(RepositoryInfo {
            name,
            path: self.path.clone(),
            head_branch,
            head_commit,
            is_bare: repo.is_bare(),
            is_empty: repo.is_empty().unwrap_or(true),
        })
    }

    /// Full record for a single commit.
    pub fn get_commit(&self, revision: &str) -> Result<CommitDetail> {
        let commit = self.resolve_commit(Some(revision))?;
        Ok(commit_to_detail(&commit))
    }

    /// List all local and remote branches in the repository
    pub fn list_branches(&self) -> Result<Vec<BranchInfo>> {
        let repo = &self.repo;

        let head = repo.head().ok();
        let current_branch = head.as_ref().and_then(|h| {
            if h.is_branch() {
                h.shorthand().map(|s| s.to_string())
            } else {
                None
            }
        });

        let mut local_branches = Vec::new();
        let mut remote_branches = Vec::new();

        for branch_result in repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch_result?;
            let name = branch.name()?.unwrap_or("").to_string();
            let is_current = current_branch.as_ref() == Some(&name);
            let last_commit = branch.get().peel_to_commit().ok().map(|c| commit_to_info(&c));

            local_branches.push(BranchInfo {
                name,
                is_current,
                is_remote: false,
                last_commit,
            });
        }

        for branch_result in repo.branches(Some(BranchType::Remote))? {
            let (branch, _) = branch_result?;
            let name = branch.name()?.unwrap_or("").to_string();
            // origin/HEAD is a symbolic alias, not a branch
            if name.ends_with("/HEAD") {
                continue;
            }
            let last_commit = branch.get().peel_to_commit().ok().map(|c| commit_to_info(&c));

            remote_branches.push(BranchInfo {
                name,
                is_current: false,
                is_remote: true,
                last_commit,
            });
        }

        // Local: current branch first, then alphabetically
        local_branches.sort_by(|a, b| match (a.is_current, b.is_current) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        });
        remote_branches.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        let mut branches = local_branches;
        branches.extend(remote_branches);
        Ok(branches)
    }

    /// Checkout a local branch by name
    pub fn checkout_branch(&self, branch_name: &str) -> Result<()> {
        self.require_workdir("checkout")?;
        let repo = &self.repo;

        let branch = repo
            .find_branch(branch_name, BranchType::Local)
            .map_err(|_| AppError::RevisionNotFound(format!("branch {}", branch_name)))?;

        let refname = branch
            .get()
            .name()
            .ok_or_else(|| AppError::Internal("Invalid branch reference".to_string()))?
            .to_string();

        self.ensure_clean_worktree()?;

        // Force is safe: the worktree was verified clean above
        let commit = branch.get().peel_to_commit()?;
        let tree = commit.tree()?;
        let mut checkout_builder = git2::build::CheckoutBuilder::new();
        checkout_builder.force();

        repo.checkout_tree(tree.as_object(), Some(&mut checkout_builder))?;
        repo.set_head(&refname)?;

        tracing::info!("Checked out branch: {}", branch_name);
        Ok(())
    }

    /// Create a local branch tracking `remote_branch` and check it out
    pub fn checkout_remote_branch(&self, remote_branch: &str, local_name: &str) -> Result<()> {
        self.require_workdir("checkout")?;
        let repo = &self.repo;

        self.ensure_clean_worktree()?;

        if repo.find_branch(local_name, BranchType::Local).is_ok() {
            return Err(AppError::BranchExists(local_name.to_string()));
        }

        let remote_ref = repo
            .find_branch(remote_branch, BranchType::Remote)
            .map_err(|_| AppError::RevisionNotFound(format!("remote branch {}", remote_branch)))?;

        let commit = remote_ref.get().peel_to_commit()?;

        let mut local_branch = repo.branch(local_name, &commit, false)?;
        local_branch.set_upstream(Some(remote_branch))?;

        let refname = local_branch
            .get()
            .name()
            .ok_or_else(|| AppError::Internal("Invalid branch reference".to_string()))?
            .to_string();

        let tree = commit.tree()?;
        let mut checkout_builder = git2::build::CheckoutBuilder::new();
        checkout_builder.force();

        repo.checkout_tree(tree.as_object(), Some(&mut checkout_builder))?;
        repo.set_head(&refname)?;

        tracing::info!(
            "Created and checked out local branch '{}' tracking '{}'",
            local_name,
            remote_branch
        );
        Ok(())
    }

    /// Refuse to continue when tracked files have uncommitted changes.
    fn ensure_clean_worktree(&self) -> Result<()> {
        let statuses = self.repo.statuses(Some(
            git2::StatusOptions::new()
                .include_untracked(false)
                .include_ignored(false),
        ))?;

        let dirty: Vec<String> = statuses
            .iter()
            .filter(|s| {
                s.status().intersects(
                    git2::Status::INDEX_NEW
                        | git2::Status::INDEX_MODIFIED
                        | git2::Status::INDEX_DELETED
                        | git2::Status::INDEX_RENAMED
                        | git2::Status::INDEX_TYPECHANGE
                        | git2::Status::WT_MODIFIED
                        | git2::Status::WT_DELETED
                        | git2::Status::WT_RENAMED
                        | git2::Status::WT_TYPECHANGE,
                )
            })
            .filter_map(|s| s.path().map(|p| p.to_string()))
            .collect();

        if dirty.is_empty() {
            return Ok(());
        }

        let file_list = dirty.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
        let more = if dirty.len() > 5 {
            format!(" and {} more", dirty.len() - 5)
        } else {
            String::new()
        };
        Err(AppError::CheckoutConflict(format!(
            "Cannot switch branches: you have uncommitted changes in: {}{}",
            file_list, more
        )))
    }
}

fn revision_error(spec: &str, error: git2::Error) -> AppError {
    match error.code() {
        ErrorCode::InvalidSpec => {
            AppError::Parse(format!("invalid revision '{}': {}", spec, error.message()))
        }
        ErrorCode::NotFound | ErrorCode::Ambiguous | ErrorCode::UnbornBranch => {
            AppError::RevisionNotFound(spec.to_string())
        }
        _ => AppError::Git(error),
    }
}

pub fn commit_to_info(commit: &git2::Commit) -> CommitInfo {
    let timestamp = commit.time().seconds();
    CommitInfo {
        oid: commit.id().to_string(),
        message: commit.message().unwrap_or("").trim().to_string(),
        author: commit.author().name().unwrap_or("Unknown").to_string(),
        timestamp,
        relative_time: format_relative_time(timestamp),
    }
}

pub fn commit_to_detail(commit: &git2::Commit) -> CommitDetail {
    let timestamp = commit.time().seconds();
    CommitDetail {
        oid: commit.id().to_string(),
        message: commit.message().unwrap_or("").trim().to_string(),
        author: signature_to_author(&commit.author()),
        committer: signature_to_author(&commit.committer()),
        timestamp,
        relative_time: format_relative_time(timestamp),
        parent_count: commit.parent_count(),
        parents: commit.parent_ids().map(|id| id.to_string()).collect(),
    }
}

pub fn signature_to_author(signature: &git2::Signature) -> AuthorInfo {
    AuthorInfo {
        name: signature.name().unwrap_or("Unknown").to_string(),
        email: signature.email().unwrap_or("").to_string(),
    }
}

pub fn format_relative_time(timestamp: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let diff = now - timestamp;

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        let mins = diff / 60;
        format!("{} minute{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if diff < 86400 {
        let hours = diff / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if diff < 2592000 {
        let days = diff / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else if diff < 31536000 {
        let months = diff / 2592000;
        format!("{} month{} ago", months, if months == 1 { "" } else { "s" })
    } else {
        let years = diff / 31536000;
        format!("{} year{} ago", years, if years == 1 { "" } else { "s" })
    }
}

/// The one active repository, behind the lock every operation takes.
pub struct RepoHandle {
    config: EngineConfig,
    inner: Mutex<GitRepository>,
}

impl RepoHandle {
    pub fn new(repo: GitRepository) -> Self {
        Self {
            config: repo.config,
            inner: Mutex::new(repo),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, GitRepository>> {
        self.inner
            .lock()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))
    }

    /// Run `f` with exclusive access; walks inside `f` abort once `cancel` fires.
    pub fn with_repo_cancellable<F, T>(&self, cancel: CancellationToken, f: F) -> Result<T>
    where
        F: FnOnce(&GitRepository) -> Result<T>,
    {
        let mut repo = self.lock()?;
        repo.cancel = cancel;
        let result = f(&repo);
        repo.cancel = CancellationToken::new();
        result
    }

    /// Replace the active repository. The new one is opened before the lock is
    /// taken, so a bad path leaves the current repository in place.
    pub fn switch<P: AsRef<Path>>(&self, path: P) -> Result<RepositoryInfo> {
        let new_repo = GitRepository::open(path, self.config)?;
        let info = new_repo.info()?;

        let mut repo = self.lock()?;
        *repo = new_repo;
        tracing::info!("Switched repository to {}", info.path);

        Ok(info)
    }
}

pub type SharedRepo = Arc<RepoHandle>;
