//! Diff generation between commits, or between a commit and the working tree.
//!
//! Generates detailed diffs with:
//! - File-level changes (added, modified, deleted, renamed, copied, typechanged)
//! - Hunks with line-by-line additions/deletions
//! - Full file contents (old and new) for side-by-side view
//! - Author attribution per file (who touched each file between the commits)
//! - File-level author filtering
//!
//! Also hosts `first_parent_diff`, the "did this commit change that path"
//! primitive shared with history and tree queries.

use git2::{
    Delta, Diff, DiffFindOptions, DiffOptions, FileMode, Oid, Patch, Repository, Sort, Tree,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Instant;

use crate::error::{AppError, Result};
use crate::git::filter::{exclusion_list, AuthorFilter};
use crate::git::normalize_path;
use crate::git::repository::GitRepository;
use crate::models::{
    AuthorInfo, DiffHunk, DiffLine, DiffResponse, DiffStats, DiffStatus, FileAuthorInfo, FileDiff,
    LineType, WorkingTreeStatus,
};

/// `to` value selecting the live working directory instead of a commit.
pub const WORKING_TREE: &str = "WORKING_TREE";

/// Diff options restricted to literal (non-glob) paths; a directory path
/// matches everything beneath it. A path whose entry kind changes (file to
/// symlink, file to submodule) is one `TypeChanged` delta.
pub(crate) fn path_diff_options(paths: &[&str]) -> DiffOptions {
    let mut opts = DiffOptions::new();
    opts.include_typechange(true);
    if !paths.is_empty() {
        opts.disable_pathspec_match(true);
        for path in paths {
            opts.pathspec(*path);
        }
    }
    opts
}

/// Diff `commit` against its first parent (the empty tree for root commits),
/// restricted to `paths` when any are given.
pub(crate) fn first_parent_diff<'r>(
    repo: &'r Repository,
    commit: &git2::Commit<'r>,
    paths: &[&str],
) -> Result<Diff<'r>> {
    let tree = commit.tree()?;

    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };

    let mut opts = path_diff_options(paths);
    opts.skip_binary_check(true);

    Ok(repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?)
}

/// Check if a commit changed anything at or under `path` relative to its first parent.
pub(crate) fn commit_touches_path(
    repo: &Repository,
    commit: &git2::Commit,
    path: &str,
) -> Result<bool> {
    Ok(first_parent_diff(repo, commit, &[path])?.deltas().len() > 0)
}

pub(crate) fn tree_has_path(tree: &Tree, path: &str) -> bool {
    tree.get_path(Path::new(path)).is_ok()
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn map_status(delta: Delta) -> DiffStatus {
    match delta {
        Delta::Added | Delta::Untracked => DiffStatus::Added,
        Delta::Deleted => DiffStatus::Deleted,
        Delta::Modified => DiffStatus::Modified,
        Delta::Renamed => DiffStatus::Renamed,
        Delta::Copied => DiffStatus::Copied,
        Delta::Typechange => DiffStatus::TypeChanged,
        _ => DiffStatus::Unmodified,
    }
}

fn blob_text(repo: &Repository, oid: Oid) -> Option<String> {
    if oid.is_zero() {
        return None;
    }
    let blob = repo.find_blob(oid).ok()?;
    String::from_utf8(blob.content().to_vec()).ok()
}

fn collect_hunks(patch: &Patch) -> Result<Vec<DiffHunk>> {
    let mut hunks = Vec::with_capacity(patch.num_hunks());

    for hunk_idx in 0..patch.num_hunks() {
        let (hunk, _) = patch.hunk(hunk_idx)?;
        let mut lines: Vec<DiffLine> = Vec::new();

        for line_idx in 0..patch.num_lines_in_hunk(hunk_idx)? {
            let line = patch.line_in_hunk(hunk_idx, line_idx)?;

            // '=', '>' and '<' only mark a missing newline at end of file
            let (line_type, old_lineno, new_lineno) = match line.origin() {
                '+' => (LineType::Addition, None, line.new_lineno()),
                '-' => (LineType::Deletion, line.old_lineno(), None),
                ' ' => (LineType::Context, line.old_lineno(), line.new_lineno()),
                _ => continue,
            };

            lines.push(DiffLine {
                line_type,
                old_lineno,
                new_lineno,
                content: String::from_utf8_lossy(line.content()).to_string(),
            });
        }

        hunks.push(DiffHunk {
            old_start: hunk.old_start(),
            old_lines: hunk.old_lines(),
            new_start: hunk.new_start(),
            new_lines: hunk.new_lines(),
            header: String::from_utf8_lossy(hunk.header()).trim_end().to_string(),
            lines,
        });
    }

    Ok(hunks)
}

/// Who touched which path, keyed by path then author email.
type PathAuthors = HashMap<String, HashMap<String, AuthorTouches>>;

#[derive(Debug, Clone)]
struct AuthorTouches {
    name: String,
    email: String,
    commits: HashSet<Oid>,
    last_commit_timestamp: i64,
}

impl AuthorTouches {
    fn merge(&mut self, other: &AuthorTouches) {
        self.commits.extend(other.commits.iter().copied());
        self.last_commit_timestamp = self.last_commit_timestamp.max(other.last_commit_timestamp);
    }
}

/// Authors of a file under its former and current path, each commit counted once.
/// Sorted by commit count, then most recent touch, then email.
fn authors_for_file(
    touched: &PathAuthors,
    old_path: Option<&str>,
    new_path: Option<&str>,
) -> Vec<FileAuthorInfo> {
    let mut merged: HashMap<&str, AuthorTouches> = HashMap::new();

    let mut paths: Vec<&str> = old_path.into_iter().chain(new_path).collect();
    paths.dedup();

    for path in paths {
        let Some(authors) = touched.get(path) else {
            continue;
        };
        for (email, touches) in authors {
            merged
                .entry(email.as_str())
                .and_modify(|existing| existing.merge(touches))
                .or_insert_with(|| touches.clone());
        }
    }

    let mut authors: Vec<FileAuthorInfo> = merged
        .into_values()
        .map(|info| FileAuthorInfo {
            email: info.email,
            name: info.name,
            commit_count: info.commits.len(),
            last_commit_timestamp: info.last_commit_timestamp,
        })
        .collect();

    authors.sort_by(|a, b| {
        b.commit_count
            .cmp(&a.commit_count)
            .then_with(|| b.last_commit_timestamp.cmp(&a.last_commit_timestamp))
            .then_with(|| a.email.cmp(&b.email))
    });

    authors
}

impl GitRepository {
    pub fn get_diff(
        &self,
        from_commit: Option<&str>,
        to_commit: &str,
        path: Option<&str>,
        filter: Option<&AuthorFilter>,
    ) -> Result<DiffResponse> {
        if to_commit == WORKING_TREE {
            return self.get_working_tree_diff(from_commit, path);
        }

        let repo = self.repo();
        let path = normalize_path(path);
        let started = Instant::now();

        let to_oid = self.resolve(Some(to_commit))?;
        let to = repo.find_commit(to_oid)?;
        let to_tree = to.tree()?;

        let (from_oid, from_tree) = match from_commit {
            Some(rev) => {
                let from = self.resolve_commit(Some(rev))?;
                (Some(from.id()), Some(from.tree()?))
            }
            None if to.parent_count() > 0 => {
                let parent = to.parent(0)?;
                (Some(parent.id()), Some(parent.tree()?))
            }
            None => (None, None),
        };

        if let Some(p) = path {
            let in_from = from_tree.as_ref().is_some_and(|t| tree_has_path(t, p));
            if !in_from && !tree_has_path(&to_tree, p) {
                return Err(AppError::PathNotFound(p.to_string()));
            }
        }

        let paths: Vec<&str> = path.into_iter().collect();
        let mut opts = path_diff_options(&paths);
        opts.context_lines(self.config.context_lines);

        let mut diff = repo.diff_tree_to_tree(from_tree.as_ref(), Some(&to_tree), Some(&mut opts))?;
        self.detect_renames(&mut diff, false)?;

        let mut files = self.collect_files(&diff, None)?;

        let touched = self.file_authors_between(from_oid, to_oid, path)?;
        for file in &mut files {
            file.authors =
                authors_for_file(&touched, file.old_path.as_deref(), file.new_path.as_deref());
            file.biggest_change_author = file.authors.first().map(|a| a.email.clone());
        }

        let response = finish_response(
            from_oid.map(|oid| oid.to_string()),
            to_oid.to_string(),
            path,
            files,
            filter,
        );

        tracing::debug!(
            "Diff {}..{} ({} of {} files) in {:?}",
            response.from_commit.as_deref().unwrap_or("(empty)"),
            response.to_commit,
            response.filtered_files,
            response.total_files,
            started.elapsed()
        );

        Ok(response)
    }

    /// Compare `from` (default HEAD) against the working directory, including
    /// untracked files. No authorship: uncommitted changes have no author yet.
    pub fn get_working_tree_diff(
        &self,
        from_commit: Option<&str>,
        path: Option<&str>,
    ) -> Result<DiffResponse> {
        let workdir = self.require_workdir("working tree diff")?.to_path_buf();
        let repo = self.repo();
        let path = normalize_path(path);

        let from = match from_commit {
            Some(rev) => Some(self.resolve_commit(Some(rev))?),
            None => match repo.head() {
                Ok(head) => Some(head.peel_to_commit()?),
                // Unborn HEAD: everything in the working tree is new
                Err(e)
                    if matches!(
                        e.code(),
                        git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound
                    ) =>
                {
                    None
                }
                Err(e) => return Err(e.into()),
            },
        };
        let from_tree = match &from {
            Some(commit) => Some(commit.tree()?),
            None => None,
        };

        if let Some(p) = path {
            let in_tree = from_tree.as_ref().is_some_and(|t| tree_has_path(t, p));
            if !in_tree && !workdir.join(p).exists() {
                return Err(AppError::PathNotFound(p.to_string()));
            }
        }

        let paths: Vec<&str> = path.into_iter().collect();
        let mut opts = path_diff_options(&paths);
        opts.context_lines(self.config.context_lines)
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);

        let mut diff = repo.diff_tree_to_workdir_with_index(from_tree.as_ref(), Some(&mut opts))?;
        self.detect_renames(&mut diff, true)?;

        let files = self.collect_files(&diff, Some(&workdir))?;

        Ok(finish_response(
            from.map(|c| c.id().to_string()),
            WORKING_TREE.to_string(),
            path,
            files,
            None,
        ))
    }

    pub fn get_working_tree_status(&self, path: Option<&str>) -> Result<WorkingTreeStatus> {
        self.require_workdir("working tree status")?;
        let repo = self.repo();

        if repo.head().is_err() {
            return Ok(WorkingTreeStatus {
                has_changes: false,
                files_changed: 0,
            });
        }

        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        if let Some(p) = normalize_path(path) {
            opts.pathspec(p).disable_pathspec_match(true);
        }

        let statuses = repo.statuses(Some(&mut opts))?;
        let files_changed = statuses.len();

        Ok(WorkingTreeStatus {
            has_changes: files_changed > 0,
            files_changed,
        })
    }

    /// Pair deletions with additions (and modifications with copies) above the
    /// configured similarity threshold.
    fn detect_renames(&self, diff: &mut Diff<'_>, untracked: bool) -> Result<()> {
        let threshold = self.config.rename_threshold;
        let mut find = DiffFindOptions::new();
        find.renames(true)
            .copies(true)
            .rename_threshold(threshold)
            .copy_threshold(threshold)
            .for_untracked(untracked);
        diff.find_similar(Some(&mut find))?;
        Ok(())
    }

    /// Build `FileDiff`s for every delta. New-side contents come from the
    /// working directory when `workdir` is given, otherwise from blobs.
    fn collect_files(&self, diff: &Diff<'_>, workdir: Option<&Path>) -> Result<Vec<FileDiff>> {
        let repo = self.repo();
        let mut files: Vec<FileDiff> = Vec::with_capacity(diff.deltas().len());

        for (delta_idx, delta) in diff.deltas().enumerate() {
            let status = map_status(delta.status());

            let mut old_path = delta.old_file().path().map(path_string);
            let mut new_path = delta.new_file().path().map(path_string);
            match status {
                DiffStatus::Added => old_path = None,
                DiffStatus::Deleted => new_path = None,
                _ => {}
            }

            let patch = Patch::from_diff(diff, delta_idx)?;
            let is_binary = patch
                .as_ref()
                .map_or(delta.flags().is_binary(), |p| p.delta().flags().is_binary());

            let (hunks, old_content, new_content) = if is_binary {
                (Vec::new(), None, None)
            } else {
                let hunks = match &patch {
                    Some(patch) => collect_hunks(patch)?,
                    None => Vec::new(),
                };
                let old_content = if old_path.is_some() {
                    blob_text(repo, delta.old_file().id())
                } else {
                    None
                };
                let new_content = match (&new_path, workdir) {
                    (Some(p), Some(dir)) if delta.new_file().mode() == FileMode::Link => {
                        std::fs::read_link(dir.join(p))
                            .ok()
                            .map(|target| target.to_string_lossy().to_string())
                    }
                    (Some(p), Some(dir)) => std::fs::read_to_string(dir.join(p)).ok(),
                    (Some(_), None) => blob_text(repo, delta.new_file().id()),
                    (None, _) => None,
                };
                (hunks, old_content, new_content)
            };

            files.push(FileDiff {
                old_path,
                new_path,
                status,
                hunks,
                old_content,
                new_content,
                is_binary,
                authors: Vec::new(),
                biggest_change_author: None,
            });
        }

        Ok(files)
    }

    /// Walk commits reachable from `to` but not from `from`, recording which
    /// authors touched each path (old and new side of every delta).
    fn file_authors_between(
        &self,
        from: Option<Oid>,
        to: Oid,
        path: Option<&str>,
    ) -> Result<PathAuthors> {
        let repo = self.repo();
        let mut touched: PathAuthors = HashMap::new();

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(to)?;
        if let Some(from) = from {
            revwalk.hide(from)?;
        }

        let paths: Vec<&str> = path.into_iter().collect();

        for oid in revwalk {
            self.check_cancelled()?;
            let commit = repo.find_commit(oid?)?;

            let author = commit.author();
            let email = author.email().unwrap_or("").to_string();
            let name = author.name().unwrap_or("Unknown").to_string();
            let timestamp = commit.time().seconds();

            let diff = first_parent_diff(repo, &commit, &paths)?;

            for delta in diff.deltas() {
                let sides = [delta.old_file().path(), delta.new_file().path()];
                for file_path in sides.into_iter().flatten() {
                    let touches = touched
                        .entry(path_string(file_path))
                        .or_default()
                        .entry(email.clone())
                        .or_insert_with(|| AuthorTouches {
                            name: name.clone(),
                            email: email.clone(),
                            commits: HashSet::new(),
                            last_commit_timestamp: timestamp,
                        });
                    touches.commits.insert(commit.id());
                    touches.last_commit_timestamp = touches.last_commit_timestamp.max(timestamp);
                }
            }
        }

        Ok(touched)
    }
}

/// Apply the author filter, then derive stats and the contributor roster.
fn finish_response(
    from_commit: Option<String>,
    to_commit: String,
    path: Option<&str>,
    mut files: Vec<FileDiff>,
    filter: Option<&AuthorFilter>,
) -> DiffResponse {
    let total_files = files.len();

    // Roster covers every file, filtered or not
    let mut roster: HashMap<String, AuthorInfo> = HashMap::new();
    for author in files.iter().flat_map(|f| &f.authors) {
        roster.entry(author.email.clone()).or_insert_with(|| AuthorInfo {
            name: author.name.clone(),
            email: author.email.clone(),
        });
    }
    let mut contributors: Vec<AuthorInfo> = roster.into_values().collect();
    contributors.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.email.cmp(&b.email))
    });

    if let Some(filter) = filter.filter(|f| !f.is_noop()) {
        files.retain(|file| filter.admits_any(file.authors.iter().map(|a| a.email.as_str())));
    }

    let stats = DiffStats::from_files(&files);
    let excluded_authors = exclusion_list(filter, &contributors);

    DiffResponse {
        from_commit,
        to_commit,
        path: path.map(|p| p.to_string()),
        filtered_files: files.len(),
        files,
        stats,
        contributors,
        excluded_authors,
        total_files,
    }
}
