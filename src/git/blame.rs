//! Per-line attribution of a file at a revision.
//!
//! Walks the first-parent chain from the revision. At each step the lines
//! still unattributed are mapped through the diff between the commit's blob
//! and its parent's blob: lines the commit added belong to it, the rest move
//! on to the parent. When the file is missing in the parent, rename detection
//! finds its previous path; otherwise the commit added the file and owns every
//! remaining line.

use git2::{Blob, Commit, DiffFindOptions, DiffOptions, ObjectType, Oid, Patch};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::{AppError, Result};
use crate::git::repository::GitRepository;
use crate::models::{BlameLine, BlameResponse};

/// Lines as libgit2 counts them: one per newline plus a trailing partial line.
fn count_lines(content: &[u8]) -> usize {
    let newlines = content.iter().filter(|&&b| b == b'\n').count();
    match content.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}

/// For every line of `new`, the index of the same unchanged line in `old`,
/// or `None` when the line was added.
fn line_mapping(old: &Blob, new: &Blob) -> Result<Vec<Option<usize>>> {
    let old_len = count_lines(old.content());
    let new_len = count_lines(new.content());

    let mut opts = DiffOptions::new();
    opts.context_lines(0).force_text(true);
    let patch = Patch::from_blobs(old, None, new, None, Some(&mut opts))?;

    let mut added = vec![false; new_len];
    let mut deleted = vec![false; old_len];

    for hunk_idx in 0..patch.num_hunks() {
        for line_idx in 0..patch.num_lines_in_hunk(hunk_idx)? {
            let line = patch.line_in_hunk(hunk_idx, line_idx)?;
            match (line.origin(), line.old_lineno(), line.new_lineno()) {
                ('+', _, Some(n)) => {
                    if let Some(slot) = added.get_mut(n as usize - 1) {
                        *slot = true;
                    }
                }
                ('-', Some(n), _) => {
                    if let Some(slot) = deleted.get_mut(n as usize - 1) {
                        *slot = true;
                    }
                }
                _ => {}
            }
        }
    }

    // Unchanged lines keep their relative order on both sides
    let mut kept_old = (0..old_len).filter(|&i| !deleted[i]);
    Ok(added
        .iter()
        .map(|&was_added| if was_added { None } else { kept_old.next() })
        .collect())
}

impl GitRepository {
    pub fn get_blame(&self, path: &str, revision: Option<&str>) -> Result<BlameResponse> {
        let started = Instant::now();
        let repo = self.repo();
        let path = path.trim_matches('/');

        let start = self.resolve_commit(revision)?;
        let not_found = || AppError::FileNotFoundAtRevision {
            path: path.to_string(),
            revision: start.id().to_string(),
        };

        let entry = start.tree()?.get_path(Path::new(path)).map_err(|_| not_found())?;
        if entry.kind() != Some(ObjectType::Blob) {
            return Err(not_found());
        }

        let mut blob = repo.find_blob(entry.id())?;
        let line_count = count_lines(blob.content());

        let mut owners: Vec<Option<Oid>> = vec![None; line_count];
        // (line in the requested file, same line in the blob being examined)
        let mut pending: Vec<(usize, usize)> = (0..line_count).map(|i| (i, i)).collect();

        let mut commit = start.clone();
        let mut current_path = PathBuf::from(path);
        let mut steps = 0usize;

        while !pending.is_empty() {
            self.check_cancelled()?;
            steps += 1;

            let origin = if commit.parent_count() > 0 {
                let parent = commit.parent(0)?;
                self.find_origin(&commit, &parent, &current_path)?
                    .map(|(old_path, old_blob)| (parent, old_path, old_blob))
            } else {
                None
            };

            let Some((parent, old_path, old_blob)) = origin else {
                // Root commit, or the file first appears here
                for (line, _) in pending.drain(..) {
                    owners[line] = Some(commit.id());
                }
                break;
            };

            if old_blob.id() != blob.id() {
                let mapping = line_mapping(&old_blob, &blob)?;
                pending.retain_mut(|(line, current)| {
                    match mapping.get(*current).copied().flatten() {
                        Some(old) => {
                            *current = old;
                            true
                        }
                        None => {
                            owners[*line] = Some(commit.id());
                            false
                        }
                    }
                });
            }

            commit = parent;
            current_path = old_path;
            blob = old_blob;
        }

        let mut lines = Vec::with_capacity(line_count);
        let mut cached: Option<(Oid, Commit)> = None;
        for (idx, owner) in owners.into_iter().enumerate() {
            let oid = owner
                .ok_or_else(|| AppError::Internal(format!("unattributed line {}", idx + 1)))?;
            if cached.as_ref().is_none_or(|(id, _)| *id != oid) {
                cached = Some((oid, repo.find_commit(oid)?));
            }
            let Some((_, owner_commit)) = cached.as_ref() else {
                continue;
            };
            let author = owner_commit.author();
            lines.push(BlameLine {
                line_number: idx as u32 + 1,
                author_name: author.name().unwrap_or("Unknown").to_string(),
                author_email: author.email().unwrap_or("").to_string(),
                commit_oid: oid.to_string(),
                timestamp: owner_commit.time().seconds(),
            });
        }

        tracing::debug!(
            "Blamed {} ({} lines) over {} commits in {:?}",
            path,
            line_count,
            steps,
            started.elapsed()
        );

        Ok(BlameResponse {
            path: path.to_string(),
            commit: start.id().to_string(),
            lines,
        })
    }

    /// Path and blob of the file in `parent`: the same path when it is a blob
    /// there, else the source of a detected rename. `None` means `commit`
    /// added the file.
    fn find_origin<'r>(
        &'r self,
        commit: &Commit<'r>,
        parent: &Commit<'r>,
        path: &Path,
    ) -> Result<Option<(PathBuf, Blob<'r>)>> {
        let repo = self.repo();
        let parent_tree = parent.tree()?;

        if let Ok(entry) = parent_tree.get_path(path) {
            if entry.kind() == Some(ObjectType::Blob) {
                return Ok(Some((path.to_path_buf(), repo.find_blob(entry.id())?)));
            }
        }

        let tree = commit.tree()?;
        let mut diff = repo.diff_tree_to_tree(Some(&parent_tree), Some(&tree), None)?;
        let mut find = DiffFindOptions::new();
        find.renames(true).rename_threshold(self.config.rename_threshold);
        diff.find_similar(Some(&mut find))?;

        for delta in diff.deltas() {
            if delta.status() != git2::Delta::Renamed || delta.new_file().path() != Some(path) {
                continue;
            }
            if let Some(old_path) = delta.old_file().path() {
                return Ok(Some((old_path.to_path_buf(), repo.find_blob(delta.old_file().id())?)));
            }
        }

        Ok(None)
    }
}
