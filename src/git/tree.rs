//! Tree browsing at a revision.
//!
//! - `get_tree_entries`: immediate children of a directory, optionally with the
//!   last commit that touched each one
//! - `get_full_tree`: recursive structure without commit metadata
//! - `get_directory_info`: recursive counts, size and contributors
//! - `get_file_content`: UTF-8 text of a file
//!
//! Both listings classify and order entries the same way: directories first,
//! then everything else, case-insensitive by name.

use git2::{ObjectType, Odb, Oid, Repository, Tree};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use crate::error::{AppError, Result};
use crate::git::diff::commit_touches_path;
use crate::git::history::last_commits_for_paths;
use crate::git::normalize_path;
use crate::git::repository::{commit_to_info, GitRepository};
use crate::models::{
    CommitInfo, ContributorInfo, DirectoryInfo, EntryType, FullTreeEntry, TreeEntry,
};

const SYMLINK_MODE: i32 = 0o120000;

fn classify(entry: &git2::TreeEntry) -> Option<EntryType> {
    match entry.kind() {
        Some(ObjectType::Tree) => Some(EntryType::Directory),
        Some(ObjectType::Commit) => Some(EntryType::Submodule),
        Some(ObjectType::Blob) if entry.filemode() == SYMLINK_MODE => Some(EntryType::Symlink),
        Some(ObjectType::Blob) => Some(EntryType::File),
        _ => None,
    }
}

fn listing_order(a: (EntryType, &str), b: (EntryType, &str)) -> Ordering {
    let rank = |t: EntryType| if t == EntryType::Directory { 0 } else { 1 };
    rank(a.0)
        .cmp(&rank(b.0))
        .then_with(|| a.1.to_lowercase().cmp(&b.1.to_lowercase()))
        .then_with(|| a.1.cmp(b.1))
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

/// Blob size from the object header, without loading the content.
fn blob_size(odb: &Odb, oid: Oid) -> Option<u64> {
    odb.read_header(oid).ok().map(|(size, _)| size as u64)
}

/// Recursive (files, directories, bytes) below `tree`.
fn count_entries(repo: &Repository, odb: &Odb, tree: &Tree) -> Result<(usize, usize, u64)> {
    let mut file_count = 0;
    let mut dir_count = 0;
    let mut total_size: u64 = 0;

    for entry in tree.iter() {
        match entry.kind() {
            Some(ObjectType::Blob) => {
                file_count += 1;
                total_size += blob_size(odb, entry.id()).unwrap_or(0);
            }
            Some(ObjectType::Tree) => {
                dir_count += 1;
                let subtree = repo.find_tree(entry.id())?;
                let (fc, dc, ts) = count_entries(repo, odb, &subtree)?;
                file_count += fc;
                dir_count += dc;
                total_size += ts;
            }
            _ => {}
        }
    }

    Ok((file_count, dir_count, total_size))
}

impl GitRepository {
    /// The directory at `path` in `tree`; a missing path or a non-directory is
    /// `PathNotFound`.
    fn directory_at<'r>(&'r self, tree: Tree<'r>, path: Option<&str>) -> Result<Tree<'r>> {
        let Some(p) = path else {
            return Ok(tree);
        };
        let entry = tree
            .get_path(Path::new(p))
            .map_err(|_| AppError::PathNotFound(p.to_string()))?;
        if entry.kind() != Some(ObjectType::Tree) {
            return Err(AppError::PathNotFound(format!("{} is not a directory", p)));
        }
        Ok(self.repo().find_tree(entry.id())?)
    }

    pub fn get_tree_entries(
        &self,
        revision: Option<&str>,
        path: Option<&str>,
        include_last_commit: bool,
    ) -> Result<Vec<TreeEntry>> {
        let repo = self.repo();
        let odb = repo.odb()?;
        let path = normalize_path(path);

        let commit = self.resolve_commit(revision)?;
        let target_tree = self.directory_at(commit.tree()?, path)?;
        let base_path = path.unwrap_or("");

        let mut entries = Vec::with_capacity(target_tree.len());

        // First pass: collect all entries without commit info
        for entry in target_tree.iter() {
            let Some(entry_type) = classify(&entry) else {
                continue;
            };
            let name = entry.name().unwrap_or("").to_string();

            let (size, child_count) = match entry_type {
                EntryType::File | EntryType::Symlink => (blob_size(&odb, entry.id()), None),
                EntryType::Directory => {
                    let count = repo.find_tree(entry.id()).ok().map(|t| t.len() as u32);
                    (None, count)
                }
                EntryType::Submodule => (None, None),
            };

            entries.push(TreeEntry {
                path: join_path(base_path, &name),
                name,
                entry_type,
                size,
                child_count,
                last_commit: None,
            });
        }

        // Second pass: batch fetch commit info for all paths at once
        if include_last_commit {
            let paths: Vec<String> = entries.iter().map(|e| e.path.clone()).collect();
            let mut commit_map = last_commits_for_paths(self, commit.id(), &paths)?;

            for entry in &mut entries {
                entry.last_commit = commit_map.remove(&entry.path);
            }
        }

        entries.sort_by(|a, b| listing_order((a.entry_type, &a.name), (b.entry_type, &b.name)));

        Ok(entries)
    }

    pub fn get_full_tree(&self, revision: Option<&str>) -> Result<Vec<FullTreeEntry>> {
        fn build_tree(
            repo: &Repository,
            tree: &Tree,
            base_path: &str,
        ) -> Result<Vec<FullTreeEntry>> {
            let mut entries = Vec::with_capacity(tree.len());

            for entry in tree.iter() {
                let Some(entry_type) = classify(&entry) else {
                    continue;
                };
                let name = entry.name().unwrap_or("").to_string();
                let path = join_path(base_path, &name);

                let children = if entry_type == EntryType::Directory {
                    let subtree = repo.find_tree(entry.id())?;
                    Some(build_tree(repo, &subtree, &path)?)
                } else {
                    None
                };

                entries.push(FullTreeEntry {
                    name,
                    path,
                    entry_type,
                    children,
                });
            }

            entries.sort_by(|a, b| listing_order((a.entry_type, &a.name), (b.entry_type, &b.name)));
            Ok(entries)
        }

        let tree = self.resolve_commit(revision)?.tree()?;
        build_tree(self.repo(), &tree, "")
    }

    /// Counts and size of everything under `path`, plus who worked on it.
    /// Contributors, first and latest commit come from one ancestry walk.
    pub fn get_directory_info(
        &self,
        revision: Option<&str>,
        path: Option<&str>,
    ) -> Result<DirectoryInfo> {
        let started = Instant::now();
        let repo = self.repo();
        let odb = repo.odb()?;
        let path = normalize_path(path);

        let commit = self.resolve_commit(revision)?;
        let tree = commit.tree()?;

        let (file_count, directory_count, total_size) = match path {
            None => count_entries(repo, &odb, &tree)?,
            Some(p) => {
                let entry = tree
                    .get_path(Path::new(p))
                    .map_err(|_| AppError::PathNotFound(p.to_string()))?;
                match entry.kind() {
                    Some(ObjectType::Tree) => {
                        count_entries(repo, &odb, &repo.find_tree(entry.id())?)?
                    }
                    Some(ObjectType::Blob) => (1, 0, blob_size(&odb, entry.id()).unwrap_or(0)),
                    _ => (0, 0, 0),
                }
            }
        };

        let mut contributor_map: HashMap<String, (String, usize)> = HashMap::new();
        let mut latest_commit: Option<CommitInfo> = None;
        let mut first_commit: Option<(i64, Oid, CommitInfo)> = None;

        for walked in self.walk_from(commit.id())? {
            let walked = walked?;
            if let Some(p) = path {
                if !commit_touches_path(repo, &walked, p)? {
                    continue;
                }
            }

            let author = walked.author();
            let email = author.email().unwrap_or("").to_string();
            let name = author.name().unwrap_or("Unknown").to_string();
            contributor_map
                .entry(email)
                .and_modify(|(_, count)| *count += 1)
                .or_insert((name, 1));

            if latest_commit.is_none() {
                latest_commit = Some(commit_to_info(&walked));
            }

            let key = (walked.time().seconds(), walked.id());
            let older = first_commit
                .as_ref()
                .is_none_or(|(time, oid, _)| key <= (*time, *oid));
            if older {
                first_commit = Some((key.0, key.1, commit_to_info(&walked)));
            }
        }

        let mut contributors: Vec<ContributorInfo> = contributor_map
            .into_iter()
            .map(|(email, (name, commit_count))| ContributorInfo {
                name,
                email,
                commit_count,
            })
            .collect();
        contributors.sort_by(|a, b| {
            b.commit_count
                .cmp(&a.commit_count)
                .then_with(|| a.email.cmp(&b.email))
        });

        tracing::debug!(
            "Directory info for {} in {:?}",
            path.unwrap_or("/"),
            started.elapsed()
        );

        Ok(DirectoryInfo {
            path: path.unwrap_or("").to_string(),
            file_count,
            directory_count,
            total_size,
            contributors,
            first_commit: first_commit.map(|(_, _, info)| info),
            latest_commit,
        })
    }

    pub fn get_file_content(&self, revision: Option<&str>, path: &str) -> Result<String> {
        let path = normalize_path(Some(path)).ok_or_else(|| AppError::NotAFile("/".to_string()))?;
        let tree = self.resolve_commit(revision)?.tree()?;

        let entry = tree
            .get_path(Path::new(path))
            .map_err(|_| AppError::PathNotFound(path.to_string()))?;

        if entry.kind() != Some(ObjectType::Blob) {
            return Err(AppError::NotAFile(path.to_string()));
        }
        let blob = self.repo().find_blob(entry.id())?;

        String::from_utf8(blob.content().to_vec())
            .map_err(|_| AppError::BinaryContent(path.to_string()))
    }
}
