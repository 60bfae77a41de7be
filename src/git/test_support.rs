//! Throwaway repositories for engine tests.

use git2::{IndexAddOption, Oid, Repository, RepositoryInitOptions, Signature, Time};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::EngineConfig;
use crate::git::GitRepository;

pub const ALICE: (&str, &str) = ("Alice", "alice@x");
pub const BOB: (&str, &str) = ("Bob", "bob@x");
pub const CAROL: (&str, &str) = ("Carol", "carol@x");

pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("master");
        let repo = Repository::init_opts(dir.path(), &opts).unwrap();
        Self { dir, repo }
    }

    pub fn open(&self) -> GitRepository {
        self.open_with(EngineConfig::default())
    }

    pub fn open_with(&self, config: EngineConfig) -> GitRepository {
        GitRepository::open(self.dir.path(), config).unwrap()
    }

    pub fn write(&self, path: &str, content: &str) {
        self.write_bytes(path, content.as_bytes());
    }

    pub fn write_bytes(&self, path: &str, content: &[u8]) {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    pub fn remove(&self, path: &str) {
        fs::remove_file(self.dir.path().join(path)).unwrap();
    }

    pub fn rename(&self, from: &str, to: &str) {
        let target = self.dir.path().join(to);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::rename(self.dir.path().join(from), target).unwrap();
    }

    /// Stage the whole working directory and commit it on HEAD.
    pub fn commit(&self, message: &str, author: (&str, &str), time: i64) -> Oid {
        let parents: Vec<Oid> = self
            .repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .into_iter()
            .collect();
        self.commit_with_parents(message, &parents, author, time)
    }

    /// Commit the working directory with explicit parents (first parent must be HEAD).
    pub fn merge(&self, message: &str, parents: &[Oid], author: (&str, &str), time: i64) -> Oid {
        self.commit_with_parents(message, parents, author, time)
    }

    fn commit_with_parents(
        &self,
        message: &str,
        parents: &[Oid],
        author: (&str, &str),
        time: i64,
    ) -> Oid {
        let mut index = self.repo.index().unwrap();
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None).unwrap();
        index.update_all(["*"].iter(), None).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let signature = Signature::new(author.0, author.1, &Time::new(time, 0)).unwrap();
        let parents: Vec<git2::Commit> = parents
            .iter()
            .map(|oid| self.repo.find_commit(*oid).unwrap())
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parent_refs)
            .unwrap()
    }

    pub fn branch(&self, name: &str, target: Oid) {
        let commit = self.repo.find_commit(target).unwrap();
        self.repo.branch(name, &commit, false).unwrap();
    }

    pub fn checkout(&self, name: &str) {
        self.repo.set_head(&format!("refs/heads/{}", name)).unwrap();
        let mut builder = git2::build::CheckoutBuilder::new();
        builder.force().remove_untracked(true);
        self.repo.checkout_head(Some(&mut builder)).unwrap();
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
