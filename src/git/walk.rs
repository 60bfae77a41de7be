//! Newest-first traversal of the commit graph.
//!
//! Commits come out ordered by commit time descending, ties broken by commit
//! id descending, so two walks over the same graph always agree. Each commit
//! is yielded once even when reachable through several merges. The walk checks
//! the request's cancellation token before every commit.

use git2::{Commit, Oid, Repository};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};

struct Pending<'r> {
    time: i64,
    commit: Commit<'r>,
}

impl PartialEq for Pending<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending<'_> {}

impl PartialOrd for Pending<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.commit.id().cmp(&other.commit.id()))
    }
}

pub struct AncestryWalk<'r> {
    repo: &'r Repository,
    cancel: &'r CancellationToken,
    queue: BinaryHeap<Pending<'r>>,
    seen: HashSet<Oid>,
    /// Parents of the last yielded commit, queued on the next call.
    expand: Vec<Oid>,
}

impl<'r> AncestryWalk<'r> {
    pub fn new(repo: &'r Repository, cancel: &'r CancellationToken, start: Oid) -> Result<Self> {
        let mut walk = Self {
            repo,
            cancel,
            queue: BinaryHeap::new(),
            seen: HashSet::new(),
            expand: Vec::new(),
        };
        walk.enqueue(start)?;
        Ok(walk)
    }

    fn enqueue(&mut self, oid: Oid) -> Result<()> {
        if self.seen.insert(oid) {
            let commit = self.repo.find_commit(oid)?;
            self.queue.push(Pending {
                time: commit.time().seconds(),
                commit,
            });
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<Commit<'r>>> {
        if self.cancel.is_cancelled() {
            tracing::warn!("Ancestry walk cancelled after {} commits", self.seen.len());
            self.queue.clear();
            return Err(AppError::Cancelled);
        }

        for parent in std::mem::take(&mut self.expand) {
            self.enqueue(parent)?;
        }

        let Some(Pending { commit, .. }) = self.queue.pop() else {
            return Ok(None);
        };
        self.expand = commit.parent_ids().collect();
        Ok(Some(commit))
    }
}

impl<'r> Iterator for AncestryWalk<'r> {
    type Item = Result<Commit<'r>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}
