//! Path-scoped commit history.
//!
//! - `get_commits`: paginated, author-filtered history of a path
//! - `last_commits_for_paths`: most recent commit touching each of several
//!   paths, resolved in one shared walk (used by directory listings)
//!
//! A commit "touches" a path when its diff against its first parent shows a
//! change at or under that path. Root commits are diffed against the empty
//! tree, so they touch every path they contain.

use git2::Oid;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::error::{AppError, Result};
use crate::git::diff::{commit_touches_path, first_parent_diff, tree_has_path};
use crate::git::filter::{exclusion_list, AuthorFilter};
use crate::git::repository::{commit_to_detail, commit_to_info, GitRepository};
use crate::git::{normalize_path, path_overlaps};
use crate::models::{AuthorInfo, CommitInfo, CommitListResponse};

/// Get last commit info for multiple paths in a single history walk.
///
/// The walk stops as soon as every path is resolved. Paths no commit ever
/// touched are simply absent from the result.
pub(crate) fn last_commits_for_paths(
    git: &GitRepository,
    start: Oid,
    paths: &[String],
) -> Result<HashMap<String, CommitInfo>> {
    let mut results: HashMap<String, CommitInfo> = HashMap::new();
    let mut remaining: HashSet<&str> = paths.iter().map(|s| s.as_str()).collect();
    if remaining.is_empty() {
        return Ok(results);
    }

    let started = Instant::now();
    let mut visited = 0usize;

    for commit in git.walk_from(start)? {
        let commit = commit?;
        visited += 1;

        let pending: Vec<&str> = remaining.iter().copied().collect();
        let diff = first_parent_diff(git.repo(), &commit, &pending)?;

        for delta in diff.deltas() {
            let sides = [delta.old_file().path(), delta.new_file().path()];
            for changed in sides.into_iter().flatten().filter_map(|p| p.to_str()) {
                for target in pending.iter().filter(|t| path_overlaps(changed, t)) {
                    if remaining.remove(target) {
                        results.insert(target.to_string(), commit_to_info(&commit));
                    }
                }
            }
        }

        if remaining.is_empty() {
            break;
        }
    }

    tracing::debug!(
        "Resolved last commits for {}/{} paths over {} commits in {:?}",
        results.len(),
        paths.len(),
        visited,
        started.elapsed()
    );

    Ok(results)
}

impl GitRepository {
    /// History of `path` (whole repository when absent) reachable from
    /// `revision`, newest first.
    ///
    /// `total` and `contributors` ignore the author filter; pagination applies
    /// to the filtered sequence.
    pub fn get_commits(
        &self,
        revision: Option<&str>,
        path: Option<&str>,
        limit: usize,
        offset: usize,
        filter: Option<&AuthorFilter>,
    ) -> Result<CommitListResponse> {
        let started = Instant::now();
        let repo = self.repo();
        let path = normalize_path(path);
        let start = self.resolve(revision)?;
        let limit = self.config.page_size(limit);

        let mut matched: Vec<git2::Commit> = Vec::new();
        for commit in self.walk_from(start)? {
            let commit = commit?;
            let touches = match path {
                Some(p) => commit_touches_path(repo, &commit, p)?,
                None => true,
            };
            if touches {
                matched.push(commit);
            }
        }

        if let Some(p) = path {
            if matched.is_empty() && !tree_has_path(&repo.find_commit(start)?.tree()?, p) {
                return Err(AppError::PathNotFound(p.to_string()));
            }
        }

        // Parents committed "after" their children (clock skew) come out of the
        // walk late; order strictly by time, then id
        matched.sort_by(|a, b| {
            b.time()
                .seconds()
                .cmp(&a.time().seconds())
                .then_with(|| b.id().cmp(&a.id()))
        });

        let contributors = rank_authors(&matched);

        let admitted: Vec<&git2::Commit> = matched
            .iter()
            .filter(|c| filter.is_none_or(|f| f.admits(c.author().email().unwrap_or(""))))
            .collect();

        let total = matched.len();
        let filtered_total = admitted.len();

        let commits = admitted
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(commit_to_detail)
            .collect();

        tracing::debug!(
            "History of {} at {}: {} commits ({} after filter) in {:?}",
            path.unwrap_or("/"),
            start,
            total,
            filtered_total,
            started.elapsed()
        );

        Ok(CommitListResponse {
            commits,
            total,
            filtered_total,
            has_more: filtered_total > offset + limit,
            excluded_authors: exclusion_list(filter, &contributors),
            contributors,
        })
    }
}

/// Distinct authors, most commits first, then email.
fn rank_authors(commits: &[git2::Commit]) -> Vec<AuthorInfo> {
    let mut counts: HashMap<String, (String, usize)> = HashMap::new();
    for commit in commits {
        let author = commit.author();
        let email = author.email().unwrap_or("").to_string();
        let name = author.name().unwrap_or("Unknown").to_string();
        counts
            .entry(email)
            .and_modify(|(_, count)| *count += 1)
            .or_insert((name, 1));
    }

    let mut ranked: Vec<(String, String, usize)> = counts
        .into_iter()
        .map(|(email, (name, count))| (email, name, count))
        .collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .map(|(email, name, _)| AuthorInfo { name, email })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::git::test_support::{TestRepo, ALICE, BOB, CAROL};

    fn oids(response: &CommitListResponse) -> Vec<String> {
        response.commits.iter().map(|c| c.oid.clone()).collect()
    }

    #[test]
    fn two_commit_history_newest_first() {
        let fixture = TestRepo::new();
        fixture.write("a.txt", "one\ntwo\nthree\n");
        let c1 = fixture.commit("add a", ALICE, 1_000);
        fixture.write("a.txt", "one\nTWO\nthree\n");
        let c2 = fixture.commit("edit a", BOB, 2_000);

        let history = fixture.open().get_commits(None, Some("a.txt"), 10, 0, None).unwrap();
        assert_eq!(oids(&history), vec![c2.to_string(), c1.to_string()]);
        assert_eq!(history.total, 2);
        assert_eq!(history.filtered_total, 2);
        assert!(history.excluded_authors.is_empty());
        assert!(!history.has_more);
        assert_eq!(history.commits[0].parents, vec![c1.to_string()]);
    }

    #[test]
    fn pages_concatenate_to_full_history() {
        let fixture = TestRepo::new();
        let mut expected = Vec::new();
        for i in 0..7 {
            fixture.write("a.txt", &format!("{}\n", i));
            expected.push(fixture.commit(&format!("c{}", i), ALICE, 1_000 + i).to_string());
        }
        expected.reverse();

        let git = fixture.open();
        let mut collected = Vec::new();
        let mut offset = 0;
        loop {
            let page = git.get_commits(None, Some("a.txt"), 3, offset, None).unwrap();
            assert_eq!(page.total, 7);
            collected.extend(oids(&page));
            offset += 3;
            if !page.has_more {
                break;
            }
        }
        assert_eq!(collected, expected);

        let beyond = git.get_commits(None, None, 3, 50, None).unwrap();
        assert!(beyond.commits.is_empty());
        assert!(!beyond.has_more);
    }

    #[test]
    fn limit_is_clamped_to_configured_page_size() {
        let fixture = TestRepo::new();
        for i in 0..4 {
            fixture.write("a.txt", &format!("{}\n", i));
            fixture.commit("c", ALICE, 1_000 + i);
        }
        let git = fixture.open_with(EngineConfig {
            max_page_size: 2,
            ..EngineConfig::default()
        });

        let page = git.get_commits(None, None, 100, 0, None).unwrap();
        assert_eq!(page.commits.len(), 2);
        assert!(page.has_more);

        let page = git.get_commits(None, None, 0, 0, None).unwrap();
        assert_eq!(page.commits.len(), 1);
    }

    #[test]
    fn path_restricts_to_touching_commits() {
        let fixture = TestRepo::new();
        fixture.write("src/main.rs", "fn main() {}\n");
        fixture.write("README", "hi\n");
        let c1 = fixture.commit("init", ALICE, 1_000);
        fixture.write("README", "hello\n");
        fixture.commit("docs", BOB, 2_000);
        fixture.write("src/lib.rs", "pub fn f() {}\n");
        let c3 = fixture.commit("lib", CAROL, 3_000);

        let git = fixture.open();
        let history = git.get_commits(None, Some("src"), 10, 0, None).unwrap();
        assert_eq!(oids(&history), vec![c3.to_string(), c1.to_string()]);

        let history = git.get_commits(None, Some("/src/lib.rs/"), 10, 0, None).unwrap();
        assert_eq!(oids(&history), vec![c3.to_string()]);

        // Prefix of a name is not a directory
        assert!(matches!(
            git.get_commits(None, Some("sr"), 10, 0, None),
            Err(AppError::PathNotFound(_))
        ));
    }

    #[test]
    fn deleted_path_still_has_history() {
        let fixture = TestRepo::new();
        fixture.write("gone.txt", "x\n");
        fixture.write("keep.txt", "k\n");
        let c1 = fixture.commit("add", ALICE, 1_000);
        fixture.remove("gone.txt");
        let c2 = fixture.commit("remove", BOB, 2_000);

        let history = fixture.open().get_commits(None, Some("gone.txt"), 10, 0, None).unwrap();
        assert_eq!(oids(&history), vec![c2.to_string(), c1.to_string()]);
    }

    #[test]
    fn revision_bounds_the_walk() {
        let fixture = TestRepo::new();
        fixture.write("a.txt", "1\n");
        let c1 = fixture.commit("c1", ALICE, 1_000);
        fixture.write("a.txt", "2\n");
        fixture.commit("c2", BOB, 2_000);

        let git = fixture.open();
        let history = git.get_commits(Some(&c1.to_string()), None, 10, 0, None).unwrap();
        assert_eq!(oids(&history), vec![c1.to_string()]);
        assert!(matches!(
            git.get_commits(Some("missing"), None, 10, 0, None),
            Err(AppError::RevisionNotFound(_))
        ));
    }

    #[test]
    fn author_filter_paginates_filtered_sequence() {
        let fixture = TestRepo::new();
        let authors = [ALICE, BOB, ALICE, CAROL, BOB, ALICE];
        for (i, author) in authors.iter().enumerate() {
            fixture.write("a.txt", &format!("{}\n", i));
            fixture.commit("c", *author, 1_000 + i as i64);
        }
        let git = fixture.open();

        let exclude = AuthorFilter::exclude(["alice@x"]);
        let history = git.get_commits(None, None, 2, 0, Some(&exclude)).unwrap();
        assert_eq!(history.total, 6);
        assert_eq!(history.filtered_total, 3);
        assert!(history.has_more);
        assert!(history.commits.iter().all(|c| c.author.email != "alice@x"));

        let include = AuthorFilter::include(["alice@x"]);
        let history = git.get_commits(None, None, 10, 0, Some(&include)).unwrap();
        assert_eq!(history.filtered_total, 3);
        assert!(history.commits.iter().all(|c| c.author.email == "alice@x"));
        assert_eq!(history.excluded_authors, vec!["bob@x", "carol@x"]);

        // Roster ignores the filter: alice 3, bob 2, carol 1
        let emails: Vec<&str> = history.contributors.iter().map(|a| a.email.as_str()).collect();
        assert_eq!(emails, vec!["alice@x", "bob@x", "carol@x"]);
    }

    #[test]
    fn equal_timestamps_order_by_id_descending() {
        let fixture = TestRepo::new();
        fixture.write("a.txt", "1\n");
        let c1 = fixture.commit("c1", ALICE, 1_000);
        fixture.write("a.txt", "2\n");
        let c2 = fixture.commit("c2", BOB, 1_000);

        let history = fixture.open().get_commits(None, None, 10, 0, None).unwrap();
        let mut expected = vec![c1, c2];
        expected.sort_by(|a, b| b.cmp(a));
        let expected: Vec<String> = expected.iter().map(|o| o.to_string()).collect();
        assert_eq!(oids(&history), expected);
    }

    #[test]
    fn last_commits_resolved_in_one_walk() {
        let fixture = TestRepo::new();
        fixture.write("a.txt", "a\n");
        fixture.write("dir/b.txt", "b\n");
        let c1 = fixture.commit("init", ALICE, 1_000);
        fixture.write("dir/b.txt", "b2\n");
        let c2 = fixture.commit("touch dir", BOB, 2_000);

        let git = fixture.open();
        let paths = vec!["a.txt".to_string(), "dir".to_string(), "never".to_string()];
        let found = last_commits_for_paths(&git, c2, &paths).unwrap();
        assert_eq!(found["a.txt"].oid, c1.to_string());
        assert_eq!(found["dir"].oid, c2.to_string());
        assert!(!found.contains_key("never"));
    }
}
