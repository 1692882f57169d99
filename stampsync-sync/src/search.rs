//! Candidate search: which tracked file is this external script a copy of?
//!
//! Three strategies, each tried only when the previous one found nothing:
//!
//! 1. **Exact commit**: the stamp's version names a commit; look for the
//!    file by name in that commit and keep byte-identical contents.
//! 2. **Future history** (dirty only): the script was edited after that
//!    commit and maybe committed later; walk forward from the stamped commit
//!    and take the *earliest* commit whose file matches.
//! 3. **Working copy** (dirty only): the edit may not be committed at all;
//!    look in each checkout on disk.
//!
//! Repositories are always visited in their configured order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use stampsync_core::{Candidate, CommitId, RepoCommitRef, RepoId};
use stampsync_repo::{RepoError, RepoQuery, TreeMatch};

use crate::error::MatchError;

/// What to look for.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    /// Base name of the tracked file, extension included.
    pub file_name: &'a str,
    /// Stamped version, dirty marker stripped.
    pub version: &'a str,
    pub content: &'a [u8],
    pub dirty: bool,
}

/// Which strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ExactCommit,
    FutureHistory,
    WorkingCopy,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::ExactCommit => write!(f, "exact commit"),
            Strategy::FutureHistory => write!(f, "future history"),
            Strategy::WorkingCopy => write!(f, "working copy"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// `None` when nothing matched.
    pub strategy: Option<Strategy>,
    pub candidates: Vec<Candidate>,
}

/// Files with the right name in the commit the stamp points at, before any
/// content check.
#[derive(Debug)]
struct NameMatch {
    repository: RepoId,
    commit: CommitId,
    files: Vec<TreeMatch>,
}

/// Run the strategies in order and return the first non-empty result.
pub fn find_candidates<R: RepoQuery>(
    repos: &[R],
    request: &SearchRequest<'_>,
) -> Result<SearchResult, RepoError> {
    let name_matches = name_matches(repos, request.file_name, request.version)?;

    let exact = content_matches(&name_matches, request.content);
    tracing::debug!(
        file = request.file_name,
        name_matches = name_matches.len(),
        exact = exact.len(),
        "exact commit search"
    );
    if !exact.is_empty() {
        return Ok(found(Strategy::ExactCommit, exact));
    }
    if !request.dirty {
        return Ok(SearchResult::default());
    }

    let future = future_search(repos, &name_matches, request.file_name, request.content)?;
    tracing::debug!(file = request.file_name, future = future.len(), "future history search");
    if !future.is_empty() {
        return Ok(found(Strategy::FutureHistory, future));
    }

    let working = working_copy_search(repos, request.file_name, request.content)?;
    tracing::debug!(file = request.file_name, working = working.len(), "working copy search");
    if !working.is_empty() {
        return Ok(found(Strategy::WorkingCopy, working));
    }

    Ok(SearchResult::default())
}

fn found(strategy: Strategy, candidates: Vec<Candidate>) -> SearchResult {
    SearchResult {
        strategy: Some(strategy),
        candidates,
    }
}

/// Strategy 1, first half: every repository where `version` resolves and
/// the commit contains at least one file called `file_name`.
fn name_matches<R: RepoQuery>(
    repos: &[R],
    file_name: &str,
    version: &str,
) -> Result<Vec<NameMatch>, RepoError> {
    let mut matches = Vec::new();
    for (idx, repo) in repos.iter().enumerate() {
        let Some(commit) = repo.resolve_commit(version)? else {
            continue;
        };
        let files = repo.tree_search(&commit, file_name)?;
        if files.is_empty() {
            continue;
        }
        matches.push(NameMatch {
            repository: RepoId(idx),
            commit,
            files,
        });
    }
    Ok(matches)
}

/// Strategy 1, second half: keep byte-identical files only.
fn content_matches(name_matches: &[NameMatch], content: &[u8]) -> Vec<Candidate> {
    name_matches
        .iter()
        .flat_map(|m| {
            m.files
                .iter()
                .filter(|file| file.content == content)
                .map(|file| candidate(m.repository, &m.commit, file))
        })
        .collect()
}

/// Strategy 2: walk forward from each name match towards HEAD and stop at
/// the first commit whose file content matches.
fn future_search<R: RepoQuery>(
    repos: &[R],
    name_matches: &[NameMatch],
    file_name: &str,
    content: &[u8],
) -> Result<Vec<Candidate>, RepoError> {
    let mut matched = BTreeSet::new();
    let mut candidates = Vec::new();

    for m in name_matches {
        if matched.contains(&m.repository) {
            continue;
        }
        let repo = &repos[m.repository.0];
        let head = repo.head_commit_id()?;
        for commit in repo.commits_between(&m.commit, &head)? {
            let hits: Vec<Candidate> = repo
                .tree_search(&commit, file_name)?
                .iter()
                .filter(|file| file.content == content)
                .map(|file| candidate(m.repository, &commit, file))
                .collect();
            if !hits.is_empty() {
                matched.insert(m.repository);
                candidates.extend(hits);
                break;
            }
        }
    }
    Ok(candidates)
}

/// Strategy 3: files on disk in each checkout.
///
/// A repository whose checkout cannot be walked, or whose HEAD does not
/// resolve yet, is logged and skipped so the others are still searched.
fn working_copy_search<R: RepoQuery>(
    repos: &[R],
    file_name: &str,
    content: &[u8],
) -> Result<Vec<Candidate>, RepoError> {
    let mut candidates = Vec::new();
    for (idx, repo) in repos.iter().enumerate() {
        match working_copy_matches(repo, RepoId(idx), file_name, content) {
            Ok(found) => candidates.extend(found),
            Err(err) => tracing::warn!(
                repository = %repo.workdir().display(),
                error = %err,
                "skipping repository in working copy search"
            ),
        }
    }
    Ok(candidates)
}

fn working_copy_matches<R: RepoQuery>(
    repo: &R,
    repository: RepoId,
    file_name: &str,
    content: &[u8],
) -> Result<Vec<Candidate>, RepoError> {
    let files: Vec<TreeMatch> = repo
        .find_in_workdir(file_name)?
        .into_iter()
        .filter(|file| file.content == content)
        .collect();
    if files.is_empty() {
        return Ok(Vec::new());
    }
    let head = repo.head_commit_id()?;
    Ok(files.iter().map(|file| candidate(repository, &head, file)).collect())
}

fn candidate(repository: RepoId, commit: &CommitId, file: &TreeMatch) -> Candidate {
    Candidate {
        at: RepoCommitRef {
            repository,
            commit: commit.clone(),
        },
        path: file.path.clone(),
        content: file.content.clone(),
    }
}

/// Reduce a candidate list to the single actionable match.
///
/// More than one repository, or more than one distinct path within the one
/// repository, is ambiguous.
pub fn select_unique(candidates: Vec<Candidate>) -> Result<Candidate, MatchError> {
    let mut by_repo: BTreeMap<RepoId, Vec<Candidate>> = BTreeMap::new();
    for candidate in candidates {
        by_repo
            .entry(candidate.at.repository)
            .or_default()
            .push(candidate);
    }

    if by_repo.len() > 1 {
        return Err(MatchError::MultipleRepositories {
            repositories: by_repo.into_keys().collect(),
        });
    }
    let Some((repository, mut group)) = by_repo.into_iter().next() else {
        return Err(MatchError::NoMatch);
    };

    let paths: BTreeSet<&str> = group.iter().map(|c| c.path.as_str()).collect();
    if paths.len() > 1 {
        return Err(MatchError::MultiplePaths {
            repository,
            paths: paths.into_iter().map(str::to_string).collect(),
        });
    }
    Ok(group.swap_remove(0))
}
