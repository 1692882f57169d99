//! `stampsync identify`: dry-run the candidate search for one script.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use stampsync_core::{parse_header, Candidate, ScriptRecord};
use stampsync_repo::{GitRepo, RepoQuery};
use stampsync_sync::{find_candidates, select_unique, MatchError, SearchRequest, Strategy};

use super::load_config;

/// Arguments for `stampsync identify`.
#[derive(Args, Debug)]
pub struct IdentifyArgs {
    /// Stamped script to look up.
    pub file: PathBuf,

    /// Repository to search; repeat for several. Defaults to the configured list.
    #[arg(long = "repo", value_name = "REPO")]
    pub repositories: Vec<PathBuf>,

    /// Config file to use instead of the default location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl IdentifyArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let repo_paths = if self.repositories.is_empty() {
            config.repositories.clone()
        } else {
            self.repositories.clone()
        };
        if repo_paths.is_empty() {
            bail!("no repositories to search; pass --repo or configure `repositories`");
        }

        let bytes =
            fs::read(&self.file).with_context(|| format!("failed to read {}", self.file.display()))?;
        let record = parse_header(&bytes)
            .with_context(|| format!("unable to recognize {}", self.file.display()))?;

        let repos = repo_paths
            .iter()
            .map(|path| {
                GitRepo::open(path)
                    .with_context(|| format!("failed to open repository {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        let file_name = config.tracked_file_name(&record.name);
        let result = find_candidates(
            &repos,
            &SearchRequest {
                file_name: &file_name,
                version: &record.version,
                content: &record.content,
                dirty: record.dirty,
            },
        )
        .context("candidate search failed")?;

        let report = build_report(&record, &repos, result.strategy, result.candidates);
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize identify JSON")?
            );
            return Ok(());
        }

        print_table(&report);
        Ok(())
    }
}

#[derive(Serialize)]
struct IdentifyReport {
    name: String,
    version: String,
    dirty: bool,
    strategy: Option<Strategy>,
    verdict: Verdict,
    candidates: Vec<CandidateRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Verdict {
    Unique,
    Ambiguous,
    NoMatch,
}

#[derive(Clone, Serialize, Tabled)]
struct CandidateRow {
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "commit")]
    commit: String,
    #[tabled(rename = "path")]
    path: String,
}

fn build_report(
    record: &ScriptRecord,
    repos: &[GitRepo],
    strategy: Option<Strategy>,
    candidates: Vec<Candidate>,
) -> IdentifyReport {
    let verdict = match select_unique(candidates.clone()) {
        Ok(_) => Verdict::Unique,
        Err(MatchError::NoMatch) => Verdict::NoMatch,
        Err(_) => Verdict::Ambiguous,
    };

    IdentifyReport {
        name: record.name.clone(),
        version: record.version.clone(),
        dirty: record.dirty,
        strategy,
        verdict,
        candidates: candidates
            .into_iter()
            .map(|candidate| CandidateRow {
                repository: repos
                    .get(candidate.at.repository.0)
                    .map(|repo| repo.workdir().display().to_string())
                    .unwrap_or_else(|| candidate.at.repository.to_string()),
                commit: candidate.at.commit.to_string(),
                path: candidate.path,
            })
            .collect(),
    }
}

fn print_table(report: &IdentifyReport) {
    let stamp = if report.dirty {
        format!("{}+", report.version)
    } else {
        report.version.clone()
    };
    println!("{} - {}", report.name.bold(), stamp);

    let verdict = match report.verdict {
        Verdict::Unique => "unique match".green(),
        Verdict::Ambiguous => "ambiguous".yellow(),
        Verdict::NoMatch => "no match".red(),
    };
    match report.strategy {
        Some(strategy) => println!("{verdict} via {strategy}"),
        None => println!("{verdict}"),
    }

    if report.candidates.is_empty() {
        return;
    }
    let mut table = Table::new(report.candidates.clone());
    table.with(Style::rounded());
    println!("{table}");
}
