//! stampsync core library: domain types, stamp parsing, the link table,
//! configuration and errors.
//!
//! - [`types`]: newtypes and domain structs
//! - [`header`]: parse / render the `//name - version` stamp
//! - [`links`]: [`LinkTable`], the one-to-one external <-> repository mapping
//! - [`config`]: [`Config`] load / override / resolve
//! - [`error`]: [`HeaderError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod header;
pub mod links;
pub mod types;

pub use config::{Config, Overrides};
pub use error::{ConfigError, HeaderError};
pub use header::{parse_header, render_header, stamp_version};
pub use links::LinkTable;
pub use types::{
    Candidate, CommitId, LinkEntry, RepoCommitRef, RepoId, ScriptRecord, WorktreeStatus,
};
