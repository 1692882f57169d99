//! # stampsync-sync
//!
//! The matching and reconciliation engine.
//!
//! Feed every filesystem event to [`Reconciler::handle`]. Unlinked external
//! scripts are matched against the tracked repositories with
//! [`find_candidates`]; linked pairs are kept in step with [`reconcile`].

pub mod driver;
pub mod error;
pub mod search;
pub mod writer;

pub use driver::{EventKind, Origin, Outcome, Reconciler, WatchEvent};
pub use error::{MatchError, SyncError};
pub use search::{find_candidates, select_unique, SearchRequest, SearchResult, Strategy};
pub use writer::{reconcile, Direction, Snapshot, WriteResult};
