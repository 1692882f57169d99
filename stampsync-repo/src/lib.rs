//! # stampsync-repo
//!
//! The repository query layer: what the matching engine may ask of a tracked
//! repository ([`RepoQuery`]), an exhaustive by-name tree search over any
//! [`TreeNode`], and the libgit2 implementation ([`GitRepo`]).

pub mod error;
pub mod git;
pub mod query;
pub mod tree;

pub use error::RepoError;
pub use git::GitRepo;
pub use query::{slash_path, RepoQuery};
pub use tree::{recursive_search, TreeMatch, TreeNode};
