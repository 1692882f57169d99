//! Exhaustive search of a tree by base name.
//!
//! The search only needs two capabilities from a tree object: its named
//! subtrees and its named blobs. [`TreeNode`] captures exactly that, so the
//! algorithm is independent of any repository library's object model.

/// One file found by [`recursive_search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeMatch {
    /// Path from the searched root, `/`-separated.
    pub path: String,
    pub content: Vec<u8>,
}

/// The view of a directory-like tree the search needs.
pub trait TreeNode: Sized {
    type Error;

    /// Direct child trees with their entry names.
    fn subtrees(&self) -> Result<Vec<(String, Self)>, Self::Error>;

    /// Names of the direct child blobs.
    fn blob_names(&self) -> Vec<String>;

    /// Content of the direct child blob `name`.
    fn blob_content(&self, name: &str) -> Result<Vec<u8>, Self::Error>;
}

/// Every blob named `file_name` anywhere under `node`.
///
/// Subtrees are visited before the node's own blobs. Paths are assembled on
/// the way back up: a match deep in the tree starts as its bare name and each
/// enclosing level prefixes its own entry name.
pub fn recursive_search<T: TreeNode>(node: &T, file_name: &str) -> Result<Vec<TreeMatch>, T::Error> {
    let mut results = Vec::new();

    for (dir, subtree) in node.subtrees()? {
        for mut found in recursive_search(&subtree, file_name)? {
            found.path = format!("{dir}/{}", found.path);
            results.push(found);
        }
    }

    for name in node.blob_names() {
        if name == file_name {
            let content = node.blob_content(&name)?;
            results.push(TreeMatch {
                path: name,
                content,
            });
        }
    }

    Ok(results)
}

#[cfg(test)]
pub(crate) mod mem {
    //! In-memory tree for exercising the search without a repository.

    use std::collections::BTreeMap;
    use std::convert::Infallible;

    use super::TreeNode;

    #[derive(Debug, Clone, Default)]
    pub struct MemTree {
        pub trees: BTreeMap<String, MemTree>,
        pub blobs: BTreeMap<String, Vec<u8>>,
    }

    impl MemTree {
        pub fn blob(mut self, name: &str, content: &[u8]) -> Self {
            self.blobs.insert(name.to_string(), content.to_vec());
            self
        }

        pub fn dir(mut self, name: &str, tree: MemTree) -> Self {
            self.trees.insert(name.to_string(), tree);
            self
        }
    }

    impl TreeNode for MemTree {
        type Error = Infallible;

        fn subtrees(&self) -> Result<Vec<(String, Self)>, Self::Error> {
            Ok(self
                .trees
                .iter()
                .map(|(name, tree)| (name.clone(), tree.clone()))
                .collect())
        }

        fn blob_names(&self) -> Vec<String> {
            self.blobs.keys().cloned().collect()
        }

        fn blob_content(&self, name: &str) -> Result<Vec<u8>, Self::Error> {
            Ok(self.blobs.get(name).cloned().unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mem::MemTree;
    use super::*;

    fn paths(found: &[TreeMatch]) -> Vec<&str> {
        found.iter().map(|m| m.path.as_str()).collect()
    }

    #[test]
    fn finds_top_level_blob() {
        let root = MemTree::default()
            .blob("door.lsl", b"a")
            .blob("other.lsl", b"b");
        let found = recursive_search(&root, "door.lsl").unwrap();
        assert_eq!(paths(&found), vec!["door.lsl"]);
        assert_eq!(found[0].content, b"a");
    }

    #[test]
    fn builds_nested_paths_bottom_up() {
        let root = MemTree::default().dir(
            "hud",
            MemTree::default().dir("scripts", MemTree::default().blob("door.lsl", b"deep")),
        );
        let found = recursive_search(&root, "door.lsl").unwrap();
        assert_eq!(paths(&found), vec!["hud/scripts/door.lsl"]);
        assert_eq!(found[0].content, b"deep");
    }

    #[test]
    fn visits_every_subtree() {
        let root = MemTree::default()
            .blob("door.lsl", b"root")
            .dir("a", MemTree::default().blob("door.lsl", b"a"))
            .dir(
                "b",
                MemTree::default()
                    .blob("door.lsl.bak", b"no")
                    .dir("c", MemTree::default().blob("door.lsl", b"c")),
            );
        let mut found = paths(&recursive_search(&root, "door.lsl").unwrap())
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        found.sort();
        assert_eq!(found, vec!["a/door.lsl", "b/c/door.lsl", "door.lsl"]);
    }

    #[test]
    fn directory_with_matching_name_is_not_a_match() {
        let root = MemTree::default().dir("door.lsl", MemTree::default().blob("x", b""));
        assert!(recursive_search(&root, "door.lsl").unwrap().is_empty());
    }
}
