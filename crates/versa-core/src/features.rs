//! Per-version capability flags
//!
//! Each version owns a nested tree of boolean flags, addressed with dotted
//! paths such as `pagination.cursor`. Lookups never fail: anything that does
//! not resolve to an enabled leaf reads as `false`.
//!
//! Copyright (c) 2025 Versa Team
//! Licensed under the Apache-2.0 license

use crate::versioning::ApiVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node of a capability tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureNode {
    Flag(bool),
    Group(FeatureTree),
}

/// Named capability nodes at one level of the tree
pub type FeatureTree = BTreeMap<String, FeatureNode>;

/// Sealed capability trees keyed by version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureMatrix {
    trees: BTreeMap<ApiVersion, FeatureTree>,
}

impl FeatureMatrix {
    pub(crate) fn from_trees(trees: BTreeMap<ApiVersion, FeatureTree>) -> Self {
        Self { trees }
    }

    /// The full capability tree for a version
    pub fn get_version_features(&self, version: ApiVersion) -> Option<&FeatureTree> {
        self.trees.get(&version)
    }

    /// Whether the dotted path names an enabled flag for this version
    pub fn has_feature(&self, version: ApiVersion, path: &str) -> bool {
        let Some(mut level) = self.trees.get(&version) else {
            return false;
        };

        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let last = segments.peek().is_none();
            match (level.get(segment), last) {
                (Some(FeatureNode::Flag(enabled)), true) => return *enabled,
                (Some(FeatureNode::Group(children)), false) => level = children,
                _ => return false,
            }
        }

        false
    }

    /// Dotted paths of every enabled flag, sorted
    pub fn enabled_features(&self, version: ApiVersion) -> Vec<String> {
        let mut paths = Vec::new();
        if let Some(tree) = self.trees.get(&version) {
            collect_enabled(tree, "", &mut paths);
        }
        paths
    }
}

fn collect_enabled(tree: &FeatureTree, prefix: &str, out: &mut Vec<String>) {
    for (name, node) in tree {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        match node {
            FeatureNode::Flag(true) => out.push(path),
            FeatureNode::Flag(false) => {}
            FeatureNode::Group(children) => collect_enabled(children, &path, out),
        }
    }
}
