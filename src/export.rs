// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Inventory views.
//!
//! Pure functions turning a frozen [`Tree`] (or the host map it was built from) into
//! the maps printed by the CLI. All maps are `BTreeMap`s and every list is sorted, so
//! exporting the same tree twice gives identical output.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::attributes::attributes_to_map;
use crate::config::KeysConfig;
use crate::tree::{HostMap, NodeId, Tree};

/// An Ansible group as it appears in `--list` output.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsibleGroup {
    /// Child group names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    /// Hosts placed directly in the group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
}

/// A group with its subtree, for the `--tree` view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Group name
    pub name: String,
    /// Child groups
    pub children: Vec<TreeNode>,
    /// Hosts placed directly in the group
    pub hosts: Vec<String>,
}

/// Export every group with its children and direct hosts.
///
/// This is the shape Ansible expects from a dynamic inventory's `--list`.
#[must_use]
pub fn export_inventory(tree: &Tree) -> BTreeMap<String, AnsibleGroup> {
    let mut inventory = BTreeMap::new();

    for id in tree.preorder() {
        let node = &tree[id];

        let children = node
            .children
            .iter()
            .map(|child| tree[*child].name.clone())
            .collect();

        inventory.insert(
            node.name.clone(),
            AnsibleGroup {
                children,
                hosts: node.hosts.iter().cloned().collect(),
            },
        );
    }

    inventory
}

/// Export every host with the sorted names of all groups it belongs to.
///
/// A host belongs to every group that holds it directly and to all of their
/// ancestors.
#[must_use]
pub fn export_hosts(tree: &Tree) -> BTreeMap<String, Vec<String>> {
    let mut collected: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for id in tree.preorder() {
        let node = &tree[id];
        if node.hosts.is_empty() {
            continue;
        }

        let mut groups: BTreeSet<&str> = tree
            .ancestors(id)
            .into_iter()
            .map(|ancestor| tree[ancestor].name.as_str())
            .collect();
        groups.insert(node.name.as_str());

        for host in &node.hosts {
            collected
                .entry(host.as_str())
                .or_default()
                .extend(groups.iter().copied());
        }
    }

    collected
        .into_iter()
        .map(|(host, groups)| {
            (
                host.to_string(),
                groups.into_iter().map(str::to_string).collect(),
            )
        })
        .collect()
}

/// Export every group with the sorted hosts found anywhere beneath it.
///
/// Host sets are computed bottom-up once per call, so each node is visited a single
/// time.
#[must_use]
pub fn export_groups(tree: &Tree) -> BTreeMap<String, Vec<String>> {
    let order = tree.preorder();
    let mut memo: BTreeMap<NodeId, BTreeSet<&str>> = BTreeMap::new();

    // Reverse pre-order sees every child before its parent
    for id in order.iter().rev() {
        let node = &tree[*id];

        let mut hosts: BTreeSet<&str> = node.hosts.iter().map(String::as_str).collect();
        for child in &node.children {
            hosts.extend(memo[child].iter().copied());
        }
        memo.insert(*id, hosts);
    }

    order
        .into_iter()
        .map(|id| {
            (
                tree[id].name.clone(),
                memo[&id].iter().map(|host| (*host).to_string()).collect(),
            )
        })
        .collect()
}

/// Export the whole tree as nested groups.
#[must_use]
pub fn export_tree(tree: &Tree) -> TreeNode {
    build_tree_node(tree, Tree::ROOT)
}

fn build_tree_node(tree: &Tree, id: NodeId) -> TreeNode {
    let node = &tree[id];
    TreeNode {
        name: node.name.clone(),
        children: node
            .children
            .iter()
            .map(|child| build_tree_node(tree, *child))
            .collect(),
        hosts: node.hosts.iter().cloned().collect(),
    }
}

/// Export every host with its attribute records, keyed by the configured key names.
#[must_use]
pub fn export_attributes(
    hosts: &HostMap,
    keys: &KeysConfig,
) -> BTreeMap<String, Vec<BTreeMap<String, String>>> {
    hosts
        .iter()
        .map(|(host, records)| {
            (
                host.clone(),
                records
                    .iter()
                    .map(|attrs| attributes_to_map(attrs, keys))
                    .collect(),
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod export_tests;
