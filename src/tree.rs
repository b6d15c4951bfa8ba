// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Inventory group tree.
//!
//! The tree is rebuilt on every run from the flat list of host records. Nodes live in
//! an arena (`Vec<Node>`) and refer to each other by index, so a node can reach its
//! parent without owning it.
//!
//! # Layout
//!
//! For a host `app01` with `OS=linux;ENV=dev;ROLE=app;SRV=tomcat_backend_auth` and
//! the default `_` separator, [`Tree::import_hosts`] produces:
//!
//! ```text
//! all                                 (root)
//! ├── all_app
//! │   └── all_app_tomcat              app01
//! ├── all_host
//! │   └── all_host_linux              app01
//! └── dev
//!     ├── dev_app
//!     │   └── dev_app_tomcat
//!     │       └── dev_app_tomcat_backend
//!     │           └── dev_app_tomcat_backend_auth   app01
//!     └── dev_host
//!         └── dev_host_linux          app01
//! ```
//!
//! Every record is imported twice: once under its own environment and once under the
//! `all` pseudo-environment (the root itself). Under `all` only the first service
//! segment is used, so the cross-environment groups stay shallow.
//!
//! # Lifecycle
//!
//! A tree is *building* while records are imported and *frozen* once
//! [`Tree::sort_children`] has run. The exporters expect a frozen tree; exporting a
//! tree that is still being built gives insertion-ordered output.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Index;

use crate::attributes::HostAttributes;
use crate::constants::{HOST_GROUP_SEGMENT, ROOT_GROUP};

/// Index of a node in its [`Tree`].
pub type NodeId = usize;

/// Hosts and their (expanded) attribute records, keyed by hostname.
pub type HostMap = BTreeMap<String, Vec<HostAttributes>>;

/// A group in the inventory tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// Group name, unique among its siblings
    pub name: String,
    /// Parent group; `None` only for the root
    pub parent: Option<NodeId>,
    /// Child groups
    pub children: Vec<NodeId>,
    /// Hosts placed directly in this group
    pub hosts: BTreeSet<String>,
}

impl Node {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            hosts: BTreeSet::new(),
        }
    }
}

/// Arena-backed tree of inventory groups rooted at `all`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Id of the root group (`all`).
    pub const ROOT: NodeId = 0;

    /// Create a tree holding only the root group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(ROOT_GROUP, None)],
        }
    }

    /// Number of groups, root included.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node by id, for ids that did not come from this tree.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The root group.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    /// Find the first group with the given name, in pre-order.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.preorder()
            .into_iter()
            .find(|id| self.nodes[*id].name == name)
    }

    /// Add a child group, or return the existing one.
    ///
    /// If `parent` already has a child called `name`, that child is returned. If
    /// `name` is the name of `parent` itself, `parent` is returned, so adding `all`
    /// under the root yields the root.
    pub fn add_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        if self.nodes[parent].name == name {
            return parent;
        }

        if let Some(existing) = self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[*child].name == name)
        {
            return existing;
        }

        let id = self.nodes.len();
        self.nodes.push(Node::new(name, Some(parent)));
        self.nodes[parent].children.push(id);
        id
    }

    /// Place a host directly in a group. Adding the same host twice is a no-op.
    pub fn add_host(&mut self, node: NodeId, host: &str) {
        self.nodes[node].hosts.insert(host.to_string());
    }

    /// Import expanded host records, building all their groups.
    ///
    /// For each record, and for each environment in `{record env, "all"}`:
    ///
    /// 1. the environment group under the root;
    /// 2. the role group `<env><sep><role>` under it;
    /// 3. one nested group per non-empty service segment, each name extending the
    ///    previous one by `<sep><segment>`; the host goes into the deepest group;
    /// 4. the host groups `<env><sep>host` and `<env><sep>host<sep><os>`, the host
    ///    going into the latter.
    ///
    /// Under the `all` environment only the first service segment descends, unless
    /// the record's own environment is `all`.
    ///
    /// Records must already be expanded: `role` and `srv` are used as single values.
    /// Children are not sorted; call [`Tree::sort_children`] once all imports are
    /// done.
    pub fn import_hosts(&mut self, hosts: &HostMap, separator: &str) {
        for (host, records) in hosts {
            for attrs in records {
                let envs: BTreeSet<&str> = [attrs.env.as_str(), ROOT_GROUP].into_iter().collect();

                for env in envs {
                    let env_node = self.add_child(Self::ROOT, env);

                    let mut group_name = format!("{env}{separator}{}", attrs.role);
                    let mut group = self.add_child(env_node, &group_name);

                    for (index, segment) in attrs.srv.split(separator).enumerate() {
                        let descend = index == 0 || env != ROOT_GROUP || attrs.env == ROOT_GROUP;
                        if !segment.is_empty() && descend {
                            group_name = format!("{group_name}{separator}{segment}");
                            group = self.add_child(group, &group_name);
                        }
                    }

                    self.add_host(group, host);

                    let host_group = format!("{env}{separator}{HOST_GROUP_SEGMENT}");
                    let host_node = self.add_child(env_node, &host_group);
                    let os_node =
                        self.add_child(host_node, &format!("{host_group}{separator}{}", attrs.os));
                    self.add_host(os_node, host);
                }
            }
        }
    }

    /// Ancestors of a group, nearest first, ending with the root. The root has none.
    #[must_use]
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.nodes[node].parent;

        while let Some(id) = current {
            ancestors.push(id);
            current = self.nodes[id].parent;
        }

        ancestors
    }

    /// Hosts of a group and all of its descendants.
    #[must_use]
    pub fn all_hosts(&self, node: NodeId) -> BTreeSet<&str> {
        let mut hosts = BTreeSet::new();
        let mut stack = vec![node];

        while let Some(id) = stack.pop() {
            let current = &self.nodes[id];
            hosts.extend(current.hosts.iter().map(String::as_str));
            stack.extend(current.children.iter().copied());
        }

        hosts
    }

    /// Sort the children of every group by name.
    pub fn sort_children(&mut self) {
        for index in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[index].children);
            children.sort_by(|a, b| self.nodes[*a].name.cmp(&self.nodes[*b].name));
            self.nodes[index].children = children;
        }
    }

    /// All node ids in pre-order (parents before children, siblings in child order).
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![Self::ROOT];

        while let Some(id) = stack.pop() {
            order.push(id);
            // Reversed so the first child is visited first
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }

        order
    }
}

/// Ids handed out by a tree are always valid for it.
impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tree_tests;
