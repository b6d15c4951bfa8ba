// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # ansible-dns-inventory - Ansible dynamic inventory from DNS or etcd
//!
//! Hosts describe themselves with a small attribute string, stored either as a DNS
//! TXT record or as an etcd value:
//!
//! ```text
//! app01.rnd.local.  TXT  "OS=linux;ENV=dev;ROLE=app;SRV=tomcat_backend_auth"
//! ```
//!
//! The inventory reads every record, builds a tree of Ansible groups out of the
//! environment, role, service and operating system of each host, and exports that
//! tree in the shapes Ansible and humans want.
//!
//! ## Modules
//!
//! - [`attributes`] - Attribute string parsing, validation and rendering
//! - [`expand`] - Role/service list expansion
//! - [`filter`] - Compiled host filters
//! - [`tree`] - Arena-backed group tree
//! - [`export`] - Views of a built tree (Ansible inventory, host and group maps)
//! - [`format`] - JSON/YAML output rendering
//! - [`datasource`] - DNS and etcd record sources
//! - [`inventory`] - The facade wiring all of the above
//! - [`config`] - YAML configuration with environment overrides
//!
//! ## Example
//!
//! ```rust
//! use ansible_dns_inventory::attributes::AttributeParser;
//! use ansible_dns_inventory::config::TxtConfig;
//! use ansible_dns_inventory::export::export_groups;
//! use ansible_dns_inventory::tree::{HostMap, Tree};
//!
//! let parser = AttributeParser::new(&TxtConfig::default()).unwrap();
//! let attrs = parser.parse("OS=linux;ENV=dev;ROLE=app;SRV=tomcat").unwrap();
//!
//! let mut hosts = HostMap::new();
//! hosts.insert("app01".to_string(), vec![attrs]);
//!
//! let mut tree = Tree::new();
//! tree.import_hosts(&hosts, "_");
//! tree.sort_children();
//!
//! let groups = export_groups(&tree);
//! assert_eq!(groups["dev_app_tomcat"], vec!["app01"]);
//! ```

pub mod attributes;
pub mod config;
pub mod constants;
pub mod datasource;
pub mod errors;
pub mod expand;
pub mod export;
pub mod filter;
pub mod format;
pub mod inventory;
pub mod tree;
