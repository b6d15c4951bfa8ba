// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Inventory facade.
//!
//! [`Inventory`] ties the pieces together for one run:
//!
//! ```text
//! Datasource ──records──▶ AttributeParser ──▶ expand ──▶ FilterSet ──▶ HostMap ──▶ Tree
//! ```
//!
//! Records that fail to parse are logged and skipped. Filter or parser configuration
//! errors are detected in [`Inventory::new`], before anything is read.
//!
//! # Example
//!
//! ```rust,no_run
//! use ansible_dns_inventory::config::InventoryConfig;
//! use ansible_dns_inventory::datasource;
//! use ansible_dns_inventory::export::export_inventory;
//! use ansible_dns_inventory::inventory::Inventory;
//!
//! # async fn run() -> Result<(), ansible_dns_inventory::errors::InventoryError> {
//! let config = InventoryConfig::load(None)?;
//! let source = datasource::new(&config)?;
//! let inventory = Inventory::new(config, source)?;
//!
//! let tree = inventory.build(&inventory.get_hosts().await?);
//! let groups = export_inventory(&tree);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::attributes::{attributes_from_map, AttributeParser};
use crate::config::{InventoryConfig, KeysConfig};
use crate::datasource::{Datasource, DatasourceRecord};
use crate::errors::InventoryError;
use crate::expand::expand;
use crate::filter::FilterSet;
use crate::tree::{HostMap, Tree};

/// Host attribute records as written in an import file, keyed by hostname.
pub type ImportFile = BTreeMap<String, Vec<BTreeMap<String, String>>>;

/// A configured inventory bound to its datasource.
pub struct Inventory {
    config: InventoryConfig,
    parser: AttributeParser,
    filters: FilterSet,
    datasource: Box<dyn Datasource>,
}

impl Inventory {
    /// Create an inventory.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the attribute parser or the filter list
    /// cannot be built.
    pub fn new(
        config: InventoryConfig,
        datasource: Box<dyn Datasource>,
    ) -> Result<Self, InventoryError> {
        let parser = AttributeParser::new(&config.txt)?;
        let filters = FilterSet::compile(&config.filter)?;

        if !filters.is_empty() {
            debug!("{} host filters active", filters.len());
        }

        Ok(Self {
            config,
            parser,
            filters,
            datasource,
        })
    }

    /// The configuration this inventory was built with.
    #[must_use]
    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Configured attribute key names.
    #[must_use]
    pub fn keys(&self) -> &KeysConfig {
        self.parser.keys()
    }

    /// Fetch, parse, expand and filter every host record.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Datasource`] if records cannot be read and
    /// [`InventoryError::EmptyInventory`] if no record survives.
    pub async fn get_hosts(&self) -> Result<HostMap, InventoryError> {
        let records = self.datasource.get_all_records().await?;
        debug!("Loaded {} raw host records", records.len());

        let hosts = self.collect_hosts(&records);
        if hosts.is_empty() {
            return Err(InventoryError::EmptyInventory);
        }

        Ok(hosts)
    }

    /// Parse, expand and filter raw records into a host map.
    #[must_use]
    pub fn collect_hosts(&self, records: &[DatasourceRecord]) -> HostMap {
        let mut hosts = HostMap::new();

        for record in records {
            let attrs = match self.parser.parse(&record.attributes) {
                Ok(attrs) => attrs,
                Err(e) => {
                    warn!("[{}] skipping host record: {}", record.hostname, e);
                    continue;
                }
            };

            for (hostname, expanded) in expand(&record.hostname, &attrs) {
                if self.filters.matches(&hostname, &expanded) {
                    hosts.entry(hostname).or_default().push(expanded);
                } else {
                    debug!(
                        "[{}] record filtered out (role={}, srv={})",
                        hostname, expanded.role, expanded.srv
                    );
                }
            }
        }

        hosts
    }

    /// Build the frozen group tree of a host map.
    #[must_use]
    pub fn build(&self, hosts: &HostMap) -> Tree {
        let mut tree = Tree::new();
        tree.import_hosts(hosts, &self.config.txt.keys.separator);
        tree.sort_children();

        debug!("Built inventory tree with {} groups", tree.group_count());
        tree
    }

    /// Collect the variables of a single host from the `vars` field of its records.
    ///
    /// Invalid records are skipped. Later records overwrite earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Datasource`] if the host records cannot be read.
    pub async fn get_host_variables(
        &self,
        host: &str,
    ) -> Result<BTreeMap<String, String>, InventoryError> {
        let records = self.datasource.get_host_records(host).await?;

        let parsed: Vec<_> = records
            .iter()
            .filter_map(|record| match self.parser.parse(&record.attributes) {
                Ok(attrs) => Some(attrs),
                Err(e) => {
                    warn!("[{}] skipping host record: {}", record.hostname, e);
                    None
                }
            })
            .collect();

        Ok(self.parser.parse_variables(&parsed))
    }

    /// Render the records of an import file into raw datasource records.
    ///
    /// Nothing is returned unless every record is valid.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::InvalidRecord`] for the first invalid record.
    pub fn render_records(&self, hosts: &ImportFile) -> Result<Vec<DatasourceRecord>, InventoryError> {
        let mut records = Vec::new();

        for (host, entries) in hosts {
            for entry in entries {
                let attrs = attributes_from_map(entry, self.parser.keys());
                let raw = self
                    .parser
                    .render(&attrs)
                    .map_err(|source| InventoryError::InvalidRecord {
                        host: host.clone(),
                        source,
                    })?;
                records.push(DatasourceRecord::new(host.clone(), raw));
            }
        }

        Ok(records)
    }

    /// Import host records from a YAML file into the datasource.
    ///
    /// The file maps hostnames to lists of attribute maps keyed by the configured key
    /// names:
    ///
    /// ```yaml
    /// app01.rnd.local:
    ///   - OS: linux
    ///     ENV: dev
    ///     ROLE: app
    ///     SRV: tomcat_backend
    /// ```
    ///
    /// Returns the number of records published.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::ImportRead`] or [`InventoryError::ImportParse`] for an
    /// unusable file, [`InventoryError::InvalidRecord`] for an invalid record and
    /// [`InventoryError::Datasource`] if publishing fails.
    pub async fn import_file(&self, path: &Path) -> Result<usize, InventoryError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| InventoryError::ImportRead {
                path: path.display().to_string(),
                source,
            })?;
        let hosts: ImportFile =
            serde_yaml::from_str(&content).map_err(|source| InventoryError::ImportParse {
                path: path.display().to_string(),
                source,
            })?;

        let records = self.render_records(&hosts)?;
        self.datasource.publish_records(&records).await?;

        info!(
            "Imported {} records for {} hosts from {}",
            records.len(),
            hosts.len(),
            path.display()
        );

        Ok(records.len())
    }

    /// Release the datasource.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Datasource`] if the datasource fails to close.
    pub async fn close(&self) -> Result<(), InventoryError> {
        self.datasource.close().await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod inventory_tests;
