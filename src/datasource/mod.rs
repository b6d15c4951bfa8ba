// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Datasources supplying raw host records.
//!
//! A datasource only moves `(hostname, attribute string)` pairs; parsing, filtering
//! and tree building happen in the inventory core. Two implementations exist:
//!
//! - [`dns::DnsDatasource`]: TXT records read by zone transfer, or from a single
//!   inventory host per zone in no-transfer mode
//! - [`etcd::EtcdDatasource`]: keys `<prefix>/<zone>/<host>/<n>` read through the
//!   etcd v3 JSON gateway
//!
//! Failures of a single zone are logged and the zone is skipped; other errors are
//! returned with context.

pub mod dns;
pub mod etcd;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::InventoryConfig;
use crate::constants::{DATASOURCE_DNS, DATASOURCE_ETCD};
use crate::errors::{ConfigError, InventoryError};

/// A raw host record as stored in a datasource.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DatasourceRecord {
    /// Hostname without a trailing dot
    pub hostname: String,
    /// Unparsed attribute string
    pub attributes: String,
}

impl DatasourceRecord {
    /// Create a record.
    pub fn new(hostname: impl Into<String>, attributes: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            attributes: attributes.into(),
        }
    }
}

/// Source of raw host records.
#[async_trait]
pub trait Datasource: Send + Sync {
    /// Read every record of every configured zone.
    async fn get_all_records(&self) -> Result<Vec<DatasourceRecord>>;

    /// Read the records of a single host.
    async fn get_host_records(&self, host: &str) -> Result<Vec<DatasourceRecord>>;

    /// Write records into the datasource.
    async fn publish_records(&self, records: &[DatasourceRecord]) -> Result<()>;

    /// Release any resources held by the datasource.
    async fn close(&self) -> Result<()>;
}

/// Create the datasource selected by `config.datasource`.
///
/// # Errors
///
/// Returns a configuration error for an unknown datasource type, and an error if the
/// selected datasource cannot be initialized (e.g., invalid timeout or TLS material).
pub fn new(config: &InventoryConfig) -> Result<Box<dyn Datasource>, InventoryError> {
    match config.datasource.as_str() {
        DATASOURCE_DNS => Ok(Box::new(dns::DnsDatasource::new(&config.dns)?)),
        DATASOURCE_ETCD => Ok(Box::new(etcd::EtcdDatasource::new(&config.etcd)?)),
        other => Err(ConfigError::UnknownDatasource {
            name: other.to_string(),
        }
        .into()),
    }
}

/// Select the configured zone a host belongs to, by suffix match.
///
/// Leading and trailing dots are ignored on both sides. The first matching zone in
/// configuration order wins.
#[must_use]
pub fn find_zone<'a>(host: &str, zones: &'a [String]) -> Option<&'a str> {
    let host = host.trim_matches('.');
    zones
        .iter()
        .find(|zone| host.ends_with(zone.trim_matches('.')))
        .map(String::as_str)
}
