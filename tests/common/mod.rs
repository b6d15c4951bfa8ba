// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests

use ansible_dns_inventory::config::InventoryConfig;
use ansible_dns_inventory::datasource::{Datasource, DatasourceRecord};
use ansible_dns_inventory::inventory::Inventory;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// In-memory datasource: serves fixed records and keeps published ones.
#[derive(Default)]
pub struct MemoryDatasource {
    pub records: Arc<Mutex<Vec<DatasourceRecord>>>,
}

#[async_trait]
impl Datasource for MemoryDatasource {
    async fn get_all_records(&self) -> anyhow::Result<Vec<DatasourceRecord>> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn get_host_records(&self, host: &str) -> anyhow::Result<Vec<DatasourceRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.hostname == host)
            .cloned()
            .collect())
    }

    async fn publish_records(&self, records: &[DatasourceRecord]) -> anyhow::Result<()> {
        let mut stored = self.records.lock().unwrap();
        let hosts: Vec<&str> = records.iter().map(|r| r.hostname.as_str()).collect();
        stored.retain(|r| !hosts.contains(&r.hostname.as_str()));
        stored.extend_from_slice(records);
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Build an inventory over the given `(hostname, attributes)` records.
pub fn inventory(config: InventoryConfig, records: &[(&str, &str)]) -> Inventory {
    let datasource = MemoryDatasource::default();
    datasource.records.lock().unwrap().extend(
        records
            .iter()
            .map(|(host, attrs)| DatasourceRecord::new(*host, *attrs)),
    );
    Inventory::new(config, Box::new(datasource)).unwrap()
}

/// The hosts used by most scenarios.
pub const SAMPLE_RECORDS: &[(&str, &str)] = &[
    ("app01", "OS=linux;ENV=dev;ROLE=app;SRV=tomcat_backend_auth"),
    ("app02", "OS=linux;ENV=dev;ROLE=app;SRV=tomcat_backend_auth"),
    ("app03", "OS=linux;ENV=dev;ROLE=app;SRV=tomcat_backend_media"),
    ("stor01", "OS=freebsd;ENV=prod;ROLE=app,storage;SRV="),
    ("broken", "OS=linux;ENV=dev"),
];
