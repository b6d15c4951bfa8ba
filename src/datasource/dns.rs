// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS datasource.
//!
//! Host records are TXT records. They are read in one of two ways:
//!
//! - **Zone transfer** (default): every configured zone is transferred (AXFR over
//!   TCP, optionally TSIG-signed) and each TXT record becomes one host record, the
//!   owner name being the hostname.
//! - **No-transfer mode**: each zone holds one inventory host (default
//!   `ansible-dns-inventory`) whose TXT values are `<hostname><separator><attributes>`.
//!   Only that host is queried, so no zone transfer permission is needed.
//!
//! The hickory client is synchronous; every request runs on the blocking pool.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hickory_client::client::{Client, SyncClient};
use hickory_client::rr::rdata::tsig::TsigAlgorithm;
use hickory_client::rr::{DNSClass, Name, RData, Record, RecordType};
use hickory_client::tcp::TcpClientConnection;
use hickory_client::udp::UdpClientConnection;
use hickory_proto::rr::dnssec::tsig::TSigner;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use super::{find_zone, Datasource, DatasourceRecord};
use crate::config::{DnsConfig, NoTransferConfig, TsigConfig};
use crate::constants::TSIG_FUDGE_TIME_SECS;
use crate::errors::InventoryError;

/// An owner name and the text of one of its TXT records.
type TxtEntry = (String, String);

/// DNS-backed datasource.
#[derive(Clone, Debug)]
pub struct DnsDatasource {
    server: String,
    timeout: Duration,
    zones: Vec<String>,
    notransfer: NoTransferConfig,
    tsig: Option<TsigConfig>,
}

impl DnsDatasource {
    /// Create a DNS datasource.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is invalid or, with TSIG enabled, if the key
    /// cannot be turned into a signer.
    pub fn new(config: &DnsConfig) -> Result<Self, InventoryError> {
        let timeout = config.timeout()?;

        let tsig = if config.tsig.enabled {
            // Fail early on a bad key instead of on the first transfer
            create_tsig_signer(&config.tsig)?;
            Some(config.tsig.clone())
        } else {
            None
        };

        Ok(Self {
            server: config.server.clone(),
            timeout,
            zones: config.zones.clone(),
            notransfer: config.notransfer.clone(),
            tsig,
        })
    }

    /// Records of one zone, read according to the configured mode.
    async fn get_zone_records(&self, zone: &str) -> Result<Vec<DatasourceRecord>> {
        if self.notransfer.enabled {
            let entries = query_txt(
                self.server.clone(),
                make_fqdn(&self.notransfer.host, zone),
                self.timeout,
            )
            .await?;
            Ok(self.inventory_records(entries))
        } else {
            let entries = transfer_zone(
                self.server.clone(),
                make_fqdn("", zone),
                make_fqdn(&self.notransfer.host, zone),
                self.timeout,
                self.tsig.clone(),
            )
            .await?;
            Ok(entries.into_iter().map(owner_record).collect())
        }
    }

    /// Turn the TXT values of an inventory host into host records.
    fn inventory_records(&self, entries: Vec<TxtEntry>) -> Vec<DatasourceRecord> {
        entries
            .into_iter()
            .filter_map(|(owner, value)| {
                let record = split_inventory_entry(&value, &self.notransfer.separator);
                if record.is_none() {
                    warn!(
                        "[{}] skipping inventory entry without separator '{}': {}",
                        owner, self.notransfer.separator, value
                    );
                }
                record
            })
            .collect()
    }
}

#[async_trait]
impl Datasource for DnsDatasource {
    async fn get_all_records(&self) -> Result<Vec<DatasourceRecord>> {
        let mut records = Vec::new();

        for zone in &self.zones {
            match self.get_zone_records(zone).await {
                Ok(zone_records) => {
                    debug!("[{}] loaded {} host records", zone, zone_records.len());
                    records.extend(zone_records);
                }
                Err(e) => warn!("[{}] skipping zone: {:#}", zone, e),
            }
        }

        Ok(records)
    }

    async fn get_host_records(&self, host: &str) -> Result<Vec<DatasourceRecord>> {
        if self.notransfer.enabled {
            let zone = find_zone(host, &self.zones)
                .with_context(|| format!("{host}: no matching zone found in configuration"))?;

            let entries = query_txt(
                self.server.clone(),
                make_fqdn(&self.notransfer.host, zone),
                self.timeout,
            )
            .await?;

            Ok(self
                .inventory_records(entries)
                .into_iter()
                .filter(|record| record.hostname == host)
                .collect())
        } else {
            let entries = query_txt(self.server.clone(), make_fqdn(host, ""), self.timeout).await?;
            Ok(entries.into_iter().map(owner_record).collect())
        }
    }

    async fn publish_records(&self, records: &[DatasourceRecord]) -> Result<()> {
        warn!(
            "Publishing records is not supported by the DNS datasource, {} records ignored",
            records.len()
        );
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Build a fully qualified name from a host and a zone.
///
/// Leading dots are dropped from both parts and the result always ends with a dot.
/// An empty host yields the zone itself, an empty zone the host itself.
///
/// ```rust
/// use ansible_dns_inventory::datasource::dns::make_fqdn;
///
/// assert_eq!(make_fqdn("test", ".rnd.local"), "test.rnd.local.");
/// assert_eq!(make_fqdn("", "rnd.local."), "rnd.local.");
/// assert_eq!(make_fqdn("", ""), ".");
/// ```
#[must_use]
pub fn make_fqdn(host: &str, zone: &str) -> String {
    let name = host.trim_start_matches('.');
    let domain = zone.trim_start_matches('.');

    if domain.is_empty() {
        return fqdn(name);
    }

    fqdn(&format!("{name}.{domain}"))
        .trim_start_matches('.')
        .to_string()
}

fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Split a no-transfer inventory entry `<hostname><separator><attributes>`.
///
/// Returns `None` when the separator is missing. A trailing dot is removed from the
/// hostname.
#[must_use]
pub fn split_inventory_entry(value: &str, separator: &str) -> Option<DatasourceRecord> {
    let (hostname, attributes) = value.split_once(separator)?;
    Some(DatasourceRecord::new(
        hostname.trim_end_matches('.'),
        attributes,
    ))
}

fn owner_record((owner, value): TxtEntry) -> DatasourceRecord {
    DatasourceRecord::new(owner.trim_end_matches('.'), value)
}

/// Concatenated text of a TXT record; `None` for any other record type.
fn txt_value(record: &Record) -> Option<String> {
    match record.data() {
        Some(RData::TXT(txt)) => Some(
            txt.txt_data()
                .iter()
                .map(|bytes| String::from_utf8_lossy(bytes))
                .collect(),
        ),
        _ => None,
    }
}

/// TXT entry of a transferred record. The owner `skip_name` is the no-transfer
/// inventory host, not a real host, and is dropped.
fn transfer_entry(record: &Record, skip_name: &str) -> Option<TxtEntry> {
    let owner = record.name().to_utf8();
    if owner.eq_ignore_ascii_case(skip_name) {
        return None;
    }
    txt_value(record).map(|value| (owner, value))
}

fn resolve_server(server: &str) -> Result<SocketAddr> {
    server
        .to_socket_addrs()
        .with_context(|| format!("Invalid server address: {server}"))?
        .next()
        .with_context(|| format!("Server address resolved to nothing: {server}"))
}

/// Query the TXT records of one name.
async fn query_txt(server: String, name: String, timeout: Duration) -> Result<Vec<TxtEntry>> {
    tokio::task::spawn_blocking(move || {
        let server_addr = resolve_server(&server)?;
        let conn = UdpClientConnection::with_timeout(server_addr, timeout)
            .context("Failed to create UDP connection for query")?;
        let client = SyncClient::new(conn);

        let fqdn = Name::from_str(&name).with_context(|| format!("Invalid record name: {name}"))?;
        let response = client
            .query(&fqdn, DNSClass::IN, RecordType::TXT)
            .with_context(|| format!("Failed to query TXT records for {fqdn}"))?;

        Ok(response
            .answers()
            .iter()
            .filter_map(|record| txt_value(record).map(|value| (record.name().to_utf8(), value)))
            .collect())
    })
    .await
    .context("DNS query task failed")?
}

/// Transfer a zone and keep its TXT records, except those of `skip_name`.
async fn transfer_zone(
    server: String,
    zone: String,
    skip_name: String,
    timeout: Duration,
    tsig: Option<TsigConfig>,
) -> Result<Vec<TxtEntry>> {
    tokio::task::spawn_blocking(move || {
        let server_addr = resolve_server(&server)?;
        let conn = TcpClientConnection::with_timeout(server_addr, timeout)
            .context("Failed to create TCP connection for zone transfer")?;
        let client = match &tsig {
            Some(key) => SyncClient::with_tsigner(conn, create_tsig_signer(key)?),
            None => SyncClient::new(conn),
        };

        let origin = Name::from_str(&zone).with_context(|| format!("Invalid zone name: {zone}"))?;
        let responses = client
            .zone_transfer(&origin, None)
            .with_context(|| format!("Zone transfer of {zone} failed"))?;

        let mut entries = Vec::new();
        for response in responses {
            let response = response.with_context(|| format!("Zone transfer of {zone} failed"))?;

            entries.extend(
                response
                    .answers()
                    .iter()
                    .filter_map(|record| transfer_entry(record, &skip_name)),
            );
        }

        Ok(entries)
    })
    .await
    .context("DNS zone transfer task failed")?
}

/// Map a configured algorithm name onto the hickory TSIG algorithm.
///
/// # Errors
///
/// Returns an error for algorithms outside the HMAC-SHA family.
pub fn tsig_algorithm(algo: &str) -> Result<TsigAlgorithm> {
    Ok(match algo.trim_end_matches('.') {
        "hmac-sha1" => TsigAlgorithm::HmacSha1,
        "hmac-sha224" => TsigAlgorithm::HmacSha224,
        "hmac-sha256" => TsigAlgorithm::HmacSha256,
        "hmac-sha384" => TsigAlgorithm::HmacSha384,
        "hmac-sha512" => TsigAlgorithm::HmacSha512,
        other => bail!("Unsupported TSIG algorithm '{other}'"),
    })
}

/// Create a TSIG signer from the configured key.
///
/// # Errors
///
/// Returns an error if the algorithm is unsupported, the secret is not valid base64
/// or the key name is not a valid DNS name.
pub fn create_tsig_signer(config: &TsigConfig) -> Result<TSigner> {
    let algorithm = tsig_algorithm(&config.algo)?;

    let key_bytes = BASE64
        .decode(config.secret.trim())
        .context("Failed to decode TSIG secret")?;

    TSigner::new(
        key_bytes,
        algorithm,
        Name::from_str(&config.key).context("Invalid TSIG key name")?,
        u16::try_from(TSIG_FUDGE_TIME_SECS).unwrap_or(300),
    )
    .context("Failed to create TSIG signer")
}

#[cfg(test)]
#[path = "dns_tests.rs"]
mod dns_tests;
