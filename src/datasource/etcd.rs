// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! etcd datasource.
//!
//! Host records are stored one per key:
//!
//! ```text
//! <prefix>/<zone>/<hostname>/<n>  =  OS=linux;ENV=dev;ROLE=app
//! ```
//!
//! where `<n>` numbers the records of a host starting at 0. The datasource talks to
//! the etcd v3 JSON gateway (`/v3/kv/*`), in which keys and values travel
//! base64-encoded. Endpoints are tried in order until one answers.
//!
//! # Authentication
//!
//! With a username configured, a token is obtained from `/v3/auth/authenticate` on
//! first use and sent in the `Authorization` header of every later request.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{Certificate, Client as HttpClient, Identity};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use super::{find_zone, Datasource, DatasourceRecord};
use crate::config::{EtcdAuthConfig, EtcdConfig, EtcdImportConfig, EtcdTlsConfig};
use crate::constants::ETCD_KEY_SEPARATOR;
use crate::errors::InventoryError;

// ============================================================================
// Gateway messages
// ============================================================================

#[derive(Debug, Serialize)]
struct RangeRequest {
    key: String,
    range_end: String,
}

#[derive(Debug, Default, Deserialize)]
struct RangeResponse {
    #[serde(default)]
    kvs: Vec<KeyValue>,
}

#[derive(Debug, Deserialize)]
struct KeyValue {
    key: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Serialize)]
struct PutRequest {
    key: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct TxnRequest {
    success: Vec<RequestOp>,
}

#[derive(Debug, Serialize)]
struct RequestOp {
    request_put: PutRequest,
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    name: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

/// Response body of calls whose result is not needed.
#[derive(Debug, Deserialize)]
struct Ignored {}

// ============================================================================
// Datasource
// ============================================================================

/// etcd-backed datasource.
#[derive(Debug)]
pub struct EtcdDatasource {
    client: HttpClient,
    endpoints: Vec<Url>,
    prefix: String,
    zones: Vec<String>,
    auth: EtcdAuthConfig,
    import: EtcdImportConfig,
    token: Mutex<Option<String>>,
}

impl EtcdDatasource {
    /// Create an etcd datasource.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout or an endpoint is invalid, or if the TLS
    /// material cannot be loaded.
    pub fn new(config: &EtcdConfig) -> Result<Self, InventoryError> {
        let timeout = config.timeout()?;

        let mut builder = HttpClient::builder().timeout(timeout);
        if config.tls.enabled {
            builder = configure_tls(builder, &config.tls)?;
        }
        let client = builder.build().context("Failed to build etcd HTTP client")?;

        let endpoints = config
            .endpoints
            .iter()
            .map(|endpoint| build_endpoint_url(endpoint, config.tls.enabled))
            .collect::<Result<Vec<_>>>()?;
        if endpoints.is_empty() {
            return Err(anyhow::anyhow!("No etcd endpoints configured").into());
        }

        Ok(Self {
            client,
            endpoints,
            prefix: config.prefix.clone(),
            zones: config.zones.clone(),
            auth: config.auth.clone(),
            import: config.import.clone(),
            token: Mutex::new(None),
        })
    }

    /// Key prefix holding all records of a zone.
    fn zone_prefix(&self, zone: &str) -> String {
        format!("{}{ETCD_KEY_SEPARATOR}{zone}{ETCD_KEY_SEPARATOR}", self.prefix)
    }

    /// Key prefix holding all records of a host.
    fn host_prefix(&self, zone: &str, host: &str) -> String {
        format!("{}{host}{ETCD_KEY_SEPARATOR}", self.zone_prefix(zone))
    }

    /// Read all records below a key prefix.
    async fn get_prefix(&self, prefix: &str) -> Result<Vec<DatasourceRecord>> {
        let request = RangeRequest {
            key: BASE64.encode(prefix),
            range_end: BASE64.encode(prefix_range_end(prefix.as_bytes())),
        };

        let response: RangeResponse = self.post("v3/kv/range", &request).await?;

        let mut pairs = Vec::with_capacity(response.kvs.len());
        for kv in response.kvs {
            let key = decode(&kv.key).context("Invalid key in etcd response")?;
            let value = decode(&kv.value).context("Invalid value in etcd response")?;
            pairs.push((key, value));
        }

        Ok(records_from_pairs(&self.prefix, pairs))
    }

    /// Delete every key below a prefix.
    async fn delete_prefix(&self, prefix: &str) -> Result<()> {
        let request = RangeRequest {
            key: BASE64.encode(prefix),
            range_end: BASE64.encode(prefix_range_end(prefix.as_bytes())),
        };

        let _: Ignored = self.post("v3/kv/deleterange", &request).await?;
        Ok(())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let request = PutRequest {
            key: BASE64.encode(key),
            value: BASE64.encode(value),
        };

        let _: Ignored = self.post("v3/kv/put", &request).await?;
        Ok(())
    }

    /// Write several keys in one transaction.
    async fn put_batch(&self, pairs: &[(String, String)]) -> Result<()> {
        let request = TxnRequest {
            success: pairs
                .iter()
                .map(|(key, value)| RequestOp {
                    request_put: PutRequest {
                        key: BASE64.encode(key),
                        value: BASE64.encode(value),
                    },
                })
                .collect(),
        };

        let _: Ignored = self.post("v3/kv/txn", &request).await?;
        Ok(())
    }

    /// Authentication token, obtained on first use.
    async fn token(&self) -> Result<Option<String>> {
        if self.auth.username.is_empty() {
            return Ok(None);
        }

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(Some(token.clone()));
        }

        let request = AuthRequest {
            name: &self.auth.username,
            password: &self.auth.password,
        };
        let response: AuthResponse = self
            .send("v3/auth/authenticate", &request, None)
            .await
            .context("etcd authentication failed")?;

        debug!("Authenticated to etcd as {}", self.auth.username);
        *cached = Some(response.token.clone());

        Ok(Some(response.token))
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let token = self.token().await?;
        self.send(path, body, token.as_deref()).await
    }

    /// POST a request to the first endpoint that answers.
    async fn send<B, R>(&self, path: &str, body: &B, token: Option<&str>) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut last_error = None;

        for endpoint in &self.endpoints {
            let url = endpoint
                .join(path)
                .with_context(|| format!("Invalid etcd request path: {path}"))?;

            let mut request = self.client.post(url.clone()).json(body);
            if let Some(token_value) = token {
                request = request.header("Authorization", token_value);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!("etcd endpoint {} unreachable: {}", endpoint, e);
                    last_error = Some(
                        anyhow::Error::new(e).context(format!("Failed to send request to {url}")),
                    );
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                bail!("etcd request to {url} failed: HTTP {status}: {error_text}");
            }

            return response
                .json()
                .await
                .with_context(|| format!("Failed to decode etcd response from {url}"));
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("No etcd endpoints configured")))
    }
}

#[async_trait]
impl Datasource for EtcdDatasource {
    async fn get_all_records(&self) -> Result<Vec<DatasourceRecord>> {
        let mut records = Vec::new();

        for zone in &self.zones {
            match self.get_prefix(&self.zone_prefix(zone)).await {
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
        let zone = find_zone(host, &self.zones)
            .with_context(|| format!("{host}: no matching zone found in configuration"))?;

        self.get_prefix(&self.host_prefix(zone, host)).await
    }

    async fn publish_records(&self, records: &[DatasourceRecord]) -> Result<()> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut host_prefixes = BTreeSet::new();
        let mut pairs = Vec::with_capacity(records.len());

        for record in records {
            let zone = find_zone(&record.hostname, &self.zones).with_context(|| {
                format!(
                    "{}: no matching zone found in configuration",
                    record.hostname
                )
            })?;
            let prefix = self.host_prefix(zone, &record.hostname);

            let count = counts.entry(record.hostname.as_str()).or_insert(0);
            pairs.push((format!("{prefix}{count}"), record.attributes.clone()));
            *count += 1;

            host_prefixes.insert(prefix);
        }

        // Only hosts present in the import are cleared
        if self.import.clear {
            for prefix in &host_prefixes {
                debug!("clearing existing host records under {}", prefix);
                self.delete_prefix(prefix)
                    .await
                    .with_context(|| format!("Failed to clear {prefix}"))?;
            }
        }

        if self.import.batch == 0 {
            for (key, value) in &pairs {
                self.put(key, value)
                    .await
                    .with_context(|| format!("Failed to publish {key}"))?;
            }
        } else {
            for chunk in pairs.chunks(self.import.batch) {
                self.put_batch(chunk)
                    .await
                    .context("Failed to publish a batch of host records")?;
            }
        }

        info!(
            "Published {} records for {} hosts",
            pairs.len(),
            counts.len()
        );

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        *self.token.lock().await = None;
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Build the base URL of an endpoint given as `host:port` or a full URL.
///
/// # Errors
///
/// Returns an error if the result is not a valid URL.
pub fn build_endpoint_url(endpoint: &str, tls: bool) -> Result<Url> {
    let scheme = if tls { "https" } else { "http" };
    let base = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.trim_end_matches('/').to_string()
    } else {
        format!("{scheme}://{}", endpoint.trim_end_matches('/'))
    };

    // Trailing slash so that join() appends instead of replacing the last segment
    Url::parse(&format!("{base}/")).with_context(|| format!("Invalid etcd endpoint: {endpoint}"))
}

/// End of the key range covering every key that starts with `prefix`.
///
/// The last byte below `0xff` is incremented and everything after it dropped. A
/// prefix made only of `0xff` bytes (or an empty one) covers the whole keyspace,
/// which etcd spells as a single zero byte.
#[must_use]
pub fn prefix_range_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xff {
            end.push(last + 1);
            return end;
        }
    }
    vec![0]
}

/// Group raw `(key, value)` pairs into host records.
///
/// Keys must look like `<prefix>/<zone>/<host>/<n>`; anything else is logged and
/// skipped. Records come out ordered by hostname, then by `<n>`; a repeated
/// `<host>/<n>` keeps the last value.
#[must_use]
pub fn records_from_pairs(prefix: &str, pairs: Vec<(String, String)>) -> Vec<DatasourceRecord> {
    let mut hosts: BTreeMap<String, BTreeMap<usize, String>> = BTreeMap::new();
    let namespace = format!("{prefix}{ETCD_KEY_SEPARATOR}");

    for (key, value) in pairs {
        let Some(relative) = key.strip_prefix(&namespace) else {
            warn!("skipping key outside of the inventory prefix: {}", key);
            continue;
        };

        let parts: Vec<&str> = relative.split(ETCD_KEY_SEPARATOR).collect();
        let [_zone, host, set] = parts.as_slice() else {
            warn!("skipping malformed inventory key: {}", key);
            continue;
        };

        match set.parse::<usize>() {
            Ok(n) => {
                hosts
                    .entry((*host).to_string())
                    .or_default()
                    .insert(n, value);
            }
            Err(e) => warn!("[{}] skipping host attributes set: {}", host, e),
        }
    }

    hosts
        .into_iter()
        .flat_map(|(host, sets)| {
            sets.into_values()
                .map(move |attributes| DatasourceRecord::new(host.clone(), attributes))
        })
        .collect()
}

fn decode(value: &str) -> Result<String> {
    let bytes = BASE64.decode(value).context("Invalid base64")?;
    String::from_utf8(bytes).context("Invalid UTF-8")
}

fn configure_tls(
    mut builder: reqwest::ClientBuilder,
    tls: &EtcdTlsConfig,
) -> Result<reqwest::ClientBuilder> {
    if let Some(ca) = tls.ca.load().context("Failed to read etcd CA certificate")? {
        let certificate = Certificate::from_pem(&ca).context("Invalid etcd CA certificate")?;
        builder = builder.add_root_certificate(certificate);
    }

    let certificate = tls
        .certificate
        .load()
        .context("Failed to read etcd client certificate")?;
    let key = tls.key.load().context("Failed to read etcd client key")?;
    if let (Some(mut pem), Some(key)) = (certificate, key) {
        pem.push(b'\n');
        pem.extend_from_slice(&key);
        let identity = Identity::from_pem(&pem).context("Invalid etcd client certificate or key")?;
        builder = builder.identity(identity);
    }

    if tls.insecure {
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder)
}

#[cfg(test)]
#[path = "etcd_tests.rs"]
mod etcd_tests;
