// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Inventory configuration.
//!
//! The configuration is read from a YAML file and then overridden by `ADI_*`
//! environment variables. Every setting has a default, so running without any
//! configuration file is valid.
//!
//! # Lookup order
//!
//! 1. An explicit path (`--config` or `ADI_CONFIG_FILE`)
//! 2. `./ansible-dns-inventory.yaml`
//! 3. `$HOME/.ansible/ansible-dns-inventory.yaml`
//! 4. `/etc/ansible/ansible-dns-inventory.yaml`
//!
//! # Environment overrides
//!
//! Each dotted key maps to an upper-case variable with an `ADI_` prefix, e.g.
//! `dns.notransfer.enabled` → `ADI_DNS_NOTRANSFER_ENABLED`. List values are
//! comma-separated.
//!
//! # Example
//!
//! ```rust
//! use ansible_dns_inventory::config::InventoryConfig;
//!
//! let yaml = r#"
//! datasource: dns
//! dns:
//!   server: 10.0.0.53:53
//!   zones: [prod.example.com.]
//! txt:
//!   keys:
//!     separator: "-"
//! "#;
//!
//! let config = InventoryConfig::from_yaml_str(yaml, "inline").unwrap();
//! assert_eq!(config.dns.server, "10.0.0.53:53");
//! assert_eq!(config.txt.keys.separator, "-");
//! // Untouched settings keep their defaults
//! assert_eq!(config.txt.kv.separator, ";");
//! ```

pub mod duration;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::constants::{
    CONFIG_ENV_PREFIX, CONFIG_FILE_ENV, CONFIG_FILE_NAME, CONFIG_SYSTEM_DIR, CONFIG_USER_DIR,
    DATASOURCE_DNS, DEFAULT_DNS_SERVER, DEFAULT_ETCD_ENDPOINT, DEFAULT_ETCD_PREFIX,
    DEFAULT_KEY_ENV, DEFAULT_KEY_OS, DEFAULT_KEY_ROLE, DEFAULT_KEY_SEPARATOR, DEFAULT_KEY_SRV,
    DEFAULT_KEY_VARS, DEFAULT_KV_EQUALSIGN, DEFAULT_KV_SEPARATOR, DEFAULT_NOTRANSFER_HOST,
    DEFAULT_NOTRANSFER_SEPARATOR, DEFAULT_TIMEOUT, DEFAULT_TSIG_ALGO, DEFAULT_TSIG_KEY,
    DEFAULT_TSIG_SECRET, DEFAULT_VARS_EQUALSIGN, DEFAULT_VARS_SEPARATOR, DEFAULT_ZONE,
};
use crate::errors::ConfigError;

/// Every configuration key that can be overridden from the environment.
pub const CONFIG_KEYS: &[&str] = &[
    "datasource",
    "dns.server",
    "dns.timeout",
    "dns.zones",
    "dns.notransfer.enabled",
    "dns.notransfer.host",
    "dns.notransfer.separator",
    "dns.tsig.enabled",
    "dns.tsig.key",
    "dns.tsig.secret",
    "dns.tsig.algo",
    "etcd.endpoints",
    "etcd.timeout",
    "etcd.prefix",
    "etcd.zones",
    "etcd.auth.username",
    "etcd.auth.password",
    "etcd.tls.enabled",
    "etcd.tls.insecure",
    "etcd.tls.ca.path",
    "etcd.tls.ca.pem",
    "etcd.tls.certificate.path",
    "etcd.tls.certificate.pem",
    "etcd.tls.key.path",
    "etcd.tls.key.pem",
    "etcd.import.clear",
    "etcd.import.batch",
    "txt.kv.separator",
    "txt.kv.equalsign",
    "txt.vars.enabled",
    "txt.vars.separator",
    "txt.vars.equalsign",
    "txt.keys.separator",
    "txt.keys.os",
    "txt.keys.env",
    "txt.keys.role",
    "txt.keys.srv",
    "txt.keys.vars",
    "filter.enabled",
];

/// Top-level inventory configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Datasource type: `dns` or `etcd`
    pub datasource: String,
    /// DNS datasource settings
    pub dns: DnsConfig,
    /// etcd datasource settings
    pub etcd: EtcdConfig,
    /// TXT attribute parsing settings
    pub txt: TxtConfig,
    /// Host filtering settings
    pub filter: FilterConfig,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            datasource: DATASOURCE_DNS.to_string(),
            dns: DnsConfig::default(),
            etcd: EtcdConfig::default(),
            txt: TxtConfig::default(),
            filter: FilterConfig::default(),
        }
    }
}

/// DNS datasource settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    /// DNS server address (IP:port)
    pub server: String,
    /// Network timeout for DNS requests (Go-style duration)
    pub timeout: String,
    /// Zones to load hosts from
    pub zones: Vec<String>,
    /// No-transfer mode settings
    pub notransfer: NoTransferConfig,
    /// TSIG settings for zone transfers
    pub tsig: TsigConfig,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_DNS_SERVER.to_string(),
            timeout: DEFAULT_TIMEOUT.to_string(),
            zones: vec![DEFAULT_ZONE.to_string()],
            notransfer: NoTransferConfig::default(),
            tsig: TsigConfig::default(),
        }
    }
}

impl DnsConfig {
    /// Parsed DNS request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured timeout is not a valid duration.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        parse_timeout("dns.timeout", &self.timeout)
    }
}

/// No-transfer mode: all inventory records live in the TXT records of one host per zone.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NoTransferConfig {
    /// Query the inventory host instead of transferring the zone
    pub enabled: bool,
    /// Name of the host holding the inventory records
    pub host: String,
    /// Separator between a hostname and its attribute string
    pub separator: String,
}

impl Default for NoTransferConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: DEFAULT_NOTRANSFER_HOST.to_string(),
            separator: DEFAULT_NOTRANSFER_SEPARATOR.to_string(),
        }
    }
}

/// TSIG key used to sign zone transfer requests.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TsigConfig {
    /// Sign zone transfer requests
    pub enabled: bool,
    /// Key name
    pub key: String,
    /// Base64-encoded secret
    pub secret: String,
    /// HMAC algorithm name (e.g., `hmac-sha256`)
    pub algo: String,
}

impl Default for TsigConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            key: DEFAULT_TSIG_KEY.to_string(),
            secret: DEFAULT_TSIG_SECRET.to_string(),
            algo: DEFAULT_TSIG_ALGO.to_string(),
        }
    }
}

/// etcd datasource settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EtcdConfig {
    /// etcd endpoints (`host:port` or full URLs)
    pub endpoints: Vec<String>,
    /// Request timeout (Go-style duration)
    pub timeout: String,
    /// Key namespace holding the inventory
    pub prefix: String,
    /// Zones to load hosts from
    pub zones: Vec<String>,
    /// Authentication settings
    pub auth: EtcdAuthConfig,
    /// TLS settings
    pub tls: EtcdTlsConfig,
    /// Record import settings
    pub import: EtcdImportConfig,
}

impl Default for EtcdConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![DEFAULT_ETCD_ENDPOINT.to_string()],
            timeout: DEFAULT_TIMEOUT.to_string(),
            prefix: DEFAULT_ETCD_PREFIX.to_string(),
            zones: vec![DEFAULT_ZONE.to_string()],
            auth: EtcdAuthConfig::default(),
            tls: EtcdTlsConfig::default(),
            import: EtcdImportConfig::default(),
        }
    }
}

impl EtcdConfig {
    /// Parsed etcd request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured timeout is not a valid duration.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        parse_timeout("etcd.timeout", &self.timeout)
    }
}

/// etcd username/password authentication. Empty username disables authentication.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EtcdAuthConfig {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

/// etcd TLS material.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EtcdTlsConfig {
    /// Use HTTPS towards the endpoints
    pub enabled: bool,
    /// Skip server certificate verification
    pub insecure: bool,
    /// CA bundle
    pub ca: PemSource,
    /// Client certificate
    pub certificate: PemSource,
    /// Client private key
    pub key: PemSource,
}

/// PEM material given either inline or as a file path. Inline PEM wins.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PemSource {
    /// Path to a PEM file
    pub path: String,
    /// Inline PEM data
    pub pem: String,
}

impl PemSource {
    /// Whether any PEM material is configured.
    #[must_use]
    pub fn is_set(&self) -> bool {
        !self.pem.is_empty() || !self.path.is_empty()
    }

    /// Load the PEM bytes, preferring inline data over the file path.
    ///
    /// Returns `Ok(None)` when nothing is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured file cannot be read.
    pub fn load(&self) -> std::io::Result<Option<Vec<u8>>> {
        if !self.pem.is_empty() {
            Ok(Some(self.pem.as_bytes().to_vec()))
        } else if !self.path.is_empty() {
            std::fs::read(&self.path).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Settings for publishing records into etcd.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EtcdImportConfig {
    /// Delete the existing records of each imported host before publishing its new
    /// ones; hosts missing from the import are left alone
    pub clear: bool,
    /// Number of records written per transaction; 0 writes records one by one
    pub batch: usize,
}

impl Default for EtcdImportConfig {
    fn default() -> Self {
        Self {
            clear: true,
            batch: 0,
        }
    }
}

/// TXT attribute parsing settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TxtConfig {
    /// Separators of the raw attribute string
    pub kv: KvConfig,
    /// Host variable settings
    pub vars: VarsConfig,
    /// Attribute key names and group-name separator
    pub keys: KeysConfig,
}

/// Separators of a raw attribute string: `OS=linux;ENV=dev`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct KvConfig {
    /// Separator between key/value pairs
    pub separator: String,
    /// Separator between a key and its value
    pub equalsign: String,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_KV_SEPARATOR.to_string(),
            equalsign: DEFAULT_KV_EQUALSIGN.to_string(),
        }
    }
}

/// Host variables encoded in the VARS attribute: `VARS=a=1,b=2`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VarsConfig {
    /// Serve host variables for `--host`
    pub enabled: bool,
    /// Separator between variables
    pub separator: String,
    /// Separator between a variable name and its value
    pub equalsign: String,
}

impl Default for VarsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            separator: DEFAULT_VARS_SEPARATOR.to_string(),
            equalsign: DEFAULT_VARS_EQUALSIGN.to_string(),
        }
    }
}

/// Attribute key names and the group-name separator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Separator between the elements of a group name
    pub separator: String,
    /// Key name of the operating system attribute
    pub os: String,
    /// Key name of the environment attribute
    pub env: String,
    /// Key name of the role attribute
    pub role: String,
    /// Key name of the service attribute
    pub srv: String,
    /// Key name of the host variables attribute
    pub vars: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_KEY_SEPARATOR.to_string(),
            os: DEFAULT_KEY_OS.to_string(),
            env: DEFAULT_KEY_ENV.to_string(),
            role: DEFAULT_KEY_ROLE.to_string(),
            srv: DEFAULT_KEY_SRV.to_string(),
            vars: DEFAULT_KEY_VARS.to_string(),
        }
    }
}

/// Host filtering settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Apply the filter list
    pub enabled: bool,
    /// Filters; all of them must pass for a record to be kept
    pub filters: Vec<FilterSpec>,
}

/// A single host filter as written in the configuration file.
///
/// Key and operator are kept as plain strings here and checked when the filter list
/// is compiled, so that a typo is reported as a configuration error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Attribute the filter applies to: `host`, `os`, `env`, `role`, `srv` or `vars`
    pub key: String,
    /// Operator: `in`, `notin`, `regex` or `notregex`
    pub operator: String,
    /// Values or regular expressions to compare against
    #[serde(default)]
    pub values: Vec<String>,
}

impl InventoryConfig {
    /// Load the configuration from the standard locations and the environment.
    ///
    /// `explicit` takes precedence over `ADI_CONFIG_FILE`, which takes precedence over
    /// the search path. A missing file in the search path is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected file cannot be read or parsed, or if an
    /// environment override holds an invalid value.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from))
            .or_else(find_config_file);

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.normalize();

        Ok(config)
    }

    /// Read a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid configuration YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Reading configuration file");

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// Parse configuration YAML. `origin` names the source in error messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML does not match the configuration schema.
    pub fn from_yaml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        // An empty document means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Apply `ADI_*` overrides using `lookup` to read variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a boolean or numeric override cannot be parsed.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in CONFIG_KEYS {
            let variable = env_var_name(key);
            if let Some(value) = lookup(&variable) {
                debug!(key = %key, variable = %variable, "Applying environment override");
                self.set(key, &variable, &value)?;
            }
        }

        Ok(())
    }

    /// Normalize values that have a restricted set of meanings.
    pub fn normalize(&mut self) {
        self.dns.tsig.algo = normalize_tsig_algo(&self.dns.tsig.algo).to_string();
    }

    fn set(&mut self, key: &str, variable: &str, value: &str) -> Result<(), ConfigError> {
        let text = || value.to_string();

        match key {
            "datasource" => self.datasource = text(),
            "dns.server" => self.dns.server = text(),
            "dns.timeout" => self.dns.timeout = text(),
            "dns.zones" => self.dns.zones = parse_list(value),
            "dns.notransfer.enabled" => {
                self.dns.notransfer.enabled = parse_bool(variable, value)?;
            }
            "dns.notransfer.host" => self.dns.notransfer.host = text(),
            "dns.notransfer.separator" => self.dns.notransfer.separator = text(),
            "dns.tsig.enabled" => self.dns.tsig.enabled = parse_bool(variable, value)?,
            "dns.tsig.key" => self.dns.tsig.key = text(),
            "dns.tsig.secret" => self.dns.tsig.secret = text(),
            "dns.tsig.algo" => self.dns.tsig.algo = text(),
            "etcd.endpoints" => self.etcd.endpoints = parse_list(value),
            "etcd.timeout" => self.etcd.timeout = text(),
            "etcd.prefix" => self.etcd.prefix = text(),
            "etcd.zones" => self.etcd.zones = parse_list(value),
            "etcd.auth.username" => self.etcd.auth.username = text(),
            "etcd.auth.password" => self.etcd.auth.password = text(),
            "etcd.tls.enabled" => self.etcd.tls.enabled = parse_bool(variable, value)?,
            "etcd.tls.insecure" => self.etcd.tls.insecure = parse_bool(variable, value)?,
            "etcd.tls.ca.path" => self.etcd.tls.ca.path = text(),
            "etcd.tls.ca.pem" => self.etcd.tls.ca.pem = text(),
            "etcd.tls.certificate.path" => self.etcd.tls.certificate.path = text(),
            "etcd.tls.certificate.pem" => self.etcd.tls.certificate.pem = text(),
            "etcd.tls.key.path" => self.etcd.tls.key.path = text(),
            "etcd.tls.key.pem" => self.etcd.tls.key.pem = text(),
            "etcd.import.clear" => self.etcd.import.clear = parse_bool(variable, value)?,
            "etcd.import.batch" => {
                self.etcd.import.batch =
                    value
                        .trim()
                        .parse()
                        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnvValue {
                            variable: variable.to_string(),
                            value: value.to_string(),
                            reason: e.to_string(),
                        })?;
            }
            "txt.kv.separator" => self.txt.kv.separator = text(),
            "txt.kv.equalsign" => self.txt.kv.equalsign = text(),
            "txt.vars.enabled" => self.txt.vars.enabled = parse_bool(variable, value)?,
            "txt.vars.separator" => self.txt.vars.separator = text(),
            "txt.vars.equalsign" => self.txt.vars.equalsign = text(),
            "txt.keys.separator" => self.txt.keys.separator = text(),
            "txt.keys.os" => self.txt.keys.os = text(),
            "txt.keys.env" => self.txt.keys.env = text(),
            "txt.keys.role" => self.txt.keys.role = text(),
            "txt.keys.srv" => self.txt.keys.srv = text(),
            "txt.keys.vars" => self.txt.keys.vars = text(),
            "filter.enabled" => self.filter.enabled = parse_bool(variable, value)?,
            _ => {}
        }

        Ok(())
    }
}

/// Environment variable name for a dotted configuration key.
///
/// ```rust
/// use ansible_dns_inventory::config::env_var_name;
///
/// assert_eq!(env_var_name("dns.notransfer.enabled"), "ADI_DNS_NOTRANSFER_ENABLED");
/// ```
#[must_use]
pub fn env_var_name(key: &str) -> String {
    format!(
        "{CONFIG_ENV_PREFIX}_{}",
        key.replace('.', "_").to_uppercase()
    )
}

/// Map a user-supplied TSIG algorithm name onto the supported set.
///
/// Unknown names fall back to `hmac-sha256`.
#[must_use]
pub fn normalize_tsig_algo(algo: &str) -> &'static str {
    match algo.trim_end_matches('.').to_lowercase().as_str() {
        "hmac-sha1" => "hmac-sha1",
        "hmac-sha224" => "hmac-sha224",
        "hmac-sha384" => "hmac-sha384",
        "hmac-sha512" => "hmac-sha512",
        _ => "hmac-sha256",
    }
}

fn find_config_file() -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(home) = std::env::var_os("HOME") {
        candidates.push(
            PathBuf::from(home)
                .join(CONFIG_USER_DIR)
                .join(CONFIG_FILE_NAME),
        );
    }
    candidates.push(PathBuf::from(CONFIG_SYSTEM_DIR).join(CONFIG_FILE_NAME));

    candidates.into_iter().find(|path| path.is_file())
}

fn parse_timeout(key: &str, value: &str) -> Result<Duration, ConfigError> {
    duration::parse_duration(value).map_err(|e| ConfigError::InvalidDuration {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(variable: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnvValue {
            variable: variable.to_string(),
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
