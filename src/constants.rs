// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the inventory.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Inventory Tree Constants
// ============================================================================

/// Ansible root group name. Every host is also counted under this pseudo-environment.
pub const ROOT_GROUP: &str = "all";

/// Name segment of the per-environment special group holding every host of that environment
pub const HOST_GROUP_SEGMENT: &str = "host";

/// Separator between the roles or services of a single attribute value
pub const LIST_SEPARATOR: char = ',';

// ============================================================================
// TXT Attribute Defaults
// ============================================================================

/// Separator between key/value pairs of a raw attribute string
pub const DEFAULT_KV_SEPARATOR: &str = ";";

/// Separator between a key and its value in a raw attribute string
pub const DEFAULT_KV_EQUALSIGN: &str = "=";

/// Separator between host variables inside the VARS attribute
pub const DEFAULT_VARS_SEPARATOR: &str = ",";

/// Separator between a variable name and its value inside the VARS attribute
pub const DEFAULT_VARS_EQUALSIGN: &str = "=";

/// Separator between the elements of a group name
pub const DEFAULT_KEY_SEPARATOR: &str = "_";

/// Default key name of the operating system attribute
pub const DEFAULT_KEY_OS: &str = "OS";

/// Default key name of the environment attribute
pub const DEFAULT_KEY_ENV: &str = "ENV";

/// Default key name of the role attribute
pub const DEFAULT_KEY_ROLE: &str = "ROLE";

/// Default key name of the service attribute
pub const DEFAULT_KEY_SRV: &str = "SRV";

/// Default key name of the host variables attribute
pub const DEFAULT_KEY_VARS: &str = "VARS";

/// Separator that enables the legacy underscore carve-out in attribute validation
pub const LEGACY_KEY_SEPARATOR: &str = "-";

// ============================================================================
// DNS Datasource Constants
// ============================================================================

/// Datasource type name for DNS
pub const DATASOURCE_DNS: &str = "dns";

/// Datasource type name for etcd
pub const DATASOURCE_ETCD: &str = "etcd";

/// Default DNS server address
pub const DEFAULT_DNS_SERVER: &str = "127.0.0.1:53";

/// Default network timeout for datasource requests
pub const DEFAULT_TIMEOUT: &str = "30s";

/// Default zone list
pub const DEFAULT_ZONE: &str = "server.local.";

/// Default name of the host holding all inventory records in no-transfer mode
pub const DEFAULT_NOTRANSFER_HOST: &str = "ansible-dns-inventory";

/// Default separator between a hostname and its attributes in no-transfer mode
pub const DEFAULT_NOTRANSFER_SEPARATOR: &str = ":";

/// Default TSIG key name
pub const DEFAULT_TSIG_KEY: &str = "axfr.";

/// Default TSIG secret (base64)
pub const DEFAULT_TSIG_SECRET: &str = "c2VjcmV0Cg==";

/// Default TSIG algorithm
pub const DEFAULT_TSIG_ALGO: &str = "hmac-sha256";

/// TSIG fudge time in seconds (allows for clock skew)
pub const TSIG_FUDGE_TIME_SECS: u64 = 300;

// ============================================================================
// etcd Datasource Constants
// ============================================================================

/// Default etcd endpoint
pub const DEFAULT_ETCD_ENDPOINT: &str = "127.0.0.1:2379";

/// Default etcd key namespace
pub const DEFAULT_ETCD_PREFIX: &str = "ANSIBLE_INVENTORY";

/// etcd key path separator
pub const ETCD_KEY_SEPARATOR: char = '/';

// ============================================================================
// Configuration Constants
// ============================================================================

/// Environment variable holding an explicit configuration file path
pub const CONFIG_FILE_ENV: &str = "ADI_CONFIG_FILE";

/// Prefix of environment variables overriding configuration keys
pub const CONFIG_ENV_PREFIX: &str = "ADI";

/// Configuration file name searched for in the standard locations
pub const CONFIG_FILE_NAME: &str = "ansible-dns-inventory.yaml";

/// System-wide configuration directory
pub const CONFIG_SYSTEM_DIR: &str = "/etc/ansible";

/// Per-user configuration directory, relative to `$HOME`
pub const CONFIG_USER_DIR: &str = ".ansible";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 2;
