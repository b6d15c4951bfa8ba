// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the inventory core.
//!
//! This module provides specialized error types for:
//! - Host attribute parsing and validation (recoverable, the record is skipped)
//! - Filter configuration (fatal, the run is aborted)
//! - Configuration loading (fatal)
//! - Inventory building (fatal, e.g. an inventory without hosts)
//!
//! Datasource adapters report their failures through `anyhow::Error`; those are
//! wrapped into [`InventoryError::Datasource`] at the inventory boundary.

use thiserror::Error;

/// Errors produced while parsing or validating a raw attribute string.
///
/// These errors are recoverable: the offending host record is logged and skipped,
/// and the rest of the inventory is still built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    /// A required attribute is missing, empty or whitespace only
    #[error("attribute '{field}' must not be blank")]
    Blank {
        /// The configured key name of the attribute
        field: String,
    },

    /// An attribute value contains characters outside of its safety pattern
    #[error("string '{value}' is not a valid value for attribute '{field}' (expr: {pattern})")]
    Unsafe {
        /// The configured key name of the attribute
        field: String,
        /// The rejected value
        value: String,
        /// The regular expression the value failed to match
        pattern: String,
    },
}

/// Errors in the configured host filter list.
///
/// A misconfigured filter could silently admit or exclude the wrong hosts, so every
/// variant aborts the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The filter refers to an attribute that does not exist
    #[error("unknown filter key '{key}' (expected one of: host, os, env, role, srv, vars)")]
    UnknownKey {
        /// The offending key
        key: String,
    },

    /// The filter uses an operator that does not exist
    #[error("unknown filter operator '{operator}' for key '{key}' (expected one of: in, notin, regex, notregex)")]
    UnknownOperator {
        /// The filter key
        key: String,
        /// The offending operator
        operator: String,
    },

    /// The filter has nothing to compare against
    #[error("filter on key '{key}' has an empty value list")]
    EmptyValues {
        /// The filter key
        key: String,
    },

    /// A `regex`/`notregex` filter value is not a valid regular expression
    #[error("invalid regular expression '{pattern}' in filter on key '{key}': {reason}")]
    InvalidRegex {
        /// The filter key
        key: String,
        /// The pattern that failed to compile
        pattern: String,
        /// Compiler error message
        reason: String,
    },
}

/// Errors while loading the inventory configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Path of the configuration file
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the configuration schema
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// Path of the configuration file
        path: String,
        /// Underlying YAML error
        source: serde_yaml::Error,
    },

    /// An environment variable override holds a value of the wrong type
    #[error("invalid value '{value}' for environment variable {variable}: {reason}")]
    InvalidEnvValue {
        /// Name of the environment variable
        variable: String,
        /// The rejected value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// The `datasource` setting names an unknown datasource type
    #[error("unknown datasource type '{name}' (expected 'dns' or 'etcd')")]
    UnknownDatasource {
        /// The configured type
        name: String,
    },

    /// The configured separators produce an attribute pattern that does not compile
    #[error("invalid attribute pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The generated regular expression
        pattern: String,
        /// Compiler error message
        reason: String,
    },

    /// A duration setting could not be parsed
    #[error("invalid duration '{value}' for '{key}': {reason}")]
    InvalidDuration {
        /// Dotted configuration key
        key: String,
        /// The rejected value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Errors that abort an inventory run.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// No usable host records were found after parsing and filtering
    #[error("empty inventory: no usable host records found")]
    EmptyInventory,

    /// The filter configuration is invalid
    #[error("filter configuration error: {0}")]
    Filter(#[from] FilterError),

    /// The configuration is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A record handed to the inventory for publishing failed validation
    #[error("invalid attributes for host '{host}': {source}")]
    InvalidRecord {
        /// The host whose attributes were rejected
        host: String,
        /// The validation failure
        source: AttributeError,
    },

    /// The import file could not be read
    #[error("cannot read import file '{path}': {source}")]
    ImportRead {
        /// Path of the import file
        path: String,
        /// The I/O failure
        source: std::io::Error,
    },

    /// The import file is not a valid host-to-records YAML map
    #[error("cannot parse import file '{path}': {source}")]
    ImportParse {
        /// Path of the import file
        path: String,
        /// The YAML failure
        source: serde_yaml::Error,
    },

    /// The datasource failed
    #[error("datasource error: {0:#}")]
    Datasource(#[from] anyhow::Error),
}

impl InventoryError {
    /// Whether this error comes from invalid user configuration rather than a runtime
    /// condition.
    ///
    /// Used by the CLI to pick the exit message.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Filter(_) | Self::Config(_))
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
