// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Output rendering for the exported views.
//!
//! Besides plain JSON and YAML, three line-oriented YAML shapes are supported; each
//! map entry is written on its own line, keys in sorted order:
//!
//! ```text
//! yaml-list:  "app01": ["all","all_app"]
//! yaml-csv:   "app01": "all,all_app"
//! yaml-flow:  "app01": [{"OS": "linux", "ENV": "dev", ...}]
//! ```
//!
//! `yaml-list` and `yaml-csv` apply to host and group maps, `yaml-flow` to the
//! attribute dump.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::config::KeysConfig;

/// Output format selected with `--format`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Block-style YAML
    Yaml,
    /// One `"key": ["a","b"]` line per entry
    YamlList,
    /// One `"key": "a,b"` line per entry
    #[default]
    YamlCsv,
    /// One `"key": [{...}]` line per entry, attributes as flow mappings
    YamlFlow,
}

impl OutputFormat {
    /// Name as given on the command line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::YamlList => "yaml-list",
            Self::YamlCsv => "yaml-csv",
            Self::YamlFlow => "yaml-flow",
        }
    }
}

/// Render any serializable value as JSON or YAML.
///
/// # Errors
///
/// Returns an error for the line-oriented formats or if serialization fails.
pub fn render_value<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(value).context("JSON serialization failed"),
        OutputFormat::Yaml => serde_yaml::to_string(value).context("YAML serialization failed"),
        other => bail!("format '{}' is not supported for this view", other.as_str()),
    }
}

/// Render a host→groups or group→hosts map.
///
/// # Errors
///
/// Returns an error for `yaml-flow` or if serialization fails.
pub fn render_list_map(map: &BTreeMap<String, Vec<String>>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::YamlList => {
            let mut out = String::new();
            for (key, values) in map {
                let items = values
                    .iter()
                    .map(|v| quote(v))
                    .collect::<Result<Vec<_>>>()?;
                writeln!(out, "{}: [{}]", quote(key)?, items.join(","))?;
            }
            Ok(out)
        }
        OutputFormat::YamlCsv => {
            let mut out = String::new();
            for (key, values) in map {
                writeln!(out, "{}: {}", quote(key)?, quote(&values.join(","))?)?;
            }
            Ok(out)
        }
        other => render_value(map, other),
    }
}

/// Render the host→attribute records dump.
///
/// In `yaml-flow` the fields of a record follow the attribute order (os, env, role,
/// srv, vars); any other key comes after them.
///
/// # Errors
///
/// Returns an error for `yaml-list`/`yaml-csv` or if serialization fails.
pub fn render_attributes(
    map: &BTreeMap<String, Vec<BTreeMap<String, String>>>,
    keys: &KeysConfig,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::YamlFlow => {
            let order = [&keys.os, &keys.env, &keys.role, &keys.srv, &keys.vars];
            let mut out = String::new();
            for (host, records) in map {
                let mut rendered = Vec::with_capacity(records.len());
                for record in records {
                    let known = order
                        .iter()
                        .filter_map(|key| record.get_key_value(key.as_str()));
                    let extra = record.iter().filter(|(key, _)| !order.contains(key));
                    let fields = known
                        .chain(extra)
                        .map(|(key, value)| Ok(format!("{}: {}", quote(key)?, quote(value)?)))
                        .collect::<Result<Vec<_>>>()?;
                    rendered.push(format!("{{{}}}", fields.join(", ")));
                }
                writeln!(out, "{}: [{}]", quote(host)?, rendered.join(","))?;
            }
            Ok(out)
        }
        other => render_value(map, other),
    }
}

/// Double-quoted scalar valid in both JSON and YAML.
fn quote(value: &str) -> Result<String> {
    serde_json::to_string(value).context("string quoting failed")
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod format_tests;
