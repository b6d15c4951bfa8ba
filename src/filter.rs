// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Host record filtering.
//!
//! Filters are written in the configuration file as `{key, operator, values}`
//! requirements and are all ANDed together:
//!
//! ```yaml
//! filter:
//!   enabled: true
//!   filters:
//!     - key: env
//!       operator: in
//!       values: [prod, stage]
//!     - key: host
//!       operator: notregex
//!       values: ["^tmp-"]
//! ```
//!
//! Operators:
//! - `in`: the value equals one of `values`
//! - `notin`: the value equals none of `values`
//! - `regex`: the value matches at least one of the expressions in `values`
//! - `notregex`: the value matches none of the expressions in `values`
//!
//! The list is compiled once, before any record is read. A filter that cannot be
//! compiled aborts the run instead of silently admitting or dropping hosts.

use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::attributes::HostAttributes;
use crate::config::{FilterConfig, FilterSpec};
use crate::errors::FilterError;

/// Record field a filter applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKey {
    /// Hostname
    Host,
    /// Operating system
    Os,
    /// Environment
    Env,
    /// Role
    Role,
    /// Service
    Srv,
    /// Host variables
    Vars,
}

impl FilterKey {
    /// Configuration name of this key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Os => "os",
            Self::Env => "env",
            Self::Role => "role",
            Self::Srv => "srv",
            Self::Vars => "vars",
        }
    }

    fn select<'a>(self, hostname: &'a str, attrs: &'a HostAttributes) -> &'a str {
        match self {
            Self::Host => hostname,
            Self::Os => &attrs.os,
            Self::Env => &attrs.env,
            Self::Role => &attrs.role,
            Self::Srv => &attrs.srv,
            Self::Vars => &attrs.vars,
        }
    }
}

impl FromStr for FilterKey {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(Self::Host),
            "os" => Ok(Self::Os),
            "env" => Ok(Self::Env),
            "role" => Ok(Self::Role),
            "srv" => Ok(Self::Srv),
            "vars" => Ok(Self::Vars),
            _ => Err(FilterError::UnknownKey { key: s.to_string() }),
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
enum Matcher {
    In(Vec<String>),
    NotIn(Vec<String>),
    Regex(Vec<Regex>),
    NotRegex(Vec<Regex>),
}

impl Matcher {
    fn matches(&self, value: &str) -> bool {
        match self {
            Self::In(values) => values.iter().any(|v| v == value),
            Self::NotIn(values) => !values.iter().any(|v| v == value),
            Self::Regex(patterns) => patterns.iter().any(|p| p.is_match(value)),
            Self::NotRegex(patterns) => !patterns.iter().any(|p| p.is_match(value)),
        }
    }
}

/// A single compiled filter.
#[derive(Clone, Debug)]
pub struct HostFilter {
    key: FilterKey,
    matcher: Matcher,
}

impl HostFilter {
    /// Compile a filter from its configuration form.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or operator is unknown, the value list is empty,
    /// or a regular expression does not compile.
    pub fn compile(spec: &FilterSpec) -> Result<Self, FilterError> {
        let key: FilterKey = spec.key.parse()?;

        if spec.values.is_empty() {
            return Err(FilterError::EmptyValues {
                key: spec.key.clone(),
            });
        }

        let matcher = match spec.operator.as_str() {
            "in" => Matcher::In(spec.values.clone()),
            "notin" => Matcher::NotIn(spec.values.clone()),
            "regex" => Matcher::Regex(compile_patterns(spec)?),
            "notregex" => Matcher::NotRegex(compile_patterns(spec)?),
            other => {
                return Err(FilterError::UnknownOperator {
                    key: spec.key.clone(),
                    operator: other.to_string(),
                })
            }
        };

        Ok(Self { key, matcher })
    }

    /// The field this filter applies to.
    #[must_use]
    pub fn key(&self) -> FilterKey {
        self.key
    }

    /// Whether the record passes this filter.
    #[must_use]
    pub fn matches(&self, hostname: &str, attrs: &HostAttributes) -> bool {
        self.matcher.matches(self.key.select(hostname, attrs))
    }
}

fn compile_patterns(spec: &FilterSpec) -> Result<Vec<Regex>, FilterError> {
    spec.values
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| FilterError::InvalidRegex {
                key: spec.key.clone(),
                pattern: pattern.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// The compiled filter list. An empty set passes every record.
#[derive(Clone, Debug, Default)]
pub struct FilterSet {
    filters: Vec<HostFilter>,
}

impl FilterSet {
    /// Compile the configured filters. When filtering is disabled the set is empty and
    /// the filter list is not inspected.
    ///
    /// # Errors
    ///
    /// Returns the first compilation error.
    pub fn compile(config: &FilterConfig) -> Result<Self, FilterError> {
        if !config.enabled {
            return Ok(Self::default());
        }

        let filters = config
            .filters
            .iter()
            .map(HostFilter::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { filters })
    }

    /// Number of compiled filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether no filters are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Whether the record passes every filter.
    #[must_use]
    pub fn matches(&self, hostname: &str, attrs: &HostAttributes) -> bool {
        self.filters.iter().all(|f| f.matches(hostname, attrs))
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod filter_tests;
