// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Host attribute parsing and validation.
//!
//! A host record carries its attributes as one delimited string, e.g.
//! `OS=linux;ENV=dev;ROLE=app;SRV=tomcat_backend_auth;VARS=port=8080`. The
//! [`AttributeParser`] turns that string into a [`HostAttributes`] value, checks every
//! field against its safety pattern and renders attributes back into the raw form
//! when records are published.
//!
//! Attribute values end up in group names, so they are restricted to characters that
//! are safe there:
//!
//! | Field  | Required | Allowed characters                          |
//! |--------|----------|---------------------------------------------|
//! | `OS`   | yes      | `A-Z a-z 0-9`                               |
//! | `ENV`  | yes      | `A-Z a-z 0-9`                               |
//! | `ROLE` | yes      | `A-Z a-z 0-9 ,`                             |
//! | `SRV`  | no       | `A-Z a-z 0-9 ,` and the group-name separator |
//! | `VARS` | no       | printable ASCII                             |
//!
//! When the group-name separator is `-`, `_` is accepted in every field except `VARS`.
//!
//! # Example
//!
//! ```rust
//! use ansible_dns_inventory::attributes::AttributeParser;
//! use ansible_dns_inventory::config::TxtConfig;
//!
//! let parser = AttributeParser::new(&TxtConfig::default()).unwrap();
//! let attrs = parser.parse("OS=linux;ENV=dev;ROLE=app;SRV=tomcat_backend").unwrap();
//!
//! assert_eq!(attrs.os, "linux");
//! assert_eq!(attrs.srv, "tomcat_backend");
//! assert!(parser.parse("OS=linux;ENV=d3v!;ROLE=app").is_err());
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{KeysConfig, TxtConfig};
use crate::constants::LEGACY_KEY_SEPARATOR;
use crate::errors::{AttributeError, ConfigError};

/// Attributes of a single host record.
///
/// `role` and `srv` may hold comma-separated lists right after parsing; the record
/// expander resolves them into single values before the record reaches the tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HostAttributes {
    /// Operating system
    pub os: String,
    /// Environment
    pub env: String,
    /// Role (or role list)
    pub role: String,
    /// Service chain (or list of chains), segments joined by the group-name separator
    pub srv: String,
    /// Host variables, still encoded
    pub vars: String,
}

/// Compiled safety patterns for attribute values.
#[derive(Clone, Debug)]
struct SafetyPatterns {
    name: Regex,
    list: Regex,
    srv: Regex,
    vars: Regex,
}

impl SafetyPatterns {
    fn new(separator: &str) -> Result<Self, ConfigError> {
        // Deprecated: '-' as the group-name separator with '_' inside values
        let legacy = if separator == LEGACY_KEY_SEPARATOR {
            "_"
        } else {
            ""
        };
        let separator = regex::escape(separator);

        Ok(Self {
            name: compile(&format!("^[A-Za-z0-9{legacy}]*$"))?,
            list: compile(&format!("^[A-Za-z0-9{legacy},]*$"))?,
            srv: compile(&format!("^[A-Za-z0-9{legacy},{separator}]*$"))?,
            vars: compile("^[[:print:]]*$")?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Parses, validates and renders raw attribute strings.
///
/// All separators, key names and patterns are captured at construction time.
#[derive(Clone, Debug)]
pub struct AttributeParser {
    kv_separator: String,
    kv_equalsign: String,
    vars_separator: String,
    vars_equalsign: String,
    keys: KeysConfig,
    patterns: SafetyPatterns,
}

impl AttributeParser {
    /// Create a parser for the given TXT settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the group-name separator produces a pattern that cannot
    /// be compiled.
    pub fn new(config: &TxtConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            kv_separator: config.kv.separator.clone(),
            kv_equalsign: config.kv.equalsign.clone(),
            vars_separator: config.vars.separator.clone(),
            vars_equalsign: config.vars.equalsign.clone(),
            keys: config.keys.clone(),
            patterns: SafetyPatterns::new(&config.keys.separator)?,
        })
    }

    /// Configured attribute key names.
    #[must_use]
    pub fn keys(&self) -> &KeysConfig {
        &self.keys
    }

    /// Parse and validate a raw attribute string.
    ///
    /// Items are split on the pair separator and then on the first key/value
    /// separator. Unknown keys, empty items and items without a key/value separator
    /// are ignored. A key given more than once keeps its last value.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first field that is blank or unsafe.
    pub fn parse(&self, raw: &str) -> Result<HostAttributes, AttributeError> {
        let mut attrs = HostAttributes::default();

        for item in raw.split(self.kv_separator.as_str()) {
            let Some((key, value)) = item.split_once(self.kv_equalsign.as_str()) else {
                continue;
            };

            let slot = if key == self.keys.os {
                &mut attrs.os
            } else if key == self.keys.env {
                &mut attrs.env
            } else if key == self.keys.role {
                &mut attrs.role
            } else if key == self.keys.srv {
                &mut attrs.srv
            } else if key == self.keys.vars {
                &mut attrs.vars
            } else {
                continue;
            };
            *slot = value.to_string();
        }

        self.validate(&attrs)?;

        Ok(attrs)
    }

    /// Validate attributes and render them into a raw attribute string.
    ///
    /// Fields are written in a fixed order: OS, ENV, ROLE, SRV, VARS.
    ///
    /// # Errors
    ///
    /// Returns an error if the attributes fail validation.
    pub fn render(&self, attrs: &HostAttributes) -> Result<String, AttributeError> {
        self.validate(attrs)?;

        let fields = [
            (&self.keys.os, &attrs.os),
            (&self.keys.env, &attrs.env),
            (&self.keys.role, &attrs.role),
            (&self.keys.srv, &attrs.srv),
            (&self.keys.vars, &attrs.vars),
        ];

        Ok(fields
            .iter()
            .map(|(key, value)| format!("{key}{}{value}", self.kv_equalsign))
            .collect::<Vec<_>>()
            .join(&self.kv_separator))
    }

    /// Check every field against its safety pattern.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::Blank`] for a missing required field and
    /// [`AttributeError::Unsafe`] for a value outside its allowed character set.
    pub fn validate(&self, attrs: &HostAttributes) -> Result<(), AttributeError> {
        require(&self.keys.os, &attrs.os)?;
        check(&self.keys.os, &attrs.os, &self.patterns.name)?;

        require(&self.keys.env, &attrs.env)?;
        check(&self.keys.env, &attrs.env, &self.patterns.name)?;

        require(&self.keys.role, &attrs.role)?;
        check(&self.keys.role, &attrs.role, &self.patterns.list)?;

        check(&self.keys.srv, &attrs.srv, &self.patterns.srv)?;
        check(&self.keys.vars, &attrs.vars, &self.patterns.vars)
    }

    /// Collect host variables from the `vars` field of the given records.
    ///
    /// Pairs are split on the vars separator, then on the vars key/value separator.
    /// Only pairs made of exactly a name and a value are kept (`a=b=c` and `broken`
    /// are skipped). Later records overwrite earlier ones.
    #[must_use]
    pub fn parse_variables<'a, I>(&self, records: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = &'a HostAttributes>,
    {
        let mut variables = BTreeMap::new();

        for attrs in records {
            if attrs.vars.is_empty() {
                continue;
            }

            for pair in attrs.vars.split(self.vars_separator.as_str()) {
                let mut parts = pair.split(self.vars_equalsign.as_str());
                if let (Some(name), Some(value), None) =
                    (parts.next(), parts.next(), parts.next())
                {
                    variables.insert(name.to_string(), value.to_string());
                }
            }
        }

        variables
    }
}

fn require(field: &str, value: &str) -> Result<(), AttributeError> {
    if value.trim().is_empty() {
        return Err(AttributeError::Blank {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn check(field: &str, value: &str, pattern: &Regex) -> Result<(), AttributeError> {
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(AttributeError::Unsafe {
            field: field.to_string(),
            value: value.to_string(),
            pattern: pattern.as_str().to_string(),
        })
    }
}

/// Convert attributes into a map keyed by the configured key names.
#[must_use]
pub fn attributes_to_map(attrs: &HostAttributes, keys: &KeysConfig) -> BTreeMap<String, String> {
    BTreeMap::from([
        (keys.os.clone(), attrs.os.clone()),
        (keys.env.clone(), attrs.env.clone()),
        (keys.role.clone(), attrs.role.clone()),
        (keys.srv.clone(), attrs.srv.clone()),
        (keys.vars.clone(), attrs.vars.clone()),
    ])
}

/// Build attributes from a map keyed by the configured key names.
///
/// Missing keys leave the field empty; unknown keys are ignored. The result is not
/// validated.
#[must_use]
pub fn attributes_from_map(map: &BTreeMap<String, String>, keys: &KeysConfig) -> HostAttributes {
    let field = |key: &String| map.get(key).cloned().unwrap_or_default();

    HostAttributes {
        os: field(&keys.os),
        env: field(&keys.env),
        role: field(&keys.role),
        srv: field(&keys.srv),
        vars: field(&keys.vars),
    }
}

#[cfg(test)]
#[path = "attributes_tests.rs"]
mod attributes_tests;
