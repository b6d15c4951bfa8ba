// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Role and service list expansion.
//!
//! A record may list several roles and services: `ROLE=app,db;SRV=web,api`. Before a
//! record reaches the inventory tree it is expanded into one record per
//! `(role, service)` pair, here four: `app/web`, `app/api`, `db/web`, `db/api`.

use crate::attributes::HostAttributes;
use crate::constants::LIST_SEPARATOR;

/// Iterator over the single-role, single-service records of one host record.
///
/// The iterator is `Clone`: a clone taken before iteration replays the whole
/// expansion, independently of the original.
#[derive(Clone, Debug)]
pub struct Expand<'a> {
    hostname: &'a str,
    attrs: &'a HostAttributes,
    roles: Vec<&'a str>,
    services: Vec<&'a str>,
    position: usize,
}

impl Iterator for Expand<'_> {
    type Item = (String, HostAttributes);

    fn next(&mut self) -> Option<Self::Item> {
        let role = self.roles.get(self.position / self.services.len())?;
        let srv = self.services[self.position % self.services.len()];
        self.position += 1;

        Some((
            self.hostname.to_string(),
            HostAttributes {
                os: self.attrs.os.clone(),
                env: self.attrs.env.clone(),
                role: (*role).to_string(),
                srv: srv.to_string(),
                vars: self.attrs.vars.clone(),
            },
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.roles.len() * self.services.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Expand<'_> {}

/// Expand a record into one record per `(role, service)` pair.
///
/// Pairs are produced in split order, roles outermost. An empty service list yields
/// a single entry with an empty service. All other fields are copied unchanged.
///
/// # Example
///
/// ```rust
/// use ansible_dns_inventory::attributes::HostAttributes;
/// use ansible_dns_inventory::expand::expand;
///
/// let attrs = HostAttributes {
///     os: "linux".into(),
///     env: "dev".into(),
///     role: "app,storage".into(),
///     srv: String::new(),
///     vars: String::new(),
/// };
///
/// let roles: Vec<String> = expand("app01", &attrs).map(|(_, a)| a.role).collect();
/// assert_eq!(roles, vec!["app", "storage"]);
/// ```
#[must_use]
pub fn expand<'a>(hostname: &'a str, attrs: &'a HostAttributes) -> Expand<'a> {
    Expand {
        hostname,
        attrs,
        roles: attrs.role.split(LIST_SEPARATOR).collect(),
        // split() always yields at least one item, so the modulo in next() is safe
        services: attrs.srv.split(LIST_SEPARATOR).collect(),
        position: 0,
    }
}

#[cfg(test)]
#[path = "expand_tests.rs"]
mod expand_tests;
