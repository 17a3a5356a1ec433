// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Hosted zone discovery for a record name.
//!
//! With an explicit zone id the zone is fetched directly. Otherwise the record
//! name is matched against the provider's zone list, starting with the full name
//! and dropping one leftmost label at a time. The first suffix matched by exactly
//! one zone wins:
//!
//! ```text
//! zones: a.b.com., b.com.
//! name:  x.a.b.com.
//!
//!   x.a.b.com  -> no match
//!   a.b.com    -> a.b.com.   (selected)
//! ```
//!
//! Two zones matching the same suffix is an error rather than a guess.

use tracing::debug;

use crate::errors::ReconcileError;
use crate::record::{fqdn, is_under_domain, strip_trailing_dot};
use crate::store::{Zone, ZoneStore};

/// A zone together with the record name to use inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedZone {
    pub zone: Zone,
    /// Fully-qualified record name, qualified under the zone when needed
    pub record_name: String,
}

/// Finds the hosted zone that owns a record name.
pub struct ZoneLocator<'a, S: ZoneStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ZoneStore + ?Sized> ZoneLocator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolve the owning zone of `name`, using `zone_id` when given.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::ZoneIdNotFound`] if the explicit id does not exist
    /// - [`ReconcileError::ZoneNotFound`] if no listed zone owns the name
    /// - [`ReconcileError::ZoneAmbiguous`] if several zones tie at the first matching suffix
    /// - [`ReconcileError::Provider`] if the provider cannot be queried
    pub fn locate(&self, name: &str, zone_id: Option<&str>) -> Result<LocatedZone, ReconcileError> {
        let name = fqdn(name);

        if let Some(id) = zone_id {
            let zone = self
                .store
                .get_zone(id)
                .map_err(|e| ReconcileError::from_store(&name, e))?;
            let record_name = qualify_under_zone(&name, &zone);
            if record_name != name {
                debug!(
                    "Record name {} is outside zone {} ({}), using {}",
                    name, zone.domain, zone.id, record_name
                );
            }
            return Ok(LocatedZone { zone, record_name });
        }

        let zones = self
            .store
            .list_zones()
            .map_err(|e| ReconcileError::from_store(&name, e))?;
        let zone = find_zone(&zones, &name)?;
        debug!("Record {} belongs to zone {} ({})", name, zone.domain, zone.id);

        Ok(LocatedZone {
            zone,
            record_name: name,
        })
    }
}

/// Pick the zone owning `name` from a zone list.
///
/// # Errors
///
/// Returns [`ReconcileError::ZoneAmbiguous`] on a tie and
/// [`ReconcileError::ZoneNotFound`] when the labels run out.
pub fn find_zone(zones: &[Zone], name: &str) -> Result<Zone, ReconcileError> {
    let name = fqdn(name);
    let labels: Vec<&str> = strip_trailing_dot(&name)
        .split('.')
        .filter(|l| !l.is_empty())
        .collect();

    for start in 0..labels.len() {
        let suffix = labels[start..].join(".");
        let mut candidates = zones
            .iter()
            .filter(|z| strip_trailing_dot(&z.domain).eq_ignore_ascii_case(&suffix));

        match (candidates.next(), candidates.next()) {
            (None, _) => {}
            (Some(zone), None) => return Ok(zone.clone()),
            (Some(_), Some(_)) => {
                return Err(ReconcileError::ZoneAmbiguous {
                    name: name.clone(),
                    suffix: fqdn(&suffix),
                    candidates: zones
                        .iter()
                        .filter(|z| strip_trailing_dot(&z.domain).eq_ignore_ascii_case(&suffix))
                        .map(|z| z.id.clone())
                        .collect(),
                });
            }
        }
    }

    Err(ReconcileError::ZoneNotFound { name })
}

/// The record name under `zone`, appending the zone domain to names outside it.
#[must_use]
pub fn qualify_under_zone(name: &str, zone: &Zone) -> String {
    let name = fqdn(name);
    if is_under_domain(&name, &zone.domain) {
        name
    } else {
        fqdn(&format!(
            "{}.{}",
            strip_trailing_dot(&name),
            strip_trailing_dot(&zone.domain)
        ))
    }
}

#[cfg(test)]
#[path = "zone_locator_tests.rs"]
mod zone_locator_tests;
