// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Hosted zone stores: the provider capability the reconciler mutates through.
//!
//! The reconciler only depends on the [`ZoneStore`] trait. Two implementations
//! ship with the crate:
//!
//! - [`Route53ZoneStore`] - the real provider, speaking the Route53 REST/XML API
//! - [`InMemoryZoneStore`] - the `mock` provider, used for dry runs and tests
//!
//! Every call is blocking. A store is used by one reconciliation at a time.

pub mod memory;
pub mod route53;
pub mod sigv4;

pub use memory::{InMemoryZoneStore, StoreCall};
pub use route53::Route53ZoneStore;

use crate::errors::StoreError;
use crate::record::{fqdn, ObservedRecord, RecordSet, RecordType};

/// Reference to a hosted zone. The zone itself is never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Provider zone id, without any `/hostedzone/` prefix
    pub id: String,
    /// Zone apex, fully-qualified (e.g. `example.com.`)
    pub domain: String,
}

impl Zone {
    #[must_use]
    pub fn new(id: impl Into<String>, domain: &str) -> Self {
        Self {
            id: id.into(),
            domain: fqdn(domain),
        }
    }
}

/// Provider operations needed to reconcile a single record.
pub trait ZoneStore {
    /// List every hosted zone visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached or answers garbage.
    fn list_zones(&self) -> Result<Vec<Zone>, StoreError>;

    /// Fetch a hosted zone by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ZoneNotFound`] if no zone has this id.
    fn get_zone(&self, id: &str) -> Result<Zone, StoreError>;

    /// Fetch the record set at `(name, type)`; `Ok(None)` when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error only when the lookup itself fails.
    fn get_record(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<Option<ObservedRecord>, StoreError>;

    /// Create a record set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Rejected`] with the provider's message if refused.
    fn create_record(&self, zone: &Zone, record: &RecordSet) -> Result<(), StoreError>;

    /// Delete the record set at `(name, type)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RecordNotFound`] if it no longer exists, or
    /// [`StoreError::Rejected`] with the provider's message if refused.
    fn delete_record(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<(), StoreError>;
}

impl<S: ZoneStore + ?Sized> ZoneStore for &S {
    fn list_zones(&self) -> Result<Vec<Zone>, StoreError> {
        (**self).list_zones()
    }

    fn get_zone(&self, id: &str) -> Result<Zone, StoreError> {
        (**self).get_zone(id)
    }

    fn get_record(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<Option<ObservedRecord>, StoreError> {
        (**self).get_record(zone, name, record_type)
    }

    fn create_record(&self, zone: &Zone, record: &RecordSet) -> Result<(), StoreError> {
        (**self).create_record(zone, record)
    }

    fn delete_record(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<(), StoreError> {
        (**self).delete_record(zone, name, record_type)
    }
}

impl<S: ZoneStore + ?Sized> ZoneStore for Box<S> {
    fn list_zones(&self) -> Result<Vec<Zone>, StoreError> {
        (**self).list_zones()
    }

    fn get_zone(&self, id: &str) -> Result<Zone, StoreError> {
        (**self).get_zone(id)
    }

    fn get_record(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<Option<ObservedRecord>, StoreError> {
        (**self).get_record(zone, name, record_type)
    }

    fn create_record(&self, zone: &Zone, record: &RecordSet) -> Result<(), StoreError> {
        (**self).create_record(zone, record)
    }

    fn delete_record(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<(), StoreError> {
        (**self).delete_record(zone, name, record_type)
    }
}
