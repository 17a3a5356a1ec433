// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory zone store backing the `mock` provider.
//!
//! Behaves like a strict provider: creating an existing record set or a name
//! outside the zone is rejected with a provider-style message, and deleting an
//! absent set reports [`StoreError::RecordNotFound`]. Every call is journaled
//! in order so dry runs can show what would have been sent.

use std::cell::RefCell;
use std::collections::HashMap;
use tracing::debug;

use super::{Zone, ZoneStore};
use crate::errors::StoreError;
use crate::record::{fqdn, is_under_domain, ObservedRecord, RecordData, RecordSet, RecordType};

/// One call made against an [`InMemoryZoneStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListZones,
    GetZone(String),
    GetRecord { name: String, record_type: RecordType },
    Create(RecordSet),
    Delete { name: String, record_type: RecordType },
}

impl StoreCall {
    /// Whether this call changes provider state.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Create(_) | Self::Delete { .. })
    }
}

type RecordKey = (String, String, RecordType);

#[derive(Debug, Default)]
struct State {
    zones: Vec<Zone>,
    records: HashMap<RecordKey, RecordSet>,
    calls: Vec<StoreCall>,
    create_rejection: Option<String>,
}

/// Sandboxed provider holding zones and record sets in memory.
#[derive(Debug, Default)]
pub struct InMemoryZoneStore {
    state: RefCell<State>,
}

fn key(zone: &Zone, name: &str, record_type: RecordType) -> RecordKey {
    (zone.id.clone(), fqdn(name).to_ascii_lowercase(), record_type)
}

impl InMemoryZoneStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hosted zone. Zones with equal domains may coexist.
    #[must_use]
    pub fn with_zone(self, id: &str, domain: &str) -> Self {
        self.state.borrow_mut().zones.push(Zone::new(id, domain));
        self
    }

    /// Seed a record set into the zone with the given id.
    #[must_use]
    pub fn with_record(self, zone_id: &str, record: RecordSet) -> Self {
        let zone = Zone::new(zone_id, "");
        {
            let mut state = self.state.borrow_mut();
            let record = RecordSet {
                name: fqdn(&record.name),
                ..record
            };
            state
                .records
                .insert(key(&zone, &record.name, record.record_type), record);
        }
        self
    }

    /// Refuse every subsequent create with this provider message.
    pub fn reject_creates(&self, message: Option<String>) {
        self.state.borrow_mut().create_rejection = message;
    }

    /// All calls received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.borrow().calls.clone()
    }

    /// Only the mutating calls received so far, oldest first.
    #[must_use]
    pub fn mutations(&self) -> Vec<StoreCall> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Current record set at `(name, type)` in the zone, bypassing the journal.
    #[must_use]
    pub fn record(&self, zone_id: &str, name: &str, record_type: RecordType) -> Option<RecordSet> {
        let zone = Zone::new(zone_id, "");
        self.state
            .borrow()
            .records
            .get(&key(&zone, name, record_type))
            .cloned()
    }

    fn find_zone(&self, id: &str) -> Result<Zone, StoreError> {
        self.state
            .borrow()
            .zones
            .iter()
            .find(|z| z.id == id)
            .cloned()
            .ok_or_else(|| StoreError::ZoneNotFound {
                zone_id: id.to_string(),
            })
    }

    fn log(&self, call: StoreCall) {
        debug!(call = ?call, "mock zone store call");
        self.state.borrow_mut().calls.push(call);
    }
}

impl ZoneStore for InMemoryZoneStore {
    fn list_zones(&self) -> Result<Vec<Zone>, StoreError> {
        self.log(StoreCall::ListZones);
        Ok(self.state.borrow().zones.clone())
    }

    fn get_zone(&self, id: &str) -> Result<Zone, StoreError> {
        self.log(StoreCall::GetZone(id.to_string()));
        self.find_zone(id)
    }

    fn get_record(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<Option<ObservedRecord>, StoreError> {
        self.log(StoreCall::GetRecord {
            name: fqdn(name),
            record_type,
        });
        self.find_zone(&zone.id)?;
        Ok(self
            .state
            .borrow()
            .records
            .get(&key(zone, name, record_type))
            .cloned())
    }

    fn create_record(&self, zone: &Zone, record: &RecordSet) -> Result<(), StoreError> {
        self.log(StoreCall::Create(record.clone()));
        let zone = self.find_zone(&zone.id)?;
        let name = fqdn(&record.name);

        let rejected = |message: String| StoreError::Rejected {
            operation: "create record".to_string(),
            message,
        };

        if let Some(message) = self.state.borrow().create_rejection.clone() {
            return Err(rejected(message));
        }
        if !is_under_domain(&name, &zone.domain) {
            return Err(rejected(format!(
                "RRSet with DNS name {name} is not permitted in zone {}",
                zone.domain
            )));
        }
        if let RecordData::Values { values, .. } = &record.data {
            if values.is_empty() {
                return Err(rejected(format!(
                    "Invalid Resource Record: RRSet {name} of type {} has no values",
                    record.record_type
                )));
            }
        }

        let mut state = self.state.borrow_mut();
        let k = key(&zone, &name, record.record_type);
        if state.records.contains_key(&k) {
            return Err(rejected(format!(
                "Tried to create resource record set [name='{name}', type='{}'] but it already exists",
                record.record_type
            )));
        }
        state.records.insert(
            k,
            RecordSet {
                name,
                ..record.clone()
            },
        );
        Ok(())
    }

    fn delete_record(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<(), StoreError> {
        self.log(StoreCall::Delete {
            name: fqdn(name),
            record_type,
        });
        self.find_zone(&zone.id)?;
        self.state
            .borrow_mut()
            .records
            .remove(&key(zone, name, record_type))
            .map(|_| ())
            .ok_or_else(|| StoreError::RecordNotFound {
                name: fqdn(name),
                record_type,
            })
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
