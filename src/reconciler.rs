// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record reconciliation.
//!
//! A run handles one desired record from start to finish:
//!
//! 1. [`Reconciler::load`] builds a [`RecordContext`], asking live DNS whether the
//!    record already exists as desired. The answer is advisory.
//! 2. [`Reconciler::create`] or [`Reconciler::delete`] locates the owning zone
//!    (once per run), reads the provider's current record and applies the
//!    smallest set of mutations.
//!
//! ```text
//! create:  live DNS matches ............................ NoOp
//!          provider has nothing ........................ Create            -> Created
//!          provider has the same record ................ NoOp
//!          provider differs, overwrite = false ......... SkipOverwriteProtected
//!          provider differs, overwrite = true .......... ReplaceThenCreate -> Replaced
//!
//! delete:  no record known to exist .................... NoOp (no provider calls)
//!          provider has the record ..................... Delete            -> Deleted
//! ```
//!
//! Replacement is a delete followed by a create. If the create fails the record
//! stays absent until the next run, which then sees nothing and creates it.
//!
//! Every finished run logs exactly one outcome line at info level. Failures are
//! returned as [`ReconcileError`] and never retried here.
//!
//! # Example
//!
//! ```rust
//! use recordkeeper::reconciler::{Outcome, Reconciler};
//! use recordkeeper::record::{DesiredRecord, RecordType};
//! use recordkeeper::resolver::DisabledProbe;
//! use recordkeeper::store::InMemoryZoneStore;
//!
//! let store = InMemoryZoneStore::new().with_zone("Z1", "example.com.");
//! let reconciler = Reconciler::new(store, DisabledProbe);
//!
//! let desired = DesiredRecord::with_values(
//!     "foo.example.com",
//!     RecordType::A,
//!     vec!["1.2.3.4".to_string()],
//!     300,
//! );
//! let ctx = reconciler.load(desired);
//!
//! let first = reconciler.create(&ctx).unwrap();
//! assert!(matches!(first, Outcome::Created { .. }));
//!
//! let second = reconciler.create(&ctx).unwrap();
//! assert!(matches!(second, Outcome::NoOp { .. }));
//! ```

use std::cell::OnceCell;
use std::fmt;
use tracing::{debug, info, warn};

use crate::comparator::same_record;
use crate::errors::{ReconcileError, StoreError};
use crate::record::{DesiredRecord, ObservedRecord, RecordData, RecordSet, RecordType};
use crate::resolver::{record_exists, RecordProbe};
use crate::store::{Zone, ZoneStore};
use crate::zone_locator::{LocatedZone, ZoneLocator};

/// What a run decided to do with the provider's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationDecision {
    NoOp,
    Create,
    ReplaceThenCreate,
    SkipOverwriteProtected,
    Delete,
}

/// Decide how to bring `observed` in line with `desired` for the create action.
#[must_use]
pub fn decide(desired: &DesiredRecord, observed: Option<&ObservedRecord>) -> ReconciliationDecision {
    match observed {
        None => ReconciliationDecision::Create,
        Some(current) if same_record(desired, current) => ReconciliationDecision::NoOp,
        Some(_) if !desired.overwrite => ReconciliationDecision::SkipOverwriteProtected,
        Some(_) => ReconciliationDecision::ReplaceThenCreate,
    }
}

/// Decide what the delete action does with `observed`.
#[must_use]
pub fn decide_delete(observed: Option<&ObservedRecord>) -> ReconciliationDecision {
    match observed {
        None => ReconciliationDecision::NoOp,
        Some(_) => ReconciliationDecision::Delete,
    }
}

/// Why a run changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// Live DNS already serves the desired record
    AlreadyLive,
    /// The provider already holds the desired record
    UpToDate,
    /// There is no record to delete
    Absent,
}

/// Terminal state of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoOp {
        name: String,
        record_type: RecordType,
        reason: NoOpReason,
    },
    Created {
        record: RecordSet,
    },
    Replaced {
        previous: RecordSet,
        record: RecordSet,
    },
    /// The record differs but overwrite is disabled; nothing was changed
    SkippedProtected {
        name: String,
        record_type: RecordType,
        current: RecordData,
        desired: RecordData,
    },
    Deleted {
        name: String,
        record_type: RecordType,
    },
}

impl Outcome {
    /// Whether the run mutated provider state.
    #[must_use]
    pub fn changed(&self) -> bool {
        matches!(
            self,
            Self::Created { .. } | Self::Replaced { .. } | Self::Deleted { .. }
        )
    }

    /// One human-readable line describing the outcome.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NoOp {
                name,
                record_type,
                reason: NoOpReason::AlreadyLive,
            } => format!("{record_type} record {name} already resolves to the desired value, nothing to do"),
            Self::NoOp {
                name,
                record_type,
                reason: NoOpReason::UpToDate,
            } => format!("{record_type} record {name} is up to date"),
            Self::NoOp {
                name,
                record_type,
                reason: NoOpReason::Absent,
            } => format!("{record_type} record {name} does not exist, nothing to delete"),
            Self::Created { record } => format!(
                "Created {} record {} with {}",
                record.record_type, record.name, record.data
            ),
            Self::Replaced { previous, record } => format!(
                "Replaced {} record {}: {} -> {}",
                record.record_type, record.name, previous.data, record.data
            ),
            Self::SkippedProtected {
                name, record_type, ..
            } => format!(
                "{record_type} record {name} should have been modified, but overwrite is disabled"
            ),
            Self::Deleted { name, record_type } => format!("Deleted {record_type} record {name}"),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Per-run state: the desired record, the advisory existence flag and the
/// zone lookup, which is computed at most once.
#[derive(Debug)]
pub struct RecordContext {
    desired: DesiredRecord,
    exists: bool,
    zone: OnceCell<LocatedZone>,
}

impl RecordContext {
    /// Build the context, asking live DNS whether the record already exists.
    pub fn load<P: RecordProbe + ?Sized>(desired: DesiredRecord, probe: &P) -> Self {
        let exists = record_exists(probe, &desired);
        debug!(
            "{} record {} {} in live DNS",
            desired.record_type,
            desired.name,
            if exists { "found" } else { "not found" }
        );
        Self::new(desired, exists)
    }

    /// Build the context with a known existence flag.
    #[must_use]
    pub fn new(desired: DesiredRecord, exists: bool) -> Self {
        Self {
            desired,
            exists,
            zone: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn desired(&self) -> &DesiredRecord {
        &self.desired
    }

    /// Whether live DNS showed the record as desired when the context was loaded.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.exists
    }

    fn zone<S: ZoneStore + ?Sized>(&self, store: &S) -> Result<&LocatedZone, ReconcileError> {
        if let Some(located) = self.zone.get() {
            return Ok(located);
        }
        let located =
            ZoneLocator::new(store).locate(&self.desired.name, self.desired.zone_id.as_deref())?;
        Ok(self.zone.get_or_init(|| located))
    }
}

/// Applies desired records to a zone store.
pub struct Reconciler<S: ZoneStore, P: RecordProbe> {
    store: S,
    probe: P,
}

impl<S: ZoneStore, P: RecordProbe> Reconciler<S, P> {
    pub fn new(store: S, probe: P) -> Self {
        Self { store, probe }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Start a run for `desired`.
    pub fn load(&self, desired: DesiredRecord) -> RecordContext {
        RecordContext::load(desired, &self.probe)
    }

    /// Make the provider hold the desired record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is unusable, its zone cannot be
    /// determined, or the provider fails or refuses a call.
    pub fn create(&self, ctx: &RecordContext) -> Result<Outcome, ReconcileError> {
        let desired = ctx.desired();
        validate(desired)?;

        if ctx.exists() {
            return Ok(finish(Outcome::NoOp {
                name: desired.name.clone(),
                record_type: desired.record_type,
                reason: NoOpReason::AlreadyLive,
            }));
        }

        let (zone, target, observed) = self.observe(ctx)?;
        let decision = decide(&target, observed.as_ref());
        self.apply(decision, zone, &target, observed)
    }

    /// Remove the record from the provider.
    ///
    /// The delete is gated on the advisory live DNS check made at load time:
    /// when live DNS did not show the record as desired, nothing is read or
    /// removed. Live DNS never reports an alias of a type other than CNAME as
    /// matching, so such alias records are never deleted by this action.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone cannot be determined or the provider fails
    /// or refuses a call. A record that vanished meanwhile is not an error.
    pub fn delete(&self, ctx: &RecordContext) -> Result<Outcome, ReconcileError> {
        let desired = ctx.desired();

        if !ctx.exists() {
            return Ok(finish(Outcome::NoOp {
                name: desired.name.clone(),
                record_type: desired.record_type,
                reason: NoOpReason::Absent,
            }));
        }

        let (zone, target, observed) = self.observe(ctx)?;
        let decision = decide_delete(observed.as_ref());
        self.apply(decision, zone, &target, observed)
    }

    /// Locate the zone and read the provider's current record.
    ///
    /// The returned target carries the name as qualified under the zone.
    fn observe<'c>(
        &self,
        ctx: &'c RecordContext,
    ) -> Result<(&'c Zone, DesiredRecord, Option<ObservedRecord>), ReconcileError> {
        let located = ctx.zone(&self.store)?;
        let name = located.record_name.as_str();
        let desired = ctx.desired();

        let observed = self
            .store
            .get_record(&located.zone, name, desired.record_type)
            .map_err(|e| ReconcileError::from_store(name, e))?;

        let target = DesiredRecord {
            name: name.to_string(),
            ..desired.clone()
        };
        Ok((&located.zone, target, observed))
    }

    fn apply(
        &self,
        decision: ReconciliationDecision,
        zone: &Zone,
        target: &DesiredRecord,
        observed: Option<ObservedRecord>,
    ) -> Result<Outcome, ReconcileError> {
        let name = target.name.as_str();
        let record_type = target.record_type;
        let provider_err = |e: StoreError| ReconcileError::from_store(name, e);
        let record = target.to_record_set(name);

        let outcome = match decision {
            ReconciliationDecision::NoOp => Outcome::NoOp {
                name: name.to_string(),
                record_type,
                reason: if observed.is_some() {
                    NoOpReason::UpToDate
                } else {
                    NoOpReason::Absent
                },
            },
            ReconciliationDecision::Create => {
                self.store
                    .create_record(zone, &record)
                    .map_err(provider_err)?;
                Outcome::Created { record }
            }
            ReconciliationDecision::SkipOverwriteProtected => {
                let current = observed.map(|o| o.data).unwrap_or_else(|| record.data.clone());
                debug!("Current value: {}", current);
                debug!("Desired value: {}", record.data);
                Outcome::SkippedProtected {
                    name: name.to_string(),
                    record_type,
                    current,
                    desired: record.data,
                }
            }
            ReconciliationDecision::ReplaceThenCreate => {
                let previous = observed.unwrap_or_else(|| record.clone());
                self.remove(zone, name, record_type)?;
                self.store
                    .create_record(zone, &record)
                    .map_err(provider_err)?;
                Outcome::Replaced { previous, record }
            }
            ReconciliationDecision::Delete => {
                self.remove(zone, name, record_type)?;
                Outcome::Deleted {
                    name: name.to_string(),
                    record_type,
                }
            }
        };

        Ok(finish(outcome))
    }

    /// Delete a record, tolerating one that has already disappeared.
    fn remove(&self, zone: &Zone, name: &str, record_type: RecordType) -> Result<(), ReconcileError> {
        match self.store.delete_record(zone, name, record_type) {
            Ok(()) => Ok(()),
            Err(StoreError::RecordNotFound { .. }) => {
                warn!("{} record {} was already gone when deleted", record_type, name);
                Ok(())
            }
            Err(e) => Err(ReconcileError::from_store(name, e)),
        }
    }
}

fn validate(desired: &DesiredRecord) -> Result<(), ReconcileError> {
    match &desired.data {
        RecordData::Values { values, .. } if values.is_empty() => {
            Err(ReconcileError::InvalidRecord {
                name: desired.name.clone(),
                reason: "no value or alias target given".to_string(),
            })
        }
        _ => Ok(()),
    }
}

fn finish(outcome: Outcome) -> Outcome {
    info!("{}", outcome.message());
    outcome
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod reconciler_tests;
