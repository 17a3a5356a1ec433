// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # recordkeeper - DNS record reconciliation for hosted zones
//!
//! recordkeeper makes a hosted zone hold one desired DNS record. Each run reads
//! the current state, decides on the smallest change and applies it, so running
//! it again is always safe.
//!
//! ## Overview
//!
//! A run flows through these pieces:
//!
//! 1. [`resolver`] - advisory live DNS check: is the record already served as desired?
//! 2. [`zone_locator`] - which hosted zone owns the record name?
//! 3. [`comparator`] - does the provider's current record equal the desired one?
//! 4. [`reconciler`] - decide and apply: no-op, create, replace, skip or delete
//!
//! The provider is reached through the [`store::ZoneStore`] trait, implemented
//! for Route53 ([`store::Route53ZoneStore`]) and in memory
//! ([`store::InMemoryZoneStore`], the `mock` provider).
//!
//! ## Modules
//!
//! - [`record`] - record types, desired and observed records, name normalization
//! - [`config`] - record spec files and provider settings
//! - [`credentials`] - explicit, environment and instance-role AWS credentials
//! - [`errors`] - error types with stable reason codes
//! - [`http_errors`] - provider XML error decoding
//! - [`cli`] - command line interface of the `recordkeeper` binary
//!
//! ## Example
//!
//! ```rust
//! use recordkeeper::reconciler::{Outcome, Reconciler};
//! use recordkeeper::record::{DesiredRecord, RecordData, RecordSet, RecordType};
//! use recordkeeper::resolver::DisabledProbe;
//! use recordkeeper::store::InMemoryZoneStore;
//!
//! let store = InMemoryZoneStore::new()
//!     .with_zone("Z1", "example.com.")
//!     .with_record(
//!         "Z1",
//!         RecordSet {
//!             name: "foo.example.com.".to_string(),
//!             record_type: RecordType::A,
//!             data: RecordData::Values { values: vec!["5.6.7.8".to_string()], ttl: 300 },
//!         },
//!     );
//! let reconciler = Reconciler::new(&store, DisabledProbe);
//!
//! let desired = DesiredRecord::with_values(
//!     "foo.example.com",
//!     RecordType::A,
//!     vec!["1.2.3.4".to_string()],
//!     300,
//! )
//! .overwrite(false);
//!
//! let outcome = reconciler.create(&reconciler.load(desired)).unwrap();
//! assert!(matches!(outcome, Outcome::SkippedProtected { .. }));
//! assert!(store.mutations().is_empty());
//! ```

pub mod cli;
pub mod comparator;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod errors;
pub mod http_errors;
pub mod reconciler;
pub mod record;
pub mod resolver;
pub mod store;
pub mod zone_locator;
