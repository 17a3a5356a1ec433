// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use recordkeeper::record::{DesiredRecord, RecordData, RecordSet, RecordType};
use recordkeeper::resolver::{ProbeResult, RecordProbe};
use recordkeeper::store::InMemoryZoneStore;

/// Zone id used by every in-memory fixture
pub const ZONE_ID: &str = "Z1EXAMPLE";

/// Store holding only the `example.com.` zone
pub fn example_store() -> InMemoryZoneStore {
    InMemoryZoneStore::new().with_zone(ZONE_ID, "example.com.")
}

/// The desired record used by the scenarios: foo.example.com A 1.2.3.4, TTL 300
pub fn foo_desired() -> DesiredRecord {
    DesiredRecord::with_values(
        "foo.example.com",
        RecordType::A,
        vec!["1.2.3.4".to_string()],
        300,
    )
}

/// An A record set for foo.example.com.
pub fn foo_set(values: &[&str], ttl: u32) -> RecordSet {
    RecordSet {
        name: "foo.example.com.".to_string(),
        record_type: RecordType::A,
        data: RecordData::Values {
            values: values.iter().map(ToString::to_string).collect(),
            ttl,
        },
    }
}

/// Probe answering every query the same way
pub struct StaticProbe(pub ProbeResult);

impl RecordProbe for StaticProbe {
    fn probe(&self, _name: &str, _record_type: RecordType) -> ProbeResult {
        self.0.clone()
    }
}
