// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Equality between a desired record and the provider's current record.

use crate::record::{names_equal, strip_trailing_dot, DesiredRecord, ObservedRecord, RecordData};

/// Whether the observed record already satisfies the desired one.
///
/// - names are compared fully-qualified and case-insensitively
/// - alias records match on the target DNS name, ignoring a trailing dot
/// - value records match when the sorted value lists and the TTLs are equal
/// - an alias never equals a value record
///
/// Value order never matters, but duplicates do.
#[must_use]
pub fn same_record(desired: &DesiredRecord, observed: &ObservedRecord) -> bool {
    if !names_equal(&desired.name, &observed.name) || desired.record_type != observed.record_type {
        return false;
    }

    match (&desired.data, &observed.data) {
        (RecordData::Alias(want), RecordData::Alias(have)) => {
            strip_trailing_dot(&want.dns_name).eq_ignore_ascii_case(strip_trailing_dot(&have.dns_name))
        }
        (
            RecordData::Values { values: want, ttl: want_ttl },
            RecordData::Values { values: have, ttl: have_ttl },
        ) => want_ttl == have_ttl && sorted(want) == sorted(have),
        _ => false,
    }
}

fn sorted(values: &[String]) -> Vec<&str> {
    let mut values: Vec<&str> = values.iter().map(String::as_str).collect();
    values.sort_unstable();
    values
}

#[cfg(test)]
#[path = "comparator_tests.rs"]
mod comparator_tests;
