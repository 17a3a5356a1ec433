// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record data model shared by the resolver, zone locator, comparator and reconciler.
//!
//! Names are carried fully-qualified (dot-terminated) from the moment a
//! [`DesiredRecord`] is built. A record holds either a literal value set with a
//! TTL or an alias target; [`RecordData`] makes the two mutually exclusive so an
//! alias can never carry a TTL.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::SPF_RR_TYPE_CODE;

/// Record types a desired record may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    AAAA,
    MX,
    SOA,
    SPF,
    CNAME,
    TXT,
    PTR,
    SRV,
    NS,
}

impl RecordType {
    /// Every supported record type, in declaration order.
    pub const ALL: [RecordType; 10] = [
        Self::A,
        Self::AAAA,
        Self::MX,
        Self::SOA,
        Self::SPF,
        Self::CNAME,
        Self::TXT,
        Self::PTR,
        Self::SRV,
        Self::NS,
    ];

    /// Wire name of the type as used by providers and zone files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AAAA => "AAAA",
            Self::MX => "MX",
            Self::SOA => "SOA",
            Self::SPF => "SPF",
            Self::CNAME => "CNAME",
            Self::TXT => "TXT",
            Self::PTR => "PTR",
            Self::SRV => "SRV",
            Self::NS => "NS",
        }
    }

    /// Map to the DNS resource record type used for live queries.
    ///
    /// The match is exhaustive so adding a variant without a mapping fails to compile.
    #[must_use]
    pub fn rr_type(self) -> hickory_proto::rr::RecordType {
        use hickory_proto::rr::RecordType as Rr;

        match self {
            Self::A => Rr::A,
            Self::AAAA => Rr::AAAA,
            Self::MX => Rr::MX,
            Self::SOA => Rr::SOA,
            Self::SPF => Rr::Unknown(SPF_RR_TYPE_CODE),
            Self::CNAME => Rr::CNAME,
            Self::TXT => Rr::TXT,
            Self::PTR => Rr::PTR,
            Self::SRV => Rr::SRV,
            Self::NS => Rr::NS,
        }
    }

    /// Whether the record data of this type names other hosts.
    ///
    /// Such data compares case-insensitively and ignores a trailing dot.
    #[must_use]
    pub fn has_name_data(self) -> bool {
        matches!(
            self,
            Self::CNAME | Self::NS | Self::PTR | Self::MX | Self::SRV | Self::SOA
        )
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unsupported record type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported record type '{0}' (expected one of A, AAAA, MX, SOA, SPF, CNAME, TXT, PTR, SRV, NS)")]
pub struct UnknownRecordType(pub String);

impl FromStr for RecordType {
    type Err = UnknownRecordType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRecordType(s.to_string()))
    }
}

/// Provider alias pointing at another provider resource instead of literal data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTarget {
    /// DNS name of the target resource (e.g. a load balancer hostname)
    pub dns_name: String,

    /// Whether the provider should evaluate the target's health
    #[serde(default, alias = "evaluate_target_health")]
    pub evaluate_health: bool,

    /// Hosted zone id that owns the target resource
    pub hosted_zone_id: String,
}

/// The data half of a record set: literal values with a TTL, or an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    /// Ordered literal values with their TTL
    Values { values: Vec<String>, ttl: u32 },
    /// Alias target; aliases have no independent TTL
    Alias(AliasTarget),
}

impl RecordData {
    #[must_use]
    pub fn is_alias(&self) -> bool {
        matches!(self, Self::Alias(_))
    }

    #[must_use]
    pub fn values(&self) -> &[String] {
        match self {
            Self::Values { values, .. } => values,
            Self::Alias(_) => &[],
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Option<u32> {
        match self {
            Self::Values { ttl, .. } => Some(*ttl),
            Self::Alias(_) => None,
        }
    }

    #[must_use]
    pub fn alias_target(&self) -> Option<&AliasTarget> {
        match self {
            Self::Alias(target) => Some(target),
            Self::Values { .. } => None,
        }
    }
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Values { values, ttl } => write!(f, "[{}] (TTL: {ttl})", values.join(", ")),
            Self::Alias(target) => write!(f, "ALIAS {}", target.dns_name),
        }
    }
}

/// A record set as submitted to or observed at the provider.
///
/// Used both for creation attributes and for the provider's current state
/// (`ObservedRecord`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    pub name: String,
    pub record_type: RecordType,
    pub data: RecordData,
}

/// The provider's current record at `(name, type)`.
pub type ObservedRecord = RecordSet;

/// The desired state of one record, built once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredRecord {
    /// Fully-qualified record name
    pub name: String,
    pub record_type: RecordType,
    pub data: RecordData,
    /// Replace divergent records when true; leave them alone when false
    pub overwrite: bool,
    /// Explicit hosted zone id, bypassing zone discovery
    pub zone_id: Option<String>,
}

impl DesiredRecord {
    /// Build a value record. The name is normalized to its fully-qualified form.
    #[must_use]
    pub fn with_values(
        name: &str,
        record_type: RecordType,
        values: Vec<String>,
        ttl: u32,
    ) -> Self {
        Self {
            name: fqdn(name),
            record_type,
            data: RecordData::Values { values, ttl },
            overwrite: true,
            zone_id: None,
        }
    }

    /// Build an alias record. The name is normalized to its fully-qualified form.
    #[must_use]
    pub fn with_alias(name: &str, record_type: RecordType, target: AliasTarget) -> Self {
        Self {
            name: fqdn(name),
            record_type,
            data: RecordData::Alias(target),
            overwrite: true,
            zone_id: None,
        }
    }

    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn in_zone(mut self, zone_id: impl Into<String>) -> Self {
        self.zone_id = Some(zone_id.into());
        self
    }

    /// The record set to submit to the provider, under the given (possibly corrected) name.
    #[must_use]
    pub fn to_record_set(&self, name: &str) -> RecordSet {
        RecordSet {
            name: fqdn(name),
            record_type: self.record_type,
            data: self.data.clone(),
        }
    }
}

/// Normalize a domain name to its fully-qualified, dot-terminated form.
///
/// # Examples
///
/// ```rust
/// use recordkeeper::record::fqdn;
///
/// assert_eq!(fqdn("www.example.com"), "www.example.com.");
/// assert_eq!(fqdn("www.example.com."), "www.example.com.");
/// ```
#[must_use]
pub fn fqdn(name: &str) -> String {
    let name = name.trim();
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Strip a single trailing label separator, if present.
#[must_use]
pub fn strip_trailing_dot(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Compare two domain names after fully-qualified normalization, ignoring ASCII case.
#[must_use]
pub fn names_equal(a: &str, b: &str) -> bool {
    fqdn(a).eq_ignore_ascii_case(&fqdn(b))
}

/// Whether `name` lies at or below `domain`, label-wise.
///
/// `www.example.com.` is under `example.com.`, but `wwwexample.com.` is not.
#[must_use]
pub fn is_under_domain(name: &str, domain: &str) -> bool {
    let name = fqdn(name).to_ascii_lowercase();
    let domain = fqdn(domain).to_ascii_lowercase();
    if domain == "." {
        return true;
    }
    name == domain || name.ends_with(&format!(".{domain}"))
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
