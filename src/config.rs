// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record spec files and provider settings.
//!
//! A record spec is a YAML (or JSON) document describing one desired record:
//!
//! ```yaml
//! name: www.example.com
//! type: A
//! value:
//!   - 192.0.2.1
//!   - 192.0.2.2
//! ttl: 300
//! overwrite: false
//! ```
//!
//! Alias records give an `alias_target` instead of `value`:
//!
//! ```yaml
//! name: www.example.com
//! type: A
//! alias_target:
//!   dns_name: lb-1.us-east-1.elb.amazonaws.com
//!   evaluate_target_health: true
//!   hosted_zone_id: Z35SXDOTRQ7X7K
//! ```
//!
//! Setting `mock: true` swaps the provider for an in-memory store seeded with
//! `mock_zones`, so a spec can be tried without credentials or network access.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::constants::{
    DEFAULT_AWS_REGION, DEFAULT_DNS_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_OVERWRITE,
    DEFAULT_RECORD_TTL_SECS, MOCK_ZONE_ID, ROUTE53_ENDPOINT,
};
use crate::credentials::AwsCredentials;
use crate::errors::ConfigError;
use crate::record::{fqdn, strip_trailing_dot, AliasTarget, DesiredRecord, RecordType};
use crate::store::{InMemoryZoneStore, Zone};

fn default_ttl() -> u32 {
    DEFAULT_RECORD_TTL_SECS
}

fn default_overwrite() -> bool {
    DEFAULT_OVERWRITE
}

/// A single value or a list of values.
///
/// Unquoted numbers and booleans are kept as their text, so `value: 10` reads
/// the same as `value: "10"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for OneOrMany {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Sequence(items) => items
                .into_iter()
                .map(scalar_text)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many)
                .map_err(de::Error::custom),
            other => scalar_text(other).map(Self::One).map_err(de::Error::custom),
        }
    }
}

fn scalar_text(value: Value) -> Result<String, String> {
    match value {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Tagged(tagged) => scalar_text(tagged.value),
        Value::Null => Err("record values must not be empty".to_string()),
        Value::Sequence(_) => Err("record values must not be nested lists".to_string()),
        Value::Mapping(_) => {
            Err("record values must be strings or numbers, not mappings".to_string())
        }
    }
}

impl OneOrMany {
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// A hosted zone to seed into the mock provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockZone {
    pub domain: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// Desired record as written in a spec file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub record_type: RecordType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<OneOrMany>,

    #[serde(default = "default_ttl")]
    pub ttl: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,

    #[serde(default = "default_overwrite")]
    pub overwrite: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_target: Option<AliasTarget>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_access_key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_secret_access_key: Option<String>,

    /// Use the in-memory provider instead of Route53
    #[serde(default)]
    pub mock: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mock_zones: Vec<MockZone>,
}

impl RecordSpec {
    /// Parse a spec document (YAML or JSON).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents, missing required
    /// fields, or unsupported record types.
    pub fn parse(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(document)?)
    }

    /// Read and parse a spec file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise as [`Self::parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let document = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&document)
    }

    /// Build the desired record this spec describes.
    ///
    /// When both `value` and `alias_target` are given the alias wins.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the name is empty, or if there is
    /// neither a non-empty value nor an alias target.
    pub fn desired_record(&self) -> Result<DesiredRecord, ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        let name = self.name.trim();
        if strip_trailing_dot(name).is_empty() {
            return Err(invalid("name must not be empty"));
        }

        let values: Vec<String> = self
            .value
            .clone()
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();

        let desired = match &self.alias_target {
            Some(target) => {
                if !values.is_empty() {
                    warn!(
                        "Record {} has both a value and an alias target, using the alias target",
                        name
                    );
                }
                if target.dns_name.trim().is_empty() || target.hosted_zone_id.trim().is_empty() {
                    return Err(invalid(
                        "alias_target needs both dns_name and hosted_zone_id",
                    ));
                }
                DesiredRecord::with_alias(name, self.record_type, target.clone())
            }
            None if values.is_empty() => {
                return Err(invalid("either value or alias_target must be given"));
            }
            None => DesiredRecord::with_values(name, self.record_type, values, self.ttl),
        };

        let desired = desired.overwrite(self.overwrite);
        Ok(match self.zone_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => desired.in_zone(id),
            _ => desired,
        })
    }

    /// The explicit key pair, when both halves are present.
    #[must_use]
    pub fn explicit_credentials(&self) -> Option<AwsCredentials> {
        let id = self.aws_access_key_id.as_deref().map(str::trim).unwrap_or_default();
        let secret = self
            .aws_secret_access_key
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();

        match (id.is_empty(), secret.is_empty()) {
            (false, false) => Some(AwsCredentials::new(id, secret)),
            (true, true) => None,
            _ => {
                warn!("Only one of aws_access_key_id and aws_secret_access_key is set, ignoring both");
                None
            }
        }
    }

    /// Zones the mock provider starts with.
    ///
    /// Without configured zones the record's parent domain becomes the only
    /// zone, identified by `zone_id` when given.
    #[must_use]
    pub fn mock_zone_list(&self) -> Vec<Zone> {
        if !self.mock_zones.is_empty() {
            return self
                .mock_zones
                .iter()
                .enumerate()
                .map(|(i, z)| {
                    let id = z.id.clone().unwrap_or_else(|| format!("{MOCK_ZONE_ID}{}", i + 1));
                    Zone::new(id, &z.domain)
                })
                .collect();
        }

        let name = fqdn(self.name.trim());
        let domain = match strip_trailing_dot(&name).split_once('.') {
            Some((_, parent)) if !parent.is_empty() => parent.to_string(),
            _ => name.clone(),
        };
        let id = self
            .zone_id
            .clone()
            .unwrap_or_else(|| MOCK_ZONE_ID.to_string());
        vec![Zone::new(id, &domain)]
    }
}

/// How to reach the provider and live DNS for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Use the in-memory provider and skip live DNS
    pub mock: bool,
    /// Zones seeded into the in-memory provider
    pub mock_zones: Vec<Zone>,
    pub endpoint: String,
    pub region: String,
    pub http_timeout: Duration,
    /// Nameserver for live DNS checks; the system resolver when unset
    pub nameserver: Option<SocketAddr>,
    pub dns_timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            mock: false,
            mock_zones: Vec::new(),
            endpoint: ROUTE53_ENDPOINT.to_string(),
            region: DEFAULT_AWS_REGION.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            nameserver: None,
            dns_timeout: Duration::from_secs(DEFAULT_DNS_TIMEOUT_SECS),
        }
    }
}

impl ProviderSettings {
    /// Settings for a spec, before command line overrides.
    #[must_use]
    pub fn for_spec(spec: &RecordSpec) -> Self {
        Self {
            mock: spec.mock,
            mock_zones: spec.mock_zone_list(),
            ..Self::default()
        }
    }

    /// The in-memory provider seeded with the mock zones.
    #[must_use]
    pub fn mock_store(&self) -> InMemoryZoneStore {
        self.mock_zones
            .iter()
            .fold(InMemoryZoneStore::new(), |store, zone| {
                store.with_zone(&zone.id, &zone.domain)
            })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
