// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Live DNS existence checks.
//!
//! Before touching the provider, the create action asks public DNS whether the
//! desired record is already live. The answer is advisory: it can turn a create
//! into a no-op, but never justifies a delete or a replace.
//!
//! Lookups return a typed [`ProbeResult`] so callers can tell an empty answer
//! from a failed query. Narrowing to a plain "exists" flag happens in exactly one
//! place, when the reconciliation context is loaded.
//!
//! # Example
//!
//! ```rust,no_run
//! use recordkeeper::record::{DesiredRecord, RecordType};
//! use recordkeeper::resolver::{record_exists, DnsProbe};
//! use std::time::Duration;
//!
//! let probe = DnsProbe::from_system(Duration::from_secs(5));
//! let desired = DesiredRecord::with_values(
//!     "www.example.com",
//!     RecordType::A,
//!     vec!["192.0.2.1".to_string()],
//!     300,
//! );
//! let live = record_exists(&probe, &desired);
//! println!("already live: {live}");
//! ```

use hickory_client::client::{Client, SyncClient};
use hickory_client::op::ResponseCode;
use hickory_client::rr::{DNSClass, Name, RData};
use hickory_client::udp::UdpClientConnection;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::constants::{DNS_PORT, FALLBACK_NAMESERVER, RESOLV_CONF_PATH};
use crate::record::{fqdn, strip_trailing_dot, DesiredRecord, RecordData, RecordType};

/// Outcome of a live DNS lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// The name has data of the queried type, rendered in presentation format
    Found(Vec<String>),
    /// The name or type does not exist
    NotFound,
    /// The query could not be answered (timeout, refused, no resolver)
    QueryFailed(String),
}

/// Something that can look up live DNS data for a name and type.
pub trait RecordProbe {
    fn probe(&self, name: &str, record_type: RecordType) -> ProbeResult;
}

impl<P: RecordProbe + ?Sized> RecordProbe for &P {
    fn probe(&self, name: &str, record_type: RecordType) -> ProbeResult {
        (**self).probe(name, record_type)
    }
}

impl<P: RecordProbe + ?Sized> RecordProbe for Box<P> {
    fn probe(&self, name: &str, record_type: RecordType) -> ProbeResult {
        (**self).probe(name, record_type)
    }
}

/// Probe that never finds anything. Used with the mock provider so runs stay offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledProbe;

impl RecordProbe for DisabledProbe {
    fn probe(&self, _name: &str, _record_type: RecordType) -> ProbeResult {
        ProbeResult::NotFound
    }
}

/// Probe that queries a recursive nameserver over UDP.
#[derive(Debug, Clone)]
pub struct DnsProbe {
    nameserver: SocketAddr,
    timeout: Duration,
}

impl DnsProbe {
    #[must_use]
    pub fn new(nameserver: SocketAddr, timeout: Duration) -> Self {
        Self {
            nameserver,
            timeout,
        }
    }

    /// Use the first nameserver from `/etc/resolv.conf`, or a public fallback.
    #[must_use]
    pub fn from_system(timeout: Duration) -> Self {
        Self::new(system_nameserver(Path::new(RESOLV_CONF_PATH)), timeout)
    }

    #[must_use]
    pub fn nameserver(&self) -> SocketAddr {
        self.nameserver
    }

    fn query(&self, name: &str, record_type: RecordType) -> Result<Option<Vec<String>>, String> {
        let rr_type = record_type.rr_type();
        let name = Name::from_str(&fqdn(name)).map_err(|e| format!("invalid name: {e}"))?;

        let conn = UdpClientConnection::with_timeout(self.nameserver, self.timeout)
            .map_err(|e| format!("failed to open UDP connection: {e}"))?;
        let client = SyncClient::new(conn);

        let response = client
            .query(&name, DNSClass::IN, rr_type)
            .map_err(|e| format!("query to {} failed: {e}", self.nameserver))?;

        match response.response_code() {
            ResponseCode::NoError => {}
            ResponseCode::NXDomain => return Ok(None),
            code => return Err(format!("nameserver answered {code}")),
        }

        let data: Vec<String> = response
            .answers()
            .iter()
            .filter(|r| r.record_type() == rr_type)
            .filter_map(|r| r.data())
            .map(render_rdata)
            .collect();

        Ok((!data.is_empty()).then_some(data))
    }
}

impl RecordProbe for DnsProbe {
    fn probe(&self, name: &str, record_type: RecordType) -> ProbeResult {
        match self.query(name, record_type) {
            Ok(Some(data)) => {
                debug!(
                    "Live DNS has {} {} record(s) for {}: {:?}",
                    data.len(),
                    record_type,
                    name,
                    data
                );
                ProbeResult::Found(data)
            }
            Ok(None) => ProbeResult::NotFound,
            Err(reason) => ProbeResult::QueryFailed(reason),
        }
    }
}

/// Render record data the way providers present it.
fn render_rdata(rdata: &RData) -> String {
    match rdata {
        RData::TXT(txt) => txt
            .txt_data()
            .iter()
            .map(|segment| String::from_utf8_lossy(segment))
            .collect(),
        other => other.to_string(),
    }
}

/// Whether live DNS already serves the desired record.
///
/// Any lookup failure counts as "does not exist".
pub fn record_exists<P: RecordProbe + ?Sized>(probe: &P, desired: &DesiredRecord) -> bool {
    match probe.probe(&desired.name, desired.record_type) {
        ProbeResult::Found(resolved) => matches_expected(desired, &resolved),
        ProbeResult::NotFound => false,
        ProbeResult::QueryFailed(reason) => {
            debug!(
                "Live DNS lookup for {} {} failed, treating as absent: {}",
                desired.record_type, desired.name, reason
            );
            false
        }
    }
}

/// Compare resolved data against the desired record.
///
/// A CNAME matches when it points at the alias target (or the first value).
/// Alias records of other types resolve to provider-owned data and never match.
/// Everything else matches when the normalized value sets are equal.
#[must_use]
pub fn matches_expected(desired: &DesiredRecord, resolved: &[String]) -> bool {
    let record_type = desired.record_type;

    if record_type == RecordType::CNAME {
        let expected = match &desired.data {
            RecordData::Alias(target) => Some(target.dns_name.as_str()),
            RecordData::Values { values, .. } => values.first().map(String::as_str),
        };
        return expected.is_some_and(|expected| {
            let expected = normalize_value(record_type, expected);
            resolved
                .iter()
                .any(|r| normalize_value(record_type, r) == expected)
        });
    }

    let RecordData::Values { values, .. } = &desired.data else {
        return false;
    };
    if values.is_empty() {
        return false;
    }

    normalized_set(record_type, values) == normalized_set(record_type, resolved)
}

fn normalized_set(record_type: RecordType, values: &[String]) -> Vec<String> {
    let mut set: Vec<String> = values
        .iter()
        .map(|v| normalize_value(record_type, v))
        .collect();
    set.sort();
    set.dedup();
    set
}

/// Canonical text of one value for comparison.
///
/// - A/AAAA: parsed as an IP address, so `2001:DB8::1` equals `2001:db8:0::1`
/// - TXT/SPF: quoting and string boundaries removed
/// - types carrying host names: lowercased, trailing dots dropped
#[must_use]
pub fn normalize_value(record_type: RecordType, value: &str) -> String {
    let value = value.trim();
    match record_type {
        RecordType::A | RecordType::AAAA => IpAddr::from_str(value)
            .map(|ip| ip.to_string())
            .unwrap_or_else(|_| value.to_string()),
        RecordType::TXT | RecordType::SPF => value
            .replace("\" \"", "")
            .trim_matches('"')
            .to_string(),
        t if t.has_name_data() => value
            .split_whitespace()
            .map(|token| strip_trailing_dot(token).to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join(" "),
        _ => value.to_string(),
    }
}

/// Parse a nameserver given as `IP` or `IP:port`.
#[must_use]
pub fn parse_nameserver(value: &str) -> Option<SocketAddr> {
    let value = value.trim();
    SocketAddr::from_str(value).ok().or_else(|| {
        IpAddr::from_str(value.trim_start_matches('[').trim_end_matches(']'))
            .ok()
            .map(|ip| SocketAddr::new(ip, DNS_PORT))
    })
}

/// First usable `nameserver` entry of a resolv.conf document.
#[must_use]
pub fn parse_resolv_conf(contents: &str) -> Option<SocketAddr> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some("nameserver"), Some(addr)) => {
                    // Scoped IPv6 addresses (fe80::1%eth0) cannot be used here
                    IpAddr::from_str(addr).ok()
                }
                _ => None,
            }
        })
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .next()
}

/// The system's configured nameserver, falling back to a public resolver.
#[must_use]
pub fn system_nameserver(resolv_conf: &Path) -> SocketAddr {
    let configured = fs::read_to_string(resolv_conf)
        .ok()
        .and_then(|contents| parse_resolv_conf(&contents));

    match configured {
        Some(addr) => addr,
        None => {
            debug!(
                "No nameserver found in {}, using {}",
                resolv_conf.display(),
                FALLBACK_NAMESERVER
            );
            SocketAddr::from_str(FALLBACK_NAMESERVER)
                .unwrap_or_else(|_| SocketAddr::from(([8, 8, 8, 8], DNS_PORT)))
        }
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod resolver_tests;
