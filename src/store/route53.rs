// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Route53 hosted zone store.
//!
//! Talks to the Route53 REST/XML API with blocking HTTP calls signed with
//! `SigV4`. Required IAM permissions:
//!
//! - `route53:ListHostedZones`
//! - `route53:GetHostedZone`
//! - `route53:ListResourceRecordSets`
//! - `route53:ChangeResourceRecordSets`
//!
//! Zone ids are accepted with or without the `/hostedzone/` prefix.

use chrono::Utc;
use reqwest::blocking::Client as HttpClient;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::sigv4::{canonical_query_string, sign, uri_encode, SignableRequest};
use super::{Zone, ZoneStore};
use crate::constants::{
    HOSTED_ZONE_ID_PREFIX, MAX_ZONE_LIST_PAGES, ROUTE53_API_VERSION, ROUTE53_SERVICE,
    ROUTE53_XML_NAMESPACE,
};
use crate::credentials::AwsCredentials;
use crate::errors::StoreError;
use crate::http_errors::{first_element_text, ProviderFault};
use crate::record::{
    fqdn, names_equal, AliasTarget, ObservedRecord, RecordData, RecordSet, RecordType,
};

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListHostedZonesResponse {
    #[serde(rename = "HostedZones", default)]
    hosted_zones: HostedZones,
    #[serde(rename = "IsTruncated", default)]
    is_truncated: bool,
    #[serde(rename = "NextMarker", default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HostedZones {
    #[serde(rename = "HostedZone", default)]
    hosted_zone: Vec<HostedZone>,
}

#[derive(Debug, Deserialize)]
struct HostedZone {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct GetHostedZoneResponse {
    #[serde(rename = "HostedZone")]
    hosted_zone: HostedZone,
}

#[derive(Debug, Deserialize)]
struct ListResourceRecordSetsResponse {
    #[serde(rename = "ResourceRecordSets", default)]
    resource_record_sets: ResourceRecordSets,
}

#[derive(Debug, Default, Deserialize)]
struct ResourceRecordSets {
    #[serde(rename = "ResourceRecordSet", default)]
    resource_record_set: Vec<ResourceRecordSetXml>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ResourceRecordSetXml {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Type")]
    record_type: String,
    #[serde(rename = "TTL", default, skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    #[serde(
        rename = "ResourceRecords",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    resource_records: Option<ResourceRecords>,
    #[serde(rename = "AliasTarget", default, skip_serializing_if = "Option::is_none")]
    alias_target: Option<AliasTargetXml>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ResourceRecords {
    #[serde(rename = "ResourceRecord", default)]
    resource_record: Vec<ResourceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ResourceRecord {
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AliasTargetXml {
    #[serde(rename = "HostedZoneId")]
    hosted_zone_id: String,
    #[serde(rename = "DNSName")]
    dns_name: String,
    #[serde(rename = "EvaluateTargetHealth", default)]
    evaluate_target_health: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename = "ChangeResourceRecordSetsRequest")]
struct ChangeResourceRecordSetsRequest<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "ChangeBatch")]
    change_batch: ChangeBatch<'a>,
}

#[derive(Debug, Serialize)]
struct ChangeBatch<'a> {
    #[serde(rename = "Comment")]
    comment: &'a str,
    #[serde(rename = "Changes")]
    changes: Changes<'a>,
}

#[derive(Debug, Serialize)]
struct Changes<'a> {
    #[serde(rename = "Change")]
    change: Vec<Change<'a>>,
}

#[derive(Debug, Serialize)]
struct Change<'a> {
    #[serde(rename = "Action")]
    action: &'a str,
    #[serde(rename = "ResourceRecordSet")]
    resource_record_set: ResourceRecordSetXml,
}

impl From<&RecordSet> for ResourceRecordSetXml {
    fn from(record: &RecordSet) -> Self {
        let (ttl, resource_records, alias_target) = match &record.data {
            RecordData::Values { values, ttl } => (
                Some(*ttl),
                Some(ResourceRecords {
                    resource_record: values
                        .iter()
                        .map(|v| ResourceRecord { value: v.clone() })
                        .collect(),
                }),
                None,
            ),
            RecordData::Alias(target) => (
                None,
                None,
                Some(AliasTargetXml {
                    hosted_zone_id: target.hosted_zone_id.clone(),
                    dns_name: target.dns_name.clone(),
                    evaluate_target_health: target.evaluate_health,
                }),
            ),
        };

        Self {
            name: fqdn(&record.name),
            record_type: record.record_type.to_string(),
            ttl,
            resource_records,
            alias_target,
        }
    }
}

impl ResourceRecordSetXml {
    fn into_record_set(self) -> Result<RecordSet, StoreError> {
        let record_type =
            RecordType::from_str(&self.record_type).map_err(|e| StoreError::InvalidResponse {
                operation: "get record".to_string(),
                reason: e.to_string(),
            })?;

        let data = match self.alias_target {
            Some(alias) => RecordData::Alias(AliasTarget {
                dns_name: alias.dns_name,
                evaluate_health: alias.evaluate_target_health,
                hosted_zone_id: alias.hosted_zone_id,
            }),
            None => RecordData::Values {
                values: self
                    .resource_records
                    .map(|r| r.resource_record.into_iter().map(|v| v.value).collect())
                    .unwrap_or_default(),
                ttl: self.ttl.unwrap_or_default(),
            },
        };

        Ok(RecordSet {
            name: decode_name(&self.name),
            record_type,
            data,
        })
    }
}

/// Undo Route53's `\ddd` octal escaping of names (e.g. `\052` for `*`).
#[must_use]
pub fn decode_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let escape = &rest[pos + 1..];
        let decoded = escape
            .get(..3)
            .filter(|d| d.bytes().all(|b| (b'0'..=b'7').contains(&b)))
            .and_then(|d| u32::from_str_radix(d, 8).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &escape[3..];
            }
            None => {
                out.push('\\');
                rest = escape;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Strip the `/hostedzone/` prefix Route53 puts on zone ids.
#[must_use]
pub fn normalize_zone_id(id: &str) -> &str {
    id.trim().trim_start_matches(HOSTED_ZONE_ID_PREFIX)
}

// ============================================================================
// Store
// ============================================================================

struct HttpResponse {
    status: u16,
    body: String,
}

/// Route53-backed [`ZoneStore`].
#[derive(Debug, Clone)]
pub struct Route53ZoneStore {
    client: HttpClient,
    endpoint: Url,
    region: String,
    credentials: AwsCredentials,
}

impl Route53ZoneStore {
    /// Create a store for the given API endpoint and signing region.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(
        credentials: AwsCredentials,
        endpoint: &str,
        region: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let endpoint = Url::parse(endpoint).map_err(|e| StoreError::Transport {
            operation: "configure provider".to_string(),
            reason: format!("invalid endpoint '{endpoint}': {e}"),
        })?;
        let client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport {
                operation: "configure provider".to_string(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint,
            region: region.to_string(),
            credentials,
        })
    }

    fn api_path(suffix: &str) -> String {
        format!("/{ROUTE53_API_VERSION}/{suffix}")
    }

    /// Send a signed request and return the raw status and body.
    fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<String>,
        operation: &str,
    ) -> Result<HttpResponse, StoreError> {
        let transport = |reason: String| StoreError::Transport {
            operation: operation.to_string(),
            reason,
        };

        let mut url = self.endpoint.clone();
        url.set_path(path);
        let query_string = canonical_query_string(query);
        url.set_query((!query_string.is_empty()).then_some(query_string.as_str()));

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(transport(format!("endpoint '{url}' has no host"))),
        };
        let payload = body.unwrap_or_default();

        let signed = sign(
            &SignableRequest {
                method: method.as_str(),
                host: &host,
                path,
                query,
                payload: &payload,
            },
            &self.credentials,
            &self.region,
            ROUTE53_SERVICE,
            Utc::now(),
        )?;

        debug!(method = %method, url = %url, "Route53 API request");

        let mut request = self
            .client
            .request(method, url)
            .header("X-Amz-Date", &signed.amz_date)
            .header("Authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }
        if !payload.is_empty() {
            request = request
                .header("Content-Type", "application/xml")
                .body(payload);
        }

        let response = request
            .send()
            .map_err(|e| transport(format!("request failed: {e}")))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| transport(format!("failed to read response: {e}")))?;

        Ok(HttpResponse { status, body })
    }

    fn parse<T: DeserializeOwned>(body: &str, operation: &str) -> Result<T, StoreError> {
        quick_xml::de::from_str(body).map_err(|e| StoreError::InvalidResponse {
            operation: operation.to_string(),
            reason: e.to_string(),
        })
    }

    fn zone_from_xml(zone: HostedZone) -> Zone {
        Zone::new(normalize_zone_id(&zone.id), &decode_name(&zone.name))
    }

    /// Submit a single-change batch.
    fn change(
        &self,
        zone: &Zone,
        action: &str,
        record: &ResourceRecordSetXml,
    ) -> Result<(), HttpOrFault> {
        let operation = match action {
            "CREATE" => "create record",
            _ => "delete record",
        };
        let request = ChangeResourceRecordSetsRequest {
            xmlns: ROUTE53_XML_NAMESPACE,
            change_batch: ChangeBatch {
                comment: "Managed by recordkeeper",
                changes: Changes {
                    change: vec![Change {
                        action,
                        resource_record_set: record.clone(),
                    }],
                },
            },
        };
        let body = quick_xml::se::to_string(&request).map_err(|e| {
            HttpOrFault::Store(StoreError::InvalidResponse {
                operation: operation.to_string(),
                reason: format!("failed to serialize change batch: {e}"),
            })
        })?;

        let path = Self::api_path(&format!(
            "hostedzone/{}/rrset",
            uri_encode(normalize_zone_id(&zone.id))
        ));
        let response = self
            .send(Method::POST, &path, &[], Some(body), operation)
            .map_err(HttpOrFault::Store)?;

        if !(200..300).contains(&response.status) {
            return Err(HttpOrFault::Fault(ProviderFault::parse(
                response.status,
                &response.body,
            )));
        }

        debug!(
            change_id = %first_element_text(&response.body, "Id").unwrap_or_default(),
            action = action,
            name = %record.name,
            "Route53 change submitted"
        );
        Ok(())
    }
}

/// Failure of a change call: either no usable response, or a decoded provider fault.
enum HttpOrFault {
    Store(StoreError),
    Fault(ProviderFault),
}

impl ZoneStore for Route53ZoneStore {
    fn list_zones(&self) -> Result<Vec<Zone>, StoreError> {
        const OPERATION: &str = "list zones";

        let path = Self::api_path("hostedzone");
        let mut zones = Vec::new();
        let mut marker: Option<String> = None;

        for page in 1..=MAX_ZONE_LIST_PAGES {
            let query: Vec<(String, String)> = marker
                .iter()
                .map(|m| ("marker".to_string(), m.clone()))
                .collect();
            let response = self.send(Method::GET, &path, &query, None, OPERATION)?;
            if !(200..300).contains(&response.status) {
                return Err(ProviderFault::parse(response.status, &response.body)
                    .into_store_error(OPERATION));
            }

            let parsed: ListHostedZonesResponse = Self::parse(&response.body, OPERATION)?;
            zones.extend(
                parsed
                    .hosted_zones
                    .hosted_zone
                    .into_iter()
                    .map(Self::zone_from_xml),
            );

            debug!(page = page, total_zones = zones.len(), "Fetched hosted zone page");

            match (parsed.is_truncated, parsed.next_marker) {
                (true, Some(next)) => marker = Some(next),
                _ => return Ok(zones),
            }
        }

        warn!(
            pages = MAX_ZONE_LIST_PAGES,
            "Stopped following hosted zone pages at the page limit"
        );
        Ok(zones)
    }

    fn get_zone(&self, id: &str) -> Result<Zone, StoreError> {
        const OPERATION: &str = "get zone";

        let id = normalize_zone_id(id);
        let path = Self::api_path(&format!("hostedzone/{}", uri_encode(id)));
        let response = self.send(Method::GET, &path, &[], None, OPERATION)?;

        if !(200..300).contains(&response.status) {
            let fault = ProviderFault::parse(response.status, &response.body);
            if fault.is_missing_zone() {
                return Err(StoreError::ZoneNotFound {
                    zone_id: id.to_string(),
                });
            }
            return Err(fault.into_store_error(OPERATION));
        }

        let parsed: GetHostedZoneResponse = Self::parse(&response.body, OPERATION)?;
        Ok(Self::zone_from_xml(parsed.hosted_zone))
    }

    fn get_record(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<Option<ObservedRecord>, StoreError> {
        const OPERATION: &str = "get record";

        let name = fqdn(name);
        let zone_id = normalize_zone_id(&zone.id);
        let path = Self::api_path(&format!("hostedzone/{}/rrset", uri_encode(zone_id)));
        let query = vec![
            ("name".to_string(), name.clone()),
            ("type".to_string(), record_type.to_string()),
            ("maxitems".to_string(), "1".to_string()),
        ];

        let response = self.send(Method::GET, &path, &query, None, OPERATION)?;
        if !(200..300).contains(&response.status) {
            let fault = ProviderFault::parse(response.status, &response.body);
            if fault.is_missing_zone() {
                return Err(StoreError::ZoneNotFound {
                    zone_id: zone_id.to_string(),
                });
            }
            return Err(fault.into_store_error(OPERATION));
        }

        let parsed: ListResourceRecordSetsResponse = Self::parse(&response.body, OPERATION)?;

        // The listing starts at (name, type) but returns whatever sorts next when absent
        let Some(first) = parsed.resource_record_sets.resource_record_set.into_iter().next()
        else {
            return Ok(None);
        };
        if !first.record_type.eq_ignore_ascii_case(record_type.as_str())
            || !names_equal(&decode_name(&first.name), &name)
        {
            return Ok(None);
        }

        first.into_record_set().map(Some)
    }

    fn create_record(&self, zone: &Zone, record: &RecordSet) -> Result<(), StoreError> {
        match self.change(zone, "CREATE", &ResourceRecordSetXml::from(record)) {
            Ok(()) => Ok(()),
            Err(HttpOrFault::Store(e)) => Err(e),
            Err(HttpOrFault::Fault(fault)) => Err(fault.into_store_error("create record")),
        }
    }

    fn delete_record(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<(), StoreError> {
        let not_found = || StoreError::RecordNotFound {
            name: fqdn(name),
            record_type,
        };

        // DELETE must echo the exact current set
        let current = self.get_record(zone, name, record_type)?.ok_or_else(not_found)?;

        match self.change(zone, "DELETE", &ResourceRecordSetXml::from(&current)) {
            Ok(()) => Ok(()),
            Err(HttpOrFault::Store(e)) => Err(e),
            Err(HttpOrFault::Fault(fault)) if fault.is_missing_record_set() => Err(not_found()),
            Err(HttpOrFault::Fault(fault)) => Err(fault.into_store_error("delete record")),
        }
    }
}

#[cfg(test)]
#[path = "route53_tests.rs"]
mod route53_tests;
