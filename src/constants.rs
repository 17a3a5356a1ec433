// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for recordkeeper.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Record Defaults
// ============================================================================

/// Default TTL for value records when the caller does not supply one (1 hour)
pub const DEFAULT_RECORD_TTL_SECS: u32 = 3600;

/// Default overwrite policy for divergent records
pub const DEFAULT_OVERWRITE: bool = true;

/// Zone id given to the synthesized zone of the mock provider
pub const MOCK_ZONE_ID: &str = "MOCKZONE";

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Standard DNS port for queries
pub const DNS_PORT: u16 = 53;

/// RR type code for SPF (RFC 4408), which has no named variant in hickory
pub const SPF_RR_TYPE_CODE: u16 = 99;

/// Resolver configuration consulted for the live-DNS nameserver
pub const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

/// Nameserver used when none is configured and resolv.conf has no entry
pub const FALLBACK_NAMESERVER: &str = "8.8.8.8:53";

/// Timeout for a single live DNS query (seconds)
pub const DEFAULT_DNS_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// Route53 API Constants
// ============================================================================

/// Public Route53 API endpoint
pub const ROUTE53_ENDPOINT: &str = "https://route53.amazonaws.com";

/// Route53 API version path segment
pub const ROUTE53_API_VERSION: &str = "2013-04-01";

/// XML namespace of the Route53 API
pub const ROUTE53_XML_NAMESPACE: &str = "https://route53.amazonaws.com/doc/2013-04-01/";

/// Service name used in the `SigV4` credential scope
pub const ROUTE53_SERVICE: &str = "route53";

/// Route53 is a global service signed against us-east-1
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Prefix Route53 puts on hosted zone ids
pub const HOSTED_ZONE_ID_PREFIX: &str = "/hostedzone/";

/// Timeout for a single provider API call (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Upper bound on `ListHostedZones` pages followed in one run
pub const MAX_ZONE_LIST_PAGES: usize = 100;

// ============================================================================
// Logging
// ============================================================================

/// Environment variable selecting the log output format (`text` or `json`)
pub const ENV_LOG_FORMAT: &str = "RUST_LOG_FORMAT";

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
