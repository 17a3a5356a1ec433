// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider HTTP error decoding.
//!
//! Route53 reports failures as XML bodies. Two shapes occur:
//!
//! ```xml
//! <ErrorResponse>
//!   <Error><Type>Sender</Type><Code>NoSuchHostedZone</Code><Message>No hosted zone found with ID: Z1</Message></Error>
//! </ErrorResponse>
//!
//! <InvalidChangeBatch>
//!   <Messages><Message>Tried to delete resource record set [...] but it was not found</Message></Messages>
//! </InvalidChangeBatch>
//! ```
//!
//! The first `<Message>` is surfaced verbatim to the caller, falling back to the
//! raw body when none is present.
//!
//! # Usage
//!
//! ```rust
//! use recordkeeper::http_errors::ProviderFault;
//!
//! let body = "<ErrorResponse><Error><Code>InvalidInput</Code><Message>bad TTL</Message></Error></ErrorResponse>";
//! let fault = ProviderFault::parse(400, body);
//! assert_eq!(fault.code.as_deref(), Some("InvalidInput"));
//! assert_eq!(fault.message, "bad TTL");
//! assert!(!fault.is_transient());
//! ```

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::errors::StoreError;

/// Error codes Route53 uses for conditions that clear on their own.
const TRANSIENT_ERROR_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "PriorRequestNotComplete",
    "ServiceUnavailable",
    "RequestExpired",
];

/// A decoded non-success provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFault {
    /// HTTP status code
    pub status: u16,
    /// Provider error code (`<Code>`), when present
    pub code: Option<String>,
    /// Provider error message (`<Message>`), or the raw body
    pub message: String,
}

impl ProviderFault {
    /// Decode an error response body.
    #[must_use]
    pub fn parse(status: u16, body: &str) -> Self {
        let message = first_element_text(body, "Message").unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {status} with empty body")
            } else {
                trimmed.to_string()
            }
        });

        Self {
            status,
            code: first_element_text(body, "Code"),
            message,
        }
    }

    /// Whether the fault is throttling or server-side trouble rather than a refusal.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.status >= 500
            || self.status == 429
            || self
                .code
                .as_deref()
                .is_some_and(|c| TRANSIENT_ERROR_CODES.contains(&c))
    }

    /// Whether the fault says the record set to delete does not exist.
    #[must_use]
    pub fn is_missing_record_set(&self) -> bool {
        self.message.contains("but it was not found")
    }

    /// Whether the fault says the hosted zone does not exist.
    #[must_use]
    pub fn is_missing_zone(&self) -> bool {
        self.code.as_deref() == Some("NoSuchHostedZone")
            || (self.status == 404 && self.code.is_none())
    }

    /// Convert into the store error for `operation`.
    #[must_use]
    pub fn into_store_error(self, operation: &str) -> StoreError {
        if self.is_transient() {
            StoreError::Transport {
                operation: operation.to_string(),
                reason: format!("HTTP {}: {}", self.status, self.message),
            }
        } else {
            StoreError::Rejected {
                operation: operation.to_string(),
                message: self.message,
            }
        }
    }
}

/// Text of the first element with the given local name, ignoring namespaces.
#[must_use]
pub fn first_element_text(xml: &str, element: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut inside = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                inside = e.local_name().as_ref() == element.as_bytes();
            }
            Ok(Event::Text(t)) if inside => {
                return t.unescape().ok().map(|s| s.into_owned());
            }
            Ok(Event::End(_)) => inside = false,
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

#[cfg(test)]
#[path = "http_errors_tests.rs"]
mod http_errors_tests;
