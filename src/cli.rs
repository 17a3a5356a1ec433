// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command line interface.
//!
//! ```text
//! recordkeeper create --file www.yaml
//! recordkeeper delete --file www.yaml --mock --mock-zone example.com=Z1
//! ```

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ProviderSettings, RecordSpec};
use crate::constants::{DEFAULT_DNS_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS, MOCK_ZONE_ID};
use crate::errors::ReconcileError;
use crate::reconciler::{Outcome, Reconciler};
use crate::record::DesiredRecord;
use crate::resolver::{parse_nameserver, RecordProbe};
use crate::store::{Zone, ZoneStore};

/// Reconcile a DNS record against its hosted zone
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(name = "recordkeeper")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the record, or bring it up to date
    Create(RunArgs),
    /// Delete the record
    Delete(RunArgs),
}

impl Command {
    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Self::Create(_) => Action::Create,
            Self::Delete(_) => Action::Delete,
        }
    }

    #[must_use]
    pub fn args(&self) -> &RunArgs {
        match self {
            Self::Create(args) | Self::Delete(args) => args,
        }
    }
}

/// Options shared by every action.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Record spec file (YAML or JSON)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Use the in-memory provider instead of Route53
    #[arg(long)]
    pub mock: bool,

    /// Hosted zone for the in-memory provider (repeatable)
    #[arg(long = "mock-zone", value_name = "DOMAIN[=ID]", value_parser = parse_mock_zone)]
    pub mock_zones: Vec<Zone>,

    /// Route53 API endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// AWS signing region
    #[arg(long)]
    pub region: Option<String>,

    /// Nameserver for live DNS checks (IP or IP:port)
    #[arg(long, value_parser = parse_nameserver_arg)]
    pub nameserver: Option<SocketAddr>,

    /// Live DNS query timeout in seconds
    #[arg(long, default_value_t = DEFAULT_DNS_TIMEOUT_SECS)]
    pub dns_timeout_secs: u64,

    /// Provider API timeout in seconds
    #[arg(long, default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    pub http_timeout_secs: u64,
}

impl RunArgs {
    /// Provider settings for `spec` with these options applied on top.
    #[must_use]
    pub fn settings(&self, spec: &RecordSpec) -> ProviderSettings {
        let mut settings = ProviderSettings::for_spec(spec);

        settings.mock |= self.mock;
        if !self.mock_zones.is_empty() {
            settings.mock_zones.clone_from(&self.mock_zones);
        }
        if let Some(endpoint) = &self.endpoint {
            settings.endpoint.clone_from(endpoint);
        }
        if let Some(region) = &self.region {
            settings.region.clone_from(region);
        }
        settings.nameserver = self.nameserver;
        settings.dns_timeout = Duration::from_secs(self.dns_timeout_secs);
        settings.http_timeout = Duration::from_secs(self.http_timeout_secs);

        settings
    }
}

/// The intent of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Delete,
}

impl Action {
    /// Run this action for `desired` to completion.
    ///
    /// # Errors
    ///
    /// Propagates any [`ReconcileError`] from the reconciler.
    pub fn apply<S: ZoneStore, P: RecordProbe>(
        self,
        reconciler: &Reconciler<S, P>,
        desired: DesiredRecord,
    ) -> Result<Outcome, ReconcileError> {
        let ctx = reconciler.load(desired);
        match self {
            Self::Create => reconciler.create(&ctx),
            Self::Delete => reconciler.delete(&ctx),
        }
    }
}

/// Parse `DOMAIN` or `DOMAIN=ID`.
///
/// # Errors
///
/// Returns a message if the domain or id is empty.
pub fn parse_mock_zone(value: &str) -> Result<Zone, String> {
    let (domain, id) = match value.split_once('=') {
        Some((domain, id)) => (domain.trim(), id.trim()),
        None => (value.trim(), MOCK_ZONE_ID),
    };
    if domain.is_empty() || id.is_empty() {
        return Err(format!("expected DOMAIN or DOMAIN=ID, got '{value}'"));
    }
    Ok(Zone::new(id, domain))
}

fn parse_nameserver_arg(value: &str) -> Result<SocketAddr, String> {
    parse_nameserver(value).ok_or_else(|| format!("expected IP or IP:port, got '{value}'"))
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod cli_tests;
