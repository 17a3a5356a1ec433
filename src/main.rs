// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::Parser;
use recordkeeper::{
    cli::{Action, Cli},
    config::{ProviderSettings, RecordSpec},
    constants::{DEFAULT_LOG_FILTER, ENV_LOG_FORMAT},
    credentials::CredentialResolver,
    reconciler::{Outcome, Reconciler},
    record::DesiredRecord,
    resolver::{DisabledProbe, DnsProbe},
    store::Route53ZoneStore,
};
use std::process::ExitCode;
use tracing::{debug, error, info};

fn main() -> ExitCode {
    initialize_logging();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Log format: timestamp file:line LEVEL message
///
/// `RUST_LOG` selects the filter (default `info`), `RUST_LOG_FORMAT=json`
/// switches to JSON lines.
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    let log_format = std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

fn run(cli: &Cli) -> Result<Outcome> {
    let action = cli.command.action();
    let args = cli.command.args();

    let spec = RecordSpec::from_file(&args.file)
        .with_context(|| format!("Failed to load record spec {}", args.file.display()))?;
    let desired = spec.desired_record()?;
    let settings = args.settings(&spec);

    debug!(
        "{:?} {} record {} (overwrite: {})",
        action, desired.record_type, desired.name, desired.overwrite
    );

    if settings.mock {
        return run_mock(action, desired, &settings);
    }

    let credentials = CredentialResolver::new(&settings.region)
        .resolve(spec.explicit_credentials())
        .context("Failed to obtain AWS credentials")?;
    let store = Route53ZoneStore::new(
        credentials,
        &settings.endpoint,
        &settings.region,
        settings.http_timeout,
    )?;
    let probe = match settings.nameserver {
        Some(nameserver) => DnsProbe::new(nameserver, settings.dns_timeout),
        None => DnsProbe::from_system(settings.dns_timeout),
    };
    debug!("Live DNS checks use nameserver {}", probe.nameserver());

    let reconciler = Reconciler::new(store, probe);
    Ok(action.apply(&reconciler, desired)?)
}

fn run_mock(action: Action, desired: DesiredRecord, settings: &ProviderSettings) -> Result<Outcome> {
    info!(
        "Using the in-memory provider with {} zone(s), no changes leave this process",
        settings.mock_zones.len()
    );
    let reconciler = Reconciler::new(settings.mock_store(), DisabledProbe);
    let outcome = action.apply(&reconciler, desired)?;

    for call in reconciler.store().mutations() {
        debug!("Mock provider received {:?}", call);
    }
    Ok(outcome)
}
