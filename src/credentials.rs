// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider credential resolution.
//!
//! An explicit key pair from the record spec always wins. Without one, the
//! AWS default credential chain is consulted: environment variables, shared
//! profile files, web identity tokens, the ECS container endpoint and finally
//! the EC2 instance role.

use aws_config::default_provider::credentials::DefaultCredentialsChain;
use aws_config::Region;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use std::fmt;
use tracing::{debug, info};

use crate::errors::StoreError;

/// Access key pair, plus a session token for temporary credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl AwsCredentials {
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }
}

impl From<Credentials> for AwsCredentials {
    fn from(credentials: Credentials) -> Self {
        Self {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().map(str::to_string),
        }
    }
}

/// Resolves credentials: explicit pair first, then the ambient provider.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    region: String,
    ambient: Option<SharedCredentialsProvider>,
}

impl CredentialResolver {
    /// Resolver whose ambient provider is the AWS default chain for `region`.
    #[must_use]
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            ambient: None,
        }
    }

    /// Replace the default chain with another ambient provider.
    #[must_use]
    pub fn with_provider(mut self, provider: impl ProvideCredentials + 'static) -> Self {
        self.ambient = Some(SharedCredentialsProvider::new(provider));
        self
    }

    /// Resolve the credentials to sign provider requests with.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Credentials`] when no source yields credentials.
    pub fn resolve(&self, explicit: Option<AwsCredentials>) -> Result<AwsCredentials, StoreError> {
        if let Some(credentials) = explicit {
            debug!(access_key_id = %credentials.access_key_id, "Using explicit credentials");
            return Ok(credentials);
        }

        info!("No credentials supplied, going to attempt ambient credentials and instance roles instead");
        self.from_ambient()
    }

    /// Ask the ambient provider for credentials.
    ///
    /// The provider is async; it runs to completion on a current-thread
    /// runtime owned by this call, so this must not be called from within
    /// another tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Credentials`] if the runtime cannot be started or
    /// the provider has no credentials to offer.
    pub fn from_ambient(&self) -> Result<AwsCredentials, StoreError> {
        let fail = |reason: String| StoreError::Credentials { reason };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| fail(format!("failed to start credential runtime: {e}")))?;

        let credentials = runtime
            .block_on(async {
                let provider = match &self.ambient {
                    Some(provider) => provider.clone(),
                    None => SharedCredentialsProvider::new(
                        DefaultCredentialsChain::builder()
                            .region(Region::new(self.region.clone()))
                            .build()
                            .await,
                    ),
                };
                provider.provide_credentials().await
            })
            .map_err(|e| fail(format!("no ambient credentials available: {e}")))?;

        debug!(
            access_key_id = %credentials.access_key_id(),
            "Using ambient credentials"
        );
        Ok(credentials.into())
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod credentials_tests;
