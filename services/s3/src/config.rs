use std::fmt::{Debug, Formatter};
use std::num::NonZeroU64;

use s3sign_core::utils::Redact;
use s3sign_core::{Context, Error, Result};

use crate::constants::*;
use crate::{AddressingStyle, Credential, Endpoint};

/// TLS knobs handed to the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SslOptions {
    /// Skip certificate verification. Only meant for local test servers.
    pub accept_invalid_certs: bool,
}

/// Config carries everything a client needs to sign and send requests.
///
/// A config is built once and only read afterwards: every `with_*` method
/// consumes it and returns a new value.
#[derive(Clone, Default)]
pub struct Config {
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: `AWS_ACCESS_KEY_ID`
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: `AWS_SECRET_ACCESS_KEY`
    pub secret_access_key: Option<String>,
    /// `session_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: `AWS_SESSION_TOKEN`
    pub session_token: Option<String>,
    /// Normalized endpoint, overridden by env value `S3SIGN_ENDPOINT`.
    pub endpoint: Endpoint,
    /// Bucket addressing, overridden by env value `S3SIGN_ADDRESSING_STYLE`.
    pub addressing_style: AddressingStyle,
    /// Region used by SigV4 presigning, loaded from env value `AWS_REGION`
    /// when unset. Falls back to `us-east-1`.
    pub region: Option<String>,
    /// TLS options for the transport.
    pub ssl_options: SslOptions,
    /// Window size in seconds used to align presigned urls.
    ///
    /// `None` signs with the current time.
    pub expiration_window: Option<NonZeroU64>,
}

impl Config {
    /// Create a config for the given endpoint.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Default::default()
        }
    }

    /// Set access_key_id and secret_access_key.
    pub fn with_credential(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Set session_token.
    pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
        self.session_token = Some(session_token.into());
        self
    }

    /// Set endpoint.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Set addressing style.
    pub fn with_addressing_style(mut self, style: AddressingStyle) -> Self {
        self.addressing_style = style;
        self
    }

    /// Set region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set ssl options.
    pub fn with_ssl_options(mut self, ssl_options: SslOptions) -> Self {
        self.ssl_options = ssl_options;
        self
    }

    /// Align presigned urls to windows of `secs` seconds.
    pub fn with_expiration_window(mut self, secs: NonZeroU64) -> Self {
        self.expiration_window = Some(secs);
        self
    }

    /// Load config from env.
    ///
    /// Credentials and region only fill fields that are still unset.
    /// Endpoint and addressing style are replaced when the env has them.
    pub fn from_env(mut self, ctx: &Context) -> Result<Self> {
        if let Some(v) = ctx.env_var(AWS_ACCESS_KEY_ID) {
            self.access_key_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(AWS_SECRET_ACCESS_KEY) {
            self.secret_access_key.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(AWS_SESSION_TOKEN) {
            self.session_token.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(AWS_REGION) {
            self.region.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(S3SIGN_ENDPOINT) {
            self.endpoint =
                Endpoint::parse(&v).map_err(|e| e.with_context(format!("env: {S3SIGN_ENDPOINT}")))?;
        }
        if let Some(v) = ctx.env_var(S3SIGN_ADDRESSING_STYLE) {
            self.addressing_style = v
                .parse()
                .map_err(|e: Error| e.with_context(format!("env: {S3SIGN_ADDRESSING_STYLE}")))?;
        }

        Ok(self)
    }

    /// Region to sign with.
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    /// Build the credential carried by this config.
    pub fn credential(&self) -> Result<Credential> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(ak), Some(sk)) if !ak.is_empty() && !sk.is_empty() => Ok(Credential {
                access_key_id: ak.clone(),
                secret_access_key: sk.clone(),
                session_token: self.session_token.clone(),
                expires_in: None,
            }),
            _ => Err(Error::credential_invalid(
                "access_key_id and secret_access_key must both be set",
            )),
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_key_id", &self.access_key_id.as_ref().map(Redact::from))
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(Redact::from),
            )
            .field("session_token", &self.session_token.as_ref().map(Redact::from))
            .field("endpoint", &self.endpoint)
            .field("addressing_style", &self.addressing_style)
            .field("region", &self.region)
            .field("ssl_options", &self.ssl_options)
            .field("expiration_window", &self.expiration_window)
            .finish()
    }
}
