use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use s3sign_core::{Context, ProvideCredential, Result};

use crate::{Config, Credential};

/// ConfigCredentialProvider hands out the credential carried by a [`Config`].
///
/// A config without both keys provides nothing, so requests go out unsigned.
#[derive(Debug, Clone)]
pub struct ConfigCredentialProvider {
    config: Arc<Config>,
}

impl ConfigCredentialProvider {
    /// Create a new ConfigCredentialProvider.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProvideCredential for ConfigCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        match self.config.credential() {
            Ok(cred) => Ok(Some(cred)),
            Err(err) => {
                debug!("config carries no usable credential: {err}");
                Ok(None)
            }
        }
    }
}
