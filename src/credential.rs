use anyhow::{Context, Result};
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_identity::AzureCliCredential;
use std::sync::Arc;

/// Source of bearer tokens for Azure Resource Manager.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self, scope: &str) -> Result<String>;
}

/// Tokens from the signed-in Azure CLI account (`az login`).
pub struct AzureCliTokenProvider {
    credential: Arc<AzureCliCredential>,
}

impl AzureCliTokenProvider {
    pub fn new() -> Result<Self> {
        let credential = AzureCliCredential::new(None).context("error creating az cli client")?;
        Ok(Self { credential })
    }
}

#[async_trait]
impl TokenProvider for AzureCliTokenProvider {
    async fn token(&self, scope: &str) -> Result<String> {
        let token = self
            .credential
            .get_token(&[scope], None)
            .await
            .context("az cli did not return an access token")?;
        Ok(token.token.secret().to_string())
    }
}

/// Fixed token, for tests and for hosts that inject a token out of band.
pub struct StaticTokenProvider(pub String);

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self, _scope: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}
