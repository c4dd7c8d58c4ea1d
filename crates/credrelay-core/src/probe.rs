// ── Credential probe seam ──

use async_trait::async_trait;
use credrelay_api::{ProbeClient, ProbeOutcome};
use secrecy::SecretString;

use crate::model::RemoteSite;

/// Checks credentials against one remote site.
///
/// `ProbeClient` is the production implementation; tests substitute
/// scripted probes.
#[async_trait]
pub trait CredentialProbe: Send + Sync {
    async fn probe(
        &self,
        site: &RemoteSite,
        identifier: &str,
        password: &SecretString,
    ) -> ProbeOutcome;
}

#[async_trait]
impl CredentialProbe for ProbeClient {
    async fn probe(
        &self,
        site: &RemoteSite,
        identifier: &str,
        password: &SecretString,
    ) -> ProbeOutcome {
        ProbeClient::probe(self, site.as_str(), identifier, password).await
    }
}
