//! Bearer-token acquisition for the project API.
//!
//! [`DefaultCredential`] walks a fixed chain of sources and caches the first
//! token it obtains per scope. Individual sources can be excluded, which is how
//! the agent command forces interactive (CLI) resolution.

mod azure_cli;
mod environment;
mod managed_identity;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub use azure_cli::AzureCliCredential;
pub use environment::EnvironmentCredential;
pub use managed_identity::ManagedIdentityCredential;

/// Tokens this close to expiry are refreshed rather than reused.
const REFRESH_MARGIN_SECS: i64 = 300;

#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

impl AccessToken {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_on - Duration::seconds(REFRESH_MARGIN_SECS) > now
    }
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("{credential}: {reason}")]
    Unavailable {
        credential: &'static str,
        reason: String,
    },
    #[error("no credential source produced a token:\n  {}", .0.join("\n  "))]
    Exhausted(Vec<String>),
}

impl CredentialError {
    pub(crate) fn unavailable(credential: &'static str, reason: impl Into<String>) -> Self {
        CredentialError::Unavailable {
            credential,
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait TokenCredential: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError>;
}

/// A fixed bearer token, typically from `AZURE_ACCESS_TOKEN`.
#[derive(Clone)]
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var("AZURE_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(Self::new)
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    fn name(&self) -> &'static str {
        "StaticTokenCredential"
    }

    async fn get_token(&self, _scope: &str) -> Result<AccessToken, CredentialError> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_on: Utc::now() + Duration::hours(1),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultCredentialOptions {
    pub exclude_environment_credential: bool,
    pub exclude_managed_identity_credential: bool,
    pub exclude_cli_credential: bool,
}

pub struct DefaultCredential {
    sources: Vec<Box<dyn TokenCredential>>,
    cache: Mutex<HashMap<String, AccessToken>>,
}

impl DefaultCredential {
    pub fn new(options: DefaultCredentialOptions) -> Self {
        let mut sources: Vec<Box<dyn TokenCredential>> = Vec::new();
        if let Some(c) = StaticTokenCredential::from_env() {
            sources.push(Box::new(c));
        }
        if !options.exclude_environment_credential {
            sources.push(Box::new(EnvironmentCredential::from_env()));
        }
        if !options.exclude_managed_identity_credential {
            sources.push(Box::new(ManagedIdentityCredential::new()));
        }
        if !options.exclude_cli_credential {
            sources.push(Box::new(AzureCliCredential::new()));
        }
        debug!(?options, sources = sources.len(), "credential chain built");
        Self::with_sources(sources)
    }

    pub fn with_sources(sources: Vec<Box<dyn TokenCredential>>) -> Self {
        Self {
            sources,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl TokenCredential for DefaultCredential {
    fn name(&self) -> &'static str {
        "DefaultCredential"
    }

    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let mut cache = self.cache.lock().await;
        if let Some(tok) = cache.get(scope)
            && tok.is_fresh(Utc::now())
        {
            return Ok(tok.clone());
        }

        let mut reasons = Vec::new();
        for source in &self.sources {
            match source.get_token(scope).await {
                Ok(tok) => {
                    info!(credential = source.name(), expires_on=%tok.expires_on, "token acquired");
                    cache.insert(scope.to_string(), tok.clone());
                    return Ok(tok);
                }
                Err(e) => {
                    warn!(credential = source.name(), error=%e, "credential source failed");
                    reasons.push(e.to_string());
                }
            }
        }
        Err(CredentialError::Exhausted(reasons))
    }
}

/// `https://ai.azure.com/.default` -> `https://ai.azure.com`
pub(crate) fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: Arc<AtomicUsize>,
        result: Option<(String, i64)>,
    }

    #[async_trait]
    impl TokenCredential for Counting {
        fn name(&self) -> &'static str {
            "Counting"
        }

        async fn get_token(&self, _scope: &str) -> Result<AccessToken, CredentialError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Some((tok, secs)) => Ok(AccessToken {
                    token: tok.clone(),
                    expires_on: Utc::now() + Duration::seconds(*secs),
                }),
                None => Err(CredentialError::unavailable("Counting", "not configured")),
            }
        }
    }

    fn counting(result: Option<(&str, i64)>) -> (Box<dyn TokenCredential>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Counting {
            calls: calls.clone(),
            result: result.map(|(t, s)| (t.to_string(), s)),
        };
        (Box::new(c), calls)
    }

    #[tokio::test]
    async fn falls_through_to_next_source() {
        let (first, first_calls) = counting(None);
        let (second, second_calls) = counting(Some(("tok-2", 3600)));
        let chain = DefaultCredential::with_sources(vec![first, second]);
        let tok = chain.get_token("scope/.default").await.unwrap();
        assert_eq!(tok.token, "tok-2");
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn caches_fresh_tokens_per_scope() {
        let (src, calls) = counting(Some(("tok", 3600)));
        let chain = DefaultCredential::with_sources(vec![src]);
        chain.get_token("a/.default").await.unwrap();
        chain.get_token("a/.default").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        chain.get_token("b/.default").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refreshes_tokens_near_expiry() {
        let (src, calls) = counting(Some(("tok", 60)));
        let chain = DefaultCredential::with_sources(vec![src]);
        chain.get_token("a/.default").await.unwrap();
        chain.get_token("a/.default").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_chain_lists_every_reason() {
        let (a, _) = counting(None);
        let (b, _) = counting(None);
        let chain = DefaultCredential::with_sources(vec![a, b]);
        let err = chain.get_token("a/.default").await.unwrap_err();
        match err {
            CredentialError::Exhausted(reasons) => assert_eq!(reasons.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scope_maps_to_resource() {
        assert_eq!(
            scope_to_resource("https://ai.azure.com/.default"),
            "https://ai.azure.com"
        );
        assert_eq!(scope_to_resource("https://x"), "https://x");
    }
}
