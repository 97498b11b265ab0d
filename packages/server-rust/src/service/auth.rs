//! Caller identity providers feeding the envelope's `authContext`.

use std::sync::Arc;

use http::header::{HeaderName, AUTHORIZATION};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, warn};

use super::config::AuthConfig;
use super::operation::ActionRequest;
use crate::traits::AuthContextProvider;

/// Trusts a header set by an authenticating proxy in front of the server.
#[derive(Debug, Clone)]
pub struct RemoteUserHeader {
    header: HeaderName,
}

impl RemoteUserHeader {
    #[must_use]
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }

    /// Returns `None` when `header` is not a valid header name.
    #[must_use]
    pub fn parse(header: &str) -> Option<Self> {
        HeaderName::from_bytes(header.as_bytes()).ok().map(Self::new)
    }
}

impl AuthContextProvider for RemoteUserHeader {
    fn caller_id(&self, request: &ActionRequest) -> Option<String> {
        let value = request.headers.get(&self.header)?.to_str().ok()?.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Reads the `sub` claim of an HS256 bearer token. Invalid tokens read as
/// anonymous; nothing is rejected here.
pub struct JwtAuthProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAuthProvider {
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl AuthContextProvider for JwtAuthProvider {
    fn caller_id(&self, request: &ActionRequest) -> Option<String> {
        let header = request.headers.get(AUTHORIZATION)?.to_str().ok()?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))?
            .trim();
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => Some(data.claims.sub),
            Err(err) => {
                debug!(error = %err, "Ignoring invalid bearer token");
                None
            }
        }
    }
}

/// First provider that knows the caller wins.
#[derive(Clone, Default)]
pub struct ChainedAuthProvider {
    providers: Vec<Arc<dyn AuthContextProvider>>,
}

impl ChainedAuthProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, provider: Arc<dyn AuthContextProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl AuthContextProvider for ChainedAuthProvider {
    fn caller_id(&self, request: &ActionRequest) -> Option<String> {
        self.providers
            .iter()
            .find_map(|provider| provider.caller_id(request))
    }
}

/// Bearer tokens first, then the proxy header. With neither configured every
/// caller is anonymous.
#[must_use]
pub fn build_auth_provider(config: &AuthConfig) -> Arc<dyn AuthContextProvider> {
    let mut chain = ChainedAuthProvider::new();
    if let Some(secret) = config.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
        chain = chain.with(Arc::new(JwtAuthProvider::new(secret.as_bytes())));
    }
    if let Some(header) = config.remote_user_header.as_deref() {
        match RemoteUserHeader::parse(header) {
            Some(provider) => chain = chain.with(Arc::new(provider)),
            None => warn!(header, "Ignoring invalid remote user header name"),
        }
    }
    Arc::new(chain)
}

#[cfg(test)]
mod tests {
    use actiongate_core::HttpMethod;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
    }

    fn token(sub: &str, secret: &[u8]) -> String {
        encode(
            &Header::default(),
            &TestClaims { sub: sub.into() },
            &EncodingKey::from_secret(secret),
        )
        .expect("failed to encode test JWT")
    }

    fn request() -> ActionRequest {
        ActionRequest::new(HttpMethod::Get, "/apps/m/bin/x.action")
    }

    #[test]
    fn remote_user_header_reads_trimmed_value() {
        let provider = RemoteUserHeader::new(HeaderName::from_static("x-remote-user"));
        assert_eq!(provider.caller_id(&request()), None);
        assert_eq!(
            provider.caller_id(&request().with_header("X-Remote-User", " alice ")),
            Some("alice".to_string())
        );
        assert_eq!(provider.caller_id(&request().with_header("x-remote-user", "  ")), None);
    }

    #[test]
    fn jwt_provider_reads_subject() {
        let provider = JwtAuthProvider::new(SECRET);
        let bearer = format!("Bearer {}", token("bob", SECRET));
        assert_eq!(
            provider.caller_id(&request().with_header("authorization", &bearer)),
            Some("bob".to_string())
        );
    }

    #[test]
    fn jwt_provider_ignores_bad_tokens() {
        let provider = JwtAuthProvider::new(SECRET);
        let forged = format!("Bearer {}", token("mallory", b"other-secret"));
        assert_eq!(provider.caller_id(&request().with_header("authorization", &forged)), None);
        assert_eq!(
            provider.caller_id(&request().with_header("authorization", "Basic Ym9iOnB3")),
            None
        );
    }

    #[test]
    fn chain_returns_first_known_caller() {
        let chain = ChainedAuthProvider::new()
            .with(Arc::new(RemoteUserHeader::new(HeaderName::from_static("x-first"))))
            .with(Arc::new(RemoteUserHeader::new(HeaderName::from_static("x-second"))));
        assert_eq!(chain.len(), 2);

        let both = request().with_header("x-first", "one").with_header("x-second", "two");
        assert_eq!(chain.caller_id(&both), Some("one".to_string()));

        let second_only = request().with_header("x-second", "two");
        assert_eq!(chain.caller_id(&second_only), Some("two".to_string()));
    }

    #[test]
    fn build_auth_provider_combines_configured_sources() {
        let config = AuthConfig {
            remote_user_header: Some("x-remote-user".to_string()),
            jwt_secret: Some("test-secret".to_string()),
        };
        let provider = build_auth_provider(&config);
        let bearer = format!("Bearer {}", token("bob", SECRET));

        let both = request()
            .with_header("authorization", &bearer)
            .with_header("x-remote-user", "proxy-user");
        assert_eq!(provider.caller_id(&both), Some("bob".to_string()));
        assert_eq!(
            provider.caller_id(&request().with_header("x-remote-user", "proxy-user")),
            Some("proxy-user".to_string())
        );
    }

    #[test]
    fn nothing_configured_is_anonymous() {
        let provider = build_auth_provider(&AuthConfig::default());
        assert_eq!(
            provider.caller_id(&request().with_header("x-remote-user", "someone")),
            None
        );
    }
}
