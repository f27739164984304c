// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! OAuth 2.0 authorization URLs and token endpoints.

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::NylasClient;
use crate::error::{Error, ResultExt};
use crate::request::{QueryMap, QueryParams, Request, put};
use crate::resources::Grant;
use crate::response::Response;

const AUTH_PATH: &str = "/v3/connect/auth";
const TOKEN_PATH: &str = "/v3/connect/token";
const REVOKE_PATH: &str = "/v3/connect/revoke";
const TOKEN_INFO_PATH: &str = "/v3/connect/tokeninfo";
const CUSTOM_AUTH_PATH: &str = "/v3/connect/custom";
const DETECT_PROVIDER_PATH: &str = "/v3/providers/detect";

/// Parameters of the hosted authorization URL.
///
/// Empty strings are left out of the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthUrlConfig {
    /// Application client id.
    pub client_id: String,
    /// Where the user is sent after authorizing.
    pub redirect_uri: String,
    /// Provider to authenticate with, e.g. `google`.
    pub provider: String,
    /// Requested scopes, sent space-joined.
    pub scope: Vec<String>,
    /// Prompt behaviour of the hosted page.
    pub prompt: String,
    /// Opaque value echoed back on the redirect.
    pub state: String,
    /// Email address to prefill.
    pub login_hint: String,
    /// `online` or `offline`.
    pub access_type: String,
    /// Ask the provider to keep previously granted scopes.
    pub include_grant_scopes: bool,
    /// Defaults to `code`.
    pub response_type: String,
}

/// Parameters of the admin-consent URL for Microsoft tenants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminConsentUrlConfig {
    /// Application client id.
    pub client_id: String,
    /// Where the admin is sent after consenting.
    pub redirect_uri: String,
    /// Connector credential holding the tenant settings.
    pub credential_id: String,
    /// Provider, usually `microsoft`.
    pub provider: String,
    /// Requested scopes, sent space-joined.
    pub scope: Vec<String>,
    /// Prompt behaviour of the hosted page.
    pub prompt: String,
    /// Opaque value echoed back on the redirect.
    pub state: String,
    /// Email address to prefill.
    pub login_hint: String,
}

/// Authorization URL carrying a PKCE challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceAuthUrl {
    /// URL to send the user to.
    pub url: String,
    /// Verifier to present as `code_verifier` when exchanging the code.
    pub secret: String,
    /// Challenge sent in the URL.
    pub secret_hash: String,
}

/// Exchange of an authorization code for tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeExchangeRequest {
    /// Redirect URI used for the authorization request.
    pub redirect_uri: String,
    /// Code received on the redirect.
    pub code: String,
    /// Application client id.
    pub client_id: String,
    /// Client secret; the API key is used when empty.
    pub client_secret: String,
    /// PKCE verifier, when the URL was built with a challenge.
    pub code_verifier: String,
}

/// Exchange of a refresh token for a new access token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenExchangeRequest {
    /// Redirect URI used for the authorization request.
    pub redirect_uri: String,
    /// Refresh token issued by a previous exchange.
    pub refresh_token: String,
    /// Application client id.
    pub client_id: String,
    /// Client secret; the API key is used when empty.
    pub client_secret: String,
}

#[derive(Debug, Serialize)]
struct TokenRequestBody<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_verifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

/// Tokens issued by the token endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
    /// Access token for the grant.
    pub access_token: String,
    /// Refresh token, present for offline access.
    pub refresh_token: Option<String>,
    /// OpenID Connect id token.
    pub id_token: Option<String>,
    /// Grant created or refreshed by the exchange.
    pub grant_id: String,
    /// Granted scopes, space separated.
    pub scope: String,
    /// Token type, normally `Bearer`.
    pub token_type: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    /// Email address of the authenticated user.
    pub email: Option<String>,
    /// Provider of the grant.
    pub provider: Option<String>,
}

/// Claims of an id or access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenInfo {
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Subject.
    pub sub: String,
    /// Email address of the subject.
    pub email: Option<String>,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

/// Creates a grant from provider credentials without the hosted flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomAuthenticationRequest {
    /// Provider of the account, e.g. `imap`.
    pub provider: String,
    /// Provider-specific settings.
    pub settings: serde_json::Map<String, serde_json::Value>,
    /// Opaque value stored on the grant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Requested scopes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<String>,
}

/// Lookup of the provider hosting an email address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderDetectRequest {
    /// Address to look up.
    pub email: String,
    /// Application client id.
    pub client_id: String,
    /// Also report IMAP providers.
    pub all_provider_types: bool,
}

impl QueryParams for ProviderDetectRequest {
    fn values(&self) -> QueryMap {
        let mut map = QueryMap::new();
        put(&mut map, "email", Some(&self.email));
        put(&mut map, "client_id", Some(&self.client_id));
        put(&mut map, "all_provider_types", self.all_provider_types.then_some(true));
        map
    }
}

/// Result of a provider lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderDetectResponse {
    /// The address looked up.
    pub email_address: String,
    /// Whether a provider was found.
    pub detected: bool,
    /// Detected provider.
    pub provider: Option<String>,
    /// Provider type, e.g. `imap`.
    #[serde(rename = "type")]
    pub provider_type: Option<String>,
}

/// OAuth helpers bound to a client.
#[derive(Debug, Clone, Copy)]
pub struct Auth<'a> {
    client: &'a NylasClient,
}

impl<'a> Auth<'a> {
    pub(crate) const fn new(client: &'a NylasClient) -> Self {
        Self { client }
    }

    /// Builds the hosted authorization URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the endpoint base is not a valid URL.
    pub fn url_for_oauth2(&self, config: &AuthUrlConfig) -> Result<String, Error> {
        let mut url = self.auth_url()?;
        append_auth_params(&mut url, config, &[]);
        Ok(url.into())
    }

    /// Builds the hosted authorization URL with a fresh PKCE challenge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the endpoint base is not a valid URL.
    pub fn url_for_oauth2_pkce(&self, config: &AuthUrlConfig) -> Result<PkceAuthUrl, Error> {
        let secret = uuid::Uuid::new_v4().to_string();
        let secret_hash = code_challenge(&secret);

        let mut url = self.auth_url()?;
        append_auth_params(
            &mut url,
            config,
            &[
                ("code_challenge", secret_hash.as_str()),
                ("code_challenge_method", "s256"),
            ],
        );

        Ok(PkceAuthUrl {
            url: url.into(),
            secret,
            secret_hash,
        })
    }

    /// Builds the admin-consent URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the endpoint base is not a valid URL.
    pub fn url_for_admin_consent(&self, config: &AdminConsentUrlConfig) -> Result<String, Error> {
        let auth = AuthUrlConfig {
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            provider: config.provider.clone(),
            scope: config.scope.clone(),
            prompt: config.prompt.clone(),
            state: config.state.clone(),
            login_hint: config.login_hint.clone(),
            response_type: "adminconsent".to_string(),
            ..AuthUrlConfig::default()
        };

        let mut url = self.auth_url()?;
        append_auth_params(
            &mut url,
            &auth,
            &[("credential_id", config.credential_id.as_str())],
        );
        Ok(url.into())
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    pub async fn exchange_code_for_token(
        &self,
        ctx: &CancellationToken,
        req: &CodeExchangeRequest,
    ) -> Result<TokenResponse, Error> {
        let body = TokenRequestBody {
            grant_type: "authorization_code",
            client_id: &req.client_id,
            client_secret: self.secret_or_key(&req.client_secret),
            redirect_uri: &req.redirect_uri,
            code: Some(&req.code),
            code_verifier: Some(req.code_verifier.as_str()).filter(|v| !v.is_empty()),
            refresh_token: None,
        };
        self.token(ctx, &body)
            .await
            .with_context(|| "auth.exchange_code_for_token".to_string())
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    pub async fn refresh_access_token(
        &self,
        ctx: &CancellationToken,
        req: &TokenExchangeRequest,
    ) -> Result<TokenResponse, Error> {
        let body = TokenRequestBody {
            grant_type: "refresh_token",
            client_id: &req.client_id,
            client_secret: self.secret_or_key(&req.client_secret),
            redirect_uri: &req.redirect_uri,
            code: None,
            code_verifier: None,
            refresh_token: Some(&req.refresh_token),
        };
        self.token(ctx, &body)
            .await
            .with_context(|| "auth.refresh_access_token".to_string())
    }

    /// Revokes an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn revoke(&self, ctx: &CancellationToken, token: &str) -> Result<(), Error> {
        let req = Request::post(REVOKE_PATH).query_pair("token", token);
        self.client
            .execute_discard(ctx, &req)
            .await
            .with_context(|| "auth.revoke".to_string())
    }

    /// Returns the claims of an id token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    pub async fn id_token_info(
        &self,
        ctx: &CancellationToken,
        id_token: &str,
    ) -> Result<Response<TokenInfo>, Error> {
        self.token_info(ctx, "id_token", id_token)
            .await
            .with_context(|| "auth.id_token_info".to_string())
    }

    /// Returns the claims of an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    pub async fn access_token_info(
        &self,
        ctx: &CancellationToken,
        access_token: &str,
    ) -> Result<Response<TokenInfo>, Error> {
        self.token_info(ctx, "access_token", access_token)
            .await
            .with_context(|| "auth.access_token_info".to_string())
    }

    /// Creates a grant from provider credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    pub async fn custom_authentication(
        &self,
        ctx: &CancellationToken,
        req: &CustomAuthenticationRequest,
    ) -> Result<Response<Grant>, Error> {
        let result = async {
            let request = Request::post(CUSTOM_AUTH_PATH).json(req)?;
            self.client.execute(ctx, &request).await
        };
        result
            .await
            .with_context(|| format!("auth.custom_authentication({})", req.provider))
    }

    /// Detects the provider of an email address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    pub async fn detect_provider(
        &self,
        ctx: &CancellationToken,
        req: &ProviderDetectRequest,
    ) -> Result<Response<ProviderDetectResponse>, Error> {
        let request = Request::post(DETECT_PROVIDER_PATH).query(req);
        self.client
            .execute(ctx, &request)
            .await
            .with_context(|| format!("auth.detect_provider({})", req.email))
    }

    fn auth_url(&self) -> Result<Url, Error> {
        let raw = format!("{}{AUTH_PATH}", self.client.base_url());
        Url::parse(&raw).map_err(|source| Error::InvalidUrl { url: raw, source })
    }

    fn secret_or_key<'s>(&'s self, secret: &'s str) -> &'s str {
        if secret.is_empty() {
            self.client.api_key()
        } else {
            secret
        }
    }

    async fn token(
        &self,
        ctx: &CancellationToken,
        body: &TokenRequestBody<'_>,
    ) -> Result<TokenResponse, Error> {
        let request = Request::post(TOKEN_PATH).json(body)?;
        self.client.execute_raw(ctx, &request).await
    }

    async fn token_info(
        &self,
        ctx: &CancellationToken,
        key: &str,
        token: &str,
    ) -> Result<Response<TokenInfo>, Error> {
        let request = Request::get(TOKEN_INFO_PATH).query_pair(key, token);
        self.client.execute(ctx, &request).await
    }
}

/// Appends the authorization parameters in a fixed order, then `extra`.
fn append_auth_params(url: &mut Url, config: &AuthUrlConfig, extra: &[(&str, &str)]) {
    let scope = config.scope.join(" ");
    let response_type = if config.response_type.is_empty() {
        "code"
    } else {
        config.response_type.as_str()
    };

    let params = [
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("provider", config.provider.as_str()),
        ("scope", scope.as_str()),
        ("prompt", config.prompt.as_str()),
        ("state", config.state.as_str()),
        ("login_hint", config.login_hint.as_str()),
        ("access_type", config.access_type.as_str()),
        (
            "include_grant_scopes",
            if config.include_grant_scopes { "true" } else { "" },
        ),
        ("response_type", response_type),
    ];

    let mut pairs = url.query_pairs_mut();
    for (key, value) in params.iter().chain(extra) {
        if !value.is_empty() {
            pairs.append_pair(key, value);
        }
    }
}

/// Base64 (unpadded) of the hex SHA-256 digest of `secret`.
fn code_challenge(secret: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(secret.as_bytes()));
    STANDARD_NO_PAD.encode(digest)
}
