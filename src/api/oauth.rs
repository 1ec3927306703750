//! OAuth 2.0 authentication flow implementation for the Google Sheets API.
//!
//! This module handles the complete OAuth workflow including:
//! - Loading OAuth credentials from client_secret.json
//! - Running the consent flow (authorization code with PKCE) with a local callback server
//! - Managing access and refresh tokens in token.json
//! - Refreshing the access token when it is about to expire

use crate::api::files::{ClientSecretFile, File, TokenFile};
use crate::api::OAUTH_SCOPES;
use crate::error::Res;
use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, info};

const OAUTH_CALLBACK_PORT: u16 = 3030;

/// Used when Google does not say how long the access token lasts.
const DEFAULT_EXPIRY_SECONDS: i64 = 3600;

type OAuthClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Holds the OAuth client and the persisted token, and hands out a valid access token.
pub(crate) struct TokenProvider {
    client: OAuthClient,
    http: oauth2::reqwest::Client,
    token: File<TokenFile>,
}

impl TokenProvider {
    /// Runs the consent flow: prints the Google consent URL, waits for the redirect on
    /// `http://localhost:3030`, exchanges the code for tokens and saves them to `token_path`.
    ///
    /// This is the only place where the user is asked to authorize in a browser.
    pub(crate) async fn initialize(
        secret_path: impl AsRef<Path>,
        token_path: impl AsRef<Path>,
    ) -> Res<Self> {
        let secret = ClientSecretFile::load(secret_path.as_ref()).await?;
        let client = oauth_client(&secret)?;
        let http = http_client()?;

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, csrf) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(OAUTH_SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        info!("Open this URL in your browser to authorize byeboros:\n\n{auth_url}\n");
        info!("Waiting for the redirect on http://localhost:{OAUTH_CALLBACK_PORT}");
        let code = receive_code(&csrf).await?;

        let response = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http)
            .await
            .map_err(|e| anyhow!("Unable to exchange the authorization code for a token: {e}"))?;

        let refresh_token = response
            .refresh_token()
            .map(|t| t.secret().clone())
            .context("Google did not return a refresh token")?;
        let scopes = match response.scopes() {
            Some(scopes) => scopes.iter().map(|s| s.to_string()).collect(),
            None => OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
        };
        let token = TokenFile::new(
            scopes,
            response.access_token().secret().clone(),
            refresh_token,
            expires_at(&response),
        );
        let token = File::new(token_path.as_ref(), token);
        token.save().await?;
        info!("Authorization successful, tokens saved to {}", token.path().display());

        Ok(Self {
            client,
            http,
            token,
        })
    }

    /// Loads existing credentials and tokens without any user interaction.
    pub(crate) async fn load(
        secret_path: impl AsRef<Path>,
        token_path: impl AsRef<Path>,
    ) -> Res<Self> {
        let secret = ClientSecretFile::load(secret_path.as_ref()).await?;
        let client = oauth_client(&secret)?;
        let token = TokenFile::load(token_path.as_ref()).await?;
        Ok(Self {
            client,
            http: http_client()?,
            token,
        })
    }

    /// Exchanges the refresh token for a new access token and saves it.
    pub(crate) async fn refresh(&mut self) -> Res<()> {
        debug!("Refreshing the OAuth access token");
        let refresh_token = RefreshToken::new(self.token.data().refresh_token().to_string());
        let response = self
            .client
            .exchange_refresh_token(&refresh_token)
            .request_async(&self.http)
            .await
            .map_err(|e| anyhow!("Unable to refresh the OAuth token: {e}"))?;
        let expires_at = expires_at(&response);
        self.token.data_mut().update(
            response.access_token().secret().clone(),
            expires_at,
            response.refresh_token().map(|t| t.secret().clone()),
        );
        self.token.save().await
    }

    /// The access token, refreshed first if it is about to expire.
    pub(crate) async fn token_with_refresh(&mut self) -> Res<&str> {
        if self.token.data().is_expired(Utc::now()) {
            self.refresh().await?;
        }
        Ok(self.token())
    }

    pub(crate) fn token(&self) -> &str {
        self.token.data().access_token()
    }
}

fn oauth_client(secret: &ClientSecretFile) -> Res<OAuthClient> {
    let redirect = format!("http://localhost:{OAUTH_CALLBACK_PORT}");
    Ok(BasicClient::new(ClientId::new(secret.client_id().to_string()))
        .set_client_secret(ClientSecret::new(secret.client_secret().to_string()))
        .set_auth_uri(AuthUrl::new(secret.auth_uri().to_string()).context("Bad auth_uri")?)
        .set_token_uri(TokenUrl::new(secret.token_uri().to_string()).context("Bad token_uri")?)
        .set_redirect_uri(RedirectUrl::new(redirect).context("Bad redirect URL")?))
}

fn http_client() -> Res<oauth2::reqwest::Client> {
    oauth2::reqwest::ClientBuilder::new()
        .redirect(oauth2::reqwest::redirect::Policy::none())
        .build()
        .context("Unable to build the HTTP client")
}

fn expires_at(response: &BasicTokenResponse) -> DateTime<Utc> {
    let seconds = response
        .expires_in()
        .and_then(|d| i64::try_from(d.as_secs()).ok())
        .unwrap_or(DEFAULT_EXPIRY_SECONDS);
    Utc::now() + chrono::Duration::seconds(seconds)
}

/// Serves `http://localhost:3030` until Google redirects the browser back with a code (or an
/// error). Other requests, like the browser asking for a favicon, get a 404.
async fn receive_code(csrf: &CsrfToken) -> Res<String> {
    let listener = TcpListener::bind(("127.0.0.1", OAUTH_CALLBACK_PORT))
        .await
        .with_context(|| format!("Unable to listen on port {OAUTH_CALLBACK_PORT}"))?;
    let captured: Arc<Mutex<Option<Res<String>>>> = Arc::new(Mutex::new(None));
    loop {
        let (stream, _) = listener
            .accept()
            .await
            .context("Failed to accept the OAuth callback connection")?;
        let io = TokioIo::new(stream);
        let expected_state = csrf.secret().clone();
        let service_captured = captured.clone();
        let service = service_fn(move |req: Request<Incoming>| {
            let expected_state = expected_state.clone();
            let captured = service_captured.clone();
            async move {
                let outcome = parse_callback(req.uri(), &expected_state);
                let (status, body) = match &outcome {
                    None => (StatusCode::NOT_FOUND, "Not found".to_string()),
                    Some(Ok(_)) => (
                        StatusCode::OK,
                        "byeboros is authorized. You can close this window.".to_string(),
                    ),
                    Some(Err(e)) => (StatusCode::BAD_REQUEST, format!("Authorization failed: {e}")),
                };
                if let Some(outcome) = outcome {
                    *captured.lock().await = Some(outcome);
                }
                Response::builder().status(status).body(body)
            }
        });
        if let Err(e) = http1::Builder::new()
            .keep_alive(false)
            .serve_connection(io, service)
            .await
        {
            debug!("OAuth callback connection error: {e}");
        }
        if let Some(result) = captured.lock().await.take() {
            return result;
        }
    }
}

/// Reads the redirect query. `None` means the request was not the redirect.
fn parse_callback(uri: &Uri, expected_state: &str) -> Option<Res<String>> {
    if uri.path() != "/" {
        return None;
    }
    let url = url::Url::parse(&format!("http://localhost{uri}")).ok()?;
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    if let Some(error) = params.get("error") {
        return Some(Err(anyhow!("Google returned an error: {error}")));
    }
    let code = params.get("code")?;
    match params.get("state") {
        Some(state) if state == expected_state => Some(Ok(code.clone())),
        _ => Some(Err(anyhow!("The OAuth state did not match, ignoring the redirect"))),
    }
}
