//! OAuth 2.0 for the Google Sheets API.
//!
//! The consent flow is the installed-application flow: we print Google's consent URL, listen on
//! `localhost:3030` for the redirect, and exchange the authorization code (with PKCE) for tokens
//! which are then saved to `token.json`. Later runs load `token.json` and refresh the access token
//! when it is about to expire, without any browser interaction.

use crate::api::files::{File, SecretFile, TokenFile};
use crate::api::OAUTH_SCOPES;
use crate::error::Res;
use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Duration, Utc};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

const OAUTH_CALLBACK_PORT: u16 = 3030;

/// How long we wait for the user to finish the consent screen.
const CONSENT_TIMEOUT_SECONDS: u64 = 300;

/// Used when Google does not tell us how long an access token lives.
const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

type GoogleClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Provides a valid access token, refreshing it and saving it to `token.json` when it expires.
#[derive(Debug, Clone)]
pub(crate) struct TokenProvider {
    secret: SecretFile,
    token: File<TokenFile>,
}

impl TokenProvider {
    /// Runs the interactive consent flow and saves the resulting tokens to `token_path`. This is
    /// the only place where the user is asked to visit Google in a browser.
    pub(crate) async fn initialize(
        secret_path: impl Into<PathBuf>,
        token_path: impl Into<PathBuf>,
    ) -> Res<Self> {
        let secret = SecretFile::load(&secret_path.into()).await?;
        let token_path = token_path.into();
        let client = google_client(&secret)?;
        let http = http_client()?;

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, csrf_token) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(OAUTH_SCOPES.iter().map(|s| Scope::new(s.to_string())))
            // Without these Google will not send a refresh token.
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        let listener = TcpListener::bind(("127.0.0.1", OAUTH_CALLBACK_PORT))
            .await
            .with_context(|| format!("Unable to listen on localhost:{OAUTH_CALLBACK_PORT}"))?;
        info!("Open this URL in your browser to authorize access to your sheet:\n\n{auth_url}\n");
        info!("Waiting for the callback on http://localhost:{OAUTH_CALLBACK_PORT}");

        let callback = wait_for_callback(listener).await?;
        if callback.state != *csrf_token.secret() {
            bail!("The OAuth callback state did not match, the authorization was not completed");
        }

        let response = client
            .exchange_code(AuthorizationCode::new(callback.code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http)
            .await
            .context("Failed to exchange the authorization code for tokens")?;

        let refresh_token = response
            .refresh_token()
            .map(|t| t.secret().to_string())
            .context("Google did not return a refresh token")?;
        let scopes = match response.scopes() {
            Some(scopes) => scopes.iter().map(|s| s.to_string()).collect(),
            None => OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
        };
        let token = TokenFile::new(
            scopes,
            response.access_token().secret().to_string(),
            refresh_token,
            expires_at(response.expires_in()),
        );
        let token = File::new(token_path, token);
        token.save().await?;
        info!("Authorization successful, tokens saved to {}", token.path().display());
        Ok(Self { secret, token })
    }

    /// Loads existing tokens. Never opens a browser.
    pub(crate) async fn load(
        secret_path: impl Into<PathBuf>,
        token_path: impl Into<PathBuf>,
    ) -> Res<Self> {
        let secret = SecretFile::load(&secret_path.into()).await?;
        let token = TokenFile::load(token_path.into()).await?;
        Ok(Self { secret, token })
    }

    /// Returns the access token, refreshing it first if it is about to expire.
    pub(crate) async fn token_with_refresh(&mut self) -> Res<&str> {
        if self.token.data().is_expired() {
            self.refresh().await?;
        }
        Ok(self.token())
    }

    /// Exchanges the refresh token for a new access token and saves it.
    pub(crate) async fn refresh(&mut self) -> Res<()> {
        debug!("Refreshing the OAuth access token");
        let client = google_client(&self.secret)?;
        let http = http_client()?;
        let refresh_token = RefreshToken::new(self.token.data().refresh_token().to_string());
        let response = client
            .exchange_refresh_token(&refresh_token)
            .request_async(&http)
            .await
            .context("Failed to refresh the OAuth access token")?;
        self.token.data_mut().update(
            response.access_token().secret().to_string(),
            expires_at(response.expires_in()),
            response.refresh_token().map(|t| t.secret().to_string()),
        );
        self.token.save().await?;
        debug!("Token valid until {}", self.token.data().expires_at());
        Ok(())
    }

    /// The current access token, which may have expired.
    pub(crate) fn token(&self) -> &str {
        self.token.data().access_token()
    }
}

fn google_client(secret: &SecretFile) -> Res<GoogleClient> {
    Ok(BasicClient::new(ClientId::new(secret.client_id().to_string()))
        .set_client_secret(ClientSecret::new(secret.client_secret().to_string()))
        .set_auth_uri(AuthUrl::new(secret.auth_uri().to_string()).context("Invalid auth_uri")?)
        .set_token_uri(TokenUrl::new(secret.token_uri().to_string()).context("Invalid token_uri")?)
        .set_redirect_uri(
            RedirectUrl::new(format!("http://localhost:{OAUTH_CALLBACK_PORT}"))
                .context("Invalid redirect URL")?,
        ))
}

/// Following redirects from the token endpoint would be a security hole.
fn http_client() -> Res<reqwest::Client> {
    reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Unable to build the HTTP client")
}

fn expires_at(expires_in: Option<std::time::Duration>) -> DateTime<Utc> {
    let seconds = expires_in
        .and_then(|d| i64::try_from(d.as_secs()).ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECONDS);
    Utc::now() + Duration::seconds(seconds)
}

/// The query parameters that Google sends to the redirect URL.
#[derive(Debug, Clone, Eq, PartialEq)]
struct Callback {
    code: String,
    state: String,
}

type CallbackSender = Arc<Mutex<Option<oneshot::Sender<Res<Callback>>>>>;

/// Serves HTTP on `listener` until the first request that carries an authorization code or an
/// error arrives, then returns it.
async fn wait_for_callback(listener: TcpListener) -> Res<Callback> {
    let (tx, rx) = oneshot::channel();
    let tx: CallbackSender = Arc::new(Mutex::new(Some(tx)));

    let server = tokio::spawn(async move {
        loop {
            let stream = match listener.accept().await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!("Failed to accept a connection: {e}");
                    continue;
                }
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let tx = tx.clone();
                    async move { Ok::<_, Infallible>(handle_callback(req, &tx)) }
                });
                if let Err(e) = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await
                {
                    debug!("Callback connection error: {e}");
                }
            });
        }
    });

    let result = tokio::time::timeout(
        std::time::Duration::from_secs(CONSENT_TIMEOUT_SECONDS),
        rx,
    )
    .await;
    server.abort();
    result
        .context("Timed out waiting for the OAuth callback")?
        .context("The OAuth callback listener stopped unexpectedly")?
}

fn handle_callback(req: Request<Incoming>, tx: &CallbackSender) -> Response<String> {
    let parsed = match parse_callback_query(req.uri().query().unwrap_or_default()) {
        Some(parsed) => parsed,
        None => return respond(StatusCode::NOT_FOUND, "Not found"),
    };
    let body = match &parsed {
        Ok(_) => "Authorization complete. You can close this window.",
        Err(_) => "Authorization failed. Check the terminal for details.",
    };
    if let Ok(mut guard) = tx.lock() {
        if let Some(sender) = guard.take() {
            let _ = sender.send(parsed);
        }
    }
    respond(StatusCode::OK, body)
}

fn respond(status: StatusCode, body: &str) -> Response<String> {
    let mut response = Response::new(body.to_string());
    *response.status_mut() = status;
    response
}

/// Returns `None` for requests that are not the OAuth redirect, e.g. a browser asking for a
/// favicon.
fn parse_callback_query(query: &str) -> Option<Res<Callback>> {
    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }
    if let Some(error) = error {
        return Some(Err(anyhow!("Google returned an OAuth error: {error}")));
    }
    let code = code?;
    Some(Ok(Callback {
        code,
        state: state.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback_query() {
        let parsed = parse_callback_query("state=abc&code=4%2F0Ad&scope=x")
            .unwrap()
            .unwrap();
        assert_eq!(
            parsed,
            Callback {
                code: "4/0Ad".to_string(),
                state: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_parse_callback_query_error() {
        let err = parse_callback_query("error=access_denied&state=abc")
            .unwrap()
            .unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }

    #[test]
    fn test_parse_callback_query_unrelated() {
        assert!(parse_callback_query("").is_none());
        assert!(parse_callback_query("foo=bar").is_none());
    }

    #[test]
    fn test_expires_at_defaults_to_an_hour() {
        let at = expires_at(None);
        let diff = at - Utc::now();
        assert!(diff > Duration::minutes(59));
        assert!(diff <= Duration::minutes(60));
    }

    #[tokio::test]
    async fn test_wait_for_callback() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let waiter = tokio::spawn(wait_for_callback(listener));

        let client = reqwest::Client::new();
        let ignored = client
            .get(format!("http://127.0.0.1:{port}/favicon.ico"))
            .send()
            .await
            .unwrap();
        assert_eq!(ignored.status().as_u16(), 404);

        let ok = client
            .get(format!("http://127.0.0.1:{port}/?code=the-code&state=s1"))
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status().as_u16(), 200);

        let callback = waiter.await.unwrap().unwrap();
        assert_eq!(callback.code, "the-code");
        assert_eq!(callback.state, "s1");
    }
}
