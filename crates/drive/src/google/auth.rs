//! Google OAuth2 authentication for the Drive API
//!
//! Implements the installed-app authorization code flow. A local HTTP
//! listener receives the browser redirect; tokens are cached as JSON and
//! refreshed when they expire. Uses synchronous HTTP (ureq).

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::config::DriveCredentials;

/// Default token cache filename in the config directory
const TOKEN_FILE: &str = "drive-token.json";

/// Where the local OAuth callback listener binds, and where tokens are cached
#[derive(Debug, Clone)]
pub struct AuthOptions {
    pub host: String,
    /// 0 picks a random free port
    pub port: u16,
    /// Token cache file; defaults to ~/.config/drive-owner/drive-token.json
    pub token_path: Option<PathBuf>,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 65535,
            token_path: None,
        }
    }
}

/// OAuth2 configuration and token management for Drive
pub struct DriveAuth {
    credentials: DriveCredentials,
    options: AuthOptions,
    token_path: PathBuf,
    /// Token of the current run, kept even if caching it on disk failed
    current: Mutex<Option<StoredToken>>,
}

/// Stored token data
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
}

impl StoredToken {
    /// Valid for at least another five minutes
    fn is_fresh(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at > chrono::Utc::now().timestamp() + 300)
    }
}

/// Token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

impl From<TokenResponse> for StoredToken {
    fn from(token: TokenResponse) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token
                .expires_in
                .map(|d| chrono::Utc::now().timestamp() + d as i64),
        }
    }
}

impl DriveAuth {
    const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Full Drive access, required to create owner permissions
    const DRIVE_SCOPE: &'static str = "https://www.googleapis.com/auth/drive";

    pub fn new(credentials: DriveCredentials, options: AuthOptions) -> Result<Self> {
        let token_path = match &options.token_path {
            Some(path) => path.clone(),
            None => config::config_path(TOKEN_FILE).context("Could not determine config directory")?,
        };

        Ok(Self {
            credentials,
            options,
            token_path,
            current: Mutex::new(None),
        })
    }

    /// Get a valid access token, refreshing or re-authenticating as needed
    pub fn get_access_token(&self) -> Result<String> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| anyhow::anyhow!("Token cache lock poisoned"))?;

        if current.is_none() {
            *current = self.load_token().ok();
        }

        if let Some(token) = current.as_ref() {
            if token.is_fresh() {
                return Ok(token.access_token.clone());
            }

            if let Some(refresh_token) = token.refresh_token.clone() {
                match self.refresh_access_token(&refresh_token) {
                    Ok(refreshed) => {
                        debug!("Refreshed Drive access token");
                        let stored = StoredToken::from(refreshed);
                        self.save_token(&stored);
                        let access_token = stored.access_token.clone();
                        *current = Some(stored);
                        return Ok(access_token);
                    }
                    Err(e) => warn!("Token refresh failed, re-authenticating: {:#}", e),
                }
            }
        }

        let stored = StoredToken::from(self.authorization_code_auth()?);
        self.save_token(&stored);
        let access_token = stored.access_token.clone();
        *current = Some(stored);
        Ok(access_token)
    }

    /// Perform authorization code flow authentication
    fn authorization_code_auth(&self) -> Result<TokenResponse> {
        let (listener, port) = self.start_local_server()?;
        let redirect_uri = format!("http://{}:{}/", self.options.host, port);

        let auth_url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            Self::AUTH_URL,
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(&redirect_uri),
            urlencoding::encode(Self::DRIVE_SCOPE),
        );

        println!("\n=== Google Drive Authentication Required ===");
        println!("Opening browser for authentication...");
        println!("If the browser doesn't open, visit: {}", auth_url);

        if let Err(e) = open::that(&auth_url) {
            warn!("Failed to open browser: {}. Please open the URL manually.", e);
        }

        info!("Waiting for authorization on {}", redirect_uri);
        let code = wait_for_callback(listener)?;

        info!("Exchanging authorization code for tokens");
        let mut response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("code", code.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .context("Failed to exchange authorization code")?;

        let token: TokenResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse token response")?;

        info!("Authentication successful");
        Ok(token)
    }

    /// Bind the callback listener on the configured host and port
    fn start_local_server(&self) -> Result<(TcpListener, u16)> {
        let address = format!("{}:{}", self.options.host, self.options.port);
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Could not bind OAuth callback listener on {}", address))?;
        let port = listener.local_addr()?.port();
        Ok((listener, port))
    }

    /// Refresh an access token using a refresh token
    fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        let response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .context("Failed to refresh access token")?;

        let mut token: TokenResponse = response
            .into_body()
            .read_json()
            .context("Failed to parse refresh token response")?;

        // Google omits the refresh token on refresh
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }

        Ok(token)
    }

    fn load_token(&self) -> Result<StoredToken> {
        config::load_json_file(&self.token_path)
    }

    /// Cache the token on disk; failures only cost a re-authentication next run
    fn save_token(&self, token: &StoredToken) {
        if let Err(e) = config::save_json_file(&self.token_path, token) {
            warn!("Could not cache OAuth token: {:#}", e);
        }
    }
}

/// Read one query parameter from a request target like `/?code=X&scope=Y`
fn query_param(target: &str, name: &str) -> Option<String> {
    let (_, query) = target.split_once('?')?;
    query.split('&').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        (key == name).then(|| {
            urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
    })
}

/// Wait for the OAuth redirect and extract the authorization code
fn wait_for_callback(listener: TcpListener) -> Result<String> {
    let (mut stream, _) = listener.accept().context("Failed to accept connection")?;

    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .context("Failed to read request")?;

    // GET /?code=AUTH_CODE&scope=... HTTP/1.1
    let target = request_line.split_whitespace().nth(1).unwrap_or_default();
    let code = query_param(target, "code");
    let error = query_param(target, "error");

    let (status, body) = if code.is_some() {
        ("200 OK", "Authentication successful! You can close this window.")
    } else {
        ("400 Bad Request", "Authentication failed. Please try again.")
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body><h1>{}</h1></body></html>",
        status, body
    );
    stream.write_all(response.as_bytes()).ok();

    if let Some(err) = error {
        anyhow::bail!("OAuth error: {}", err);
    }

    code.context("No authorization code received")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auth(token_path: PathBuf) -> DriveAuth {
        let credentials = DriveCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        };
        let options = AuthOptions {
            token_path: Some(token_path),
            ..AuthOptions::default()
        };
        DriveAuth::new(credentials, options).unwrap()
    }

    #[test]
    fn test_query_param() {
        let target = "/?state=x&code=4%2F0Abc&scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fdrive";
        assert_eq!(query_param(target, "code").as_deref(), Some("4/0Abc"));
        assert_eq!(query_param(target, "error"), None);
        assert_eq!(query_param("/", "code"), None);
    }

    #[test]
    fn test_fresh_cached_token_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let token = StoredToken {
            access_token: "cached-access".to_string(),
            refresh_token: None,
            expires_at: Some(chrono::Utc::now().timestamp() + 3600),
        };
        config::save_json_file(&path, &token).unwrap();

        let auth = test_auth(path);
        assert_eq!(auth.get_access_token().unwrap(), "cached-access");
    }

    #[test]
    fn test_token_freshness_window() {
        let now = chrono::Utc::now().timestamp();
        let token = |expires_at| StoredToken {
            access_token: String::new(),
            refresh_token: None,
            expires_at,
        };
        assert!(token(Some(now + 600)).is_fresh());
        assert!(!token(Some(now + 60)).is_fresh());
        assert!(!token(None).is_fresh());
    }
}
