//! OAuth client credentials
//!
//! Credentials are looked up, in order of priority, from:
//! 1. An explicitly given client secrets file
//! 2. `client_secrets.json` in the working directory
//! 3. `client_secrets.json` in the config directory (~/.config/drive-owner/)
//! 4. The DRIVE_CLIENT_ID / DRIVE_CLIENT_SECRET environment variables

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Client secrets filename, as downloaded from the Google Cloud Console
const CREDENTIALS_FILE: &str = "client_secrets.json";

const CLIENT_ID_VAR: &str = "DRIVE_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "DRIVE_CLIENT_SECRET";

/// OAuth credentials for Drive API access
#[derive(Debug, Clone)]
pub struct DriveCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Google Cloud Console credential file format
#[derive(Deserialize)]
struct GoogleCredentialFile {
    installed: Option<InstalledCredentials>,
    web: Option<InstalledCredentials>,
}

#[derive(Deserialize)]
struct InstalledCredentials {
    client_id: String,
    client_secret: String,
}

impl DriveCredentials {
    /// Load credentials, preferring `explicit` when given
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = Path::new(CREDENTIALS_FILE);
        if local.exists() {
            return Self::from_file(local);
        }

        if config::config_exists(CREDENTIALS_FILE) {
            let creds: GoogleCredentialFile = config::load_json(CREDENTIALS_FILE)?;
            return Self::from_credential_file(creds);
        }

        Self::from_env()
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let creds: GoogleCredentialFile = config::load_json_file(path)?;
        Self::from_credential_file(creds)
    }

    fn from_credential_file(creds: GoogleCredentialFile) -> Result<Self> {
        // Desktop ("installed") and web client types share the same fields
        let installed = creds
            .installed
            .or(creds.web)
            .context("Credentials file missing 'installed' or 'web' section")?;

        Ok(Self {
            client_id: installed.client_id,
            client_secret: installed.client_secret,
        })
    }

    /// Parse credentials from JSON string (Google Cloud Console format)
    pub fn from_json(json: &str) -> Result<Self> {
        let creds: GoogleCredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_credential_file(creds)
    }

    /// Load credentials from environment variables
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var(CLIENT_ID_VAR)
            .with_context(|| format!("{} environment variable not set", CLIENT_ID_VAR))?;
        let client_secret = std::env::var(CLIENT_SECRET_VAR)
            .with_context(|| format!("{} environment variable not set", CLIENT_SECRET_VAR))?;

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    /// Default credentials path in the config directory
    pub fn default_credentials_path() -> Option<PathBuf> {
        config::config_path(CREDENTIALS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed_credentials() {
        let json = r#"{
            "installed": {
                "client_id": "test-client-id.apps.googleusercontent.com",
                "client_secret": "test-secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let creds = DriveCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "test-client-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "test-secret");
    }

    #[test]
    fn test_parse_web_credentials() {
        let json = r#"{"web": {"client_id": "web-id", "client_secret": "web-secret"}}"#;
        let creds = DriveCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "web-id");
    }

    #[test]
    fn test_missing_section() {
        assert!(DriveCredentials::from_json(r#"{ "other": {} }"#).is_err());
    }

    #[test]
    fn test_explicit_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        std::fs::write(
            &path,
            r#"{"installed": {"client_id": "file-id", "client_secret": "file-secret"}}"#,
        )
        .unwrap();

        let creds = DriveCredentials::load(Some(&path)).unwrap();
        assert_eq!(creds.client_id, "file-id");
        assert_eq!(creds.client_secret, "file-secret");
    }
}
