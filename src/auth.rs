//! Access token providers for the Google Drive API.
//!
//! Two credential sources are supported:
//! - an installed-app OAuth2 client (browser consent with a loopback
//!   redirect, driven by `yup-oauth2`) whose tokens are cached in a file,
//!   which is the default for interactive audits
//! - a service account (JWT bearer grant), optionally impersonating a user
//!
//! The traversal only ever sees the [`TokenProvider`] trait.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::storage::{TokenInfo, TokenStorage};
use yup_oauth2::{InstalledFlowAuthenticator, InstalledFlowReturnMethod};

use crate::error::{DriveError, Result};
use crate::models::{ServiceAccountCredentials, TokenResponse};

/// Google OAuth2 token endpoint.
pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Read-only scopes needed to walk files and read their permissions.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive.readonly",
    "https://www.googleapis.com/auth/drive.metadata.readonly",
];

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_BUFFER_SECS: u64 = 60;

/// Source of bearer tokens for Drive API calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get a valid access token, refreshing if necessary.
    async fn access_token(&self) -> Result<String>;
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Token set cached on disk together with the scopes it was granted for.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    scopes: Vec<String>,
    token: TokenInfo,
}

impl CacheEntry {
    fn covers(&self, target_scopes: &[&str]) -> bool {
        target_scopes
            .iter()
            .all(|scope| self.scopes.iter().any(|s| s == scope))
    }
}

/// OAuth2 credential cache kept in a JSON file (`token.json` by default).
///
/// A missing file means no cached token. So does a file that cannot be
/// read or parsed (e.g. one written by another tool); it is logged and
/// overwritten after the next consent.
pub struct FileTokenStore {
    path: PathBuf,
    entry: Mutex<Option<CacheEntry>>,
}

impl FileTokenStore {
    /// Open the cache at `path`, loading any token it already holds.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let entry = match read_cache(&path) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = ?path, error = %e, "ignoring unreadable token cache");
                None
            }
        };
        Self {
            path,
            entry: Mutex::new(entry),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<CacheEntry>> {
        self.entry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn read_cache(path: &Path) -> Result<Option<CacheEntry>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

#[async_trait]
impl TokenStorage for FileTokenStore {
    async fn set(&self, scopes: &[&str], token: TokenInfo) -> anyhow::Result<()> {
        let entry = CacheEntry {
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            token,
        };
        let content = serde_json::to_string_pretty(&entry)?;
        tokio::fs::write(&self.path, content).await?;
        debug!(path = ?self.path, "token cache updated");
        *self.lock() = Some(entry);
        Ok(())
    }

    async fn get(&self, target_scopes: &[&str]) -> Option<TokenInfo> {
        self.lock()
            .as_ref()
            .filter(|entry| entry.covers(target_scopes))
            .map(|entry| entry.token.clone())
    }
}

/// Authenticator for an installed-app OAuth2 client.
///
/// Tokens come from the cache first; an expired one is refreshed with its
/// refresh token, and without a usable token the browser consent flow
/// runs against a loopback redirect. Every new token set is written back
/// to the cache.
pub struct InstalledAppAuthenticator {
    inner: DefaultAuthenticator,
}

impl InstalledAppAuthenticator {
    /// Create an authenticator from a client-secret JSON file (the
    /// `installed` or `web` client downloaded from the Cloud console).
    pub async fn from_file<P: AsRef<Path>>(path: P, cache: FileTokenStore) -> Result<Self> {
        let secret = yup_oauth2::read_application_secret(path).await?;
        Self::new(secret, cache).await
    }

    pub async fn new(secret: yup_oauth2::ApplicationSecret, cache: FileTokenStore) -> Result<Self> {
        let inner =
            InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::HTTPRedirect)
                .with_storage(Box::new(cache))
                .build()
                .await?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl TokenProvider for InstalledAppAuthenticator {
    async fn access_token(&self) -> Result<String> {
        let token = self.inner.token(SCOPES).await?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| DriveError::AuthenticationError("No access token granted".to_string()))
    }
}

/// JWT claims for service account authentication.
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,   // Issuer (service account email)
    scope: String, // OAuth scope
    aud: String,   // Audience (token endpoint)
    exp: u64,      // Expiration time
    iat: u64,      // Issued at
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<String>, // Impersonated user
}

/// Cached access token with expiration.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: SystemTime,
}

/// Authenticator for Google APIs using service account credentials.
#[derive(Clone)]
pub struct ServiceAccountAuthenticator {
    credentials: Arc<ServiceAccountCredentials>,
    subject: Option<String>,
    client: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl ServiceAccountAuthenticator {
    /// Create a new authenticator from a service account JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let credentials: ServiceAccountCredentials = serde_json::from_str(&content)?;
        Ok(Self::new(credentials))
    }

    /// Create a new authenticator from credentials.
    pub fn new(credentials: ServiceAccountCredentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
            subject: None,
            client: Client::new(),
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Act on behalf of `subject` (requires domain-wide delegation).
    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }

    fn token_uri(&self) -> &str {
        self.credentials.token_uri.as_deref().unwrap_or(TOKEN_URI)
    }

    fn claims(&self, now: u64) -> Claims {
        Claims {
            iss: self.credentials.client_email.clone(),
            scope: SCOPES.join(" "),
            aud: self.token_uri().to_string(),
            iat: now,
            exp: now + 3600, // 1 hour
            sub: self.subject.clone(),
        }
    }

    /// Refresh the access token using JWT assertion.
    async fn refresh_token(&self) -> Result<CachedToken> {
        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())?;
        let jwt = encode(&header, &self.claims(now_secs()), &key)?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", &jwt),
        ];

        let response = self
            .client
            .post(self.token_uri())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::TokenRefreshError(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await?;

        let expires_at = SystemTime::now() + Duration::from_secs(token_response.expires_in);

        Ok(CachedToken {
            access_token: token_response.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountAuthenticator {
    async fn access_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                let buffer = Duration::from_secs(EXPIRY_BUFFER_SECS);
                if token.expires_at > SystemTime::now() + buffer {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let new_token = self.refresh_token().await?;

        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(new_token.clone());
        }

        Ok(new_token.access_token)
    }
}

/// Pre-issued bearer token.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider(String);

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(access: &str) -> TokenInfo {
        TokenInfo {
            access_token: Some(access.to_string()),
            refresh_token: Some("1//refresh".to_string()),
            expires_at: None,
            id_token: None,
        }
    }

    #[test]
    fn test_claims_serialization() {
        let auth = ServiceAccountAuthenticator::new(ServiceAccountCredentials {
            client_email: "test@example.iam.gserviceaccount.com".to_string(),
            private_key: "key".to_string(),
            token_uri: None,
        });

        let json = serde_json::to_string(&auth.claims(1234567890)).unwrap();
        assert!(json.contains("test@example.iam.gserviceaccount.com"));
        assert!(json.contains("drive.readonly"));
        assert!(!json.contains("\"sub\""));

        let auth = auth.with_subject(Some("admin@x.com".to_string()));
        let json = serde_json::to_string(&auth.claims(1234567890)).unwrap();
        assert!(json.contains("\"sub\":\"admin@x.com\""));
    }

    #[test]
    fn test_cache_entry_scope_cover() {
        let entry = CacheEntry {
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            token: token("a"),
        };
        assert!(entry.covers(SCOPES));
        assert!(entry.covers(&SCOPES[..1]));
        assert!(!entry.covers(&["https://www.googleapis.com/auth/drive"]));
    }

    #[tokio::test]
    async fn test_missing_cache_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::open(dir.path().join("token.json"));
        assert!(store.get(SCOPES).await.is_none());
    }

    #[tokio::test]
    async fn test_static_token() {
        let auth = StaticTokenProvider::new("ya29.static");
        assert_eq!(auth.access_token().await.unwrap(), "ya29.static");
    }
}
