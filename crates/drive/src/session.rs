use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tidydesk_core::RemoteError;

/// Supplies a usable access token. Acquisition, refresh, and persistence are
/// entirely this side of the boundary; the synchronizer never sees token
/// contents beyond the bearer string.
pub trait SessionProvider {
    fn access_token(&mut self) -> Result<String, RemoteError>;
}

pub struct StaticTokenSession {
    token: String,
}

impl StaticTokenSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl SessionProvider for StaticTokenSession {
    fn access_token(&mut self) -> Result<String, RemoteError> {
        if self.token.trim().is_empty() {
            return Err(RemoteError::Auth("empty access token".to_string()));
        }
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenFile {
    access_token: String,
}

/// Reads the access token from a JSON token file on first use. Extra fields
/// (refresh tokens, expiry) are ignored here; whatever wrote the file owns
/// them.
pub struct TokenFileSession {
    path: PathBuf,
    cached: Option<String>,
}

impl TokenFileSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: None,
        }
    }
}

impl SessionProvider for TokenFileSession {
    fn access_token(&mut self) -> Result<String, RemoteError> {
        if let Some(token) = &self.cached {
            return Ok(token.clone());
        }
        let data = fs::read_to_string(&self.path).map_err(|err| {
            RemoteError::Auth(format!(
                "cannot read token file {}: {err}",
                self.path.display()
            ))
        })?;
        let parsed: TokenFile = serde_json::from_str(&data).map_err(|err| {
            RemoteError::Auth(format!(
                "token file {} is not valid: {err}",
                self.path.display()
            ))
        })?;
        if parsed.access_token.trim().is_empty() {
            return Err(RemoteError::Auth(format!(
                "token file {} holds an empty access token",
                self.path.display()
            )));
        }
        self.cached = Some(parsed.access_token.clone());
        Ok(parsed.access_token)
    }
}
