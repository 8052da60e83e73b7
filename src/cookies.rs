//! Persisted Google Scholar cookies.
//!
//! Scholar throttles cookie-less clients quickly; a cookie set exported from a
//! browser session is stored on disk and passed through on citation lookups.

use crate::error::{ArxivError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const JAR_FILE_NAME: &str = ".rustarxiv_cookies.json";

/// One cookie as browser export extensions write it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, alias = "httpOnly")]
    pub http_only: bool,
    /// Expiry as Unix seconds; session cookies have none
    #[serde(default, alias = "expirationDate")]
    pub expires: Option<f64>,
}

impl Cookie {
    pub fn new(name: &str, value: &str, domain: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
            secure: false,
            http_only: false,
            expires: None,
        }
    }

    fn is_expired(&self, now_secs: f64) -> bool {
        self.expires.is_some_and(|at| at < now_secs)
    }
}

/// The on-disk cookie jar (a JSON array)
#[derive(Debug, Clone)]
pub struct CookieJar {
    file: PathBuf,
}

impl CookieJar {
    /// Jar at `~/.rustarxiv_cookies.json`.
    pub fn in_home() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ArxivError::Config("Cannot determine home directory".to_string()))?;
        Ok(Self::at(home.join(JAR_FILE_NAME)))
    }

    pub fn at(file: PathBuf) -> Self {
        Self { file }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Unexpired cookies from the jar. A missing or unreadable jar is empty.
    pub fn load(&self) -> Vec<Cookie> {
        let content = match std::fs::read_to_string(&self.file) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.file.display(), "No cookie jar");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %self.file.display(), error = %e, "Cannot read cookie jar");
                return Vec::new();
            }
        };

        let stored: Vec<Cookie> = match serde_json::from_str(&content) {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!(path = %self.file.display(), error = %e, "Cookie jar is not valid JSON");
                return Vec::new();
            }
        };

        let now = Utc::now().timestamp() as f64;
        let total = stored.len();
        let live: Vec<Cookie> = stored.into_iter().filter(|c| !c.is_expired(now)).collect();
        if live.len() < total {
            info!(expired = total - live.len(), "Dropped expired cookies");
        }
        debug!(count = live.len(), "Loaded cookies");
        live
    }

    /// Replace the jar with a JSON cookie export; returns how many were kept.
    pub fn import(&self, json: &str) -> Result<usize> {
        let cookies: Vec<Cookie> = serde_json::from_str(json)?;
        if cookies.is_empty() {
            return Err(ArxivError::Validation("cookie export is empty".to_string()));
        }
        self.save(&cookies)?;
        Ok(cookies.len())
    }

    pub fn save(&self, cookies: &[Cookie]) -> Result<()> {
        if let Some(dir) = self.file.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.file, serde_json::to_string_pretty(cookies)?)?;
        info!(count = cookies.len(), path = %self.file.display(), "Saved cookies");
        Ok(())
    }

    /// Delete the jar. Returns whether there was one.
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.file) {
            Ok(()) => {
                info!(path = %self.file.display(), "Removed cookie jar");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
