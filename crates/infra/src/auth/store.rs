//! Token storage backends
//!
//! Stores are synchronous and deliberately dumb: they hold a raw string and
//! never validate it. Validation and purging live in
//! [`TokenProvider`](super::TokenProvider).

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use courier_domain::constants::TOKEN_COOKIE_NAME;
use parking_lot::Mutex;
use tracing::debug;

/// Storage tiers, in lookup priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenBackend {
    /// Survives restarts (a file on disk)
    Durable,
    /// Lives for the process lifetime
    Session,
    /// Cookie-jar fallback
    Cookie,
}

impl fmt::Display for TokenBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Durable => "durable",
            Self::Session => "session",
            Self::Cookie => "cookie",
        };
        f.write_str(name)
    }
}

/// A place a raw token can be kept
pub trait TokenStore: Send + Sync {
    fn backend(&self) -> TokenBackend;

    /// Stored token, `None` when empty
    fn read(&self) -> io::Result<Option<String>>;

    fn write(&self, token: &str) -> io::Result<()>;

    /// Remove the token. Clearing an empty store succeeds.
    fn clear(&self) -> io::Result<()>;
}

/// Token kept in a single file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn backend(&self) -> TokenBackend {
        TokenBackend::Durable
    }

    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        file.write_all(token.as_bytes())?;
        file.sync_all()?;
        debug!(path = %self.path.display(), "token written to durable store");
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// Token held in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn backend(&self) -> TokenBackend {
        TokenBackend::Session
    }

    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.slot.lock().clone())
    }

    fn write(&self, token: &str) -> io::Result<()> {
        *self.slot.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

/// Token kept as one pair in a `name=value; other=value` cookie jar
#[derive(Debug)]
pub struct CookieTokenStore {
    name: String,
    jar: Mutex<String>,
}

impl Default for CookieTokenStore {
    fn default() -> Self {
        Self::new(TOKEN_COOKIE_NAME)
    }
}

impl CookieTokenStore {
    /// Empty jar that stores the token under `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), jar: Mutex::new(String::new()) }
    }

    /// Jar pre-populated from a `Cookie` header value
    pub fn from_jar(name: impl Into<String>, jar: impl Into<String>) -> Self {
        Self { name: name.into(), jar: Mutex::new(jar.into()) }
    }

    /// Current jar contents, suitable for a `Cookie` header
    pub fn jar(&self) -> String {
        self.jar.lock().clone()
    }

    fn pairs(jar: &str) -> impl Iterator<Item = (&str, &str)> {
        jar.split(';').filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            Some((name.trim(), value.trim()))
        })
    }

    fn without_token(&self, jar: &str) -> Vec<String> {
        Self::pairs(jar)
            .filter(|(name, _)| *name != self.name)
            .map(|(name, value)| format!("{name}={value}"))
            .collect()
    }
}

impl TokenStore for CookieTokenStore {
    fn backend(&self) -> TokenBackend {
        TokenBackend::Cookie
    }

    fn read(&self) -> io::Result<Option<String>> {
        let jar = self.jar.lock();
        let value = Self::pairs(&jar)
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty());
        Ok(value)
    }

    fn write(&self, token: &str) -> io::Result<()> {
        let mut jar = self.jar.lock();
        let mut pairs = self.without_token(&jar);
        pairs.push(format!("{}={}", self.name, token));
        *jar = pairs.join("; ");
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        let mut jar = self.jar.lock();
        *jar = self.without_token(&jar).join("; ");
        Ok(())
    }
}
