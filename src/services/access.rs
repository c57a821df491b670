//! Who may use the bot.
//!
//! The allow-list is a plain text file with one identity per line. It is
//! read once at startup and rewritten whole on every change.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Invalid identity: {0:?}")]
    InvalidIdentity(String),

    #[error("Allow-list I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Authorization predicate consulted before any search runs, plus the
/// admin operations that maintain it.
#[async_trait::async_trait]
pub trait AccessGate: Send + Sync {
    fn is_allowed(&self, identity: &str) -> bool;

    fn is_admin(&self, identity: &str) -> bool;

    fn list(&self) -> Vec<String>;

    /// Returns `false` when `identity` was already present.
    async fn add(&self, identity: &str) -> Result<bool, AccessError>;

    /// Returns `false` when `identity` was not present.
    async fn remove(&self, identity: &str) -> Result<bool, AccessError>;
}

#[derive(Debug)]
pub struct AllowList {
    path: PathBuf,

    admin: Option<String>,

    entries: RwLock<Vec<String>>,

    /// Serializes file rewrites so the last write carries the latest list.
    write_lock: tokio::sync::Mutex<()>,
}

impl AllowList {
    /// Read the allow-list at `path`, creating it when missing. A new file
    /// is seeded with the admin identity.
    pub async fn load(path: impl Into<PathBuf>, admin: Option<String>) -> Result<Self, AccessError> {
        let path = path.into();
        let admin = admin
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        let entries = match fs::read_to_string(&path).await {
            Ok(content) => parse_entries(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let seeded: Vec<String> = admin.iter().cloned().collect();
                write_entries(&path, &seeded).await?;
                info!("Created allow-list at {}", path.display());
                seeded
            }
            Err(e) => return Err(e.into()),
        };

        debug!(
            "Loaded {} allow-list entries from {}",
            entries.len(),
            path.display()
        );

        Ok(Self {
            path,
            admin,
            entries: RwLock::new(entries),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Add `identity`. Returns `false` when it was already present.
    ///
    /// The in-memory list only changes once the file has been rewritten.
    pub async fn add(&self, identity: &str) -> Result<bool, AccessError> {
        let identity = validate_identity(identity)?;
        let _write = self.write_lock.lock().await;

        let mut updated = self.list();
        if updated.iter().any(|e| e == identity) {
            return Ok(false);
        }
        updated.push(identity.to_string());

        self.commit(updated).await?;
        info!("Allow-list: added {}", identity);
        Ok(true)
    }

    /// Remove `identity`. Returns `false` when it was not present.
    pub async fn remove(&self, identity: &str) -> Result<bool, AccessError> {
        let identity = validate_identity(identity)?;
        let _write = self.write_lock.lock().await;

        let mut updated = self.list();
        let before = updated.len();
        updated.retain(|e| e != identity);
        if updated.len() == before {
            return Ok(false);
        }

        self.commit(updated).await?;
        info!("Allow-list: removed {}", identity);
        Ok(true)
    }

    // Callers hold `write_lock`.
    async fn commit(&self, updated: Vec<String>) -> Result<(), AccessError> {
        write_entries(&self.path, &updated).await?;
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = updated;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AccessGate for AllowList {
    fn is_allowed(&self, identity: &str) -> bool {
        let identity = identity.trim();
        if self.is_admin(identity) {
            return true;
        }
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|e| e == identity)
    }

    fn is_admin(&self, identity: &str) -> bool {
        self.admin.as_deref() == Some(identity.trim())
    }

    fn list(&self) -> Vec<String> {
        Self::list(self)
    }

    async fn add(&self, identity: &str) -> Result<bool, AccessError> {
        Self::add(self, identity).await
    }

    async fn remove(&self, identity: &str) -> Result<bool, AccessError> {
        Self::remove(self, identity).await
    }
}

fn validate_identity(identity: &str) -> Result<&str, AccessError> {
    let trimmed = identity.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(AccessError::InvalidIdentity(identity.to_string()));
    }
    Ok(trimmed)
}

fn parse_entries(content: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !entries.iter().any(|e| e == line) {
            entries.push(line.to_string());
        }
    }
    entries
}

/// Replace the file atomically: write a sibling temp file, then rename.
async fn write_entries(path: &Path, entries: &[String]) -> Result<(), AccessError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }

    let mut content = entries.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
