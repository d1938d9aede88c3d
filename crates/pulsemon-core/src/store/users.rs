//! User store over `users.json`
//!
//! Maps username to a credential record. Passwords are stored as
//! salted SHA-256 digests, never plaintext.

use crate::store::atomic_write;
use crate::{Error, Result};
use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_USERS_FILE: &str = "users.json";

/// One stored credential record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub password_hash: String,
    pub salt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub created_at: i64,
}

/// JSON-file backed user registry
#[derive(Debug)]
pub struct UserStore {
    path: PathBuf,
    users: BTreeMap<String, UserRecord>,
}

impl UserStore {
    /// Load the store, starting empty when the file does not exist
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let users = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)
                .map_err(|e| Error::Store(format!("invalid user store {}: {}", path.display(), e)))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, users })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Register a new user and persist the store
    ///
    /// Rejects empty credentials and duplicate usernames.
    pub fn register(&mut self, username: &str, password: &str, role: Option<&str>) -> Result<()> {
        if username.is_empty() || password.is_empty() {
            return Err(Error::Auth(
                "username and password are required".to_string(),
            ));
        }
        if self.users.contains_key(username) {
            return Err(Error::Auth(format!("username '{}' already exists", username)));
        }

        let mut salt_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = hex_string(&salt_bytes);
        let password_hash = hash_password(password, &salt);

        self.users.insert(
            username.to_string(),
            UserRecord {
                password_hash,
                salt,
                role: role.map(|r| r.to_string()),
                created_at: Utc::now().timestamp(),
            },
        );
        self.save()
    }

    /// Check a username/password pair
    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(record) => hash_password(password, &record.salt) == record.password_hash,
            None => false,
        }
    }

    pub fn get(&self, username: &str) -> Option<&UserRecord> {
        self.users.get(username)
    }

    /// Remove a user and persist the store
    pub fn remove(&mut self, username: &str) -> Result<()> {
        if self.users.remove(username).is_none() {
            return Err(Error::Auth(format!("unknown user '{}'", username)));
        }
        self.save()
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.users)
            .map_err(|e| Error::Store(format!("failed to serialize user store: {}", e)))?;
        atomic_write(&self.path, &json)
    }
}

fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
