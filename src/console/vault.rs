//! The durable token vault: access token plus exactly one role marker.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::config;
use crate::console::ConsoleError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultRecord {
    pub access_token: String,
    pub role_marker: String,
}

/// File-backed persistence for the console session. Holds at most one
/// token/marker pair; storing replaces whatever was there.
pub struct TokenVault {
    path: PathBuf,
}

impl TokenVault {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn at_default_location() -> Self {
        Self::new(config::vault_path())
    }

    pub fn store(&self, access_token: &str, role: Role) -> Result<(), ConsoleError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let record = VaultRecord {
            access_token: access_token.to_string(),
            role_marker: role.marker().to_string(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| ConsoleError::Validation(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Missing or malformed vault content reads as empty.
    pub fn load(&self) -> Option<VaultRecord> {
        let raw = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    /// Idempotent: clearing an empty vault is a no-op.
    pub fn clear(&self) -> Result<(), ConsoleError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
