// Local chair identity, persisted so a restart resumes the same topics

use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::CHAIR_CODE_LEN;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("IO error on identity file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to encode identity: {0}")]
    Encode(#[from] serde_json::Error),
}

/// `code` is shown to the user for pairing, `id` keys every topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChairIdentity {
    pub code: String,
    pub id: String,
}

impl ChairIdentity {
    /// Fresh identity: 8 uppercase hex chars for the code, 64 random bits for the id
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code: String = format!("{:08X}", rng.random::<u32>())
            .chars()
            .take(CHAIR_CODE_LEN)
            .collect();
        let id = format!("{:016x}", rng.random::<u64>());
        Self { code, id }
    }

    /// Load a saved identity. Missing or unreadable records yield None.
    pub fn load(path: &Path) -> Option<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Could not read identity file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<ChairIdentity>(&text) {
            Ok(identity) if identity.is_valid() => Some(identity),
            Ok(_) => {
                warn!("Identity file {} has empty fields", path.display());
                None
            }
            Err(e) => {
                warn!("Identity file {} is corrupt: {}", path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), IdentityError> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resume the saved identity, or register and persist a new one
    pub fn load_or_register(path: &Path) -> Result<Self, IdentityError> {
        if let Some(identity) = Self::load(path) {
            info!("Chair initialized with code: {} (id {})", identity.code, identity.id);
            return Ok(identity);
        }

        let identity = Self::generate();
        identity.save(path)?;
        info!("Chair registered with code: {} (id {})", identity.code, identity.id);
        info!("Use this code in the mobile app to connect to this chair");
        Ok(identity)
    }

    /// Ids end up in zenoh key expressions, so no separators or wildcards
    pub fn is_valid(&self) -> bool {
        let clean = |s: &str| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };
        clean(&self.code) && clean(&self.id)
    }
}
