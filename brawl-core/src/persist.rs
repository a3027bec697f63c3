//! Player and catalog persistence.
//!
//! The combat core only ever sees the [`Persistence`] trait. Two stores ship
//! with the crate: an in-memory store for tests and single-process tools, and
//! a JSON file store that writes one versioned save file per player.

use crate::combatant::{Player, PlayerId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Storage collaborator for players and catalog tables.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Load a player, or `None` if it has never been saved.
    async fn load_player(&self, id: &PlayerId) -> Result<Option<Player>, PersistError>;

    async fn save_player(&self, player: &Player) -> Result<(), PersistError>;

    /// Raw bytes of a stored catalog table, or `None` if absent.
    async fn load_catalog(&self, name: &str) -> Result<Option<Vec<u8>>, PersistError>;

    async fn save_catalog(&self, name: &str, bytes: &[u8]) -> Result<(), PersistError>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Keeps serialized values in memory.
///
/// Players are stored as JSON so a load always hands out an independent copy,
/// exactly as a real backend would.
#[derive(Default)]
pub struct MemoryStore {
    players: RwLock<HashMap<PlayerId, Vec<u8>>>,
    catalogs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn player_count(&self) -> usize {
        self.players.read().await.len()
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn load_player(&self, id: &PlayerId) -> Result<Option<Player>, PersistError> {
        let players = self.players.read().await;
        match players.get(id) {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
            None => Ok(None),
        }
    }

    async fn save_player(&self, player: &Player) -> Result<(), PersistError> {
        let bytes = serde_json::to_vec(player)?;
        self.players.write().await.insert(player.id.clone(), bytes);
        Ok(())
    }

    async fn load_catalog(&self, name: &str) -> Result<Option<Vec<u8>>, PersistError> {
        Ok(self.catalogs.read().await.get(name).cloned())
    }

    async fn save_catalog(&self, name: &str, bytes: &[u8]) -> Result<(), PersistError> {
        self.catalogs
            .write()
            .await
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Current player save file version.
pub const SAVE_VERSION: u32 = 1;

/// On-disk envelope around a player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPlayer {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was written, in unix seconds.
    pub saved_at: String,

    pub player: Player,
}

impl SavedPlayer {
    pub fn new(player: Player) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: chrono_now(),
            player,
        }
    }
}

/// Stores players under `<root>/players` and catalogs under `<root>/config`.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of a player's save file.
    pub fn player_path(&self, id: &PlayerId) -> PathBuf {
        self.root
            .join("players")
            .join(format!("{}.json", sanitize(id.as_str())))
    }

    pub fn catalog_path(&self, name: &str) -> PathBuf {
        self.root
            .join("config")
            .join(format!("{}.json", sanitize(name)))
    }

    async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        // Write beside the target and rename so readers never see half a file.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, bytes).await?;
        fs::rename(&staging, path).await?;
        Ok(())
    }
}

#[async_trait]
impl Persistence for JsonFileStore {
    async fn load_player(&self, id: &PlayerId) -> Result<Option<Player>, PersistError> {
        let Some(bytes) = read_optional(&self.player_path(id)).await? else {
            return Ok(None);
        };
        let saved: SavedPlayer = serde_json::from_slice(&bytes)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(Some(saved.player))
    }

    async fn save_player(&self, player: &Player) -> Result<(), PersistError> {
        let content = serde_json::to_vec_pretty(&SavedPlayer::new(player.clone()))?;
        Self::write_file(&self.player_path(&player.id), &content).await
    }

    async fn load_catalog(&self, name: &str) -> Result<Option<Vec<u8>>, PersistError> {
        read_optional(&self.catalog_path(name)).await
    }

    async fn save_catalog(&self, name: &str, bytes: &[u8]) -> Result<(), PersistError> {
        Self::write_file(&self.catalog_path(name), bytes).await
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, PersistError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Map an identifier onto a safe file stem.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Get current timestamp as unix seconds.
fn chrono_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", now.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn player(id: &str) -> Player {
        Player::new(PlayerId::new(id), "Saver", 100, 1_700_000_000)
    }

    #[tokio::test]
    async fn test_memory_store_missing_player() {
        let store = MemoryStore::new();
        assert!(store.load_player(&PlayerId::new("ghost")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_hands_out_copies() {
        let store = MemoryStore::new();
        let mut original = player("p1");
        store.save_player(&original).await.unwrap();

        original.health = 1;
        let loaded = store.load_player(&original.id).await.unwrap().unwrap();
        assert_eq!(loaded.health, 100);
        assert_eq!(store.player_count().await, 1);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let mut saved = player("p1");
        saved.record_kill(crate::catalog::EnemyKind::Beast);

        store.save_player(&saved).await.unwrap();
        let loaded = store.load_player(&saved.id).await.unwrap().unwrap();

        assert_eq!(loaded, saved);
        assert!(store.player_path(&saved.id).exists());
    }

    #[tokio::test]
    async fn test_file_store_missing_files() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(store.load_player(&PlayerId::new("nobody")).await.unwrap().is_none());
        assert!(store.load_catalog("attacks").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_version_mismatch() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let p = player("p1");

        let mut envelope = serde_json::to_value(SavedPlayer::new(p.clone())).unwrap();
        envelope["version"] = serde_json::json!(SAVE_VERSION + 1);
        let path = store.player_path(&p.id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, serde_json::to_vec(&envelope).unwrap()).unwrap();

        let err = store.load_player(&p.id).await.unwrap_err();
        assert!(matches!(err, PersistError::VersionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_file_store_catalog_bytes() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.save_catalog("enemies", b"{}").await.unwrap();

        assert_eq!(store.load_catalog("enemies").await.unwrap().unwrap(), b"{}");
        assert!(dir.path().join("config").join("enemies.json").exists());
    }

    #[test]
    fn test_sanitized_paths_stay_in_root() {
        let store = JsonFileStore::new("/data");
        let path = store.player_path(&PlayerId::new("../../etc/passwd"));

        assert_eq!(path, PathBuf::from("/data/players/______etc_passwd.json"));
    }
}
