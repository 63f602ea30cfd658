//! Persistence for the `boatman-store` UI blob.
//!
//! The blob is tiny and written rarely, but a torn write would still corrupt
//! it, so saves go through a temp file, fsync and atomic rename.

use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use boatman_core::error::{BoatmanError, Result};
use boatman_core::ui_state::{UiState, UiStateRepository};

/// File name of the persisted blob, under the platform config directory.
const STORE_FILE: &str = "boatman-store.toml";

/// TOML-file-backed [`UiStateRepository`].
///
/// The state is cached in memory; saves rewrite the whole file.
#[derive(Clone)]
pub struct TomlUiStateRepository {
    path: PathBuf,
    cache: Arc<Mutex<UiState>>,
}

impl TomlUiStateRepository {
    /// Opens the repository at the default platform location
    /// (`<config dir>/boatman/boatman-store.toml`).
    pub fn open_default() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BoatmanError::io("no platform config directory"))?;
        Self::open(config_dir.join("boatman").join(STORE_FILE))
    }

    /// Opens the repository at an explicit path.
    pub fn open(path: PathBuf) -> Result<Self> {
        let state = Self::read_blob(&path)?;
        Ok(Self {
            path,
            cache: Arc::new(Mutex::new(state)),
        })
    }

    fn read_blob(path: &PathBuf) -> Result<UiState> {
        if !path.exists() {
            return Ok(UiState::default());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(UiState::default());
        }
        Ok(toml::from_str(&content)?)
    }

    fn write_blob(path: &PathBuf, state: &UiState) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialized = toml::to_string_pretty(state)?;

        let tmp_path = path.with_extension("toml.tmp");
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(serialized.as_bytes())?;
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

#[async_trait]
impl UiStateRepository for TomlUiStateRepository {
    async fn load(&self) -> Result<UiState> {
        Ok(self.cache.lock().await.clone())
    }

    async fn save(&self, state: &UiState) -> Result<()> {
        {
            let mut cache = self.cache.lock().await;
            *cache = state.clone();
        }
        let path = self.path.clone();
        let state = state.clone();
        tokio::task::spawn_blocking(move || Self::write_blob(&path, &state))
            .await
            .map_err(|e| BoatmanError::internal(format!("blocking save failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_missing_file_yields_default() {
        let dir = TempDir::new().unwrap();
        let repo = TomlUiStateRepository::open(dir.path().join(STORE_FILE)).unwrap();
        let state = repo.load().await.unwrap();
        assert_eq!(state, UiState::default());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORE_FILE);

        let repo = TomlUiStateRepository::open(path.clone()).unwrap();
        let state = UiState {
            sidebar_open: true,
            last_active_project_id: Some("p1".to_string()),
        };
        repo.save(&state).await.unwrap();

        // A fresh repository sees the persisted blob.
        let reopened = TomlUiStateRepository::open(path).unwrap();
        assert_eq!(reopened.load().await.unwrap(), state);
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORE_FILE);
        let repo = TomlUiStateRepository::open(path.clone()).unwrap();
        repo.save(&UiState::default()).await.unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());
    }
}
