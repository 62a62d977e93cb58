use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Runtime configuration changed through commands, persisted between restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollState {
    pub enabled: bool,
    pub channel_id: Option<String>,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
}

struct StoreInner {
    state: PollState,
    path: Option<PathBuf>,
}

#[derive(Clone)]
pub struct StateStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl StateStore {
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("livewatch").join("state.toml"))
    }

    /// Store that never touches disk.
    pub fn in_memory(state: PollState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner { state, path: None })),
        }
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let state = read_state(&path)?;
        tracing::debug!(?path, ?state, "Opened state store");
        Ok(Self {
            inner: Arc::new(RwLock::new(StoreInner {
                state,
                path: Some(path),
            })),
        })
    }

    pub async fn snapshot(&self) -> PollState {
        self.inner.read().await.state.clone()
    }

    pub async fn enabled(&self) -> bool {
        self.inner.read().await.state.enabled
    }

    pub async fn channel_id(&self) -> Option<String> {
        self.inner.read().await.state.channel_id.clone()
    }

    pub async fn game(&self) -> Option<(String, String)> {
        let inner = self.inner.read().await;
        let id = inner.state.game_id.clone()?;
        Some((id, inner.state.game_name.clone().unwrap_or_default()))
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.update(|state| state.enabled = enabled).await
    }

    pub async fn set_channel_id(&self, channel_id: String) -> Result<()> {
        self.update(|state| state.channel_id = Some(channel_id)).await
    }

    pub async fn set_game(&self, id: String, name: String) -> Result<()> {
        self.update(|state| {
            state.game_id = Some(id);
            state.game_name = Some(name);
        })
        .await
    }

    async fn update(&self, apply: impl FnOnce(&mut PollState)) -> Result<()> {
        let mut inner = self.inner.write().await;
        let mut next = inner.state.clone();
        apply(&mut next);

        if let Some(path) = &inner.path {
            write_state(path, &next)?;
        }
        tracing::info!(state = ?next, "Updated poll state");
        inner.state = next;
        Ok(())
    }
}

pub fn read_state(path: &Path) -> Result<PollState> {
    if !path.exists() {
        return Ok(PollState::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse state file: {}", path.display()))
}

fn write_state(path: &Path, state: &PollState) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create state directory: {}", parent.display()))?;
    }
    let content = toml::to_string(state).context("Failed to serialize state")?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, content)
        .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace state file: {}", path.display()))?;
    Ok(())
}
