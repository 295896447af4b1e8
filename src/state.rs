use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::NoteflowError;
use crate::google_api::TokenStore;
use crate::intelligence::{AiAssist, AiError, GroqClient};
use crate::notes::{codec, NoteStore};
use crate::sync::{DriveSync, SyncCoordinator, SyncOutcome};
use crate::types::Config;

/// Location of config.json
pub fn config_path() -> Result<PathBuf, NoteflowError> {
    let home = dirs::home_dir()
        .ok_or_else(|| NoteflowError::Configuration("Could not find home directory".into()))?;
    Ok(home.join(".noteflow").join("config.json"))
}

/// Load ~/.noteflow/config.json. A missing file means defaults.
pub fn load_config() -> Result<Config, NoteflowError> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config, NoteflowError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path)
        .map_err(|e| NoteflowError::Configuration(format!("Failed to read config: {}", e)))?;
    serde_json::from_str(&content)
        .map_err(|e| NoteflowError::Configuration(format!("Failed to parse config: {}", e)))
}

/// Apply `mutator` to the stored config (or defaults) and write it back.
pub fn create_or_update_config(
    mutator: impl FnOnce(&mut Config),
) -> Result<Config, NoteflowError> {
    update_config_at(&config_path()?, mutator)
}

pub fn update_config_at(
    path: &Path,
    mutator: impl FnOnce(&mut Config),
) -> Result<Config, NoteflowError> {
    let mut config = load_config_from(path)?;
    mutator(&mut config);

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                NoteflowError::Configuration(format!("Failed to create config dir: {}", e))
            })?;
        }
    }
    let content = serde_json::to_string_pretty(&config)
        .map_err(|e| NoteflowError::Configuration(format!("Failed to serialize config: {}", e)))?;
    fs::write(path, content).map_err(|e| NoteflowError::WriteFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(config)
}

/// Language-model client from configuration, if a key is available.
pub fn build_ai(config: &Config) -> Option<Arc<dyn AiAssist>> {
    match GroqClient::from_config(&config.groq) {
        Ok(client) => Some(Arc::new(client)),
        Err(AiError::MissingApiKey) => {
            log::info!("No Groq API key configured; AI features disabled");
            None
        }
        Err(e) => {
            log::warn!("Could not create AI client: {}", e);
            None
        }
    }
}

/// Drive sync when enabled and a Google token has been saved.
pub fn build_sync(config: &Config) -> Option<SyncCoordinator> {
    if !config.google.enabled {
        return None;
    }
    let tokens = TokenStore::in_dir(&config.data_dir());
    if !tokens.path().exists() {
        log::info!("Google sync enabled but not signed in");
        return None;
    }
    let adapter = DriveSync::new(Arc::new(tokens), config.drive_file_name.clone());
    Some(SyncCoordinator::new(Arc::new(adapter)))
}

/// Collaborators handed to the context at startup.
#[derive(Default)]
pub struct Collaborators {
    pub sync: Option<SyncCoordinator>,
    pub ai: Option<Arc<dyn AiAssist>>,
    /// Guest sessions never touch the remote copy.
    pub is_guest: bool,
}

/// Everything a command needs: configuration, the loaded notes and the
/// external services.
pub struct AppContext {
    pub config: Config,
    pub store: NoteStore,
    notes_path: PathBuf,
    sync: Option<SyncCoordinator>,
    ai: Option<Arc<dyn AiAssist>>,
    is_guest: bool,
}

impl AppContext {
    /// Pull the remote copy when there is no local file, then load.
    pub async fn startup(config: Config, collaborators: Collaborators) -> Self {
        let notes_path = config.notes_path();
        let Collaborators { sync, ai, is_guest } = collaborators;

        if let (Some(sync), false) = (&sync, is_guest) {
            match sync.pull_if_missing(&notes_path).await {
                Ok(SyncOutcome::Pulled) => log::info!("Restored notes from Google Drive"),
                Ok(_) => {}
                Err(e) => log::warn!("Could not download notes: {}", e),
            }
        }

        let store = codec::load_from_path(&notes_path);

        Self {
            config,
            store,
            notes_path,
            sync,
            ai,
            is_guest,
        }
    }

    pub fn notes_path(&self) -> &Path {
        &self.notes_path
    }

    pub fn is_guest(&self) -> bool {
        self.is_guest
    }

    pub fn ai(&self) -> Result<&dyn AiAssist, NoteflowError> {
        self.ai.as_deref().ok_or_else(|| {
            NoteflowError::Configuration(
                "No Groq API key. Set GROQ_API_KEY or groq.apiKey".to_string(),
            )
        })
    }

    pub fn save(&self) -> Result<(), NoteflowError> {
        codec::save_to_path(&self.notes_path, &self.store)
    }

    /// Push the local file now. `None` when there is nothing to sync with.
    pub async fn push(&self) -> Result<Option<SyncOutcome>, NoteflowError> {
        match (&self.sync, self.is_guest) {
            (Some(sync), false) => sync.push_local(&self.notes_path).await.map(Some),
            _ => Ok(None),
        }
    }

    /// Fetch the remote copy if there is no local file, and reload from it.
    pub async fn pull(&mut self) -> Result<Option<SyncOutcome>, NoteflowError> {
        let outcome = match (&self.sync, self.is_guest) {
            (Some(sync), false) => sync.pull_if_missing(&self.notes_path).await?,
            _ => return Ok(None),
        };
        if outcome == SyncOutcome::Pulled {
            self.store = codec::load_from_path(&self.notes_path);
        }
        Ok(Some(outcome))
    }

    /// Save, then push for signed-in sessions.
    pub async fn shutdown(&self) -> Result<Option<SyncOutcome>, NoteflowError> {
        self.save()?;
        self.push().await
    }
}
