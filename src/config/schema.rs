use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Recorded as the author of every span this session creates.
    pub author: String,
    pub storage: StorageConfig,
    pub clipboard: ClipboardConfig,
    pub logging: LoggingConfig,
}

/// Where records are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageLayout {
    #[default]
    Repository,
    HomeDirectory,
    VcsNotes,
}

impl StorageLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::HomeDirectory => "home_directory",
            Self::VcsNotes => "vcs_notes",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub layout: StorageLayout,
    /// Push the notes ref to `origin` after each save (vcs_notes layout).
    pub notes_push: bool,
    /// Fetch the notes ref from `origin` before each load (vcs_notes layout).
    pub notes_fetch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// Argv of the platform clipboard helper; empty disables polling.
    pub helper: Vec<String>,
    pub poll_interval_ms: u64,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            helper: Vec::new(),
            poll_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stdout: bool,
    pub filter: Option<String>,
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            filter: None,
            file: FileLoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
}

/// Partial config as read from one file; `None` means "not set here".
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigLayer {
    pub author: Option<String>,
    pub storage: Option<StorageLayerConfig>,
    pub clipboard: Option<ClipboardLayerConfig>,
    pub logging: Option<LoggingLayerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageLayerConfig {
    pub layout: Option<StorageLayout>,
    pub notes_push: Option<bool>,
    pub notes_fetch: Option<bool>,
}

impl StorageLayerConfig {
    pub fn apply_to(&self, target: &mut StorageConfig) {
        if let Some(layout) = self.layout {
            target.layout = layout;
        }
        if let Some(push) = self.notes_push {
            target.notes_push = push;
        }
        if let Some(fetch) = self.notes_fetch {
            target.notes_fetch = fetch;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClipboardLayerConfig {
    pub helper: Option<Vec<String>>,
    pub poll_interval_ms: Option<u64>,
}

impl ClipboardLayerConfig {
    pub fn apply_to(&self, target: &mut ClipboardConfig) {
        if let Some(helper) = self.helper.as_ref() {
            target.helper = helper.clone();
        }
        if let Some(interval) = self.poll_interval_ms {
            target.poll_interval_ms = interval;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingLayerConfig {
    pub stdout: Option<bool>,
    pub filter: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<PathBuf>,
}

impl LoggingLayerConfig {
    pub fn apply_to(&self, target: &mut LoggingConfig) {
        if let Some(stdout) = self.stdout {
            target.stdout = stdout;
        }
        if let Some(filter) = self.filter.as_ref() {
            target.filter = Some(filter.clone());
        }
        if let Some(enabled) = self.file_enabled {
            target.file.enabled = enabled;
        }
        if let Some(dir) = self.file_dir.as_ref() {
            target.file.dir = Some(dir.clone());
        }
    }
}

impl ConfigLayer {
    pub fn apply_to(&self, target: &mut Config) {
        if let Some(author) = self.author.as_ref() {
            target.author = author.clone();
        }
        if let Some(storage) = self.storage.as_ref() {
            storage.apply_to(&mut target.storage);
        }
        if let Some(clipboard) = self.clipboard.as_ref() {
            clipboard.apply_to(&mut target.clipboard);
        }
        if let Some(logging) = self.logging.as_ref() {
            logging.apply_to(&mut target.logging);
        }
    }
}
