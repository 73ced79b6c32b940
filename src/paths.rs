//! Directory helpers for config/log locations and path hygiene.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Directory name of the per-workspace log tree.
pub const LOG_DIR_NAME: &str = ".tabd";

fn env_dir(var: &str) -> Option<PathBuf> {
    let value = std::env::var(var).ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

/// Configuration directory: `$TABD_CONFIG_DIR`, else `$XDG_CONFIG_HOME/tabd`,
/// else `~/.config/tabd`.
pub(crate) fn config_dir() -> PathBuf {
    if let Some(dir) = env_dir("TABD_CONFIG_DIR") {
        return dir;
    }
    let base = env_dir("XDG_CONFIG_HOME")
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    base.join("tabd")
}

/// Root of the home-directory storage layout: `$TABD_DATA_DIR`, else
/// `~/.tabd`.
pub(crate) fn data_dir() -> PathBuf {
    let pinned = PINNED_DATA_DIR
        .lock()
        .unwrap_or_else(|err| err.into_inner())
        .as_ref()
        .and_then(Weak::upgrade);
    if let Some(dir) = pinned {
        return dir.as_ref().clone();
    }

    env_dir("TABD_DATA_DIR").unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(LOG_DIR_NAME)
    })
}

/// Live data-dir pin; same weak-handle scheme as the test clock, so a
/// dropped pin releases itself.
static PINNED_DATA_DIR: Mutex<Option<Weak<PathBuf>>> = Mutex::new(None);

static DATA_DIR_GATE: Mutex<()> = Mutex::new(());

/// Redirects `data_dir` until dropped; one pin at a time.
#[doc(hidden)]
pub struct DataDirPin {
    _dir: Arc<PathBuf>,
    _exclusive: MutexGuard<'static, ()>,
}

#[doc(hidden)]
pub fn pin_data_dir_for_tests(dir: PathBuf) -> DataDirPin {
    let exclusive = DATA_DIR_GATE.lock().unwrap_or_else(|err| err.into_inner());
    let dir = Arc::new(dir);
    *PINNED_DATA_DIR.lock().unwrap_or_else(|err| err.into_inner()) = Some(Arc::downgrade(&dir));
    DataDirPin {
        _dir: dir,
        _exclusive: exclusive,
    }
}

/// Log root inside a workspace (repository layout).
pub fn workspace_log_root(workspace: &Path) -> PathBuf {
    workspace.join(LOG_DIR_NAME).join("log")
}

/// Log root for a workspace under the home-directory layout.
pub fn home_log_root(workspace: &Path) -> PathBuf {
    data_dir()
        .join("workspaces")
        .join(sanitize_path_component(&workspace.to_string_lossy()))
        .join("log")
}

/// Flatten an arbitrary path into one directory-name-safe component:
/// non-alphanumerics become `_`, runs collapse, edges are trimmed.
pub fn sanitize_path_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_mark = true;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_mark = false;
        } else if !last_was_mark {
            out.push('_');
            last_was_mark = true;
        }
    }
    if out.ends_with('_') {
        out.pop();
    }
    out
}

/// Files under any dot-directory, and dot-files themselves, are never
/// tracked.
pub fn is_excluded(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
