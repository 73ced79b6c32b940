//! Repository discovery and paste-origin resolution.
//!
//! Everything here degrades: a missing repo, remote, or branch yields
//! `None`/empty metadata rather than an error reaching the edit path.

use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::debug;

use crate::core::{OriginError, OriginResolver, PasteOrigin};

/// Workspace root of `file`: the working directory of the repository that
/// contains it.
pub fn workspace_root(file: &Path) -> Option<PathBuf> {
    let probe = if file.is_dir() {
        file
    } else {
        file.parent()?
    };
    let repo = Repository::discover(probe).ok()?;
    repo.workdir().map(Path::to_path_buf)
}

/// Short name of the checked-out branch, if any.
pub fn current_branch(repo: &Repository) -> Option<String> {
    let head = repo.head().ok()?;
    head.shorthand().map(str::to_string)
}

/// `origin` remote URL in HTTPS form: scp-style SSH rewritten, `.git`
/// stripped.
pub fn origin_https_url(repo: &Repository) -> Option<String> {
    let remote = repo.find_remote("origin").ok()?;
    remote.url().map(https_url)
}

/// Rewrite a git remote URL into a browsable HTTPS URL.
///
/// - `git@github.com:foo/bar.git`     → `https://github.com/foo/bar`
/// - `ssh://git@github.com/foo/bar`   → `https://github.com/foo/bar`
/// - `https://github.com/foo/bar.git` → `https://github.com/foo/bar`
pub fn https_url(url: &str) -> String {
    let mut u = url.trim();
    if let Some(stripped) = u.strip_suffix(".git") {
        u = stripped;
    }

    // SSH scp-style: git@host:path
    if let Some(rest) = u.strip_prefix("git@")
        && let Some((host, path)) = rest.split_once(':')
    {
        return format!("https://{}/{}", host, path.trim_start_matches('/'));
    }

    // Scheme URLs: drop userinfo and force https.
    if let Some((_, after_scheme)) = u.split_once("://") {
        let after_at = after_scheme
            .rsplit_once('@')
            .map(|(_, r)| r)
            .unwrap_or(after_scheme);
        return format!("https://{after_at}");
    }

    u.to_string()
}

/// Resolves in-IDE clipboard captures against the source repository.
pub struct VcsOriginResolver;

impl OriginResolver for VcsOriginResolver {
    fn resolve(&self, workspace_path: &str, relative_path: &str) -> Result<PasteOrigin, OriginError> {
        let repo = Repository::discover(workspace_path)
            .map_err(|e| OriginError(format!("{workspace_path}: {e}")))?;
        let url = origin_https_url(&repo).unwrap_or_default();
        let title = match current_branch(&repo).as_deref() {
            Some("main") | Some("master") | None => relative_path.to_string(),
            Some(branch) => format!("{relative_path} (on branch {branch})"),
        };
        debug!(%url, %title, "paste origin resolved");
        Ok(PasteOrigin { url, title })
    }
}
