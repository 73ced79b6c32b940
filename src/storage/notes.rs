//! VCS-notes record storage (experimental).
//!
//! Records attach to the current head commit as git notes under a per-file
//! ref `tabd__<branch>__<sha256(sanitised relative path)>`. A note body is
//! one JSON record per line; saving onto a head that already carries a note
//! appends a line rather than losing the earlier record.

use std::path::Path;

use git2::Repository;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::error::StorageError;
use super::wire::LogRecord;
use crate::paths::sanitize_path_component;
use crate::vcs;

/// Short name of the notes ref for `relative` on `branch`.
pub fn notes_ref_name(branch: &str, relative: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sanitize_path_component(&relative.to_string_lossy()).as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("tabd__{branch}__{hex}")
}

fn full_ref(short: &str) -> String {
    format!("refs/notes/{short}")
}

/// Attach `record` to the current head commit, appending to any note
/// already there.
pub fn save_record(
    workspace: &Path,
    relative: &Path,
    record: &LogRecord,
    push: bool,
) -> Result<(), StorageError> {
    let repo = Repository::open(workspace)?;
    let head = repo.head()?.peel_to_commit()?.id();
    let branch = vcs::current_branch(&repo).unwrap_or_else(|| "HEAD".to_string());
    let notes_ref = full_ref(&notes_ref_name(&branch, relative));
    let sig = repo
        .signature()
        .or_else(|_| git2::Signature::now("tabd", "tabd@localhost"))?;

    let line = record.encode()?;
    let body = match repo.find_note(Some(&notes_ref), head) {
        Ok(existing) => match existing.message() {
            Some(prev) => format!("{}\n{line}", prev.trim_end()),
            None => line,
        },
        Err(_) => line,
    };

    repo.note(&sig, &sig, Some(&notes_ref), head, &body, true)?;
    debug!(%notes_ref, "note record attached");

    if push && let Err(err) = push_ref(&repo, &notes_ref) {
        warn!(%notes_ref, error = %err, "note push failed; record kept locally");
    }
    Ok(())
}

/// Read every record from the file's notes ref, across all annotated
/// commits. Malformed lines are skipped with a warning.
pub fn load_records(
    workspace: &Path,
    relative: &Path,
    fetch: bool,
) -> Result<Vec<LogRecord>, StorageError> {
    let repo = Repository::open(workspace)?;
    let branch = vcs::current_branch(&repo).unwrap_or_else(|| "HEAD".to_string());
    let notes_ref = full_ref(&notes_ref_name(&branch, relative));

    if fetch && let Err(err) = fetch_ref(&repo, &notes_ref) {
        warn!(%notes_ref, error = %err, "note fetch failed; using local notes");
    }

    let mut records = Vec::new();
    let notes = match repo.notes(Some(&notes_ref)) {
        Ok(notes) => notes,
        Err(_) => return Ok(records),
    };
    for entry in notes {
        let Ok((_, annotated)) = entry else { continue };
        let Ok(note) = repo.find_note(Some(&notes_ref), annotated) else {
            continue;
        };
        let Some(body) = note.message() else { continue };
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            match LogRecord::decode(line) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(%notes_ref, error = %err, "malformed note record skipped");
                }
            }
        }
    }
    Ok(records)
}

fn push_ref(repo: &Repository, notes_ref: &str) -> Result<(), git2::Error> {
    let mut remote = repo.find_remote("origin")?;
    let refspec = format!("{notes_ref}:{notes_ref}");
    let mut options = git2::PushOptions::new();
    options.remote_callbacks(credential_callbacks(repo));
    remote.push(&[refspec.as_str()], Some(&mut options))
}

fn fetch_ref(repo: &Repository, notes_ref: &str) -> Result<(), git2::Error> {
    let mut remote = repo.find_remote("origin")?;
    let refspec = format!("{notes_ref}:{notes_ref}");
    let mut options = git2::FetchOptions::new();
    options.remote_callbacks(credential_callbacks(repo));
    remote.fetch(&[refspec.as_str()], Some(&mut options), None)
}

fn credential_callbacks(repo: &Repository) -> git2::RemoteCallbacks<'static> {
    let cfg = repo.config().ok();
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(move |url, username_from_url, allowed| {
        if allowed.is_ssh_key()
            && let Some(user) = username_from_url
        {
            return git2::Cred::ssh_key_from_agent(user);
        }
        if allowed.is_user_pass_plaintext()
            && let Some(ref cfg) = cfg
            && let Ok(cred) = git2::Cred::credential_helper(cfg, url, username_from_url)
        {
            return Ok(cred);
        }
        git2::Cred::default()
    });
    callbacks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_name_embeds_branch_and_path_hash() {
        let name = notes_ref_name("main", Path::new("src/lib.rs"));
        assert!(name.starts_with("tabd__main__"), "{name}");
        assert_eq!(name.len(), "tabd__main__".len() + 64);
        assert_ne!(
            name,
            notes_ref_name("main", Path::new("src/other.rs")),
            "distinct paths get distinct refs"
        );
        assert_ne!(
            name,
            notes_ref_name("dev", Path::new("src/lib.rs")),
            "distinct branches get distinct refs"
        );
    }
}
