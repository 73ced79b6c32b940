//! Temporary git workspaces for persistence tests.

use std::fs;
use std::path::{Path, PathBuf};

use git2::Repository;
use tempfile::TempDir;

pub struct TempWorkspace {
    dir: TempDir,
}

impl TempWorkspace {
    /// Fresh git repository with an identity configured.
    ///
    /// The directory name must not start with a dot: dot-directories are
    /// excluded from tracking.
    pub fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("tabd-test-")
            .tempdir()
            .expect("temp workspace");
        let repo = Repository::init(dir.path()).expect("git init");
        let mut config = repo.config().expect("repo config");
        config.set_str("user.name", "Test Author").expect("user.name");
        config
            .set_str("user.email", "test@example.com")
            .expect("user.email");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn file_path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `relative` without committing.
    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.file_path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write file");
    }

    /// Write `relative` and commit it to HEAD, so notes have a commit to
    /// attach to.
    pub fn commit_file(&self, relative: &str, content: &str) {
        self.write_file(relative, content);

        let repo = Repository::open(self.root()).expect("open repo");
        let mut index = repo.index().expect("index");
        index.add_path(Path::new(relative)).expect("index add");
        index.write().expect("index write");
        let tree_id = index.write_tree().expect("write tree");
        let tree = repo.find_tree(tree_id).expect("find tree");
        let sig = repo.signature().expect("signature");
        let parent = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, "add file", &tree, &parents)
            .expect("commit");
    }
}
