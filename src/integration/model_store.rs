//! Local cache for model weights backed by a remote store.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{BoxError, ModelStoreError};

/// Resolves a remote model path to a file on local disk.
pub trait ModelStore {
    /// Return a local path for `remote_path`, fetching it if no local copy
    /// exists. Fails with [`ModelStoreError::ModelUnavailable`] when the
    /// fetch fails.
    fn ensure_local(&self, remote_path: &str) -> Result<PathBuf, ModelStoreError>;
}

/// Entry returned when listing a remote folder. Paths are full remote paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEntry {
    File(String),
    Folder(String),
}

/// Minimal remote artifact store. Authentication is the implementor's concern.
pub trait RemoteStore {
    /// Copy the file at `remote_path` to `local_path`.
    fn download(&self, remote_path: &str, local_path: &Path) -> Result<(), BoxError>;

    /// List the direct children of a remote folder.
    fn list_folder(&self, remote_path: &str) -> Result<Vec<RemoteEntry>, BoxError>;
}

/// A mounted directory (network share, synced folder) used as a remote store.
#[derive(Debug, Clone)]
pub struct DirectoryRemote {
    root: PathBuf,
}

impl DirectoryRemote {
    /// Serve remote paths relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, remote_path: &str) -> PathBuf {
        self.root.join(remote_path.trim_start_matches('/'))
    }
}

impl RemoteStore for DirectoryRemote {
    fn download(&self, remote_path: &str, local_path: &Path) -> Result<(), BoxError> {
        fs::copy(self.resolve(remote_path), local_path)?;
        Ok(())
    }

    fn list_folder(&self, remote_path: &str) -> Result<Vec<RemoteEntry>, BoxError> {
        let base = remote_path.trim_end_matches('/');
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.resolve(remote_path))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = format!("{base}/{name}");
            if entry.file_type()?.is_dir() {
                entries.push(RemoteEntry::Folder(path));
            } else {
                entries.push(RemoteEntry::File(path));
            }
        }
        entries.sort_by(|a, b| remote_path_of(a).cmp(remote_path_of(b)));
        Ok(entries)
    }
}

fn remote_path_of(entry: &RemoteEntry) -> &str {
    match entry {
        RemoteEntry::File(p) | RemoteEntry::Folder(p) => p,
    }
}

fn file_name_of(remote_path: &str) -> Option<&str> {
    remote_path.rsplit('/').next().filter(|name| !name.is_empty())
}

/// [`ModelStore`] that keeps weights under `models_dir/<file name>` and
/// downloads them from a [`RemoteStore`] on first use.
pub struct CachedModelStore<R: RemoteStore> {
    remote: R,
    models_dir: PathBuf,
}

impl<R: RemoteStore> CachedModelStore<R> {
    /// Cache files fetched from `remote` under `models_dir`.
    pub fn new(remote: R, models_dir: impl Into<PathBuf>) -> Self {
        Self {
            remote,
            models_dir: models_dir.into(),
        }
    }

    /// Directory holding cached weights.
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Mirror a remote folder tree into `local_dir`, skipping files that
    /// already exist locally. Returns every local file path in the tree.
    ///
    /// Walks the tree with an explicit worklist, so depth is bounded by heap
    /// rather than stack.
    pub fn ensure_local_folder(
        &self,
        remote_folder: &str,
        local_dir: &Path,
    ) -> Result<Vec<PathBuf>, ModelStoreError> {
        let mut files = Vec::new();
        let mut worklist = vec![(remote_folder.to_string(), local_dir.to_path_buf())];

        while let Some((remote, local)) = worklist.pop() {
            create_dir(&local)?;
            let entries = self.remote.list_folder(&remote).map_err(|source| {
                ModelStoreError::ModelUnavailable {
                    remote_path: remote.clone(),
                    source,
                }
            })?;

            for entry in entries {
                match entry {
                    RemoteEntry::Folder(path) => {
                        let Some(name) = file_name_of(&path) else {
                            let message = format!("invalid folder path {path}");
                            return Err(ModelStoreError::Remote(message));
                        };
                        worklist.push((path.clone(), local.join(name)));
                    }
                    RemoteEntry::File(path) => {
                        let Some(name) = file_name_of(&path) else {
                            let message = format!("invalid file path {path}");
                            return Err(ModelStoreError::Remote(message));
                        };
                        let target = local.join(name);
                        if !target.is_file() {
                            self.fetch(&path, &target)?;
                        }
                        files.push(target);
                    }
                }
            }
        }

        files.sort();
        Ok(files)
    }

    /// Download into `<file name>.part` first so an interrupted fetch never
    /// looks like a cached model.
    fn fetch(&self, remote_path: &str, target: &Path) -> Result<(), ModelStoreError> {
        let partial = partial_path(target);
        info!(remote = remote_path, local = %target.display(), "Downloading model");

        if let Err(source) = self.remote.download(remote_path, &partial) {
            let _ = fs::remove_file(&partial);
            warn!(remote = remote_path, error = %source, "Model download failed");
            return Err(ModelStoreError::ModelUnavailable {
                remote_path: remote_path.to_string(),
                source,
            });
        }

        fs::rename(&partial, target).map_err(|source| ModelStoreError::Io {
            path: target.to_path_buf(),
            source,
        })
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}

fn create_dir(dir: &Path) -> Result<(), ModelStoreError> {
    fs::create_dir_all(dir).map_err(|source| ModelStoreError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

impl<R: RemoteStore> ModelStore for CachedModelStore<R> {
    fn ensure_local(&self, remote_path: &str) -> Result<PathBuf, ModelStoreError> {
        let name = file_name_of(remote_path)
            .ok_or_else(|| ModelStoreError::Remote(format!("invalid model path {remote_path}")))?;
        let local = self.models_dir.join(name);

        if local.is_file() {
            debug!(local = %local.display(), "Using cached model");
            return Ok(local);
        }

        create_dir(&self.models_dir)?;
        self.fetch(remote_path, &local)?;
        Ok(local)
    }
}
