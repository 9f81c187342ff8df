//! Companion audio files for voice messages.
//!
//! Recordings arrive from the recorder somewhere outside our control (a temp
//! file, a cache dir). [`AudioStorage::import_recording`] copies them into the
//! managed audio directory so the store owns their lifetime.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use rand::Rng;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ChatStoreError, Result};

/// Extension used when the recording has none
pub const DEFAULT_EXTENSION: &str = "m4a";
/// Bars in a generated waveform
pub const DEFAULT_WAVEFORM_BARS: usize = 40;

const FILE_PREFIX: &str = "voice_";

/// Managed directory of voice message files
#[derive(Debug, Clone)]
pub struct AudioStorage {
    root: PathBuf,
}

impl AudioStorage {
    /// Use `root` as the audio directory; call [`Self::ensure_dir`] before writing
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The managed directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the audio directory if it doesn't exist
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Copy a recording into the audio directory under a fresh name
    pub async fn import_recording(&self, source: &Path) -> Result<PathBuf> {
        match fs::metadata(source).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(ChatStoreError::AudioFileMissing(source.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ChatStoreError::AudioFileMissing(source.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        }

        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXTENSION);
        let destination = self.root.join(format!("{FILE_PREFIX}{}.{extension}", Uuid::new_v4()));

        self.ensure_dir().await?;
        let bytes = fs::copy(source, &destination).await?;
        info!(
            source = %source.display(),
            destination = %destination.display(),
            bytes,
            "Imported recording"
        );
        Ok(destination)
    }

    /// Delete an audio file. Returns `false` when it was already gone.
    pub async fn delete(&self, uri: &str) -> Result<bool> {
        let path = Path::new(uri);
        if !self.is_managed(path).await {
            warn!(uri, "Refusing to delete audio outside the audio directory");
            return Ok(false);
        }

        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(uri, "Deleted audio file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(uri, "Audio file already gone");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the file behind `uri` exists
    pub async fn exists(&self, uri: &str) -> Result<bool> {
        Ok(fs::try_exists(uri).await?)
    }

    /// Size of the file behind `uri` in bytes
    pub async fn file_size(&self, uri: &str) -> Result<u64> {
        match fs::metadata(uri).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ChatStoreError::AudioFileMissing(PathBuf::from(uri)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every voice file in the audio directory
    pub async fn list_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_voice = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(FILE_PREFIX));
            if is_voice && entry.file_type().await?.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Delete voice files that none of `referenced_uris` point at.
    ///
    /// Files are matched by file name, so a URI written under another
    /// spelling of the audio directory still keeps its file.
    pub async fn prune_orphans<'a, I>(&self, referenced_uris: I) -> Result<Vec<PathBuf>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let referenced: HashSet<&OsStr> = referenced_uris
            .into_iter()
            .filter_map(|uri| Path::new(uri).file_name())
            .collect();

        let mut removed = Vec::new();
        for path in self.list_files().await? {
            if path.file_name().is_some_and(|name| referenced.contains(name)) {
                continue;
            }
            fs::remove_file(&path).await?;
            removed.push(path);
        }

        if !removed.is_empty() {
            info!(count = removed.len(), "Pruned orphaned audio files");
        }
        Ok(removed)
    }

    /// Delete every voice file in the audio directory
    pub async fn clear(&self) -> Result<usize> {
        let files = self.list_files().await?;
        for path in &files {
            fs::remove_file(path).await?;
        }
        Ok(files.len())
    }

    /// A voice file directly inside the audio directory, however either path is spelled
    async fn is_managed(&self, path: &Path) -> bool {
        let voice_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(FILE_PREFIX));
        let Some(parent) = path.parent().filter(|_| voice_name) else {
            return false;
        };
        let parent = if parent.as_os_str().is_empty() { Path::new(".") } else { parent };

        match (fs::canonicalize(parent).await, fs::canonicalize(&self.root).await) {
            (Ok(parent), Ok(root)) => parent == root,
            _ => false,
        }
    }
}

/// Generate a placeholder waveform with `bars` amplitudes in `[0.1, 1.0]`
#[must_use]
pub fn generate_waveform(bars: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..bars).map(|_| rng.gen_range(0.1_f32..=1.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_waveform_range() {
        let waveform = generate_waveform(DEFAULT_WAVEFORM_BARS);
        assert_eq!(waveform.len(), DEFAULT_WAVEFORM_BARS);
        assert!(waveform.iter().all(|v| (0.1..=1.0).contains(v)));
    }

    #[tokio::test]
    async fn test_import_missing_recording() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AudioStorage::new(dir.path().join("audio"));
        let err = storage.import_recording(&dir.path().join("nope.m4a")).await.unwrap_err();
        assert!(matches!(err, ChatStoreError::AudioFileMissing(_)));
    }

    #[tokio::test]
    async fn test_delete_through_other_spelling_of_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AudioStorage::new(dir.path().join("audio"));
        let source = dir.path().join("rec.m4a");
        std::fs::write(&source, b"x").unwrap();
        let imported = storage.import_recording(&source).await.unwrap();

        let name = imported.file_name().unwrap();
        let respelled = dir.path().join("audio").join(".").join(name);
        assert!(storage.delete(respelled.to_str().unwrap()).await.unwrap());
        assert!(!imported.exists());
    }

    #[tokio::test]
    async fn test_delete_ignores_foreign_paths() {
        let dir = tempfile::tempdir().unwrap();
        let foreign = dir.path().join("keep.m4a");
        std::fs::write(&foreign, b"x").unwrap();

        let storage = AudioStorage::new(dir.path().join("audio"));
        assert!(!storage.delete(foreign.to_str().unwrap()).await.unwrap());
        assert!(foreign.exists());
    }
}
