//! Artifact store: the persistence gateway over the shared directory
//!
//! Writes artifact files into the version-controlled store directory and
//! records each one in history via the [`HistoryBackend`]. The file write
//! always precedes the commit attempt; a failed commit leaves the file on
//! disk and surfaces the error to the caller.

use crate::error::Error;
use crate::history::HistoryBackend;
use crate::store::types::{Artifact, ArtifactKind};
use crate::Result;
use base64::Engine;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Persistence gateway over the store directory and its history.
pub struct ArtifactStore {
    dir: PathBuf,
    device: String,
    history: Arc<dyn HistoryBackend>,
}

impl ArtifactStore {
    /// Open the store, bootstrapping on first-ever startup.
    ///
    /// When the directory is absent it is created and a fresh repository is
    /// initialized; when it already exists no initialization occurs,
    /// regardless of its internal state.
    pub async fn open(
        dir: PathBuf,
        device: String,
        history: Arc<dyn HistoryBackend>,
    ) -> Result<Self> {
        if !dir.exists() {
            tokio::fs::create_dir_all(&dir).await?;
            if let Err(e) = history.init().await {
                // The store still works without history; commits will
                // surface their own errors on each save.
                tracing::warn!(
                    dir = %dir.display(),
                    "Failed to initialize history: {}",
                    e
                );
            } else {
                tracing::info!(dir = %dir.display(), "Initialized artifact store");
            }
        }
        // Resolve relative paths up front so artifact paths handed to the
        // front end are always absolute.
        let dir = tokio::fs::canonicalize(&dir).await?;
        Ok(Self {
            dir,
            device,
            history,
        })
    }

    /// Store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Device identity used to namespace media filenames.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Write a text note verbatim and commit it.
    pub async fn write_note(&self, filename: &str, content: &str) -> Result<PathBuf> {
        let path = self.prepare_path(filename)?;
        tokio::fs::write(&path, content).await?;
        self.commit(filename).await?;
        tracing::info!(filename = filename, "Saved note");
        Ok(path)
    }

    /// Decode a base64 media payload, write the binary and commit it.
    ///
    /// Accepts payloads with or without a `data:<mime>;base64,` prefix.
    pub async fn write_media(&self, filename: &str, payload: &str) -> Result<PathBuf> {
        let path = self.prepare_path(filename)?;
        let encoded = strip_data_url_prefix(payload);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Store(format!("invalid base64 payload: {}", e)))?;
        tokio::fs::write(&path, bytes).await?;
        self.commit(filename).await?;
        tracing::info!(filename = filename, "Saved media");
        Ok(path)
    }

    /// Enumerate all artifacts, oldest first.
    ///
    /// Hidden entries and unrecognized extensions are skipped. Content is
    /// read for notes only; media artifacts are returned as metadata so
    /// large binary payloads never enter memory.
    pub async fn list(&self) -> Result<Vec<Artifact>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            Error::Store(format!("failed to read {}: {}", self.dir.display(), e))
        })?;

        let mut artifacts = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let filename = entry.file_name().to_string_lossy().into_owned();
            if filename.starts_with('.') {
                continue;
            }
            let kind = match ArtifactKind::from_filename(&filename) {
                Some(kind) => kind,
                None => continue,
            };
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            let modified_at = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            let path = entry.path();

            let content = if kind == ArtifactKind::Note {
                // An unreadable note renders as empty rather than failing
                // the whole listing.
                Some(tokio::fs::read_to_string(&path).await.unwrap_or_default())
            } else {
                None
            };

            artifacts.push(Artifact {
                filename,
                kind,
                modified_at,
                size_bytes: meta.len(),
                path,
                content,
            });
        }

        artifacts.sort_by(|a, b| {
            a.modified_at
                .cmp(&b.modified_at)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Ok(artifacts)
    }

    /// Validate the filename and resolve its path, refusing overwrites.
    fn prepare_path(&self, filename: &str) -> Result<PathBuf> {
        validate_filename(filename)?;
        let path = self.dir.join(filename);
        if path.exists() {
            return Err(Error::Store(format!(
                "artifact {} already exists",
                filename
            )));
        }
        Ok(path)
    }

    async fn commit(&self, filename: &str) -> Result<()> {
        self.history
            .commit_file(filename, &format!("Add {}", filename))
            .await
    }
}

/// Check filename legality: non-hidden, no path components, recognized
/// artifact extension.
pub fn validate_filename(filename: &str) -> Result<()> {
    if filename.is_empty() {
        return Err(Error::Store("empty filename".to_string()));
    }
    if filename.starts_with('.') {
        return Err(Error::Store(format!("hidden filename: {}", filename)));
    }
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(Error::Store(format!(
            "filename must not contain path components: {}",
            filename
        )));
    }
    if ArtifactKind::from_filename(filename).is_none() {
        return Err(Error::Store(format!(
            "unrecognized artifact extension: {}",
            filename
        )));
    }
    Ok(())
}

fn strip_data_url_prefix(payload: &str) -> &str {
    match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    }
}
