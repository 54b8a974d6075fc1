//! Filesystem-backed document registry.
//!
//! The storage directory is the only state: documents are identified by
//! their file name and all metadata comes from `stat`. Every path handed to
//! the filesystem goes through [`FileRegistry::resolve_path`].

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::kind::is_supported;
use super::naming::{numbered_name, sanitize_file_name};
use super::record::DocumentRecord;
use crate::{DocError, Result};

/// Registry of the documents in one storage directory.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    /// Storage directory.
    root: PathBuf,
    /// Base URL under which `/files/{name}` is publicly served.
    public_base_url: String,
}

impl FileRegistry {
    /// Open a registry, creating the storage directory if needed.
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            public_base_url: public_base_url.into(),
        })
    }

    /// Storage directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL for a stored name.
    pub fn file_url(&self, name: &str) -> String {
        format!("{}/files/{}", self.public_base_url, urlencoding::encode(name))
    }

    /// Map an identifier to a path directly inside the storage directory.
    ///
    /// Only the last `/` or `\` separated segment of `id` is used. Segments
    /// that cannot name a file (`""`, `.`, `..`) are reported as not found.
    pub fn resolve_path(&self, id: &str) -> Result<PathBuf> {
        let name = safe_name(id).ok_or_else(|| DocError::NotFound(format!("file {id}")))?;
        Ok(self.root.join(name))
    }

    /// List supported documents in directory-iteration order.
    pub async fn list(&self) -> Result<Vec<DocumentRecord>> {
        let mut dir = fs::read_dir(&self.root).await?;
        let mut records = Vec::new();

        while let Some(entry) = dir.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                tracing::debug!(entry = ?file_name, "Skipping non UTF-8 file name");
                continue;
            };

            match self.stat(name).await {
                Ok(record) => records.push(record),
                Err(DocError::NotFound(_) | DocError::UnsupportedType(_)) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(records)
    }

    /// Look up one document.
    ///
    /// Missing entries and entries that are not regular files are
    /// `NotFound`; an unsupported extension is `UnsupportedType`.
    pub async fn stat(&self, id: &str) -> Result<DocumentRecord> {
        let path = self.resolve_path(id)?;
        let name = safe_name(id).unwrap_or(id);

        let metadata = match fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(DocError::NotFound(format!("file {name}"))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DocError::NotFound(format!("file {name}")))
            }
            Err(e) => return Err(e.into()),
        };

        if !is_supported(name) {
            return Err(DocError::UnsupportedType(name.to_string()));
        }

        Ok(DocumentRecord::from_metadata(
            name,
            &metadata,
            self.file_url(name),
        ))
    }

    /// First free name for `name`, adding ` (n)` before the extension.
    ///
    /// The check is not atomic with the later write; [`Self::store`] creates
    /// files exclusively and retries if another upload took the name first.
    pub async fn unique_name(&self, name: &str) -> Result<String> {
        let mut candidate = name.to_string();
        let mut counter = 1;

        while fs::try_exists(self.resolve_path(&candidate)?).await? {
            candidate = numbered_name(name, counter);
            counter += 1;
        }

        Ok(candidate)
    }

    /// Persist uploaded bytes under a sanitized, unique name.
    ///
    /// The extension is checked on the sanitized name, which is the one that
    /// ends up on disk.
    pub async fn store(&self, content: &[u8], suggested_name: &str) -> Result<DocumentRecord> {
        let sanitized = sanitize_file_name(suggested_name);
        if !is_supported(&sanitized) {
            return Err(DocError::UnsupportedType(sanitized));
        }

        loop {
            let name = self.unique_name(&sanitized).await?;
            let path = self.resolve_path(&name)?;

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(name = %name, "Name taken concurrently, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = write_all(&mut file, content).await {
                drop(file);
                let _ = fs::remove_file(&path).await;
                return Err(e.into());
            }

            let metadata = fs::metadata(&path).await?;
            tracing::info!(name = %name, size = content.len(), "Stored document");
            return Ok(DocumentRecord::from_metadata(
                &name,
                &metadata,
                self.file_url(&name),
            ));
        }
    }

    /// Delete a document.
    ///
    /// The extension is checked before the filesystem is touched.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let name = safe_name(id).ok_or_else(|| DocError::NotFound(format!("file {id}")))?;
        if !is_supported(name) {
            return Err(DocError::UnsupportedType(name.to_string()));
        }

        match fs::remove_file(self.root.join(name)).await {
            Ok(()) => {
                tracing::info!(name = %name, "Deleted document");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DocError::NotFound(format!("file {name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace a document's content.
    ///
    /// The bytes go to a hidden sibling first and are renamed over the
    /// document, so a failed write leaves the previous content intact.
    pub async fn overwrite(&self, id: &str, content: &[u8]) -> Result<()> {
        let path = self.resolve_path(id)?;
        let name = safe_name(id).unwrap_or(id);
        let staging = self.root.join(staging_name(name));

        let result = async {
            let mut file = fs::File::create(&staging).await?;
            write_all(&mut file, content).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&staging, &path).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }

        tracing::debug!(name = %name, size = content.len(), "Overwrote document");
        Ok(())
    }
}

/// Hidden, unsupported name used while a replacement is being written.
fn staging_name(name: &str) -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!(".{name}.{}-{nanos}.partial", std::process::id())
}

async fn write_all(file: &mut fs::File, content: &[u8]) -> io::Result<()> {
    file.write_all(content).await?;
    file.flush().await
}

/// Final path segment of an identifier, if it can name a file.
fn safe_name(id: &str) -> Option<&str> {
    let name = id.rsplit(['/', '\\']).next().unwrap_or(id);
    match name {
        "" | "." | ".." => None,
        _ => Some(name),
    }
}
