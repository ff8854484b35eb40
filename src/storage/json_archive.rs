use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::{fs, task};

use super::{archive_file_name, archive_timestamp, SignalArchive};
use crate::core::{SignalDataContainer, SignalMetadata, SignalResult};

/// On-disk form of a stored signal, as read back by [`JsonArchive::load`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArchiveRecord {
    pub sin: Vec<f64>,
    pub cos: Vec<f64>,
    pub t: Vec<f64>,
    #[serde(default)]
    pub metadata: Option<SignalMetadata>,
}

impl ArchiveRecord {
    /// Rebuild a container for replay. Records stored without metadata fail
    /// with the full list of missing fields.
    pub fn into_signal(self) -> SignalResult<SignalDataContainer> {
        SignalDataContainer::new(self.sin, self.cos, self.t, self.metadata.unwrap_or_default())
    }
}

/// Serialized view borrowing the container's arrays
#[derive(Serialize)]
struct ArchiveView<'a> {
    sin: &'a [f64],
    cos: &'a [f64],
    t: &'a [f64],
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a SignalMetadata>,
}

impl<'a> ArchiveView<'a> {
    fn new(signal: &'a SignalDataContainer, include_metadata: bool) -> Self {
        Self {
            sin: signal.in_phase(),
            cos: signal.quadrature(),
            t: signal.time_base(),
            metadata: include_metadata.then(|| signal.metadata()),
        }
    }
}

/// Writes signals as timestamped JSON files under one directory
#[derive(Debug, Clone)]
pub struct JsonArchive {
    dir: PathBuf,
    include_metadata: bool,
}

impl JsonArchive {
    pub const EXTENSION: &'static str = "json";

    /// Archive rooted at `dir`. The directory is created on first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            include_metadata: false,
        }
    }

    /// Also store the metadata mapping next to the arrays (off by default)
    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<ArchiveRecord> {
        let path = path.as_ref().to_path_buf();
        task::spawn_blocking(move || -> Result<ArchiveRecord> {
            let file = File::open(&path).context(format!("Failed to read archive from {:?}", path))?;
            serde_json::from_reader(BufReader::new(file)).context("Failed to parse archive JSON")
        })
        .await
        .context("Archive reader task failed")?
    }

    /// Stored archives, oldest first by the timestamp in their names
    pub async fn list(&self) -> Result<Vec<PathBuf>> {
        let mut archives: Vec<((chrono::NaiveDateTime, u32), PathBuf)> = Vec::new();

        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.dir)
            .await
            .context("Failed to read archive directory")?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(Self::EXTENSION) {
                continue;
            }
            if let Some(key) = path.file_name().and_then(|n| n.to_str()).and_then(archive_timestamp) {
                archives.push((key, path));
            }
        }

        archives.sort();
        Ok(archives.into_iter().map(|(_, path)| path).collect())
    }

    /// Timestamped path; a numeric suffix is added when the second is already taken
    fn next_path(&self) -> PathBuf {
        let name = archive_file_name(Local::now().naive_local(), Self::EXTENSION);
        let mut path = self.dir.join(&name);

        let stem = name.trim_end_matches(&format!(".{}", Self::EXTENSION)).to_string();
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("{}_{}.{}", stem, n, Self::EXTENSION));
            n += 1;
        }
        path
    }
}

/// Stream `signal` as JSON into `path` without an intermediate string
fn write_archive(path: &Path, signal: &SignalDataContainer, include_metadata: bool) -> Result<()> {
    let file = File::create(path).context("Failed to create temporary archive file")?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, &ArchiveView::new(signal, include_metadata))
        .context("Failed to serialize signal archive")?;
    writer.flush().context("Failed to write temporary archive file")?;
    Ok(())
}

#[async_trait]
impl SignalArchive for JsonArchive {
    async fn store(&self, signal: Arc<SignalDataContainer>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .await
            .context("Failed to create archive directory")?;

        let path = self.next_path();
        let temp_path = path.with_extension("tmp");
        let samples = signal.len();

        let include_metadata = self.include_metadata;
        let writer_path = temp_path.clone();
        let written = task::spawn_blocking(move || write_archive(&writer_path, &signal, include_metadata))
            .await
            .context("Archive writer task failed")?;

        if let Err(e) = written {
            if temp_path.exists() && fs::remove_file(&temp_path).await.is_err() {
                warn!("Could not remove partial archive {:?}", temp_path);
            }
            return Err(e);
        }

        fs::rename(&temp_path, &path)
            .await
            .context(format!("Failed to move archive into place at {:?}", path))?;

        info!("Wrote {} samples to {:?}", samples, path);
        Ok(path)
    }
}
