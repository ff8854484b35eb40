pub mod json_archive;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::core::SignalDataContainer;

pub use json_archive::{ArchiveRecord, JsonArchive};

/// File name prefix for stored reference signals
pub const ARCHIVE_PREFIX: &str = "InSig";

/// Day-first timestamp used in archive file names
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y_%H-%M-%S";

/// Destination for validated signals
#[async_trait]
pub trait SignalArchive: Send + Sync {
    /// Persist the sample arrays of `signal`, returning where they went.
    ///
    /// Shared ownership lets implementations write from a blocking thread
    /// without copying the arrays.
    async fn store(&self, signal: Arc<SignalDataContainer>) -> Result<PathBuf>;
}

/// `InSig_<DD-MM-YYYY_HH-MM-SS>.<ext>`
pub fn archive_file_name(timestamp: NaiveDateTime, ext: &str) -> String {
    format!("{}_{}.{}", ARCHIVE_PREFIX, timestamp.format(TIMESTAMP_FORMAT), ext)
}

/// Timestamp and collision suffix of an archive file name, `None` for any
/// other name. An unsuffixed name has sequence 0.
pub fn archive_timestamp(name: &str) -> Option<(NaiveDateTime, u32)> {
    let stem = name.strip_prefix(ARCHIVE_PREFIX)?.strip_prefix('_')?;
    let stem = stem.rsplit_once('.').map_or(stem, |(stem, _)| stem);

    let timestamp = NaiveDateTime::parse_from_str(stem.get(..19)?, TIMESTAMP_FORMAT).ok()?;
    let sequence = match stem.get(19..)? {
        "" => 0,
        rest => rest.strip_prefix('_')?.parse().ok()?,
    };
    Some((timestamp, sequence))
}
