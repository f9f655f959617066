//! File-backed save slots for campaign progress.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ProgressStorage;
use crate::progress::CampaignProgress;
use crate::stream::{ByteOrder, StreamError, StreamReader, StreamWriter};

pub const SAVE_EXTENSION: &str = "sav";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("save slot name {0:?} is not allowed")]
    InvalidSlot(String),
    #[error("save file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("save file is corrupt: {0}")]
    Stream(#[from] StreamError),
}

/// Stores each slot as `<dir>/<slot>.sav`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    order: ByteOrder,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            order: ByteOrder::default(),
        }
    }

    #[must_use]
    pub const fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a slot's file.
    ///
    /// # Errors
    ///
    /// Rejects empty names and names that would escape the save directory.
    pub fn slot_path(&self, slot: &str) -> Result<PathBuf, StorageError> {
        let valid = !slot.is_empty()
            && slot
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
        if !valid {
            return Err(StorageError::InvalidSlot(slot.to_string()));
        }
        Ok(self.dir.join(format!("{slot}.{SAVE_EXTENSION}")))
    }
}

/// Write a record to `path` in the given byte order.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_progress_file(
    path: &Path,
    progress: &CampaignProgress,
    order: ByteOrder,
) -> Result<(), StorageError> {
    let mut writer = StreamWriter::new(BufWriter::new(File::create(path)?), order);
    writer.write(progress)?;
    writer.finish()?;
    Ok(())
}

/// Read a record from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or does not hold a record.
pub fn read_progress_file(path: &Path, order: ByteOrder) -> Result<CampaignProgress, StorageError> {
    let mut reader = StreamReader::new(BufReader::new(File::open(path)?), order);
    Ok(reader.read()?)
}

impl ProgressStorage for FileStorage {
    type Error = StorageError;

    fn save_progress(&self, slot: &str, progress: &CampaignProgress) -> Result<(), Self::Error> {
        let path = self.slot_path(slot)?;
        fs::create_dir_all(&self.dir)?;
        write_progress_file(&path, progress, self.order)?;
        log::debug!("saved campaign progress to {}", path.display());
        Ok(())
    }

    fn load_progress(&self, slot: &str) -> Result<Option<CampaignProgress>, Self::Error> {
        let path = self.slot_path(slot)?;
        match read_progress_file(&path, self.order) {
            Ok(progress) => Ok(Some(progress)),
            Err(StorageError::Io(err)) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn delete_save(&self, slot: &str) -> Result<(), Self::Error> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::{BonusKind, ScenarioBonus};

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "saga-storage-{label}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn sample() -> CampaignProgress {
        let mut progress = CampaignProgress::new();
        progress.set_campaign_id(1);
        progress.set_pending_bonus(ScenarioBonus::new(BonusKind::PrimarySkill, 2, 1));
        progress.mark_active_scenario_completed();
        progress.set_active_scenario(1);
        progress.add_award(0);
        progress.add_days_passed(44);
        progress
    }

    #[test]
    fn slots_round_trip_through_disk() {
        let dir = temp_dir("roundtrip");
        let storage = FileStorage::new(&dir);
        assert!(storage.load_progress("slot-one").unwrap().is_none());

        storage.save_progress("slot-one", &sample()).unwrap();
        assert_eq!(storage.load_progress("slot-one").unwrap(), Some(sample()));

        storage.delete_save("slot-one").unwrap();
        storage.delete_save("slot-one").unwrap();
        assert!(storage.load_progress("slot-one").unwrap().is_none());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn byte_order_is_respected() {
        let dir = temp_dir("order");
        let little = FileStorage::new(&dir).with_byte_order(ByteOrder::Little);
        little.save_progress("le", &sample()).unwrap();
        let raw = fs::read(little.slot_path("le").unwrap()).unwrap();
        assert_eq!(&raw[..4], &[1, 0, 0, 0]);
        assert_eq!(little.load_progress("le").unwrap(), Some(sample()));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = temp_dir("corrupt");
        let storage = FileStorage::new(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(storage.slot_path("bad").unwrap(), [0, 0, 0]).unwrap();
        assert!(matches!(
            storage.load_progress("bad"),
            Err(StorageError::Stream(_))
        ));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn slot_names_cannot_escape_directory() {
        let storage = FileStorage::new("saves");
        for bad in ["", "../up", "a/b", "dot.dot"] {
            assert!(matches!(
                storage.slot_path(bad),
                Err(StorageError::InvalidSlot(_))
            ));
        }
        assert_eq!(
            storage.slot_path("campaign_1").unwrap(),
            Path::new("saves").join("campaign_1.sav")
        );
    }
}
