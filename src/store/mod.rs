// src/store/mod.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::model::Defect;

const SNAPSHOT_FILE: &str = "defects.json";
const SNAPSHOT_TMP: &str = "defects.json.tmp";

/// The complete record set from one ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub defects: Vec<Defect>,
    pub timestamp: DateTime<Utc>,
}

/// `DefectStore` keeps the latest record set as a single JSON file.
///
/// Each `replace` writes the whole set to a temporary file and renames it over
/// the previous one, so a reader sees either the old set or the new set.
pub struct DefectStore {
    dir: PathBuf,
}

impl DefectStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating store directory {:?}", &dir))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    /// Replace the stored set wholesale with `defects`.
    pub fn replace(&self, defects: Vec<Defect>) -> Result<Snapshot> {
        let snapshot = Snapshot {
            defects,
            timestamp: Utc::now(),
        };

        let tmp_path = self.dir.join(SNAPSHOT_TMP);
        let final_path = self.snapshot_path();
        {
            let file = File::create(&tmp_path)
                .with_context(|| format!("creating snapshot temp file {:?}", &tmp_path))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, &snapshot).context("serializing snapshot")?;
            writer.flush().context("flushing snapshot")?;
            writer
                .get_ref()
                .sync_all()
                .context("syncing snapshot temp file")?;
        }
        fs::rename(&tmp_path, &final_path)
            .with_context(|| format!("renaming {:?} -> {:?}", &tmp_path, &final_path))?;

        info!(
            records = snapshot.defects.len(),
            path = %final_path.display(),
            "stored snapshot"
        );
        Ok(snapshot)
    }

    /// The stored snapshot, or `None` if nothing has been ingested yet.
    pub fn load(&self) -> Result<Option<Snapshot>> {
        let path = self.snapshot_path();
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot yet");
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("opening snapshot {:?}", &path));
            }
        };
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing snapshot {:?}", &path))?;
        Ok(Some(snapshot))
    }

    /// Remove the stored snapshot; succeeds if there was none.
    pub fn clear(&self) -> Result<()> {
        let path = self.snapshot_path();
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "cleared snapshot");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing snapshot {:?}", &path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn defect(id: &str) -> Defect {
        Defect {
            id: id.into(),
            summary: format!("summary {id}"),
            created_at: "2024-05-30T10:00:00.000Z".into(),
            ..Default::default()
        }
    }

    #[test]
    fn load_before_any_replace_is_none() -> Result<()> {
        let dir = tempdir()?;
        let store = DefectStore::open(dir.path().join("nested"))?;
        assert!(store.load()?.is_none());
        Ok(())
    }

    #[test]
    fn replace_swaps_the_whole_set() -> Result<()> {
        let dir = tempdir()?;
        let store = DefectStore::open(dir.path())?;

        store.replace(vec![defect("A"), defect("B")])?;
        let second = store.replace(vec![defect("C")])?;

        let loaded = store.load()?.expect("snapshot present");
        assert_eq!(loaded, second);
        let ids: Vec<&str> = loaded.defects.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["C"]);
        assert!(!dir.path().join(SNAPSHOT_TMP).exists());
        Ok(())
    }

    #[test]
    fn clear_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let store = DefectStore::open(dir.path())?;
        store.replace(vec![defect("A")])?;
        store.clear()?;
        store.clear()?;
        assert!(store.load()?.is_none());
        Ok(())
    }

    #[test]
    fn corrupt_snapshot_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let store = DefectStore::open(dir.path())?;
        fs::write(dir.path().join(SNAPSHOT_FILE), "{not json")?;
        assert!(store.load().is_err());
        Ok(())
    }
}
