use std::{collections::HashMap, fmt, io::ErrorKind, path::PathBuf, sync::Mutex};

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    Error, Result, config,
    types::{Device, Playlist},
};

/// Logical keys of the single-record pointer files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    ActiveDevice,
    ActiveRadioPlaylist,
}

impl RecordKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKey::ActiveDevice => "activeDevice",
            RecordKey::ActiveRadioPlaylist => "activeRadioPlaylist",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            RecordKey::ActiveDevice => "device.json",
            RecordKey::ActiveRadioPlaylist => "radio.json",
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value stored under exactly one [`RecordKey`].
pub trait Record: Serialize + DeserializeOwned {
    const KEY: RecordKey;
}

impl Record for Device {
    const KEY: RecordKey = RecordKey::ActiveDevice;
}

impl Record for Playlist {
    const KEY: RecordKey = RecordKey::ActiveRadioPlaylist;
}

/// Key to JSON-record storage behind the radio engine.
///
/// Backends implement the raw string operations; the typed helpers handle
/// serialization. A missing record is `Ok(None)`, corrupt JSON is an error.
#[allow(async_fn_in_trait)]
pub trait PointerStore {
    async fn read(&self, key: RecordKey) -> Result<Option<String>>;

    async fn write(&self, key: RecordKey, contents: String) -> Result<()>;

    /// Removes the record. Removing a missing record succeeds.
    async fn remove(&self, key: RecordKey) -> Result<()>;

    async fn load<R: Record>(&self) -> Result<Option<R>> {
        match self.read(R::KEY).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| Error::persistence(R::KEY, e)),
            None => Ok(None),
        }
    }

    async fn save<R: Record>(&self, record: &R) -> Result<()> {
        let json =
            serde_json::to_string_pretty(record).map_err(|e| Error::persistence(R::KEY, e))?;
        self.write(R::KEY, json).await
    }

    async fn delete<R: Record>(&self) -> Result<()> {
        self.remove(R::KEY).await
    }
}

/// Stores each record as a pretty-printed JSON file in one directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self, key: RecordKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Staging file a record is written to before it replaces the real one.
    pub fn staging_path(&self, key: RecordKey) -> PathBuf {
        self.dir.join(format!("{}.tmp", key.file_name()))
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new(config::app_dir())
    }
}

impl PointerStore for FileStore {
    async fn read(&self, key: RecordKey) -> Result<Option<String>> {
        match async_fs::read_to_string(self.path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::persistence(key, e)),
        }
    }

    async fn write(&self, key: RecordKey, contents: String) -> Result<()> {
        async_fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::persistence(key, e))?;
        // rename within one directory replaces the record in a single step
        let staging = self.staging_path(key);
        async_fs::write(&staging, contents)
            .await
            .map_err(|e| Error::persistence(key, e))?;
        async_fs::rename(&staging, self.path(key))
            .await
            .map_err(|e| Error::persistence(key, e))
    }

    async fn remove(&self, key: RecordKey) -> Result<()> {
        match async_fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::persistence(key, e)),
        }
    }
}

/// In-process backend, used by tests and by callers that must not touch disk.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<RecordKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: RecordKey) -> bool {
        self.records
            .lock()
            .map(|records| records.contains_key(&key))
            .unwrap_or(false)
    }
}

impl PointerStore for MemoryStore {
    async fn read(&self, key: RecordKey) -> Result<Option<String>> {
        let records = self
            .records
            .lock()
            .map_err(|e| Error::persistence(key, e))?;
        Ok(records.get(&key).cloned())
    }

    async fn write(&self, key: RecordKey, contents: String) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| Error::persistence(key, e))?;
        records.insert(key, contents);
        Ok(())
    }

    async fn remove(&self, key: RecordKey) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| Error::persistence(key, e))?;
        records.remove(&key);
        Ok(())
    }
}
