use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::StoreError;

use super::{ArrayData, AttrValue, DimScale, Document, EntryKind, MemoryStore, Store};

/// A [`MemoryStore`] mirrored to a JSON document on disk.
///
/// Every write is applied in memory and then persisted through a temporary
/// file that replaces the target in one rename. When persisting fails the
/// in-memory document is rolled back, so callers never observe a write that
/// did not reach the disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
    modified: Option<SystemTime>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let (inner, modified) = read_document(&path)?;
        info!(path = %path.display(), "opened data file");
        Ok(Self {
            path,
            inner,
            modified,
        })
    }

    /// Writes `doc` to `path`, replacing any existing file.
    pub fn create(path: impl Into<PathBuf>, doc: Document) -> Result<Self, StoreError> {
        let path = path.into();
        let mut store = Self {
            path,
            inner: MemoryStore::from_document(doc)?,
            modified: None,
        };
        store.persist()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        self.inner.document()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let io_error = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let payload = serde_json::to_vec(self.inner.document()).map_err(|source| {
            StoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        let mut temp = NamedTempFile::new_in(&dir).map_err(io_error)?;
        temp.write_all(&payload).map_err(io_error)?;
        if let Ok(meta) = fs::metadata(&self.path) {
            temp.as_file()
                .set_permissions(meta.permissions())
                .map_err(io_error)?;
        }
        temp.as_file().sync_all().map_err(io_error)?;
        temp.persist(&self.path)
            .map_err(|error| io_error(error.error))?;

        self.modified = modified_time(&self.path);
        debug!(path = %self.path.display(), bytes = payload.len(), "persisted data file");
        Ok(())
    }

    fn commit<T>(
        &mut self,
        apply: impl FnOnce(&mut MemoryStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let snapshot = self.inner.clone();
        let output = apply(&mut self.inner)?;
        if let Err(error) = self.persist() {
            self.inner = snapshot;
            return Err(error);
        }
        Ok(output)
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

fn read_document(path: &Path) -> Result<(MemoryStore, Option<SystemTime>), StoreError> {
    let raw = fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: Document = serde_json::from_slice(&raw).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((MemoryStore::from_document(doc)?, modified_time(path)))
}

impl Store for JsonFileStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn entry(&self, path: &str) -> Result<EntryKind, StoreError> {
        self.inner.entry(path)
    }

    fn children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        self.inner.children(path)
    }

    fn attributes(&self, path: &str) -> Result<Vec<(String, AttrValue)>, StoreError> {
        self.inner.attributes(path)
    }

    fn read_array(&self, path: &str) -> Result<ArrayData, StoreError> {
        self.inner.read_array(path)
    }

    fn create_group(&mut self, path: &str) -> Result<(), StoreError> {
        self.commit(|inner| inner.create_group(path))
    }

    fn create_dataset(&mut self, path: &str, data: ArrayData) -> Result<(), StoreError> {
        self.commit(|inner| inner.create_dataset(path, data))
    }

    fn rename_entry(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
        self.commit(|inner| inner.rename_entry(from, to))
    }

    fn write_attribute(
        &mut self,
        path: &str,
        key: &str,
        value: AttrValue,
    ) -> Result<(), StoreError> {
        self.commit(|inner| inner.write_attribute(path, key, value))
    }

    fn rename_attribute(&mut self, path: &str, from: &str, to: &str) -> Result<(), StoreError> {
        self.commit(|inner| inner.rename_attribute(path, from, to))
    }

    fn delete_attribute(&mut self, path: &str, key: &str) -> Result<(), StoreError> {
        self.commit(|inner| inner.delete_attribute(path, key))
    }

    fn attach_scale(
        &mut self,
        dataset: &str,
        scale: &str,
        dim: usize,
        label: &str,
    ) -> Result<(), StoreError> {
        self.commit(|inner| inner.attach_scale(dataset, scale, dim, label))
    }

    fn scales(&self, dataset: &str) -> Result<Vec<DimScale>, StoreError> {
        self.inner.scales(dataset)
    }

    fn reload(&mut self) -> Result<(), StoreError> {
        let (inner, modified) = read_document(&self.path)?;
        self.inner = inner;
        self.modified = modified;
        info!(path = %self.path.display(), "reloaded data file");
        Ok(())
    }

    fn changed_on_disk(&self) -> bool {
        modified_time(&self.path) != self.modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut store = JsonFileStore::create(&path, Document::default()).unwrap();
        store.create_group("/g").unwrap();
        store.write_attribute("/g", "n", AttrValue::Int(4)).unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.attributes("/g").unwrap(),
            vec![("n".to_owned(), AttrValue::Int(4))]
        );
        assert!(!store.changed_on_disk());
    }

    #[test]
    fn failed_persist_rolls_back_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        let mut store = JsonFileStore::create(nested.join("data.json"), Document::default()).unwrap();
        store.create_group("/g").unwrap();

        fs::remove_dir_all(&nested).unwrap();
        let error = store.write_attribute("/g", "n", AttrValue::Int(4)).unwrap_err();
        assert!(matches!(error, StoreError::Io { .. }));
        assert!(store.attributes("/g").unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn writes_keep_the_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.json");
        let mut store = JsonFileStore::create(&path, Document::default()).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        store.create_group("/g").unwrap();
        store.write_attribute("/g", "n", AttrValue::Int(1)).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn corrupt_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Json { .. })
        ));
    }
}
