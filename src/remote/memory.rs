//! In-process document store used when no server is configured

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{RemoteError, RemoteResult, RemoteStore};

/// Documents kept in memory, listed in name order
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `(name, content)` pairs
    #[cfg(test)]
    pub fn with_files<I, K, V>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            files: Mutex::new(
                files
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn files(&self) -> RemoteResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.files
            .lock()
            .map_err(|_| RemoteError::Connection("document store lock poisoned".to_string()))
    }
}

impl RemoteStore for MemoryStore {
    fn list(&self) -> RemoteResult<Vec<String>> {
        Ok(self.files()?.keys().cloned().collect())
    }

    fn save(&self, filename: &str, content: &str) -> RemoteResult<()> {
        if filename.trim().is_empty() {
            return Err(RemoteError::Conflict("Filename is required".to_string()));
        }
        self.files()?
            .insert(filename.to_string(), content.to_string());
        Ok(())
    }

    fn load(&self, filename: &str) -> RemoteResult<String> {
        self.files()?
            .get(filename)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("File not found: {}", filename)))
    }

    fn delete(&self, filename: &str) -> RemoteResult<()> {
        self.files()?
            .remove(filename)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(format!("File not found: {}", filename)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_list_load_delete() {
        let store = MemoryStore::new();
        store.save("b.xml", "<b/>").unwrap();
        store.save("a.xml", "<a/>").unwrap();
        assert_eq!(store.list().unwrap(), vec!["a.xml", "b.xml"]);
        assert_eq!(store.load("b.xml").unwrap(), "<b/>");

        store.delete("a.xml").unwrap();
        assert_eq!(store.list().unwrap(), vec!["b.xml"]);
    }

    #[test]
    fn test_save_overwrites() {
        let store = MemoryStore::with_files([("a.xml", "old")]);
        store.save("a.xml", "new").unwrap();
        assert_eq!(store.load("a.xml").unwrap(), "new");
    }

    #[test]
    fn test_missing_files() {
        let store = MemoryStore::new();
        assert!(matches!(store.load("missing.xml"), Err(RemoteError::NotFound(_))));
        assert!(matches!(store.delete("missing.xml"), Err(RemoteError::NotFound(_))));
        assert!(matches!(store.save(" ", "x"), Err(RemoteError::Conflict(_))));
    }
}
