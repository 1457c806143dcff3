use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;

use super::store::KeyValueStore;

/// In-memory store for tests and embedded use.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().expect("store lock poisoned");
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().expect("store lock poisoned");
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().expect("store lock poisoned");
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_remove_round_trip() -> Result<()> {
        let store = MemoryStore::new();
        assert_eq!(store.load("k")?, None);

        store.save("k", "v")?;
        assert_eq!(store.load("k")?, Some("v".to_string()));

        store.save("k", "v2")?;
        assert_eq!(store.load("k")?, Some("v2".to_string()));

        store.remove("k")?;
        assert_eq!(store.load("k")?, None);

        // Removing a missing key is fine
        store.remove("k")?;
        Ok(())
    }
}
