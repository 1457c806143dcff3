use anyhow::Result;

/// Simple key-value persistence used to make the history log durable.
///
/// The log is stored as one opaque serialized string per key; the store has
/// no knowledge of the payload format.
pub trait KeyValueStore: Send + Sync {
    /// Load the value for `key`, or `None` if it has never been saved.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Save `value` under `key`, overwriting any previous value.
    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value for `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
