use std::cell::RefCell;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;

/// Key-value storage that survives the popup being closed.
#[async_trait(?Send)]
pub trait KvStore {
  async fn get(
    &self,
    key: &str
  ) -> Result<Option<Value>, StorageError>;

  async fn set(
    &self,
    key: &str,
    value: Value
  ) -> Result<(), StorageError>;

  async fn remove(
    &self,
    key: &str
  ) -> Result<(), StorageError>;
}

/// In-process store, used when no persistent backend is reachable.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: RefCell<BTreeMap<String, Value>>
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn contains(
    &self,
    key: &str
  ) -> bool {
    self.entries.borrow().contains_key(key)
  }
}

#[async_trait(?Send)]
impl KvStore for MemoryStore {
  async fn get(
    &self,
    key: &str
  ) -> Result<Option<Value>, StorageError> {
    Ok(
      self
        .entries
        .borrow()
        .get(key)
        .cloned()
    )
  }

  async fn set(
    &self,
    key: &str,
    value: Value
  ) -> Result<(), StorageError> {
    self
      .entries
      .borrow_mut()
      .insert(key.to_string(), value);
    Ok(())
  }

  async fn remove(
    &self,
    key: &str
  ) -> Result<(), StorageError> {
    self.entries.borrow_mut().remove(key);
    Ok(())
  }
}
