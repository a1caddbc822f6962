use async_trait::async_trait;
use gloo::storage::errors::StorageError as LocalStorageError;
use gloo::storage::{
  LocalStorage,
  Storage
};
use serde::Serialize;
use serde_json::Value;
use tether_core::StorageError;
use tether_core::kv::{
  KvStore,
  MemoryStore
};
use tracing::{
  info,
  warn
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
  #[wasm_bindgen(
    catch,
    js_namespace = ["chrome", "storage", "local"],
    js_name = get
  )]
  async fn chrome_local_get(
    keys: &JsValue
  ) -> Result<JsValue, JsValue>;

  #[wasm_bindgen(
    catch,
    js_namespace = ["chrome", "storage", "local"],
    js_name = set
  )]
  async fn chrome_local_set(
    items: &JsValue
  ) -> Result<JsValue, JsValue>;

  #[wasm_bindgen(
    catch,
    js_namespace = ["chrome", "storage", "local"],
    js_name = remove
  )]
  async fn chrome_local_remove(
    keys: &JsValue
  ) -> Result<JsValue, JsValue>;
}

enum Backend {
  Extension,
  Local,
  Memory(MemoryStore)
}

/// `chrome.storage.local` inside the extension, `window.localStorage`
/// when served as a plain page, memory as a last resort.
pub struct PopupStorage {
  backend: Backend
}

impl PopupStorage {
  pub fn detect() -> Self {
    let backend = if extension_storage_present()
    {
      Backend::Extension
    } else if local_storage_present() {
      Backend::Local
    } else {
      Backend::Memory(MemoryStore::new())
    };

    match &backend {
      | Backend::Extension => {
        info!("using chrome.storage.local")
      }
      | Backend::Local => {
        info!(
          "extension storage missing; \
           using localStorage"
        )
      }
      | Backend::Memory(_) => {
        warn!(
          "no persistent storage; \
           selections last until the \
           popup closes"
        )
      }
    }
    Self { backend }
  }
}

fn extension_storage_present() -> bool {
  ["chrome", "storage", "local"]
    .into_iter()
    .try_fold(
      JsValue::from(js_sys::global()),
      |object, name| {
        js_sys::Reflect::get(
          &object,
          &JsValue::from_str(name)
        )
        .ok()
        .filter(|next| {
          !next.is_undefined()
            && !next.is_null()
        })
      }
    )
    .is_some()
}

fn local_storage_present() -> bool {
  web_sys::window()
    .and_then(|window| {
      window.local_storage().ok().flatten()
    })
    .is_some()
}

fn describe(error: JsValue) -> String {
  error
    .as_string()
    .unwrap_or_else(|| format!("{error:?}"))
}

#[async_trait(?Send)]
impl KvStore for PopupStorage {
  async fn get(
    &self,
    key: &str
  ) -> Result<Option<Value>, StorageError> {
    match &self.backend {
      | Backend::Extension => {
        let items = chrome_local_get(
          &JsValue::from_str(key)
        )
        .await
        .map_err(|e| {
          StorageError::Backend(describe(e))
        })?;
        let value = js_sys::Reflect::get(
          &items,
          &JsValue::from_str(key)
        )
        .map_err(|e| {
          StorageError::Backend(describe(e))
        })?;
        if value.is_undefined()
          || value.is_null()
        {
          return Ok(None);
        }
        serde_wasm_bindgen::from_value(value)
          .map(Some)
          .map_err(|e| {
            StorageError::Decode(
              e.to_string()
            )
          })
      }
      | Backend::Local => {
        match LocalStorage::get::<Value>(key)
        {
          | Ok(value) => Ok(Some(value)),
          | Err(
            LocalStorageError::KeyNotFound(
              _
            )
          ) => Ok(None),
          | Err(
            LocalStorageError::SerdeError(e)
          ) => {
            Err(StorageError::Decode(
              e.to_string()
            ))
          }
          | Err(e) => {
            Err(StorageError::Backend(
              e.to_string()
            ))
          }
        }
      }
      | Backend::Memory(store) => {
        store.get(key).await
      }
    }
  }

  async fn set(
    &self,
    key: &str,
    value: Value
  ) -> Result<(), StorageError> {
    match &self.backend {
      | Backend::Extension => {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let value = value
          .serialize(&serializer)
          .map_err(|e| {
            StorageError::Backend(
              e.to_string()
            )
          })?;
        let items = js_sys::Object::new();
        js_sys::Reflect::set(
          &items,
          &JsValue::from_str(key),
          &value
        )
        .map_err(|e| {
          StorageError::Backend(describe(e))
        })?;
        chrome_local_set(&items)
          .await
          .map(|_| ())
          .map_err(|e| {
            StorageError::Backend(describe(
              e
            ))
          })
      }
      | Backend::Local => {
        LocalStorage::set(key, value)
          .map_err(|e| {
            StorageError::Backend(
              e.to_string()
            )
          })
      }
      | Backend::Memory(store) => {
        store.set(key, value).await
      }
    }
  }

  async fn remove(
    &self,
    key: &str
  ) -> Result<(), StorageError> {
    match &self.backend {
      | Backend::Extension => {
        chrome_local_remove(
          &JsValue::from_str(key)
        )
        .await
        .map(|_| ())
        .map_err(|e| {
          StorageError::Backend(describe(e))
        })
      }
      | Backend::Local => {
        LocalStorage::delete(key);
        Ok(())
      }
      | Backend::Memory(store) => {
        store.remove(key).await
      }
    }
  }
}
