//! Session and organization selection core for the Tether Chat popup.
//!
//! Everything here is platform independent: the collaborators the popup
//! talks to (auth backend, organization directory, key-value storage)
//! are traits, and the screen to render is derived by a pure reducer and
//! view selector.

pub mod auth;
pub mod chat;
pub mod config;
pub mod directory;
pub mod error;
pub mod form;
pub mod kv;
pub mod organization;
pub mod persistence;
pub mod picker;
pub mod reducer;
pub mod resolver;
pub mod services;
pub mod session;
pub mod view;
pub mod wire;

pub use error::{
  AuthError,
  FetchError,
  StorageError
};
pub use organization::Organization;
pub use reducer::{
  Action,
  Effect,
  PopupState,
  reduce
};
pub use services::Services;
pub use session::{
  Session,
  User
};
pub use view::{
  View,
  ViewKind,
  select_view
};
