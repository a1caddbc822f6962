use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use async_trait::async_trait;
use tracing::trace;

use crate::error::AuthError;
use crate::session::{
  AuthEvent,
  Credentials,
  Session,
  SignUpOutcome
};

pub type AuthListener =
  Rc<dyn Fn(AuthEvent, Option<Session>)>;

/// Hosted authentication backend.
///
/// Implementations must notify listeners registered through
/// [`AuthProvider::on_auth_state_change`] whenever they sign a user in or
/// out, or refresh the session token.
#[async_trait(?Send)]
pub trait AuthProvider {
  async fn get_session(
    &self
  ) -> Result<Option<Session>, AuthError>;

  async fn sign_in(
    &self,
    credentials: &Credentials
  ) -> Result<Session, AuthError>;

  async fn sign_up(
    &self,
    credentials: &Credentials
  ) -> Result<SignUpOutcome, AuthError>;

  async fn sign_out(
    &self
  ) -> Result<(), AuthError>;

  async fn reset_password_for_email(
    &self,
    email: &str
  ) -> Result<(), AuthError>;

  fn on_auth_state_change(
    &self,
    listener: AuthListener
  ) -> AuthSubscription;
}

/// Registration guard returned by [`AuthProvider::on_auth_state_change`].
/// Dropping it removes the listener.
#[must_use = "dropping the subscription \
              unregisters the listener"]
pub struct AuthSubscription {
  release: Option<Box<dyn FnOnce()>>
}

impl AuthSubscription {
  pub fn new(
    release: impl FnOnce() + 'static
  ) -> Self {
    Self {
      release: Some(Box::new(release))
    }
  }

  pub fn unsubscribe(mut self) {
    self.release_now();
  }

  fn release_now(&mut self) {
    if let Some(release) =
      self.release.take()
    {
      release();
    }
  }
}

impl Drop for AuthSubscription {
  fn drop(&mut self) {
    self.release_now();
  }
}

#[derive(Default)]
struct Listeners {
  next_id: u64,
  entries: BTreeMap<u64, AuthListener>
}

/// Listener registry shared by auth provider implementations.
#[derive(Clone, Default)]
pub struct AuthEvents {
  inner: Rc<RefCell<Listeners>>
}

impl AuthEvents {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn subscribe(
    &self,
    listener: AuthListener
  ) -> AuthSubscription {
    let id = {
      let mut inner =
        self.inner.borrow_mut();
      let id = inner.next_id;
      inner.next_id += 1;
      inner
        .entries
        .insert(id, listener);
      id
    };
    trace!(id, "auth listener registered");

    let weak = Rc::downgrade(&self.inner);
    AuthSubscription::new(move || {
      if let Some(inner) = weak.upgrade()
      {
        inner
          .borrow_mut()
          .entries
          .remove(&id);
        trace!(
          id,
          "auth listener released"
        );
      }
    })
  }

  pub fn emit(
    &self,
    event: AuthEvent,
    session: Option<&Session>
  ) {
    // Listeners may subscribe or unsubscribe while being notified.
    let listeners: Vec<AuthListener> =
      self
        .inner
        .borrow()
        .entries
        .values()
        .cloned()
        .collect();

    trace!(
      ?event,
      listeners = listeners.len(),
      "emitting auth event"
    );
    for listener in listeners {
      listener(event, session.cloned());
    }
  }

  pub fn listener_count(&self) -> usize {
    self.inner.borrow().entries.len()
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use super::*;

  #[test]
  fn dropping_subscription_unregisters()
  {
    let events = AuthEvents::new();
    let hits = Rc::new(Cell::new(0));

    let subscription = {
      let hits = hits.clone();
      events.subscribe(Rc::new(
        move |_, _| {
          hits.set(hits.get() + 1);
        }
      ))
    };
    events.emit(
      AuthEvent::SignedOut,
      None
    );
    assert_eq!(hits.get(), 1);
    assert_eq!(
      events.listener_count(),
      1
    );

    drop(subscription);
    events.emit(
      AuthEvent::SignedOut,
      None
    );
    assert_eq!(hits.get(), 1);
    assert_eq!(
      events.listener_count(),
      0
    );
  }

  #[test]
  fn listener_may_unsubscribe_itself_during_emit()
  {
    let events = AuthEvents::new();
    let slot: Rc<
      RefCell<Option<AuthSubscription>>
    > = Rc::new(RefCell::new(None));

    let subscription = {
      let slot = slot.clone();
      events.subscribe(Rc::new(
        move |_, _| {
          if let Some(subscription) =
            slot.borrow_mut().take()
          {
            subscription.unsubscribe();
          }
        }
      ))
    };
    *slot.borrow_mut() =
      Some(subscription);

    events.emit(
      AuthEvent::SignedIn,
      None
    );
    assert_eq!(
      events.listener_count(),
      0
    );
  }

  #[test]
  fn subscription_outliving_registry_is_harmless()
  {
    let events = AuthEvents::new();
    let subscription = events
      .subscribe(Rc::new(|_, _| {}));
    drop(events);
    drop(subscription);
  }
}
