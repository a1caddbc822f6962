use std::cell::RefCell;
use std::rc::Rc;

use tether_core::{
  Action,
  PopupState,
  Services,
  View,
  reduce
};
use tracing::debug;

/// Owns the popup state and runs reducer effects on the local executor.
pub struct PopupRuntime {
  state:     RefCell<PopupState>,
  services:  Services,
  on_change: RefCell<Option<Rc<dyn Fn()>>>
}

impl PopupRuntime {
  pub fn new(services: Services) -> Rc<Self> {
    Rc::new(Self {
      state: RefCell::new(PopupState::new()),
      services,
      on_change: RefCell::new(None)
    })
  }

  pub fn services(&self) -> &Services {
    &self.services
  }

  pub fn view(&self) -> View {
    self.state.borrow().view()
  }

  pub fn signed_in_email(
    &self
  ) -> Option<String> {
    self
      .state
      .borrow()
      .session
      .as_ref()
      .map(|session| session.email().to_string())
      .filter(|email| !email.is_empty())
  }

  pub fn set_on_change(
    &self,
    on_change: Option<Rc<dyn Fn()>>
  ) {
    *self.on_change.borrow_mut() = on_change;
  }

  pub fn dispatch(
    self: &Rc<Self>,
    action: Action
  ) {
    let effects = {
      let mut state =
        self.state.borrow_mut();
      let (next, effects) =
        reduce(&state, action);
      *state = next;
      effects
    };
    debug!(
      view = ?self.view().kind(),
      effects = effects.len(),
      "state updated"
    );

    let on_change =
      self.on_change.borrow().clone();
    if let Some(on_change) = on_change {
      on_change();
    }

    for effect in effects {
      let runtime = Rc::clone(self);
      wasm_bindgen_futures::spawn_local(
        async move {
          if let Some(next) = runtime
            .services
            .perform(effect)
            .await
          {
            runtime.dispatch(next);
          }
        }
      );
    }
  }
}
