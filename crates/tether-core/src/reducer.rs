use tracing::{
  debug,
  warn
};

use crate::organization::{
  Organization,
  contains_id
};
use crate::resolver::reconcile;
use crate::session::Session;
use crate::view::{
  View,
  select_view
};

/// Everything the view is derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupState {
  pub session:       Option<Session>,
  pub organizations: Vec<Organization>,
  pub selected:      Option<Organization>,
  pub loading:       bool,
  /// Bumped whenever a membership fetch is dispatched or the session
  /// changes; results tagged with an older value are discarded.
  pub generation:    u64,
  pub fetch_error:   Option<String>
}

impl Default for PopupState {
  fn default() -> Self {
    Self {
      session:       None,
      organizations: Vec::new(),
      selected:      None,
      loading:       true,
      generation:    0,
      fetch_error:   None
    }
  }
}

impl PopupState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn view(&self) -> View {
    select_view(self)
  }

  fn signed_out(&self) -> Self {
    Self {
      session:       None,
      organizations: Vec::new(),
      selected:      None,
      loading:       false,
      generation:    self.generation + 1,
      fetch_error:   None
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
  Started,
  SessionChanged(Option<Session>),
  /// The stored session was rejected by the backend.
  SessionInvalidated,
  MembershipsLoaded {
    generation:    u64,
    organizations: Vec<Organization>,
    restored:      Option<Organization>
  },
  MembershipsFailed {
    generation: u64,
    message:    String
  },
  /// The directory refused the session's token.
  MembershipsRejected {
    generation: u64
  },
  RetryMemberships,
  OrganizationChosen(Organization),
  SelectionCleared,
  SignOutRequested
}

/// I/O requested by a transition, performed by
/// [`Services::perform`](crate::services::Services::perform).
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
  ResolveSession,
  LoadMemberships {
    generation: u64,
    user_id:    String
  },
  PersistSelection(Organization),
  ClearPersistedSelection,
  SignOut
}

pub fn reduce(
  state: &PopupState,
  action: Action
) -> (PopupState, Vec<Effect>) {
  match action {
    | Action::Started => {
      let next = PopupState {
        loading: true,
        ..state.clone()
      };
      (next, vec![Effect::ResolveSession])
    }
    | Action::SessionChanged(None) => {
      // A lookup that found nobody keeps the stored selection.
      if state.session.is_none() {
        return (state.signed_out(), vec![]);
      }
      debug!(
        "session ended; clearing \
         organization state"
      );
      (
        state.signed_out(),
        vec![
          Effect::ClearPersistedSelection,
        ]
      )
    }
    | Action::SessionInvalidated => {
      debug!(
        "session invalidated; clearing \
         organization state"
      );
      (
        state.signed_out(),
        vec![
          Effect::ClearPersistedSelection,
        ]
      )
    }
    | Action::SessionChanged(Some(
      session
    )) => session_started(state, session),
    | Action::MembershipsLoaded {
      generation,
      organizations,
      restored
    } => {
      if is_stale(state, generation) {
        return (state.clone(), vec![]);
      }

      let selected = reconcile(
        &organizations,
        restored.as_ref()
      );
      let mut effects = Vec::new();
      match (&restored, &selected) {
        | (Some(_), None) => {
          effects.push(
            Effect::ClearPersistedSelection
          );
        }
        | (Some(previous), Some(current))
          if previous != current =>
        {
          effects.push(
            Effect::PersistSelection(
              current.clone()
            )
          );
        }
        | _ => {}
      }

      let next = PopupState {
        organizations,
        selected,
        loading: false,
        fetch_error: None,
        ..state.clone()
      };
      (next, effects)
    }
    | Action::MembershipsFailed {
      generation,
      message
    } => {
      if is_stale(state, generation) {
        return (state.clone(), vec![]);
      }
      let next = PopupState {
        fetch_error: Some(message),
        ..state.clone()
      };
      (next, vec![])
    }
    | Action::MembershipsRejected {
      generation
    } => {
      if is_stale(state, generation) {
        return (state.clone(), vec![]);
      }
      debug!(
        generation,
        "directory refused the session; \
         signing out"
      );
      (state.signed_out(), vec![
        Effect::SignOut,
        Effect::ClearPersistedSelection,
      ])
    }
    | Action::RetryMemberships => {
      let Some(session) = &state.session
      else {
        return (state.clone(), vec![]);
      };
      let generation = state.generation + 1;
      let effects =
        vec![Effect::LoadMemberships {
          generation,
          user_id: session
            .user_id()
            .to_string()
        }];
      let next = PopupState {
        loading: true,
        generation,
        fetch_error: None,
        ..state.clone()
      };
      (next, effects)
    }
    | Action::OrganizationChosen(
      organization
    ) => {
      if state.session.is_none()
        || state.loading
        || !contains_id(
          &state.organizations,
          &organization.id
        )
      {
        warn!(
          organization = %organization.id,
          "ignoring selection of an \
           organization outside the \
           membership list"
        );
        return (state.clone(), vec![]);
      }

      let chosen = state
        .organizations
        .iter()
        .find(|org| {
          org.id == organization.id
        })
        .cloned()
        .unwrap_or(organization);
      let next = PopupState {
        selected: Some(chosen.clone()),
        ..state.clone()
      };
      (next, vec![Effect::PersistSelection(
        chosen
      )])
    }
    | Action::SelectionCleared => {
      let next = PopupState {
        selected: None,
        ..state.clone()
      };
      (next, vec![
        Effect::ClearPersistedSelection,
      ])
    }
    | Action::SignOutRequested => {
      (state.signed_out(), vec![
        Effect::SignOut,
        Effect::ClearPersistedSelection,
      ])
    }
  }
}

fn session_started(
  state: &PopupState,
  session: Session
) -> (PopupState, Vec<Effect>) {
  let same_user = state
    .session
    .as_ref()
    .is_some_and(|current| {
      current.user_id() == session.user_id()
    });

  if same_user {
    debug!(
      user = %session.user_id(),
      "session refreshed for the same user"
    );
    let next = PopupState {
      session: Some(session),
      ..state.clone()
    };
    return (next, vec![]);
  }

  let generation = state.generation + 1;
  debug!(
    user = %session.user_id(),
    generation,
    "session started; loading \
     memberships"
  );
  let effects =
    vec![Effect::LoadMemberships {
      generation,
      user_id: session.user_id().to_string()
    }];
  let next = PopupState {
    session: Some(session),
    organizations: Vec::new(),
    selected: None,
    loading: true,
    generation,
    fetch_error: None
  };
  (next, effects)
}

fn is_stale(
  state: &PopupState,
  generation: u64
) -> bool {
  let stale = generation != state.generation
    || state.session.is_none();
  if stale {
    debug!(
      generation,
      current = state.generation,
      "discarding stale membership result"
    );
  }
  stale
}
