use crate::chat::ChatLaunch;
use crate::organization::{
  Organization,
  contains_id
};
use crate::picker::OrganizationPicker;
use crate::reducer::PopupState;

/// The single screen the popup renders.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
  /// Session or membership fetch outstanding. `error` is set when the
  /// last membership fetch failed and a retry is offered.
  Loading {
    error: Option<String>
  },
  LoggedOut,
  PickingOrganization(OrganizationPicker),
  ConfigError(Organization),
  Chatting(ChatLaunch)
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum ViewKind {
  Loading,
  LoggedOut,
  PickingOrganization,
  ConfigError,
  Chatting
}

impl View {
  pub fn kind(&self) -> ViewKind {
    match self {
      | View::Loading { .. } => {
        ViewKind::Loading
      }
      | View::LoggedOut => {
        ViewKind::LoggedOut
      }
      | View::PickingOrganization(_) => {
        ViewKind::PickingOrganization
      }
      | View::ConfigError(_) => {
        ViewKind::ConfigError
      }
      | View::Chatting(_) => {
        ViewKind::Chatting
      }
    }
  }
}

/// First match wins: loading, no session, no valid selection,
/// unconfigured selection, chat.
pub fn select_view(
  state: &PopupState
) -> View {
  if state.loading {
    return View::Loading {
      error: state.fetch_error.clone()
    };
  }

  let Some(session) = &state.session
  else {
    return View::LoggedOut;
  };

  let selected =
    state.selected.as_ref().filter(|org| {
      contains_id(
        &state.organizations,
        &org.id
      )
    });
  let Some(organization) = selected else {
    return View::PickingOrganization(
      OrganizationPicker::new(
        &state.organizations
      )
    );
  };

  match ChatLaunch::for_organization(
    organization,
    session.user_id()
  ) {
    | Some(launch) => View::Chatting(launch),
    | None => {
      View::ConfigError(
        organization.clone()
      )
    }
  }
}
